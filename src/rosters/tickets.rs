//! Serialises roster generation per tournament.
//!
//! A generation takes a ticket before it reads anything and commits only if
//! its ticket is still the newest one for the tournament. Tickets are
//! released when the generation commits or fails. A ticket that was never
//! released (e.g. the process died) blocks further generations until one is
//! forced through with `force = true`, which supersedes and releases it.

use chrono::Utc;
use diesel::{
    SqliteConnection, connection::LoadConnection, prelude::*, sqlite::Sqlite,
};
use uuid::Uuid;

use crate::{rosters::RosterError, schema::roster_tickets};

#[derive(Debug, Clone)]
pub struct Ticket {
    pub id: String,
    pub tournament_id: String,
    pub seq: i64,
}

/// Takes a new ticket for `tournament_id`. Fails with
/// [`RosterError::ConcurrentRegeneration`] if another ticket is still held
/// and `force` is not set.
#[tracing::instrument(skip(conn))]
pub fn acquire(
    tournament_id: &str,
    force: bool,
    conn: &mut SqliteConnection,
) -> Result<Ticket, RosterError> {
    conn.immediate_transaction(|conn| {
        let held = roster_tickets::table
            .filter(
                roster_tickets::tournament_id
                    .eq(tournament_id)
                    .and(roster_tickets::released.eq(false)),
            )
            .select(diesel::dsl::max(roster_tickets::seq))
            .get_result::<Option<i64>>(conn)?;

        if held.is_some() && !force {
            return Err(RosterError::ConcurrentRegeneration(
                tournament_id.to_string(),
            ));
        }
        if let Some(seq) = held {
            tracing::warn!(seq, "forcing past an unreleased ticket");
            diesel::update(
                roster_tickets::table.filter(
                    roster_tickets::tournament_id
                        .eq(tournament_id)
                        .and(roster_tickets::released.eq(false)),
                ),
            )
            .set(roster_tickets::released.eq(true))
            .execute(conn)?;
        }

        let last = roster_tickets::table
            .filter(roster_tickets::tournament_id.eq(tournament_id))
            .select(diesel::dsl::max(roster_tickets::seq))
            .get_result::<Option<i64>>(conn)?;

        let ticket = Ticket {
            id: Uuid::now_v7().to_string(),
            tournament_id: tournament_id.to_string(),
            seq: last.map_or(0, |seq| seq + 1),
        };

        diesel::insert_into(roster_tickets::table)
            .values((
                roster_tickets::id.eq(&ticket.id),
                roster_tickets::tournament_id.eq(&ticket.tournament_id),
                roster_tickets::seq.eq(ticket.seq),
                roster_tickets::acquired.eq(Utc::now().naive_utc()),
                roster_tickets::released.eq(false),
            ))
            .execute(conn)?;

        Ok(ticket)
    })
}

/// Fails with [`RosterError::TicketExpired`] if a newer ticket was taken
/// for the same tournament. Call inside the commit transaction.
pub fn ensure_current(
    ticket: &Ticket,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<(), RosterError> {
    let superseded = diesel::dsl::select(diesel::dsl::exists(
        roster_tickets::table.filter(
            roster_tickets::tournament_id
                .eq(&ticket.tournament_id)
                .and(roster_tickets::seq.gt(ticket.seq)),
        ),
    ))
    .get_result::<bool>(conn)?;

    if superseded {
        return Err(RosterError::TicketExpired(ticket.tournament_id.clone()));
    }
    Ok(())
}

pub fn release(
    ticket: &Ticket,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<()> {
    diesel::update(roster_tickets::table.filter(roster_tickets::id.eq(&ticket.id)))
        .set(roster_tickets::released.eq(true))
        .execute(conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{acquire, ensure_current, release};
    use crate::{rosters::RosterError, test::fixtures::TestDb};

    #[test]
    fn second_ticket_is_refused_until_release() {
        let mut db = TestDb::new();
        let tournament = db.tournament("Regionals");

        let first = acquire(&tournament, false, &mut db.conn).unwrap();
        assert!(matches!(
            acquire(&tournament, false, &mut db.conn),
            Err(RosterError::ConcurrentRegeneration(_))
        ));

        release(&first, &mut db.conn).unwrap();
        let second = acquire(&tournament, false, &mut db.conn).unwrap();
        assert_eq!(second.seq, first.seq + 1);
    }

    #[test]
    fn forced_ticket_expires_the_older_one() {
        let mut db = TestDb::new();
        let tournament = db.tournament("Regionals");

        let stale = acquire(&tournament, false, &mut db.conn).unwrap();
        let forced = acquire(&tournament, true, &mut db.conn).unwrap();

        assert!(matches!(
            ensure_current(&stale, &mut db.conn),
            Err(RosterError::TicketExpired(_))
        ));
        ensure_current(&forced, &mut db.conn).unwrap();
    }

    #[test]
    fn tickets_are_per_tournament() {
        let mut db = TestDb::new();
        let a = db.tournament("A");
        let b = db.tournament("B");

        acquire(&a, false, &mut db.conn).unwrap();
        acquire(&b, false, &mut db.conn).unwrap();
    }
}
