use chrono::Utc;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use uuid::Uuid;

use crate::{
    rosters::{Roster, RosterError, build::clear_roster_children},
    schema::{roster_competitors, roster_published_users, rosters},
};

/// Makes a roster visible to everyone and records every rostered competitor
/// in their "my rosters" feed. Publishing twice changes nothing.
#[tracing::instrument(skip(conn))]
pub fn publish_roster(
    roster_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Roster, RosterError> {
    conn.transaction(|conn| {
        let roster = Roster::fetch(roster_id, conn)?;
        if roster.published {
            return Ok(roster);
        }

        let now = Utc::now().naive_utc();
        diesel::update(rosters::table.filter(rosters::id.eq(&roster.id)))
            .set((
                rosters::published.eq(true),
                rosters::published_at.eq(Some(now)),
            ))
            .execute(conn)?;

        let recorded = record_published_users(&roster, None, conn)?;

        tracing::info!(competitors = recorded, "roster published");

        Roster::fetch(roster_id, conn)
    })
}

/// Adds every seated competitor of `roster` (or of one of its events) to
/// their "my rosters" feed.
pub(crate) fn record_published_users(
    roster: &Roster,
    event_id: Option<&str>,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<usize> {
    let mut query = roster_competitors::table
        .filter(roster_competitors::roster_id.eq(&roster.id))
        .select((
            roster_competitors::competitor_id,
            roster_competitors::event_id,
        ))
        .distinct()
        .into_boxed();
    if let Some(event_id) = event_id {
        query = query.filter(roster_competitors::event_id.eq(event_id));
    }
    let seated = query.load::<(String, String)>(conn)?;

    let now = Utc::now().naive_utc();
    let rows = seated
        .iter()
        .map(|(user, event)| {
            (
                roster_published_users::id.eq(Uuid::now_v7().to_string()),
                roster_published_users::user_id.eq(user),
                roster_published_users::roster_id.eq(&roster.id),
                roster_published_users::tournament_id.eq(&roster.tournament_id),
                roster_published_users::event_id.eq(event),
                roster_published_users::notified.eq(false),
                roster_published_users::created_at.eq(now),
            )
        })
        .collect::<Vec<_>>();

    diesel::insert_into(roster_published_users::table)
        .values(&rows)
        .execute(conn)
}

#[tracing::instrument(skip(conn))]
pub fn unpublish_roster(
    roster_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Roster, RosterError> {
    conn.transaction(|conn| {
        let roster = Roster::fetch(roster_id, conn)?;

        diesel::update(rosters::table.filter(rosters::id.eq(&roster.id)))
            .set((
                rosters::published.eq(false),
                rosters::published_at.eq(None::<chrono::NaiveDateTime>),
            ))
            .execute(conn)?;
        diesel::delete(
            roster_published_users::table
                .filter(roster_published_users::roster_id.eq(&roster.id)),
        )
        .execute(conn)?;

        tracing::info!("roster unpublished");

        Roster::fetch(roster_id, conn)
    })
}

pub const MAX_NAME_LEN: usize = 128;

#[tracing::instrument(skip(conn))]
pub fn rename_roster(
    roster_id: &str,
    name: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Roster, RosterError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RosterError::InvalidName("name must not be empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(RosterError::InvalidName(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }

    let n = diesel::update(rosters::table.filter(rosters::id.eq(roster_id)))
        .set(rosters::name.eq(name))
        .execute(conn)?;
    if n == 0 {
        return Err(RosterError::RosterNotFound(roster_id.to_string()));
    }

    Roster::fetch(roster_id, conn)
}

/// Deletes a roster with everything it owns. Penalty counters that were
/// consumed when it was generated are not restored.
#[tracing::instrument(skip(conn))]
pub fn delete_roster(
    roster_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Roster, RosterError> {
    conn.transaction(|conn| {
        let roster = Roster::fetch(roster_id, conn)?;
        clear_roster_children(&roster.id, conn)?;
        diesel::delete(rosters::table.filter(rosters::id.eq(&roster.id)))
            .execute(conn)?;
        tracing::info!("roster deleted");
        Ok(roster)
    })
}

/// Published rosters `user_id` appears on, newest first.
pub fn rosters_of_user(
    user_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<Vec<Roster>> {
    rosters::table
        .filter(rosters::published.eq(true))
        .filter(
            rosters::id.eq_any(
                roster_published_users::table
                    .filter(roster_published_users::user_id.eq(user_id))
                    .select(roster_published_users::roster_id),
            ),
        )
        .order_by(rosters::published_at.desc())
        .select(Roster::as_select())
        .load(conn)
}
