//! Editing the judges of a stored roster.
//!
//! Adding or removing a judge changes the capacity of exactly one event, so
//! only that event is reseated. Competitors who already hold a seat keep
//! priority in their stored order; freed seats go to the best-ranked
//! confirmed signups that are neither seated nor penalised. Drop counters
//! and penalty entries are left alone.

use std::collections::{HashMap, HashSet};

use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use uuid::Uuid;

use crate::{
    rosters::{
        AcceptedJudge, RankedCompetitor, Roster, RosterError,
        build::{insert_seats, plan_event},
        publish::record_published_users,
        ranking::{rank_event, signups_by_event},
        select::select,
    },
    schema::{
        roster_competitors, roster_judges, roster_partners,
        roster_penalty_entries, roster_published_users, users,
    },
    tournaments::{
        events::Event,
        scores::{ScoreWeights, Standing},
        signups::{PartnerMap, Signup},
    },
};

fn load_event(
    event_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Option<Event>, RosterError> {
    Ok(Event::load_many(&[event_id.to_string()], conn)?
        .into_iter()
        .next())
}

fn user_exists(
    user_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        users::table.filter(users::id.eq(user_id)),
    ))
    .get_result(conn)
}

/// Puts `judge_id` on the roster as the judge for `child_id` in `event_id`
/// and fills the seats they bring. A judge judges at most one pairing per
/// roster.
#[tracing::instrument(skip(weights, conn))]
pub fn add_roster_judge(
    roster_id: &str,
    judge_id: &str,
    child_id: &str,
    event_id: &str,
    weights: &ScoreWeights,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Roster, RosterError> {
    conn.transaction(|conn| {
        let roster = Roster::fetch(roster_id, conn)?;
        let event = load_event(event_id, conn)?.ok_or_else(|| {
            RosterError::InvalidJudge(format!("unknown event {event_id}"))
        })?;
        for user in [judge_id, child_id] {
            if !user_exists(user, conn)? {
                return Err(RosterError::InvalidJudge(format!(
                    "unknown user {user}"
                )));
            }
        }

        let already = diesel::select(diesel::dsl::exists(
            roster_judges::table.filter(
                roster_judges::roster_id
                    .eq(&roster.id)
                    .and(roster_judges::judge_id.eq(judge_id)),
            ),
        ))
        .get_result::<bool>(conn)?;
        if already {
            return Err(RosterError::InvalidJudge(format!(
                "{judge_id} already judges on this roster"
            )));
        }

        diesel::insert_into(roster_judges::table)
            .values((
                roster_judges::id.eq(Uuid::now_v7().to_string()),
                roster_judges::roster_id.eq(&roster.id),
                roster_judges::event_id.eq(&event.id),
                roster_judges::judge_id.eq(judge_id),
                roster_judges::child_id.eq(child_id),
                roster_judges::capacity.eq(event.kind.seats_per_judge() as i64),
            ))
            .execute(conn)?;

        reseat_event(&roster, &event, weights, conn)?;
        Ok(roster)
    })
}

/// Takes a judge entry off the roster. Competitors beyond the remaining
/// capacity lose their seats, latest seated first.
#[tracing::instrument(skip(weights, conn))]
pub fn remove_roster_judge(
    roster_id: &str,
    roster_judge_id: &str,
    weights: &ScoreWeights,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Roster, RosterError> {
    conn.transaction(|conn| {
        let roster = Roster::fetch(roster_id, conn)?;
        let event_id = roster_judges::table
            .filter(
                roster_judges::id
                    .eq(roster_judge_id)
                    .and(roster_judges::roster_id.eq(&roster.id)),
            )
            .select(roster_judges::event_id)
            .first::<String>(conn)
            .optional()?
            .ok_or_else(|| {
                RosterError::InvalidJudge(format!(
                    "no judge entry {roster_judge_id} on this roster"
                ))
            })?;

        diesel::delete(
            roster_judges::table.filter(roster_judges::id.eq(roster_judge_id)),
        )
        .execute(conn)?;

        let event = load_event(&event_id, conn)?.ok_or(
            RosterError::MissingRecord {
                kind: "event",
                id: event_id,
            },
        )?;
        reseat_event(&roster, &event, weights, conn)?;
        Ok(roster)
    })
}

/// Recomputes the seats of one event from its current judges.
fn reseat_event(
    roster: &Roster,
    event: &Event,
    weights: &ScoreWeights,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<(), RosterError> {
    let judges = roster_judges::table
        .filter(
            roster_judges::roster_id
                .eq(&roster.id)
                .and(roster_judges::event_id.eq(&event.id)),
        )
        .order_by(roster_judges::id.asc())
        .select((
            roster_judges::judge_id,
            roster_judges::child_id,
            roster_judges::capacity,
        ))
        .load::<(String, String, i64)>(conn)?
        .into_iter()
        .map(|(judge_id, child_id, capacity)| AcceptedJudge {
            judge_id,
            child_id,
            event_id: event.id.clone(),
            capacity: capacity as usize,
        })
        .collect::<Vec<_>>();

    let seated = roster_competitors::table
        .filter(
            roster_competitors::roster_id
                .eq(&roster.id)
                .and(roster_competitors::event_id.eq(&event.id)),
        )
        .order_by(roster_competitors::seq.asc())
        .select((
            roster_competitors::competitor_id,
            roster_competitors::rank,
            roster_competitors::drawn,
        ))
        .load::<(String, i64, bool)>(conn)?;

    let stored_pairs = roster_partners::table
        .filter(
            roster_partners::roster_id
                .eq(&roster.id)
                .and(roster_partners::event_id.eq(&event.id)),
        )
        .select((roster_partners::partner1_id, roster_partners::partner2_id))
        .load::<(String, String)>(conn)?;

    let penalised = roster_penalty_entries::table
        .filter(
            roster_penalty_entries::roster_id
                .eq(&roster.id)
                .and(roster_penalty_entries::event_id.eq(&event.id)),
        )
        .select(roster_penalty_entries::penalized_competitor_id)
        .load::<String>(conn)?
        .into_iter()
        .collect::<HashSet<_>>();

    let signups =
        Signup::confirmed_for_tournament(&roster.tournament_id, conn)?;
    let grouped = signups_by_event(&signups);
    let event_signups = grouped
        .get(&event.id)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let competitor_ids = event_signups
        .iter()
        .map(|signup| signup.competitor_id.clone())
        .collect::<Vec<_>>();
    let standings = Standing::load_many(&competitor_ids, conn)?;
    let ranked = rank_event(event_signups, &standings, weights)?;

    let seated_ids = seated
        .iter()
        .map(|(id, ..)| id.as_str())
        .collect::<HashSet<_>>();
    let scores = ranked
        .iter()
        .map(|c| (c.competitor_id.as_str(), c.score))
        .collect::<HashMap<_, _>>();

    let mut pool = seated
        .iter()
        .map(|(id, rank, _)| RankedCompetitor {
            competitor_id: id.clone(),
            event_id: event.id.clone(),
            score: scores.get(id.as_str()).copied().unwrap_or_default(),
            drop_penalty_count: 0,
            rank: *rank as usize,
        })
        .collect::<Vec<_>>();
    pool.extend(ranked.iter().cloned().filter(|c| {
        !seated_ids.contains(c.competitor_id.as_str())
            && !penalised.contains(&c.competitor_id)
    }));

    let mut partners = PartnerMap::default();
    for (a, b) in &stored_pairs {
        partners.insert(a, b);
    }
    if event.is_partner_event {
        let requested = PartnerMap::from_event_signups(event_signups);
        for (a, b) in requested.pairs() {
            if !seated_ids.contains(a) && !seated_ids.contains(b) {
                partners.insert(a, b);
            }
        }
    }

    let guaranteed = judges
        .iter()
        .map(|judge| judge.child_id.clone())
        .collect::<HashSet<_>>();
    let capacity = judges.iter().map(|judge| judge.capacity).sum();

    let drawn = seated
        .iter()
        .map(|(id, _, drawn)| (id.as_str(), *drawn))
        .collect::<HashMap<_, _>>();
    let selected = select(&pool, capacity, &guaranteed, &partners, None)
        .into_iter()
        .map(|mut seat| {
            seat.drawn = drawn
                .get(seat.competitor_id.as_str())
                .copied()
                .unwrap_or(false);
            seat
        })
        .collect();

    let plan = plan_event(event.clone(), judges, selected, Vec::new());

    diesel::delete(
        roster_competitors::table.filter(
            roster_competitors::roster_id
                .eq(&roster.id)
                .and(roster_competitors::event_id.eq(&event.id)),
        ),
    )
    .execute(conn)?;
    diesel::delete(
        roster_partners::table.filter(
            roster_partners::roster_id
                .eq(&roster.id)
                .and(roster_partners::event_id.eq(&event.id)),
        ),
    )
    .execute(conn)?;
    insert_seats(&roster.id, &plan, conn)?;

    if roster.published {
        diesel::delete(
            roster_published_users::table.filter(
                roster_published_users::roster_id
                    .eq(&roster.id)
                    .and(roster_published_users::event_id.eq(&event.id)),
            ),
        )
        .execute(conn)?;
        record_published_users(roster, Some(&event.id), conn)?;
    }

    tracing::info!(
        event = %event.id,
        seats = plan.seats.len(),
        capacity = plan.capacity(),
        "event reseated"
    );
    Ok(())
}
