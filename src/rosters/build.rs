//! Turns selections into a roster: assigns judges, collects partner links,
//! and writes everything to the store.

use std::collections::BTreeSet;

use chrono::Utc;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    rosters::{AcceptedJudge, PenaltyEntry, Roster, RosterError, select::Selected},
    schema::{
        roster_competitors, roster_judges, roster_partners,
        roster_penalty_entries, roster_published_users, rosters, users,
    },
    tournaments::events::Event,
};

/// One rostered competitor.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Seat {
    pub competitor_id: String,
    pub partner_id: Option<String>,
    pub judge_id: Option<String>,
    pub rank: usize,
    /// Position in selection order within the event.
    pub seq: usize,
    pub drawn: bool,
    pub guaranteed: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventPlan {
    pub event: Event,
    pub judges: Vec<AcceptedJudge>,
    pub seats: Vec<Seat>,
    /// Lower id first, one entry per pair.
    pub partners: Vec<(String, String)>,
    pub penalties: Vec<PenaltyEntry>,
}

impl EventPlan {
    pub fn capacity(&self) -> usize {
        self.judges.iter().map(|judge| judge.capacity).sum()
    }
}

/// A fully computed roster that has not been written yet.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RosterDraft {
    pub roster_id: String,
    pub tournament_id: String,
    pub name: String,
    pub events: Vec<EventPlan>,
    /// Competitors whose drop counter is decremented when the draft is
    /// persisted.
    pub consumed_drops: Vec<String>,
}

/// Assigns every selected competitor a judge. A guaranteed competitor goes
/// to their own parent first; everyone else is dealt round-robin across the
/// judges that still have room.
pub fn assign_judges(
    selected: Vec<Selected>,
    judges: &[AcceptedJudge],
) -> Vec<Seat> {
    let mut remaining: Vec<usize> =
        judges.iter().map(|judge| judge.capacity).collect();

    let mut assigned: Vec<Option<usize>> = selected
        .iter()
        .map(|seat| {
            let own = judges
                .iter()
                .position(|judge| judge.child_id == seat.competitor_id)?;
            if remaining[own] == 0 {
                return None;
            }
            remaining[own] -= 1;
            Some(own)
        })
        .collect();

    let mut cursor = 0;
    for judge in assigned.iter_mut().filter(|judge| judge.is_none()) {
        let next = (0..judges.len())
            .map(|offset| (cursor + offset) % judges.len())
            .find(|&idx| remaining[idx] > 0);
        if let Some(idx) = next {
            remaining[idx] -= 1;
            *judge = Some(idx);
            cursor = idx + 1;
        }
    }

    selected
        .into_iter()
        .zip(assigned)
        .enumerate()
        .map(|(seq, (selected, judge))| {
            if judge.is_none() {
                tracing::warn!(
                    competitor = %selected.competitor_id,
                    "no judge has room for rostered competitor"
                );
            }
            Seat {
                judge_id: judge.map(|idx| judges[idx].judge_id.clone()),
                competitor_id: selected.competitor_id,
                partner_id: selected.partner_id,
                rank: selected.rank,
                seq,
                drawn: selected.drawn,
                guaranteed: selected.guaranteed,
            }
        })
        .collect()
}

pub fn plan_event(
    event: Event,
    judges: Vec<AcceptedJudge>,
    selected: Vec<Selected>,
    penalties: Vec<PenaltyEntry>,
) -> EventPlan {
    let partners = selected
        .iter()
        .filter_map(|seat| {
            let partner = seat.partner_id.as_ref()?;
            Some(if seat.competitor_id < *partner {
                (seat.competitor_id.clone(), partner.clone())
            } else {
                (partner.clone(), seat.competitor_id.clone())
            })
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let seats = assign_judges(selected, &judges);

    EventPlan {
        event,
        judges,
        seats,
        partners,
        penalties,
    }
}

/// Removes every record that belongs to a roster, but not the roster row.
pub fn clear_roster_children(
    roster_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<()> {
    diesel::delete(
        roster_competitors::table
            .filter(roster_competitors::roster_id.eq(roster_id)),
    )
    .execute(conn)?;
    diesel::delete(
        roster_judges::table.filter(roster_judges::roster_id.eq(roster_id)),
    )
    .execute(conn)?;
    diesel::delete(
        roster_partners::table.filter(roster_partners::roster_id.eq(roster_id)),
    )
    .execute(conn)?;
    diesel::delete(
        roster_penalty_entries::table
            .filter(roster_penalty_entries::roster_id.eq(roster_id)),
    )
    .execute(conn)?;
    diesel::delete(
        roster_published_users::table
            .filter(roster_published_users::roster_id.eq(roster_id)),
    )
    .execute(conn)?;
    Ok(())
}

/// Writes an event's seats and partner links. Existing rows for the event
/// must already be gone.
pub(crate) fn insert_seats(
    roster_id: &str,
    plan: &EventPlan,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<()> {
    let competitors = plan
        .seats
        .iter()
        .map(|seat| {
            (
                roster_competitors::id.eq(Uuid::now_v7().to_string()),
                roster_competitors::roster_id.eq(roster_id),
                roster_competitors::event_id.eq(&plan.event.id),
                roster_competitors::competitor_id.eq(&seat.competitor_id),
                roster_competitors::judge_id.eq(&seat.judge_id),
                roster_competitors::rank.eq(seat.rank as i64),
                roster_competitors::seq.eq(seat.seq as i64),
                roster_competitors::drawn.eq(seat.drawn),
            )
        })
        .collect::<Vec<_>>();
    let partners = plan
        .partners
        .iter()
        .map(|(a, b)| {
            (
                roster_partners::id.eq(Uuid::now_v7().to_string()),
                roster_partners::roster_id.eq(roster_id),
                roster_partners::event_id.eq(&plan.event.id),
                roster_partners::partner1_id.eq(a),
                roster_partners::partner2_id.eq(b),
            )
        })
        .collect::<Vec<_>>();

    diesel::insert_into(roster_competitors::table)
        .values(&competitors)
        .execute(conn)?;
    diesel::insert_into(roster_partners::table)
        .values(&partners)
        .execute(conn)?;
    Ok(())
}

impl RosterDraft {
    /// Replaces the tournament's roster with this draft and consumes the
    /// drop penalties, all in one transaction. A regenerated roster keeps
    /// its id and name and goes back to unpublished.
    #[tracing::instrument(skip(self, conn), fields(roster = %self.roster_id))]
    pub fn persist(
        &self,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Roster, RosterError> {
        conn.transaction(|conn| {
            let now = Utc::now().naive_utc();

            match Roster::of_tournament(&self.tournament_id, conn)? {
                Some(existing) if existing.id == self.roster_id => {
                    clear_roster_children(&existing.id, conn)?;
                    diesel::update(
                        rosters::table.filter(rosters::id.eq(&existing.id)),
                    )
                    .set((
                        rosters::published.eq(false),
                        rosters::published_at.eq(None::<chrono::NaiveDateTime>),
                    ))
                    .execute(conn)?;
                }
                existing => {
                    if let Some(stale) = existing {
                        tracing::warn!(
                            stale = %stale.id,
                            "replacing a roster that was created concurrently"
                        );
                        clear_roster_children(&stale.id, conn)?;
                        diesel::delete(
                            rosters::table.filter(rosters::id.eq(&stale.id)),
                        )
                        .execute(conn)?;
                    }
                    diesel::insert_into(rosters::table)
                        .values((
                            rosters::id.eq(&self.roster_id),
                            rosters::tournament_id.eq(&self.tournament_id),
                            rosters::name.eq(&self.name),
                            rosters::published.eq(false),
                            rosters::created_at.eq(now),
                            rosters::published_at
                                .eq(None::<chrono::NaiveDateTime>),
                        ))
                        .execute(conn)?;
                }
            }

            let mut judges = Vec::new();
            let mut penalties = Vec::new();

            for plan in &self.events {
                for judge in &plan.judges {
                    judges.push((
                        roster_judges::id.eq(Uuid::now_v7().to_string()),
                        roster_judges::roster_id.eq(&self.roster_id),
                        roster_judges::event_id.eq(&plan.event.id),
                        roster_judges::judge_id.eq(&judge.judge_id),
                        roster_judges::child_id.eq(&judge.child_id),
                        roster_judges::capacity.eq(judge.capacity as i64),
                    ));
                }
                insert_seats(&self.roster_id, plan, conn)?;
                for penalty in &plan.penalties {
                    penalties.push((
                        roster_penalty_entries::id.eq(Uuid::now_v7().to_string()),
                        roster_penalty_entries::roster_id.eq(&self.roster_id),
                        roster_penalty_entries::tournament_id
                            .eq(&penalty.tournament_id),
                        roster_penalty_entries::event_id.eq(&penalty.event_id),
                        roster_penalty_entries::penalized_competitor_id
                            .eq(&penalty.penalized_competitor_id),
                        roster_penalty_entries::original_rank
                            .eq(penalty.original_rank as i64),
                        roster_penalty_entries::drops_applied
                            .eq(penalty.drops_applied),
                        roster_penalty_entries::created_at.eq(now),
                    ));
                }
            }

            diesel::insert_into(roster_judges::table)
                .values(&judges)
                .execute(conn)?;
            diesel::insert_into(roster_penalty_entries::table)
                .values(&penalties)
                .execute(conn)?;

            for competitor in &self.consumed_drops {
                let n = diesel::update(
                    users::table.filter(
                        users::id.eq(competitor).and(users::drops.gt(0)),
                    ),
                )
                .set(users::drops.eq(users::drops - 1))
                .execute(conn)?;
                if n == 0 {
                    tracing::warn!(
                        competitor = %competitor,
                        "drop counter was already exhausted when committing"
                    );
                }
            }

            Roster::fetch(&self.roster_id, conn)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{assign_judges, plan_event};
    use crate::{
        rosters::{AcceptedJudge, select::Selected},
        tournaments::events::{Event, EventKind},
    };

    fn judge(id: &str, child: &str, capacity: usize) -> AcceptedJudge {
        AcceptedJudge {
            judge_id: id.to_string(),
            child_id: child.to_string(),
            event_id: "e".to_string(),
            capacity,
        }
    }

    fn selected(id: &str, partner: Option<&str>, guaranteed: bool) -> Selected {
        Selected {
            competitor_id: id.to_string(),
            partner_id: partner.map(str::to_string),
            rank: 1,
            drawn: false,
            guaranteed,
        }
    }

    #[test]
    fn child_sits_with_own_parent_and_others_round_robin() {
        let seats = assign_judges(
            vec![
                selected("kid2", None, true),
                selected("a", None, false),
                selected("b", None, false),
                selected("c", None, false),
            ],
            &[judge("p1", "kid1", 2), judge("p2", "kid2", 2)],
        );

        let judges: Vec<_> =
            seats.iter().map(|s| s.judge_id.as_deref()).collect();
        assert_eq!(judges, [Some("p2"), Some("p1"), Some("p2"), Some("p1")]);
        assert_eq!(
            seats.iter().map(|s| s.seq).collect::<Vec<_>>(),
            [0, 1, 2, 3]
        );
    }

    #[test]
    fn judge_capacity_is_never_exceeded() {
        let seats = assign_judges(
            vec![
                selected("a", None, false),
                selected("b", None, false),
                selected("c", None, false),
            ],
            &[judge("p1", "x", 1), judge("p2", "y", 1)],
        );
        assert_eq!(seats[0].judge_id.as_deref(), Some("p1"));
        assert_eq!(seats[1].judge_id.as_deref(), Some("p2"));
        assert_eq!(seats[2].judge_id, None);
    }

    #[test]
    fn partner_pairs_are_recorded_once() {
        let plan = plan_event(
            Event {
                id: "pf".to_string(),
                name: "Public Forum".to_string(),
                kind: EventKind::PublicForum,
                is_partner_event: true,
            },
            vec![judge("p1", "x", 4)],
            vec![
                selected("p9", Some("p2"), false),
                selected("p2", Some("p9"), false),
                selected("p3", None, false),
            ],
            Vec::new(),
        );
        assert_eq!(plan.partners, [("p2".to_string(), "p9".to_string())]);
        assert_eq!(plan.seats.len(), 3);
        assert_eq!(plan.capacity(), 4);
    }
}
