//! Presentation model for a stored roster.
//!
//! An unpublished roster is only visible to administrators. Once published
//! anyone may view it, but penalty rows lose their name and show a "+1"
//! placeholder instead. Administrators always see who was penalised.

use std::collections::HashMap;

use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    rosters::{Roster, RosterError},
    schema::{
        roster_competitors, roster_judges, roster_partners,
        roster_penalty_entries, users,
    },
    tournaments::{Tournament, events::Event},
};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Person {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum DisplayRow {
    Competitor {
        rank: usize,
        competitor: Person,
        judge: Option<Person>,
        partner: Option<Person>,
        drawn: bool,
    },
    /// `competitor` is `None` for viewers who may not see the name.
    Penalty {
        rank: usize,
        competitor: Option<Person>,
    },
}

impl DisplayRow {
    pub fn rank(&self) -> usize {
        match self {
            DisplayRow::Competitor { rank, .. } | DisplayRow::Penalty { rank, .. } => {
                *rank
            }
        }
    }

    /// The label shown in the competitor column.
    pub fn label(&self) -> &str {
        match self {
            DisplayRow::Competitor { competitor, .. } => &competitor.name,
            DisplayRow::Penalty {
                competitor: Some(competitor),
                ..
            } => &competitor.name,
            DisplayRow::Penalty {
                competitor: None, ..
            } => "+1",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DisplayJudge {
    /// The roster judge entry, not the user.
    pub id: String,
    pub judge: Person,
    pub child: Person,
    pub capacity: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DisplayEvent {
    pub event: Event,
    pub judges: Vec<DisplayJudge>,
    /// Ordered by rank, penalty rows at their original position.
    pub rows: Vec<DisplayRow>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DisplayRoster {
    pub roster: Roster,
    pub tournament: Tournament,
    pub events: Vec<DisplayEvent>,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(Sqlite))]
struct NameRow {
    id: String,
    first_name: String,
    last_name: String,
}

/// Full names for the given users. Unknown ids are left out.
pub fn load_names(
    ids: &[String],
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<HashMap<String, String>> {
    Ok(users::table
        .filter(users::id.eq_any(ids))
        .select(NameRow::as_select())
        .load(conn)?
        .into_iter()
        .map(|row| (row.id, format!("{} {}", row.first_name, row.last_name)))
        .collect())
}

#[derive(Queryable, Debug)]
struct CompetitorRow {
    event_id: String,
    competitor_id: String,
    judge_id: Option<String>,
    rank: i64,
    drawn: bool,
}

#[derive(Queryable, Debug)]
struct JudgeRow {
    id: String,
    event_id: String,
    judge_id: String,
    child_id: String,
    capacity: i64,
}

#[derive(Queryable, Debug)]
struct PenaltyRow {
    event_id: String,
    competitor_id: String,
    original_rank: i64,
}

#[tracing::instrument(skip(conn))]
pub fn roster_for_display(
    roster_id: &str,
    viewer_is_admin: bool,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<DisplayRoster, RosterError> {
    let roster = Roster::fetch(roster_id, conn)?;
    if !roster.published && !viewer_is_admin {
        return Err(RosterError::NotPublished(roster.id));
    }
    let tournament = Tournament::fetch(&roster.tournament_id, conn)?;

    let competitors = roster_competitors::table
        .filter(roster_competitors::roster_id.eq(&roster.id))
        .order_by(roster_competitors::seq.asc())
        .select((
            roster_competitors::event_id,
            roster_competitors::competitor_id,
            roster_competitors::judge_id,
            roster_competitors::rank,
            roster_competitors::drawn,
        ))
        .load::<CompetitorRow>(conn)?;

    let judges = roster_judges::table
        .filter(roster_judges::roster_id.eq(&roster.id))
        .order_by(roster_judges::id.asc())
        .select((
            roster_judges::id,
            roster_judges::event_id,
            roster_judges::judge_id,
            roster_judges::child_id,
            roster_judges::capacity,
        ))
        .load::<JudgeRow>(conn)?;

    let partners = roster_partners::table
        .filter(roster_partners::roster_id.eq(&roster.id))
        .select((
            roster_partners::event_id,
            roster_partners::partner1_id,
            roster_partners::partner2_id,
        ))
        .load::<(String, String, String)>(conn)?;

    let penalties = roster_penalty_entries::table
        .filter(roster_penalty_entries::roster_id.eq(&roster.id))
        .select((
            roster_penalty_entries::event_id,
            roster_penalty_entries::penalized_competitor_id,
            roster_penalty_entries::original_rank,
        ))
        .load::<PenaltyRow>(conn)?;

    let mut partner_of = HashMap::new();
    for (event, a, b) in &partners {
        partner_of.insert((event.as_str(), a.as_str()), b.as_str());
        partner_of.insert((event.as_str(), b.as_str()), a.as_str());
    }

    let person_ids = competitors
        .iter()
        .flat_map(|c| std::iter::once(&c.competitor_id).chain(&c.judge_id))
        .chain(judges.iter().flat_map(|j| [&j.judge_id, &j.child_id]))
        .chain(
            penalties
                .iter()
                .filter(|_| viewer_is_admin)
                .map(|p| &p.competitor_id),
        )
        .cloned()
        .unique()
        .collect::<Vec<_>>();
    let names = load_names(&person_ids, conn)?;
    let person = |id: &str| -> Result<Person, RosterError> {
        let name = names.get(id).ok_or_else(|| RosterError::MissingRecord {
            kind: "user",
            id: id.to_string(),
        })?;
        Ok(Person {
            id: id.to_string(),
            name: name.clone(),
        })
    };

    let event_ids = competitors
        .iter()
        .map(|c| &c.event_id)
        .chain(judges.iter().map(|j| &j.event_id))
        .chain(penalties.iter().map(|p| &p.event_id))
        .cloned()
        .unique()
        .collect::<Vec<_>>();

    let mut events = Vec::new();
    for event in Event::load_many(&event_ids, conn)? {
        let mut rows = Vec::new();

        for c in competitors.iter().filter(|c| c.event_id == event.id) {
            rows.push(DisplayRow::Competitor {
                rank: c.rank as usize,
                competitor: person(&c.competitor_id)?,
                judge: c.judge_id.as_deref().map(person).transpose()?,
                partner: partner_of
                    .get(&(event.id.as_str(), c.competitor_id.as_str()))
                    .map(|p| person(p))
                    .transpose()?,
                drawn: c.drawn,
            });
        }

        for p in penalties.iter().filter(|p| p.event_id == event.id) {
            rows.push(DisplayRow::Penalty {
                rank: p.original_rank as usize,
                competitor: if viewer_is_admin {
                    Some(person(&p.competitor_id)?)
                } else {
                    None
                },
            });
        }

        rows.sort_by_key(DisplayRow::rank);

        let event_judges = judges
            .iter()
            .filter(|j| j.event_id == event.id)
            .map(|j| {
                Ok(DisplayJudge {
                    id: j.id.clone(),
                    judge: person(&j.judge_id)?,
                    child: person(&j.child_id)?,
                    capacity: j.capacity as usize,
                })
            })
            .collect::<Result<Vec<_>, RosterError>>()?;

        events.push(DisplayEvent {
            event,
            judges: event_judges,
            rows,
        });
    }

    Ok(DisplayRoster {
        roster,
        tournament,
        events,
    })
}
