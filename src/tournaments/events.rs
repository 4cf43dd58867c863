use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::schema::events;

/// The three event families the team enters. The stored representation is
/// the integer code (0, 1, 2).
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum EventKind {
    #[serde(rename = "speech")]
    Speech,
    #[serde(rename = "ld")]
    LincolnDouglas,
    #[serde(rename = "pf")]
    PublicForum,
}

impl EventKind {
    /// Competitor seats one accepted judge brings to an event of this kind.
    pub const fn seats_per_judge(self) -> usize {
        match self {
            EventKind::Speech => 6,
            EventKind::LincolnDouglas => 2,
            EventKind::PublicForum => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(EventKind::Speech),
            1 => Some(EventKind::LincolnDouglas),
            2 => Some(EventKind::PublicForum),
            _ => None,
        }
    }

    pub const fn code(self) -> i64 {
        match self {
            EventKind::Speech => 0,
            EventKind::LincolnDouglas => 1,
            EventKind::PublicForum => 2,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EventKind::Speech => "Speech",
            EventKind::LincolnDouglas => "LD",
            EventKind::PublicForum => "PF",
        })
    }
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(Sqlite))]
pub struct EventRow {
    pub id: String,
    pub name: String,
    pub kind: i64,
    pub is_partner_event: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub kind: EventKind,
    pub is_partner_event: bool,
}

impl TryFrom<EventRow> for Event {
    type Error = i64;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Event {
            kind: EventKind::from_code(row.kind).ok_or(row.kind)?,
            id: row.id,
            name: row.name,
            is_partner_event: row.is_partner_event,
        })
    }
}

impl Event {
    /// Loads the given events, ordered by id (ids are time-ordered, so this
    /// is creation order). Rows with an unknown kind code are skipped with a
    /// warning.
    pub fn load_many(
        ids: &[String],
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<Event>> {
        let rows = events::table
            .filter(events::id.eq_any(ids))
            .order_by(events::id.asc())
            .select(EventRow::as_select())
            .load(conn)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id.clone();
                match Event::try_from(row) {
                    Ok(event) => Some(event),
                    Err(code) => {
                        tracing::warn!(event = %id, code, "unknown event kind");
                        None
                    }
                }
            })
            .collect())
    }
}
