use chrono::NaiveDateTime;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::{rosters::RosterError, schema::tournaments};

pub mod events;
pub mod judges;
pub mod scores;
pub mod signups;

#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = tournaments)]
#[diesel(check_for_backend(Sqlite))]
pub struct Tournament {
    pub id: String,
    pub name: String,
    pub date: NaiveDateTime,
    pub signup_deadline: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

impl Tournament {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        tournament_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Self, RosterError> {
        tournaments::table
            .filter(tournaments::id.eq(tournament_id))
            .select(Tournament::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| RosterError::TournamentNotFound(tournament_id.to_string()))
    }
}
