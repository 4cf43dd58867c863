use chrono::NaiveDateTime;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::schema::tournament_judges;

/// A parent's offer to judge an event so that their child can attend, and
/// whether the offer was accepted.
#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = tournament_judges)]
#[diesel(check_for_backend(Sqlite))]
pub struct JudgeRequest {
    pub id: String,
    pub tournament_id: String,
    pub event_id: String,
    pub judge_id: String,
    pub child_id: String,
    pub accepted: bool,
    pub created_at: NaiveDateTime,
}

impl JudgeRequest {
    /// All judge requests for the tournament (accepted or not), oldest first.
    #[tracing::instrument(skip(conn))]
    pub fn for_tournament(
        tournament_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<JudgeRequest>> {
        tournament_judges::table
            .filter(tournament_judges::tournament_id.eq(tournament_id))
            .order_by((
                tournament_judges::created_at.asc(),
                tournament_judges::id.asc(),
            ))
            .select(JudgeRequest::as_select())
            .load(conn)
    }
}
