//! Competitor scores.
//!
//! A competitor's ranking score is a weighted combination of their
//! tournament points and effort points. The weights are part of
//! [`crate::rosters::config::RosterConfig`] and always passed in explicitly.

use std::collections::HashMap;

use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::schema::users;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct ScoreWeights {
    pub tournament: Decimal,
    pub effort: Decimal,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            tournament: Decimal::new(7, 1),
            effort: Decimal::new(3, 1),
        }
    }
}

impl ScoreWeights {
    /// Weighted score, rounded to two decimal places.
    pub fn score(&self, tournament_points: i64, effort_points: i64) -> Decimal {
        (Decimal::from(tournament_points) * self.tournament
            + Decimal::from(effort_points) * self.effort)
            .round_dp(2)
    }
}

/// The parts of a competitor's user record that ranking needs.
#[derive(Queryable, Selectable, Clone, Debug)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(Sqlite))]
pub struct Standing {
    pub id: String,
    pub tournament_points: i64,
    pub effort_points: i64,
    pub drops: i64,
}

impl Standing {
    pub fn load_many(
        ids: &[String],
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<HashMap<String, Standing>> {
        Ok(users::table
            .filter(users::id.eq_any(ids))
            .select(Standing::as_select())
            .load(conn)?
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect())
    }
}
