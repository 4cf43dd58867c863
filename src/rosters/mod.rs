//! Roster generation.
//!
//! A roster decides which of a tournament's confirmed signups actually
//! attend. Generation runs in three stages:
//!
//! 1. fetch: signups, scores, judge requests and penalty counters are read
//!    into a [`generate::RosterInput`]
//! 2. plan: for every event the [`availability`] resolver, the
//!    [`penalties`] filter, the [`select`] selector and the judge
//!    assignment in [`build`] run purely in memory
//! 3. commit: [`build::RosterDraft::persist`] replaces the stored roster
//!    and consumes the penalty counters in one transaction, guarded by a
//!    [`tickets`] ticket
//!
//! [`staffing`] adds or removes a judge on a stored roster and reseats the
//! affected event without regenerating anything else. [`display`] turns a
//! stored roster back into something presentable and applies the
//! publish/anonymisation rule.

use chrono::NaiveDateTime;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::rosters;

pub mod availability;
pub mod build;
pub mod config;
pub mod display;
pub mod generate;
pub mod manage;
pub mod penalties;
pub mod public;
pub mod publish;
pub mod ranking;
pub mod select;
pub mod staffing;
pub mod tickets;

#[derive(Debug, Error)]
pub enum RosterError {
    /// A lookup or write against the store failed. Nothing was committed.
    #[error("data unavailable: {0}")]
    DataUnavailable(#[from] diesel::result::Error),
    #[error("{kind} {id} does not exist")]
    MissingRecord { kind: &'static str, id: String },
    #[error("tournament {0} does not exist")]
    TournamentNotFound(String),
    #[error("roster {0} does not exist")]
    RosterNotFound(String),
    #[error("a roster is already being generated for tournament {0}")]
    ConcurrentRegeneration(String),
    #[error("roster generation for tournament {0} was superseded by a newer request")]
    TicketExpired(String),
    #[error("roster {0} has not been published")]
    NotPublished(String),
    #[error("invalid roster name: {0}")]
    InvalidName(String),
    #[error("cannot change roster judges: {0}")]
    InvalidJudge(String),
}

/// A signed-up competitor with everything needed to rank and filter them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RankedCompetitor {
    pub competitor_id: String,
    pub event_id: String,
    pub score: Decimal,
    pub drop_penalty_count: i64,
    /// 1-based position in the event's ranking before any filtering.
    pub rank: usize,
}

/// A judge whose offer has been accepted, together with the seats they bring.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AcceptedJudge {
    pub judge_id: String,
    pub child_id: String,
    pub event_id: String,
    pub capacity: usize,
}

/// Created once for every competitor removed by the penalty filter. Shown
/// as a "+1" placeholder once the roster is published.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PenaltyEntry {
    pub roster_id: String,
    pub tournament_id: String,
    pub event_id: String,
    pub penalized_competitor_id: String,
    pub original_rank: usize,
    pub drops_applied: i64,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = rosters)]
#[diesel(check_for_backend(Sqlite))]
pub struct Roster {
    pub id: String,
    pub tournament_id: String,
    pub name: String,
    pub published: bool,
    pub created_at: NaiveDateTime,
    pub published_at: Option<NaiveDateTime>,
}

impl Roster {
    pub fn fetch(
        roster_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Roster, RosterError> {
        rosters::table
            .filter(rosters::id.eq(roster_id))
            .select(Roster::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| RosterError::RosterNotFound(roster_id.to_string()))
    }

    pub fn of_tournament(
        tournament_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Option<Roster>> {
        rosters::table
            .filter(rosters::tournament_id.eq(tournament_id))
            .select(Roster::as_select())
            .first(conn)
            .optional()
    }
}
