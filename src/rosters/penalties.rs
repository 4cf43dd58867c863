//! Drop penalties.
//!
//! A competitor who withdrew from an earlier roster owes a "drop". Each
//! roster generation consumes at most one drop per competitor: the first
//! event (in event order) in which a competitor with an outstanding drop
//! appears removes them from that event's ranking. The freed seat is filled
//! by the selector from further down the ranking.

use std::collections::{HashMap, HashSet};

use crate::rosters::{PenaltyEntry, RankedCompetitor};

/// Penalty counters as seen by one generation, and the drops it has
/// consumed so far.
#[derive(Debug, Default, Clone)]
pub struct DropLedger {
    remaining: HashMap<String, i64>,
    consumed: Vec<String>,
    consumed_set: HashSet<String>,
}

impl DropLedger {
    pub fn new(counts: impl IntoIterator<Item = (String, i64)>) -> Self {
        Self {
            remaining: counts.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Consumes one drop from `competitor` if they owe one and have not
    /// already been penalised in this generation.
    fn try_consume(&mut self, competitor: &RankedCompetitor) -> bool {
        if self.consumed_set.contains(&competitor.competitor_id) {
            return false;
        }

        let remaining = self
            .remaining
            .entry(competitor.competitor_id.clone())
            .or_insert(competitor.drop_penalty_count);

        if *remaining <= 0 {
            return false;
        }

        *remaining -= 1;
        self.consumed.push(competitor.competitor_id.clone());
        self.consumed_set.insert(competitor.competitor_id.clone());
        true
    }

    /// Competitors whose stored counter must drop by exactly one, in the
    /// order the penalties were applied.
    pub fn consumed(&self) -> &[String] {
        &self.consumed
    }
}

#[derive(Debug, Default, Clone)]
pub struct Filtered {
    pub clean: Vec<RankedCompetitor>,
    pub penalties: Vec<PenaltyEntry>,
}

/// Removes penalised competitors from `ranked`, keeping the relative order
/// of everyone else. Does not re-rank and does not pick replacements.
pub fn apply(
    ranked: &[RankedCompetitor],
    ledger: &mut DropLedger,
    roster_id: &str,
    tournament_id: &str,
    event_id: &str,
) -> Filtered {
    let mut filtered = Filtered {
        clean: Vec::with_capacity(ranked.len()),
        penalties: Vec::new(),
    };

    for competitor in ranked {
        if ledger.try_consume(competitor) {
            tracing::debug!(
                competitor = %competitor.competitor_id,
                event = %event_id,
                rank = competitor.rank,
                "applying drop penalty"
            );
            filtered.penalties.push(PenaltyEntry {
                roster_id: roster_id.to_string(),
                tournament_id: tournament_id.to_string(),
                event_id: event_id.to_string(),
                penalized_competitor_id: competitor.competitor_id.clone(),
                original_rank: competitor.rank,
                drops_applied: 1,
            });
        } else {
            filtered.clean.push(competitor.clone());
        }
    }

    filtered
}
