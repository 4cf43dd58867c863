//! Picks which competitors fill an event's seats.
//!
//! Selection runs per event and has two phases:
//!
//! 1. every guaranteed competitor (a child of an accepted judge) present in
//!    the ranking is seated, together with their partner if they have one
//! 2. the rest of the ranking is walked in order and seated while capacity
//!    remains; partners are seated together or not at all
//!
//! A competitor whose partner is absent from the ranking (never signed up,
//! or removed by a drop penalty) is seated alone.
//!
//! Speech events may replace every n-th rank-order pick with a random draw
//! from the middle third of the remaining field (see [`SpeechDraw`]).

use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::{rosters::RankedCompetitor, tournaments::signups::PartnerMap};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Selected {
    pub competitor_id: String,
    /// Set when the competitor was seated together with their partner.
    pub partner_id: Option<String>,
    pub rank: usize,
    /// Seated by the Speech draw rather than by rank.
    pub drawn: bool,
    pub guaranteed: bool,
}

pub struct SpeechDraw {
    pub rng: ChaCha20Rng,
    pub every: usize,
}

impl SpeechDraw {
    /// Returns the pool index to take next, and whether it was drawn.
    fn next_index(&mut self, picks: usize, pool_len: usize) -> (usize, bool) {
        if self.every == 0 || picks % self.every != self.every - 1 || pool_len < 3
        {
            return (0, false);
        }
        let lo = pool_len / 3;
        let hi = 2 * pool_len / 3;
        (self.rng.random_range(lo..=hi), true)
    }
}

struct Seating<'a> {
    present: HashMap<&'a str, &'a RankedCompetitor>,
    partners: &'a PartnerMap,
    taken: HashSet<&'a str>,
    remaining: usize,
    out: Vec<Selected>,
}

impl<'a> Seating<'a> {
    /// The competitor's partner, if they are in the ranking and not seated.
    fn partner_in_pool(&self, competitor: &str) -> Option<&'a RankedCompetitor> {
        let partner = self.partners.partner_of(competitor)?;
        match self.present.get(partner) {
            Some(p) if !self.taken.contains(partner) => Some(*p),
            Some(_) => None,
            None => {
                tracing::warn!(
                    competitor = %competitor,
                    partner = %partner,
                    "partner is not in the ranked pool, seating competitor alone"
                );
                None
            }
        }
    }

    /// Seats `candidate` (and their partner), returning the partner seated
    /// alongside. `None` if the seats don't fit; nothing changes then.
    fn seat(
        &mut self,
        candidate: &'a RankedCompetitor,
        drawn: bool,
        guaranteed: bool,
    ) -> Option<Option<&'a RankedCompetitor>> {
        let partner = self.partner_in_pool(&candidate.competitor_id);
        let needed = if partner.is_some() { 2 } else { 1 };
        if needed > self.remaining {
            return None;
        }

        self.remaining -= needed;
        self.taken.insert(&candidate.competitor_id);
        self.out.push(Selected {
            competitor_id: candidate.competitor_id.clone(),
            partner_id: partner.map(|p| p.competitor_id.clone()),
            rank: candidate.rank,
            drawn,
            guaranteed,
        });

        if let Some(partner) = partner {
            self.taken.insert(&partner.competitor_id);
            self.out.push(Selected {
                competitor_id: partner.competitor_id.clone(),
                partner_id: Some(candidate.competitor_id.clone()),
                rank: partner.rank,
                drawn,
                guaranteed,
            });
        }

        Some(partner)
    }
}

/// Selects up to `capacity` competitors from `clean` (already filtered for
/// penalties, in rank order). Never fails: an oversubscribed event is simply
/// filled as far as it goes.
pub fn select(
    clean: &[RankedCompetitor],
    capacity: usize,
    guaranteed: &HashSet<String>,
    partners: &PartnerMap,
    mut draw: Option<&mut SpeechDraw>,
) -> Vec<Selected> {
    if capacity == 0 || clean.is_empty() {
        return Vec::new();
    }

    let mut seating = Seating {
        present: clean
            .iter()
            .map(|c| (c.competitor_id.as_str(), c))
            .collect(),
        partners,
        taken: HashSet::new(),
        remaining: capacity,
        out: Vec::with_capacity(capacity.min(clean.len())),
    };

    for candidate in clean.iter().filter(|c| guaranteed.contains(&c.competitor_id))
    {
        if seating.taken.contains(candidate.competitor_id.as_str()) {
            continue;
        }
        if seating.seat(candidate, false, true).is_none() {
            tracing::warn!(
                competitor = %candidate.competitor_id,
                event = %candidate.event_id,
                "guaranteed competitor does not fit in the remaining capacity"
            );
        }
    }

    let mut pool: Vec<&RankedCompetitor> = clean
        .iter()
        .filter(|c| !seating.taken.contains(c.competitor_id.as_str()))
        .collect();
    let mut picks = 0;

    while seating.remaining > 0 && !pool.is_empty() {
        let (idx, drawn) = match draw.as_deref_mut() {
            Some(draw) => draw.next_index(picks, pool.len()),
            None => (0, false),
        };

        let candidate = pool.remove(idx);

        match seating.seat(candidate, drawn, false) {
            Some(partner) => {
                picks += 1;
                if let Some(partner) = partner {
                    pool.retain(|c| c.competitor_id != partner.competitor_id);
                }
            }
            None => {
                tracing::trace!(
                    competitor = %candidate.competitor_id,
                    "partnership does not fit in the remaining seat"
                );
            }
        }
    }

    seating.out
}
