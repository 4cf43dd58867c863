use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::{
    rosters::{RankedCompetitor, RosterError},
    tournaments::{
        scores::{ScoreWeights, Standing},
        signups::Signup,
    },
};

/// Groups confirmed signups by event (keeping signup order inside each
/// group). A second signup for the same (competitor, event) is dropped.
pub fn signups_by_event(signups: &[Signup]) -> IndexMap<String, Vec<Signup>> {
    let mut seen = HashSet::new();
    let mut grouped: IndexMap<String, Vec<Signup>> = IndexMap::new();

    for signup in signups.iter().filter(|s| s.confirmed) {
        if !seen.insert((signup.competitor_id.as_str(), signup.event_id.as_str()))
        {
            tracing::warn!(
                competitor = %signup.competitor_id,
                event = %signup.event_id,
                signup = %signup.id,
                "duplicate signup for the same event, keeping the first"
            );
            continue;
        }
        grouped
            .entry(signup.event_id.clone())
            .or_default()
            .push(signup.clone());
    }

    grouped
}

/// Ranks one event's signups by weighted score, highest first. The sort is
/// stable, so equal scores keep signup order.
pub fn rank_event(
    signups: &[Signup],
    standings: &HashMap<String, Standing>,
    weights: &ScoreWeights,
) -> Result<Vec<RankedCompetitor>, RosterError> {
    let mut ranked = signups
        .iter()
        .map(|signup| {
            let standing = standings.get(&signup.competitor_id).ok_or_else(|| {
                RosterError::MissingRecord {
                    kind: "competitor",
                    id: signup.competitor_id.clone(),
                }
            })?;

            Ok(RankedCompetitor {
                competitor_id: signup.competitor_id.clone(),
                event_id: signup.event_id.clone(),
                score: weights
                    .score(standing.tournament_points, standing.effort_points),
                drop_penalty_count: standing.drops,
                rank: 0,
            })
        })
        .collect::<Result<Vec<_>, RosterError>>()?;

    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    for (i, competitor) in ranked.iter_mut().enumerate() {
        competitor.rank = i + 1;
    }

    Ok(ranked)
}
