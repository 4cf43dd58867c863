//! Which judges are actually coming, and whose children that guarantees a
//! seat for.

use std::collections::{HashMap, HashSet};

use crate::{
    rosters::AcceptedJudge,
    tournaments::{events::Event, judges::JudgeRequest, signups::Signup},
};

#[derive(Debug, Default, Clone)]
pub struct JudgeAvailability {
    pub judges: Vec<AcceptedJudge>,
    /// Children of accepted judges. These are seated regardless of rank.
    pub guaranteed: HashSet<String>,
}

impl JudgeAvailability {
    pub fn capacity(&self) -> usize {
        self.judges.iter().map(|judge| judge.capacity).sum()
    }
}

/// Resolves judge availability for every event of one tournament.
///
/// A judge counts only if a confirmed signup asked for them (`wants_judge`
/// with a matching `judge_id`) and the corresponding request was explicitly
/// accepted. Pending and denied requests are simply absent. A judge judges
/// at most one (child, event) pairing per tournament: when several accepted
/// pairings name the same judge, the one from the earliest signup wins.
pub struct JudgeResolver {
    by_event: HashMap<String, Vec<(String, String)>>,
}

impl JudgeResolver {
    /// `signups` must be in signup order. The order of `requests` does not
    /// matter.
    pub fn new(signups: &[Signup], requests: &[JudgeRequest]) -> Self {
        let accepted: HashSet<(&str, &str, &str)> = requests
            .iter()
            .filter(|request| request.accepted)
            .map(|request| {
                (
                    request.judge_id.as_str(),
                    request.child_id.as_str(),
                    request.event_id.as_str(),
                )
            })
            .collect();

        let mut placed: HashSet<&str> = HashSet::new();
        let mut by_event: HashMap<String, Vec<(String, String)>> =
            HashMap::new();

        for signup in signups.iter().filter(|s| s.confirmed && s.wants_judge) {
            let Some(judge_id) = signup.judge_id.as_deref() else {
                tracing::debug!(
                    signup = %signup.id,
                    "signup wants a judge but names none"
                );
                continue;
            };

            if !accepted.contains(&(
                judge_id,
                signup.competitor_id.as_str(),
                signup.event_id.as_str(),
            )) {
                continue;
            }

            if !placed.insert(judge_id) {
                tracing::warn!(
                    judge = %judge_id,
                    child = %signup.competitor_id,
                    event = %signup.event_id,
                    "judge already accepted for another pairing in this tournament, ignoring"
                );
                continue;
            }

            by_event
                .entry(signup.event_id.clone())
                .or_default()
                .push((judge_id.to_string(), signup.competitor_id.clone()));
        }

        Self { by_event }
    }

    pub fn resolve(&self, event: &Event) -> JudgeAvailability {
        let Some(pairings) = self.by_event.get(&event.id) else {
            return JudgeAvailability::default();
        };

        let judges = pairings
            .iter()
            .map(|(judge_id, child_id)| AcceptedJudge {
                judge_id: judge_id.clone(),
                child_id: child_id.clone(),
                event_id: event.id.clone(),
                capacity: event.kind.seats_per_judge(),
            })
            .collect::<Vec<_>>();

        let guaranteed =
            judges.iter().map(|judge| judge.child_id.clone()).collect();

        JudgeAvailability { judges, guaranteed }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::JudgeResolver;
    use crate::tournaments::{
        events::{Event, EventKind},
        judges::JudgeRequest,
        signups::Signup,
    };

    fn event(id: &str, kind: EventKind) -> Event {
        Event {
            id: id.to_string(),
            name: id.to_uppercase(),
            kind,
            is_partner_event: false,
        }
    }

    fn signup(child: &str, event: &str, judge: Option<&str>) -> Signup {
        Signup {
            id: format!("s-{child}-{event}"),
            tournament_id: "t".to_string(),
            event_id: event.to_string(),
            competitor_id: child.to_string(),
            partner_id: None,
            wants_judge: judge.is_some(),
            judge_id: judge.map(str::to_string),
            confirmed: true,
            created_at: NaiveDateTime::default(),
        }
    }

    fn request(judge: &str, child: &str, event: &str, accepted: bool) -> JudgeRequest {
        JudgeRequest {
            id: format!("r-{judge}-{event}"),
            tournament_id: "t".to_string(),
            event_id: event.to_string(),
            judge_id: judge.to_string(),
            child_id: child.to_string(),
            accepted,
            created_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn only_accepted_requests_count() {
        let resolver = JudgeResolver::new(
            &[
                signup("kid1", "ld", Some("parent1")),
                signup("kid2", "ld", Some("parent2")),
                signup("kid3", "ld", None),
            ],
            &[
                request("parent1", "kid1", "ld", true),
                request("parent2", "kid2", "ld", false),
            ],
        );

        let availability = resolver.resolve(&event("ld", EventKind::LincolnDouglas));
        assert_eq!(availability.judges.len(), 1);
        assert_eq!(availability.judges[0].judge_id, "parent1");
        assert_eq!(availability.capacity(), 2);
        assert!(availability.guaranteed.contains("kid1"));
        assert!(!availability.guaranteed.contains("kid2"));
    }

    #[test]
    fn capacity_follows_event_kind() {
        let resolver = JudgeResolver::new(
            &[
                signup("a", "speech", Some("pa")),
                signup("b", "speech", Some("pb")),
                signup("c", "pf", Some("pc")),
            ],
            &[
                request("pa", "a", "speech", true),
                request("pb", "b", "speech", true),
                request("pc", "c", "pf", true),
            ],
        );

        assert_eq!(
            resolver.resolve(&event("speech", EventKind::Speech)).capacity(),
            12
        );
        assert_eq!(
            resolver.resolve(&event("pf", EventKind::PublicForum)).capacity(),
            4
        );
        assert_eq!(
            resolver
                .resolve(&event("ld", EventKind::LincolnDouglas))
                .capacity(),
            0
        );
    }

    #[test]
    fn judge_is_placed_once_per_tournament() {
        let resolver = JudgeResolver::new(
            &[
                signup("a", "speech", Some("parent")),
                signup("b", "pf", Some("parent")),
            ],
            &[
                request("parent", "a", "speech", true),
                request("parent", "b", "pf", true),
            ],
        );

        assert_eq!(
            resolver.resolve(&event("speech", EventKind::Speech)).judges.len(),
            1
        );
        assert!(
            resolver
                .resolve(&event("pf", EventKind::PublicForum))
                .judges
                .is_empty()
        );
    }

    #[test]
    fn earliest_signup_decides_a_contested_judge() {
        let resolver = JudgeResolver::new(
            &[
                signup("a", "speech", Some("parent")),
                signup("b", "pf", Some("parent")),
            ],
            &[
                request("parent", "b", "pf", true),
                request("parent", "a", "speech", true),
            ],
        );

        let speech = resolver.resolve(&event("speech", EventKind::Speech));
        assert_eq!(speech.judges.len(), 1);
        assert_eq!(speech.judges[0].child_id, "a");
        assert!(
            resolver
                .resolve(&event("pf", EventKind::PublicForum))
                .judges
                .is_empty()
        );
    }

    #[test]
    fn acceptance_without_signup_request_is_ignored() {
        let resolver = JudgeResolver::new(
            &[signup("a", "ld", None)],
            &[request("parent", "a", "ld", true)],
        );
        assert!(
            resolver
                .resolve(&event("ld", EventKind::LincolnDouglas))
                .judges
                .is_empty()
        );
    }
}
