use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::schema::tournament_signups;

/// A competitor's registration for one event at one tournament.
#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = tournament_signups)]
#[diesel(check_for_backend(Sqlite))]
pub struct Signup {
    pub id: String,
    pub tournament_id: String,
    pub event_id: String,
    pub competitor_id: String,
    pub partner_id: Option<String>,
    pub wants_judge: bool,
    pub judge_id: Option<String>,
    pub confirmed: bool,
    pub created_at: NaiveDateTime,
}

impl Signup {
    /// Confirmed signups for the tournament, in signup order.
    #[tracing::instrument(skip(conn))]
    pub fn confirmed_for_tournament(
        tournament_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Vec<Signup>> {
        tournament_signups::table
            .filter(
                tournament_signups::tournament_id
                    .eq(tournament_id)
                    .and(tournament_signups::confirmed.eq(true)),
            )
            .order_by((
                tournament_signups::created_at.asc(),
                tournament_signups::id.asc(),
            ))
            .select(Signup::as_select())
            .load(conn)
    }
}

/// Undirected partner relation for a single event.
///
/// Signups record partners as a directed reference. This map is built once,
/// before selection, and always answers symmetrically: if either side named
/// the other then both are partners.
#[derive(Default, Debug, Clone)]
pub struct PartnerMap {
    partner_of: HashMap<String, String>,
}

impl PartnerMap {
    /// Builds the relation from the signups of one event (in signup order).
    ///
    /// * a partner reference to someone without a signup for the event is
    ///   dropped (the competitor is then treated as partnerless)
    /// * if a competitor is claimed by two different partners, the earliest
    ///   recorded pairing wins
    pub fn from_event_signups(signups: &[Signup]) -> Self {
        let signed_up: HashSet<&str> =
            signups.iter().map(|s| s.competitor_id.as_str()).collect();

        let mut map = PartnerMap::default();

        for signup in signups {
            let Some(partner) = signup.partner_id.as_deref() else {
                continue;
            };

            if partner == signup.competitor_id {
                tracing::warn!(
                    competitor = %signup.competitor_id,
                    event = %signup.event_id,
                    "competitor lists themselves as partner, ignoring"
                );
                continue;
            }

            if !signed_up.contains(partner) {
                tracing::warn!(
                    competitor = %signup.competitor_id,
                    partner = %partner,
                    event = %signup.event_id,
                    "partner has no confirmed signup for this event, treating competitor as partnerless"
                );
                continue;
            }

            map.insert(&signup.competitor_id, partner);
        }

        map
    }

    /// Records `a` and `b` as partners. Returns `false` (and leaves the map
    /// untouched) if either already has a different partner.
    pub fn insert(&mut self, a: &str, b: &str) -> bool {
        match (self.partner_of.get(a), self.partner_of.get(b)) {
            (Some(x), Some(y)) if x == b && y == a => true,
            (None, None) => {
                self.partner_of.insert(a.to_string(), b.to_string());
                self.partner_of.insert(b.to_string(), a.to_string());
                true
            }
            _ => {
                tracing::warn!(
                    a = %a,
                    b = %b,
                    "conflicting partner references, keeping the earlier pairing"
                );
                false
            }
        }
    }

    pub fn partner_of(&self, competitor: &str) -> Option<&str> {
        self.partner_of.get(competitor).map(String::as_str)
    }

    /// Each pair once, lower id first.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.partner_of
            .iter()
            .filter(|(a, b)| a < b)
            .map(|(a, b)| (a.as_str(), b.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::{PartnerMap, Signup};

    fn signup(competitor: &str, partner: Option<&str>) -> Signup {
        Signup {
            id: format!("s-{competitor}"),
            tournament_id: "t".to_string(),
            event_id: "pf".to_string(),
            competitor_id: competitor.to_string(),
            partner_id: partner.map(str::to_string),
            wants_judge: false,
            judge_id: None,
            confirmed: true,
            created_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn one_sided_reference_is_symmetric() {
        let map = PartnerMap::from_event_signups(&[
            signup("a", Some("b")),
            signup("b", None),
        ]);
        assert_eq!(map.partner_of("a"), Some("b"));
        assert_eq!(map.partner_of("b"), Some("a"));
        assert_eq!(map.pairs().count(), 1);
    }

    #[test]
    fn missing_partner_is_dropped() {
        let map = PartnerMap::from_event_signups(&[signup("a", Some("ghost"))]);
        assert_eq!(map.partner_of("a"), None);
        assert_eq!(map.pairs().count(), 0);
    }

    #[test]
    fn earliest_pairing_wins_on_conflict() {
        let map = PartnerMap::from_event_signups(&[
            signup("a", Some("b")),
            signup("b", Some("c")),
            signup("c", None),
        ]);
        assert_eq!(map.partner_of("b"), Some("a"));
        assert_eq!(map.partner_of("c"), None);
    }
}
