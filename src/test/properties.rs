//! Properties of selection and penalty filtering over arbitrary fields.

use std::collections::HashSet;

use proptest::{collection::vec, prelude::*};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rust_decimal::Decimal;

use crate::{
    rosters::{
        RankedCompetitor,
        penalties::{self, DropLedger},
        select::{Selected, SpeechDraw, select},
    },
    tournaments::signups::PartnerMap,
};

#[derive(Debug, Clone)]
struct Field {
    ranked: Vec<RankedCompetitor>,
    partners: Vec<(usize, usize)>,
    guaranteed: Vec<usize>,
    capacity: usize,
}

impl Field {
    fn partner_map(&self) -> PartnerMap {
        let mut map = PartnerMap::default();
        for (a, b) in &self.partners {
            if a != b {
                map.insert(&self.ranked[*a].competitor_id, &self.ranked[*b].competitor_id);
            }
        }
        map
    }

    fn guaranteed_set(&self) -> HashSet<String> {
        self.guaranteed
            .iter()
            .map(|i| self.ranked[*i].competitor_id.clone())
            .collect()
    }
}

fn field() -> impl Strategy<Value = Field> {
    (1usize..30).prop_flat_map(|n| {
        (
            vec(0i64..3, n),
            vec((0..n, 0..n), 0..n),
            vec(0..n, 0..4),
            0usize..40,
        )
            .prop_map(move |(drops, partners, guaranteed, capacity)| Field {
                ranked: drops
                    .into_iter()
                    .enumerate()
                    .map(|(i, drops)| RankedCompetitor {
                        competitor_id: format!("c{i:02}"),
                        event_id: "e".to_string(),
                        score: Decimal::from((n - i) as i64),
                        drop_penalty_count: drops,
                        rank: i + 1,
                    })
                    .collect(),
                partners,
                guaranteed,
                capacity,
            })
    })
}

fn seated(out: &[Selected]) -> HashSet<&str> {
    out.iter().map(|s| s.competitor_id.as_str()).collect()
}

proptest! {
    #[test]
    fn never_over_capacity(field in field()) {
        let out = select(
            &field.ranked,
            field.capacity,
            &field.guaranteed_set(),
            &field.partner_map(),
            None,
        );
        prop_assert!(out.len() <= field.capacity);
        prop_assert_eq!(seated(&out).len(), out.len());
    }

    #[test]
    fn partners_are_seated_together(field in field()) {
        let partners = field.partner_map();
        let out = select(
            &field.ranked,
            field.capacity,
            &field.guaranteed_set(),
            &partners,
            None,
        );
        let seated = seated(&out);
        for (a, b) in partners.pairs() {
            prop_assert_eq!(seated.contains(a), seated.contains(b));
        }
    }

    #[test]
    fn guaranteed_children_fit_when_there_is_room(field in field()) {
        let partners = field.partner_map();
        let guaranteed = field.guaranteed_set();
        let units: HashSet<&str> = guaranteed
            .iter()
            .flat_map(|g| std::iter::once(g.as_str()).chain(partners.partner_of(g)))
            .collect();
        prop_assume!(units.len() <= field.capacity);

        let out = select(&field.ranked, field.capacity, &guaranteed, &partners, None);
        let seated = seated(&out);
        for g in &guaranteed {
            prop_assert!(seated.contains(g.as_str()));
        }
    }

    #[test]
    fn unpartnered_competitors_follow_rank(field in field()) {
        let partners = field.partner_map();
        let guaranteed = field.guaranteed_set();
        let out = select(&field.ranked, field.capacity, &guaranteed, &partners, None);
        let seated = seated(&out);

        let singles: Vec<&RankedCompetitor> = field
            .ranked
            .iter()
            .filter(|c| {
                partners.partner_of(&c.competitor_id).is_none()
                    && !guaranteed.contains(&c.competitor_id)
            })
            .collect();

        // a seated single implies every better-ranked single is seated too
        for (i, lower) in singles.iter().enumerate() {
            if seated.contains(lower.competitor_id.as_str()) {
                for higher in &singles[..i] {
                    prop_assert!(seated.contains(higher.competitor_id.as_str()));
                }
            }
        }

        let order: Vec<usize> = out
            .iter()
            .filter(|s| singles.iter().any(|c| c.competitor_id == s.competitor_id))
            .map(|s| s.rank)
            .collect();
        prop_assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn speech_draw_keeps_seating_valid(
        field in field(),
        seed in any::<u64>(),
        every in 1usize..4,
    ) {
        let partners = field.partner_map();
        let guaranteed = field.guaranteed_set();
        let units: HashSet<&str> = guaranteed
            .iter()
            .flat_map(|g| std::iter::once(g.as_str()).chain(partners.partner_of(g)))
            .collect();

        let mut draw = SpeechDraw { rng: ChaCha20Rng::seed_from_u64(seed), every };
        let out = select(
            &field.ranked,
            field.capacity,
            &guaranteed,
            &partners,
            Some(&mut draw),
        );
        let seated = seated(&out);

        prop_assert!(out.len() <= field.capacity);
        prop_assert_eq!(seated.len(), out.len());
        for (a, b) in partners.pairs() {
            prop_assert_eq!(seated.contains(a), seated.contains(b));
        }
        if units.len() <= field.capacity {
            for g in &guaranteed {
                prop_assert!(seated.contains(g.as_str()));
            }
        }
        prop_assert!(out.iter().all(|s| !(s.drawn && s.guaranteed)));

        // the same seed draws the same seats
        let mut replay = SpeechDraw { rng: ChaCha20Rng::seed_from_u64(seed), every };
        let again = select(
            &field.ranked,
            field.capacity,
            &guaranteed,
            &partners,
            Some(&mut replay),
        );
        prop_assert_eq!(again, out);
    }

    #[test]
    fn each_owed_drop_is_applied_once(field in field()) {
        let mut ledger = DropLedger::new(
            field
                .ranked
                .iter()
                .map(|c| (c.competitor_id.clone(), c.drop_penalty_count)),
        );
        let out = penalties::apply(&field.ranked, &mut ledger, "r", "t", "e");

        let owing: Vec<&str> = field
            .ranked
            .iter()
            .filter(|c| c.drop_penalty_count > 0)
            .map(|c| c.competitor_id.as_str())
            .collect();
        let penalised: Vec<&str> = out
            .penalties
            .iter()
            .map(|p| p.penalized_competitor_id.as_str())
            .collect();

        prop_assert_eq!(&penalised, &owing);
        prop_assert_eq!(ledger.consumed().len(), owing.len());
        prop_assert!(out.penalties.iter().all(|p| p.drops_applied == 1));
        prop_assert_eq!(out.clean.len() + out.penalties.len(), field.ranked.len());
        prop_assert!(out.clean.windows(2).all(|w| w[0].rank < w[1].rank));

        // a second event in the same generation penalises nobody
        let again = penalties::apply(&field.ranked, &mut ledger, "r", "t", "f");
        prop_assert!(again.penalties.is_empty());
    }
}
