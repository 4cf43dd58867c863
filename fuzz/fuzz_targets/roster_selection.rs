//! Feeds arbitrary rankings, partnerships and guarantees to the competitor
//! selector and checks that what comes out is a valid seating.

#![no_main]

use std::collections::HashSet;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rosters::{
    rosters::{
        RankedCompetitor,
        select::{SpeechDraw, select},
    },
    tournaments::signups::PartnerMap,
};
use rust_decimal::Decimal;

#[derive(Debug, Arbitrary)]
struct Input {
    competitors: u8,
    capacity: u8,
    partners: Vec<(u8, u8)>,
    guaranteed: Vec<u8>,
    draw_every: Option<u8>,
    seed: u64,
}

fuzz_target!(|input: Input| {
    let n = (input.competitors % 48) as usize;
    let id = |i: u8| format!("c{}", i as usize % n.max(1));

    let ranked: Vec<RankedCompetitor> = (0..n)
        .map(|i| RankedCompetitor {
            competitor_id: format!("c{i}"),
            event_id: "e".to_string(),
            score: Decimal::from((n - i) as i64),
            drop_penalty_count: 0,
            rank: i + 1,
        })
        .collect();

    let mut partners = PartnerMap::default();
    for (a, b) in &input.partners {
        let (a, b) = (id(*a), id(*b));
        if n > 0 && a != b {
            partners.insert(&a, &b);
        }
    }
    let guaranteed: HashSet<String> =
        input.guaranteed.iter().map(|g| id(*g)).collect();

    let mut draw = input.draw_every.map(|every| SpeechDraw {
        rng: ChaCha20Rng::seed_from_u64(input.seed),
        every: every as usize,
    });

    let capacity = input.capacity as usize;
    let out = select(&ranked, capacity, &guaranteed, &partners, draw.as_mut());

    assert!(out.len() <= capacity);

    let seated: HashSet<&str> =
        out.iter().map(|s| s.competitor_id.as_str()).collect();
    assert_eq!(seated.len(), out.len(), "competitor seated twice");

    for competitor in &ranked {
        let Some(partner) = partners.partner_of(&competitor.competitor_id) else {
            continue;
        };
        assert_eq!(
            seated.contains(competitor.competitor_id.as_str()),
            seated.contains(partner),
            "partnership split"
        );
    }

    if capacity >= n {
        assert_eq!(out.len(), n, "free seats left while competitors wait");
    }
});
