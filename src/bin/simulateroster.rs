//! Seeds a synthetic tournament and generates its roster.
//!
//! Useful for eyeballing the selection on realistic-looking data:
//!
//! ```text
//! cargo run --bin simulateroster -- --competitors 60 --seed 3
//! ```

use chrono::{Duration, NaiveDateTime, Utc};
use clap::Parser;
use diesel::{Connection, SqliteConnection, prelude::*};
use diesel_migrations::MigrationHarness;
use rand::{Rng, SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha20Rng;
use rosters::{
    MIGRATIONS,
    rosters::{
        config::RosterConfig, display::roster_for_display,
        generate::generate_roster,
    },
    schema::{events, tournament_judges, tournament_signups, tournaments, users},
    tournaments::events::EventKind,
};
use uuid::Uuid;

#[derive(Parser)]
pub struct Simulate {
    /// Defaults to an in-memory database.
    #[clap(long)]
    database_url: Option<String>,
    #[clap(long, default_value_t = 40)]
    competitors: usize,
    /// Share of competitors whose parent offers to judge.
    #[clap(long, default_value_t = 0.2)]
    judge_rate: f64,
    #[clap(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args = Simulate::parse();
    let db_url = args.database_url.as_deref().unwrap_or(":memory:");
    let mut conn = SqliteConnection::establish(db_url)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| e.to_string())?;

    let mut rng = match args.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_os_rng(),
    };
    let config = RosterConfig {
        seed: args.seed,
        ..RosterConfig::default()
    };

    let tournament_id =
        seed_tournament(&mut conn, &mut rng, args.competitors, args.judge_rate)?;
    let roster = generate_roster(&mut conn, &tournament_id, &config, false)?;
    let display = roster_for_display(&roster.id, true, &mut conn)?;

    for event in &display.events {
        println!(
            "{} ({}): {} judges, {} rows",
            event.event.name,
            event.event.kind,
            event.judges.len(),
            event.rows.len()
        );
        for row in &event.rows {
            println!("  {:>3}  {}", row.rank(), row.label());
        }
    }

    Ok(())
}

fn seed_tournament(
    conn: &mut SqliteConnection,
    rng: &mut ChaCha20Rng,
    competitors: usize,
    judge_rate: f64,
) -> QueryResult<String> {
    conn.transaction(|conn| {
        let now = Utc::now().naive_utc();
        let tournament_id = Uuid::now_v7().to_string();
        diesel::insert_into(tournaments::table)
            .values((
                tournaments::id.eq(&tournament_id),
                tournaments::name.eq("Simulated Invitational"),
                tournaments::date.eq(now + Duration::days(14)),
                tournaments::signup_deadline.eq(now + Duration::days(7)),
                tournaments::created_at.eq(now),
            ))
            .execute(conn)?;

        let kinds = [
            ("Original Oratory", EventKind::Speech, false),
            ("Lincoln-Douglas", EventKind::LincolnDouglas, false),
            ("Public Forum", EventKind::PublicForum, true),
        ];
        let mut event_ids = Vec::new();
        for (name, kind, partnered) in kinds {
            let id = Uuid::now_v7().to_string();
            diesel::insert_into(events::table)
                .values((
                    events::id.eq(&id),
                    events::name.eq(name),
                    events::kind.eq(kind.code()),
                    events::is_partner_event.eq(partnered),
                ))
                .execute(conn)?;
            event_ids.push((id, partnered));
        }

        let mut students = Vec::with_capacity(competitors);
        for i in 0..competitors {
            let id = Uuid::now_v7().to_string();
            insert_user(
                conn,
                &id,
                &format!("Student{i}"),
                rng.random_range(0..40),
                rng.random_range(0..20),
                if rng.random_bool(0.1) { 1 } else { 0 },
                now,
            )?;
            students.push(id);
        }
        students.shuffle(rng);

        // everyone enters exactly one event; PF entries come in pairs
        let per_event = students.len() / event_ids.len();
        for (n, (event_id, partnered)) in event_ids.iter().enumerate() {
            let entrants = &students[n * per_event..(n + 1) * per_event];
            for (i, competitor) in entrants.iter().enumerate() {
                let partner = if *partnered && i % 2 == 0 {
                    entrants.get(i + 1)
                } else {
                    None
                };

                let judge = if rng.random_bool(judge_rate) {
                    let parent = Uuid::now_v7().to_string();
                    insert_user(conn, &parent, &format!("Parent{i}"), 0, 0, 0, now)?;
                    Some(parent)
                } else {
                    None
                };

                let signed_up = now - Duration::minutes(rng.random_range(0..10_000));
                diesel::insert_into(tournament_signups::table)
                    .values((
                        tournament_signups::id.eq(Uuid::now_v7().to_string()),
                        tournament_signups::tournament_id.eq(&tournament_id),
                        tournament_signups::event_id.eq(event_id),
                        tournament_signups::competitor_id.eq(competitor),
                        tournament_signups::partner_id.eq(partner.cloned()),
                        tournament_signups::wants_judge.eq(judge.is_some()),
                        tournament_signups::judge_id.eq(&judge),
                        tournament_signups::confirmed.eq(true),
                        tournament_signups::created_at.eq(signed_up),
                    ))
                    .execute(conn)?;

                if let Some(parent) = &judge {
                    diesel::insert_into(tournament_judges::table)
                        .values((
                            tournament_judges::id.eq(Uuid::now_v7().to_string()),
                            tournament_judges::tournament_id.eq(&tournament_id),
                            tournament_judges::event_id.eq(event_id),
                            tournament_judges::judge_id.eq(parent),
                            tournament_judges::child_id.eq(competitor),
                            tournament_judges::accepted.eq(rng.random_bool(0.8)),
                            tournament_judges::created_at.eq(signed_up),
                        ))
                        .execute(conn)?;
                }
            }
        }

        Ok(tournament_id)
    })
}

fn insert_user(
    conn: &mut SqliteConnection,
    id: &str,
    first_name: &str,
    tournament_points: i64,
    effort_points: i64,
    drops: i64,
    now: NaiveDateTime,
) -> QueryResult<()> {
    diesel::insert_into(users::table)
        .values((
            users::id.eq(id),
            users::first_name.eq(first_name),
            users::last_name.eq("Simulated"),
            users::email.eq(None::<String>),
            users::role.eq(0),
            users::tournament_points.eq(tournament_points),
            users::effort_points.eq(effort_points),
            users::drops.eq(drops),
            users::created_at.eq(now),
        ))
        .execute(conn)?;
    Ok(())
}
