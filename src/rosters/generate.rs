use std::collections::HashMap;

use diesel::{SqliteConnection, connection::LoadConnection, prelude::*, sqlite::Sqlite};
use itertools::Itertools;
use rand_chacha::ChaCha20Rng;
use uuid::Uuid;

use crate::{
    rosters::{
        Roster, RosterError,
        availability::JudgeResolver,
        build::{RosterDraft, plan_event},
        config::RosterConfig,
        penalties::{self, DropLedger},
        ranking::{rank_event, signups_by_event},
        select::{SpeechDraw, select},
        tickets,
    },
    tournaments::{
        Tournament,
        events::{Event, EventKind},
        judges::JudgeRequest,
        scores::Standing,
        signups::{PartnerMap, Signup},
    },
};

/// Everything generation reads from the store, fetched up front so that
/// planning never touches the database.
#[derive(Debug, Clone)]
pub struct RosterInput {
    pub tournament: Tournament,
    /// Events with at least one confirmed signup, in event order.
    pub events: Vec<Event>,
    pub signups: Vec<Signup>,
    pub standings: HashMap<String, Standing>,
    pub judge_requests: Vec<JudgeRequest>,
    pub existing: Option<Roster>,
}

impl RosterInput {
    #[tracing::instrument(skip(tournament, conn), fields(tournament = %tournament.id))]
    pub fn fetch(
        tournament: Tournament,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Self, RosterError> {
        let signups = Signup::confirmed_for_tournament(&tournament.id, conn)?;

        let event_ids = signups
            .iter()
            .map(|signup| signup.event_id.clone())
            .unique()
            .collect::<Vec<_>>();
        let events = Event::load_many(&event_ids, conn)?;

        let competitor_ids = signups
            .iter()
            .map(|signup| signup.competitor_id.clone())
            .unique()
            .collect::<Vec<_>>();
        let standings = Standing::load_many(&competitor_ids, conn)?;

        let judge_requests = JudgeRequest::for_tournament(&tournament.id, conn)?;
        let existing = Roster::of_tournament(&tournament.id, conn)?;

        Ok(Self {
            tournament,
            events,
            signups,
            standings,
            judge_requests,
            existing,
        })
    }
}

/// Computes a roster from `input` without touching the store. Drop
/// penalties are taken from the fetched counters; the draft lists which
/// ones it consumed.
pub fn plan_roster(
    input: &RosterInput,
    roster_id: &str,
    config: &RosterConfig,
    rng: ChaCha20Rng,
) -> Result<RosterDraft, RosterError> {
    let grouped = signups_by_event(&input.signups);
    let resolver = JudgeResolver::new(&input.signups, &input.judge_requests);
    let mut ledger = DropLedger::new(
        input
            .standings
            .values()
            .map(|standing| (standing.id.clone(), standing.drops)),
    );
    let mut draw = SpeechDraw {
        rng,
        every: config.speech_draw_every,
    };

    let mut events = Vec::with_capacity(input.events.len());

    for event in &input.events {
        let Some(signups) = grouped.get(&event.id) else {
            continue;
        };

        let ranked = rank_event(signups, &input.standings, &config.weights)?;
        let filtered = penalties::apply(
            &ranked,
            &mut ledger,
            roster_id,
            &input.tournament.id,
            &event.id,
        );

        let availability = resolver.resolve(event);
        let partners = if event.is_partner_event {
            PartnerMap::from_event_signups(signups)
        } else {
            PartnerMap::default()
        };

        let selected = select(
            &filtered.clean,
            availability.capacity(),
            &availability.guaranteed,
            &partners,
            (event.kind == EventKind::Speech).then_some(&mut draw),
        );

        tracing::debug!(
            event = %event.id,
            signups = signups.len(),
            capacity = availability.capacity(),
            selected = selected.len(),
            penalised = filtered.penalties.len(),
            "planned event"
        );

        events.push(plan_event(
            event.clone(),
            availability.judges,
            selected,
            filtered.penalties,
        ));
    }

    Ok(RosterDraft {
        roster_id: roster_id.to_string(),
        tournament_id: input.tournament.id.clone(),
        name: match &input.existing {
            Some(roster) => roster.name.clone(),
            None => format!("{} Roster", input.tournament.name),
        },
        events,
        consumed_drops: ledger.consumed().to_vec(),
    })
}

/// Generates (or regenerates) the roster for a tournament and consumes the
/// drop penalties it applied.
///
/// **Important**: this blocks on the database and should run on a blocking
/// thread, not the async executor.
#[tracing::instrument(skip(conn, config))]
pub fn generate_roster(
    conn: &mut SqliteConnection,
    tournament_id: &str,
    config: &RosterConfig,
    force: bool,
) -> Result<Roster, RosterError> {
    let tournament = Tournament::fetch(tournament_id, conn)?;
    let ticket = tickets::acquire(tournament_id, force, conn)?;

    let generated = generate_with_ticket(conn, tournament, &ticket, config);

    match generated {
        Ok(roster) => {
            tracing::info!(roster = %roster.id, "roster generated");
            Ok(roster)
        }
        Err(e) => {
            if let Err(release_err) = tickets::release(&ticket, conn) {
                tracing::error!(
                    ticket = %ticket.id,
                    "failed to release roster ticket: {release_err}"
                );
            }
            Err(e)
        }
    }
}

fn generate_with_ticket(
    conn: &mut SqliteConnection,
    tournament: Tournament,
    ticket: &tickets::Ticket,
    config: &RosterConfig,
) -> Result<Roster, RosterError> {
    let input = RosterInput::fetch(tournament, conn)?;
    let roster_id = match &input.existing {
        Some(roster) => roster.id.clone(),
        None => Uuid::now_v7().to_string(),
    };

    let draft = plan_roster(&input, &roster_id, config, config.rng())?;

    conn.transaction(|conn| {
        tickets::ensure_current(ticket, conn)?;
        let roster = draft.persist(conn)?;
        tickets::release(ticket, conn)?;
        Ok(roster)
    })
}

/// Plans the roster a generation would produce right now. Nothing is
/// written and no penalty is consumed.
#[tracing::instrument(skip(conn, config))]
pub fn preview_roster(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
    tournament_id: &str,
    config: &RosterConfig,
) -> Result<RosterDraft, RosterError> {
    let tournament = Tournament::fetch(tournament_id, conn)?;
    let input = RosterInput::fetch(tournament, conn)?;
    let roster_id = match &input.existing {
        Some(roster) => roster.id.clone(),
        None => Uuid::now_v7().to_string(),
    };
    plan_roster(&input, &roster_id, config, config.rng())
}
