//! Administrator pages: generating, previewing, publishing, renaming and
//! deleting a tournament's roster, and editing its judges.

use std::{collections::HashMap, sync::Arc};

use axum::extract::{Form, Path, Query, State};
use hypertext::prelude::*;
use itertools::Itertools;
use serde::Deserialize;
use tokio::task::spawn_blocking;

use crate::{
    auth::User,
    rosters::{
        Roster, RosterError,
        build::{EventPlan, RosterDraft},
        config::RosterConfig,
        display::{DisplayRoster, load_names, roster_for_display},
        generate::{generate_roster, preview_roster},
        publish::{
            delete_roster, publish_roster, rename_roster, unpublish_roster,
        },
        staffing::{add_roster_judge, remove_roster_judge},
    },
    state::DbPool,
    template::Page,
    tournaments::{Tournament, events::Event, signups::Signup},
    util_resp::{
        FailureResponse, StandardResponse, see_other_ok, success, unauthorized,
    },
    widgets::{
        actions::{Action, Actions},
        alert::WarningAlert,
    },
};

pub async fn manage_rosters_page(
    Path(tournament_id): Path<String>,
    user: User,
    State(pool): State<DbPool>,
) -> StandardResponse {
    if !user.is_admin() {
        return unauthorized();
    }

    spawn_blocking(move || -> StandardResponse {
        let mut conn = pool.get()?;
        let tournament = Tournament::fetch(&tournament_id, &mut *conn)?;
        let roster = Roster::of_tournament(&tournament.id, &mut *conn)?;
        let staffing = match &roster {
            Some(roster) => {
                Some(roster_for_display(&roster.id, true, &mut *conn)?)
            }
            None => None,
        };
        let event_ids =
            Signup::confirmed_for_tournament(&tournament.id, &mut *conn)?
                .into_iter()
                .map(|signup| signup.event_id)
                .unique()
                .collect::<Vec<_>>();
        let events = Event::load_many(&event_ids, &mut *conn)?;

        let preview = format!("/tournaments/{}/rosters/preview", tournament.id);
        let generate = format!("/tournaments/{}/rosters/generate", tournament.id);

        success(
            Page::new()
                .user(user)
                .tournament(tournament.clone())
                .body(maud! {
                    div class="container py-4" {
                        h1 { (tournament.name) " roster" }
                        @if let Some(roster) = &roster {
                            @let view = format!("/rosters/{}", roster.id);
                            @let publish = format!("/rosters/{}/publish", roster.id);
                            @let unpublish = format!("/rosters/{}/unpublish", roster.id);
                            @let delete = format!("/rosters/{}/delete", roster.id);
                            @let options = [
                                Action::Link { href: &view, label: "View roster" },
                                Action::Link { href: &preview, label: "Preview regeneration" },
                                if roster.published {
                                    Action::Post { action: &unpublish, label: "Unpublish", class: "btn-outline-secondary" }
                                } else {
                                    Action::Post { action: &publish, label: "Publish", class: "btn-success" }
                                },
                                Action::Post { action: &delete, label: "Delete", class: "btn-outline-danger" },
                            ];
                            div class="card mb-4" {
                                div class="card-body" {
                                    h5 class="card-title" { (roster.name) }
                                    p class="card-text text-muted" {
                                        @if let Some(at) = roster.published_at {
                                            "Published " (at.format("%Y-%m-%d %H:%M").to_string())
                                        } @else {
                                            "Not published"
                                        }
                                    }
                                    Actions options=(&options);
                                    form method="post" action=(format!("/rosters/{}/rename", roster.id)) {
                                        div class="input-group" {
                                            input type="text" class="form-control" name="name" value=(roster.name) maxlength="128";
                                            button type="submit" class="btn btn-outline-primary" { "Rename" }
                                        }
                                    }
                                }
                            }
                            @if let Some(display) = &staffing {
                                JudgeEditor display=(display) events=(&events);
                            }
                            WarningAlert
                                msg = "Generating again replaces this roster, unpublishes it and
                                 consumes any outstanding drop penalties.";
                            @let options = [
                                Action::Post { action: &generate, label: "Regenerate roster", class: "btn-danger" },
                            ];
                            Actions options=(&options);
                        } @else {
                            @let options = [
                                Action::Link { href: &preview, label: "Preview roster" },
                                Action::Post { action: &generate, label: "Generate roster", class: "btn-primary" },
                            ];
                            Actions options=(&options);
                        }
                    }
                })
                .render(),
        )
    })
    .await?
}

/// Judges per event with a remove button each, and a form to add one.
struct JudgeEditor<'r> {
    display: &'r DisplayRoster,
    events: &'r [Event],
}

impl Renderable for JudgeEditor<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let roster_id = &self.display.roster.id;
        maud! {
            div class="card mb-4" {
                div class="card-body" {
                    h5 class="card-title" { "Judges" }
                    @for event in &self.display.events {
                        @if !event.judges.is_empty() {
                            h6 class="mt-3" { (event.event.name) }
                            ul class="list-group mb-2" {
                                @for judge in &event.judges {
                                    li class="list-group-item d-flex justify-content-between align-items-center" {
                                        span {
                                            (judge.judge.name) " for " (judge.child.name)
                                            " (" (judge.capacity.to_string()) " seats)"
                                        }
                                        form method="post" action=(format!("/rosters/{roster_id}/judges/{}/remove", judge.id)) {
                                            button type="submit" class="btn btn-sm btn-outline-danger" { "Remove" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                    form method="post" action=(format!("/rosters/{roster_id}/judges")) class="row g-2 mt-2" {
                        div class="col-md" {
                            input type="text" class="form-control" name="judge_id" placeholder="Judge user id" required;
                        }
                        div class="col-md" {
                            input type="text" class="form-control" name="child_id" placeholder="Child user id" required;
                        }
                        div class="col-md" {
                            select class="form-select" name="event_id" {
                                @for event in self.events {
                                    option value=(event.id) { (event.name) }
                                }
                            }
                        }
                        div class="col-md-auto" {
                            button type="submit" class="btn btn-outline-primary" { "Add judge" }
                        }
                    }
                }
            }
        }
        .render_to(buffer);
    }
}

struct DraftEvent<'r> {
    plan: &'r EventPlan,
    names: &'r HashMap<String, String>,
}

impl DraftEvent<'_> {
    fn name<'a>(&'a self, id: &'a str) -> &'a str {
        self.names.get(id).map(String::as_str).unwrap_or(id)
    }
}

impl Renderable for DraftEvent<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let plan = self.plan;
        maud! {
            h3 class="mt-4" {
                (plan.event.name) " "
                small class="text-muted" {
                    (plan.event.kind.to_string()) ", "
                    (plan.seats.len().to_string()) " of " (plan.capacity().to_string()) " seats"
                }
            }
            table class="table table-sm" {
                thead {
                    tr {
                        th { "#" }
                        th { "Rank" }
                        th { "Competitor" }
                        th { "Partner" }
                        th { "Judge" }
                        th {}
                    }
                }
                tbody {
                    @for seat in &plan.seats {
                        tr {
                            td { ((seat.seq + 1).to_string()) }
                            td { (seat.rank.to_string()) }
                            td { (self.name(&seat.competitor_id)) }
                            td {
                                @if let Some(partner) = &seat.partner_id {
                                    (self.name(partner))
                                }
                            }
                            td {
                                @if let Some(judge) = &seat.judge_id {
                                    (self.name(judge))
                                }
                            }
                            td {
                                @if seat.guaranteed {
                                    span class="badge text-bg-info" { "judge's child" }
                                }
                                @if seat.drawn {
                                    span class="badge text-bg-secondary" { "drawn" }
                                }
                            }
                        }
                    }
                }
            }
            @if !plan.penalties.is_empty() {
                p class="text-muted" {
                    "Drop penalties: "
                    @for (i, penalty) in plan.penalties.iter().enumerate() {
                        @if i > 0 { ", " }
                        (self.name(&penalty.penalized_competitor_id))
                        " (rank " (penalty.original_rank.to_string()) ")"
                    }
                }
            }
        }
        .render_to(buffer);
    }
}

fn draft_people(draft: &RosterDraft) -> Vec<String> {
    draft
        .events
        .iter()
        .flat_map(|plan| {
            plan.seats
                .iter()
                .flat_map(|seat| {
                    std::iter::once(&seat.competitor_id).chain(&seat.judge_id)
                })
                .chain(plan.penalties.iter().map(|p| &p.penalized_competitor_id))
        })
        .cloned()
        .unique()
        .collect()
}

pub async fn preview_roster_page(
    Path(tournament_id): Path<String>,
    user: User,
    State(pool): State<DbPool>,
    State(config): State<Arc<RosterConfig>>,
) -> StandardResponse {
    if !user.is_admin() {
        return unauthorized();
    }

    spawn_blocking(move || -> StandardResponse {
        let mut conn = pool.get()?;
        let tournament = Tournament::fetch(&tournament_id, &mut *conn)?;
        let draft = preview_roster(&mut *conn, &tournament.id, &config)?;
        let names = load_names(&draft_people(&draft), &mut *conn)?;

        success(
            Page::new()
                .user(user)
                .tournament(tournament.clone())
                .body(maud! {
                    div class="container py-4" {
                        h1 { "Preview: " (draft.name) }
                        p class="text-muted" {
                            "Nothing has been saved. Speech draws will differ when the roster is generated."
                        }
                        @for plan in &draft.events {
                            DraftEvent plan=(plan) names=(&names);
                        }
                        form method="post" action=(format!("/tournaments/{}/rosters/generate", tournament.id)) {
                            button type="submit" class="btn btn-primary" { "Generate roster" }
                        }
                    }
                })
                .render(),
        )
    })
    .await?
}

#[derive(Deserialize)]
pub struct GenerateQuery {
    force: Option<bool>,
}

pub async fn do_generate_roster(
    Path(tournament_id): Path<String>,
    Query(query): Query<GenerateQuery>,
    user: User,
    State(pool): State<DbPool>,
    State(config): State<Arc<RosterConfig>>,
) -> StandardResponse {
    if !user.is_admin() {
        return unauthorized();
    }
    let force = query.force.unwrap_or(false);

    spawn_blocking(move || -> StandardResponse {
        let mut conn = pool.get()?;

        match generate_roster(&mut *conn, &tournament_id, &config, force) {
            Ok(roster) => see_other_ok(&format!("/rosters/{}", roster.id)),
            Err(RosterError::ConcurrentRegeneration(_)) => {
                Err(FailureResponse::Conflict(
                    Page::new()
                        .user(user)
                        .body(maud! {
                            div class="container py-4" {
                                p {
                                    "Roster generation is already in progress for this tournament."
                                }
                                form method="post" action=(format!("/tournaments/{}/rosters/generate?force=true", tournament_id)) {
                                    button type="submit" class="btn btn-danger" {
                                        "Override and generate new roster"
                                    }
                                }
                            }
                        })
                        .render(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    })
    .await?
}

pub async fn do_publish_roster(
    Path(roster_id): Path<String>,
    user: User,
    State(pool): State<DbPool>,
) -> StandardResponse {
    if !user.is_admin() {
        return unauthorized();
    }

    spawn_blocking(move || -> StandardResponse {
        let mut conn = pool.get()?;
        let roster = publish_roster(&roster_id, &mut *conn)?;
        see_other_ok(&format!("/rosters/{}", roster.id))
    })
    .await?
}

pub async fn do_unpublish_roster(
    Path(roster_id): Path<String>,
    user: User,
    State(pool): State<DbPool>,
) -> StandardResponse {
    if !user.is_admin() {
        return unauthorized();
    }

    spawn_blocking(move || -> StandardResponse {
        let mut conn = pool.get()?;
        let roster = unpublish_roster(&roster_id, &mut *conn)?;
        see_other_ok(&format!("/rosters/{}", roster.id))
    })
    .await?
}

#[derive(Deserialize)]
pub struct RenameForm {
    name: String,
}

pub async fn do_rename_roster(
    Path(roster_id): Path<String>,
    user: User,
    State(pool): State<DbPool>,
    Form(form): Form<RenameForm>,
) -> StandardResponse {
    if !user.is_admin() {
        return unauthorized();
    }

    spawn_blocking(move || -> StandardResponse {
        let mut conn = pool.get()?;
        let roster = rename_roster(&roster_id, &form.name, &mut *conn)?;
        see_other_ok(&format!("/tournaments/{}/rosters", roster.tournament_id))
    })
    .await?
}

pub async fn do_delete_roster(
    Path(roster_id): Path<String>,
    user: User,
    State(pool): State<DbPool>,
) -> StandardResponse {
    if !user.is_admin() {
        return unauthorized();
    }

    spawn_blocking(move || -> StandardResponse {
        let mut conn = pool.get()?;
        let roster = delete_roster(&roster_id, &mut *conn)?;
        see_other_ok(&format!("/tournaments/{}/rosters", roster.tournament_id))
    })
    .await?
}

#[derive(Deserialize)]
pub struct AddJudgeForm {
    judge_id: String,
    child_id: String,
    event_id: String,
}

pub async fn do_add_roster_judge(
    Path(roster_id): Path<String>,
    user: User,
    State(pool): State<DbPool>,
    State(config): State<Arc<RosterConfig>>,
    Form(form): Form<AddJudgeForm>,
) -> StandardResponse {
    if !user.is_admin() {
        return unauthorized();
    }

    spawn_blocking(move || -> StandardResponse {
        let mut conn = pool.get()?;
        let roster = add_roster_judge(
            &roster_id,
            form.judge_id.trim(),
            form.child_id.trim(),
            &form.event_id,
            &config.weights,
            &mut *conn,
        )?;
        see_other_ok(&format!("/tournaments/{}/rosters", roster.tournament_id))
    })
    .await?
}

pub async fn do_remove_roster_judge(
    Path((roster_id, roster_judge_id)): Path<(String, String)>,
    user: User,
    State(pool): State<DbPool>,
    State(config): State<Arc<RosterConfig>>,
) -> StandardResponse {
    if !user.is_admin() {
        return unauthorized();
    }

    spawn_blocking(move || -> StandardResponse {
        let mut conn = pool.get()?;
        let roster = remove_roster_judge(
            &roster_id,
            &roster_judge_id,
            &config.weights,
            &mut *conn,
        )?;
        see_other_ok(&format!("/tournaments/{}/rosters", roster.tournament_id))
    })
    .await?
}
