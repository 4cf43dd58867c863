use axum::extract::{Path, State};
use hypertext::prelude::*;
use tokio::task::spawn_blocking;

use crate::{
    auth::User,
    rosters::{
        display::{DisplayRoster, DisplayRow, roster_for_display},
        publish::rosters_of_user,
    },
    state::DbPool,
    template::Page,
    util_resp::{StandardResponse, success},
    widgets::non_public::NonPublic,
};

struct RosterTables<'r> {
    roster: &'r DisplayRoster,
}

impl Renderable for RosterTables<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            @for event in &self.roster.events {
                h3 class="mt-4" {
                    (event.event.name) " "
                    small class="text-muted" { (event.event.kind.to_string()) }
                }
                @if !event.judges.is_empty() {
                    p class="text-muted" {
                        "Judges: "
                        @for (i, judge) in event.judges.iter().enumerate() {
                            @if i > 0 { ", " }
                            (judge.judge.name) " (for " (judge.child.name) ")"
                        }
                    }
                }
                table class="table table-sm" {
                    thead {
                        tr {
                            th { "Rank" }
                            th { "Competitor" }
                            th { "Partner" }
                            th { "Judge" }
                        }
                    }
                    tbody {
                        @for row in &event.rows {
                            @match row {
                                DisplayRow::Competitor { rank, competitor, judge, partner, drawn } => {
                                    tr {
                                        td { (rank.to_string()) }
                                        td {
                                            (competitor.name)
                                            @if *drawn {
                                                " "
                                                span class="badge text-bg-secondary" { "drawn" }
                                            }
                                        }
                                        td {
                                            @if let Some(partner) = partner {
                                                (partner.name)
                                            }
                                        }
                                        td {
                                            @if let Some(judge) = judge {
                                                (judge.name)
                                            }
                                        }
                                    }
                                }
                                DisplayRow::Penalty { rank, .. } => {
                                    tr class="table-warning" {
                                        td { (rank.to_string()) }
                                        td { (row.label()) }
                                        td {}
                                        td {}
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        .render_to(buffer);
    }
}

pub async fn view_roster_page(
    Path(roster_id): Path<String>,
    user: Option<User>,
    State(pool): State<DbPool>,
) -> StandardResponse {
    spawn_blocking(move || -> StandardResponse {
        let mut conn = pool.get()?;
        let is_admin = user.as_ref().is_some_and(User::is_admin);
        let roster = roster_for_display(&roster_id, is_admin, &mut *conn)?;

        success(
            Page::new()
                .user_opt(user)
                .tournament(roster.tournament.clone())
                .body(maud! {
                    div class="container py-4" {
                        h1 { (roster.roster.name) }
                        @if roster.roster.published {
                            RosterTables roster=(&roster);
                        } @else {
                            NonPublic
                                title="Unpublished roster"
                                child=(RosterTables { roster: &roster });
                        }
                    }
                })
                .render(),
        )
    })
    .await?
}

pub async fn my_rosters_page(
    user: User,
    State(pool): State<DbPool>,
) -> StandardResponse {
    spawn_blocking(move || -> StandardResponse {
        let mut conn = pool.get()?;
        let rosters = rosters_of_user(&user.id, &mut *conn)?;

        success(
            Page::new()
                .user(user)
                .body(maud! {
                    div class="container py-4" {
                        h1 { "My rosters" }
                        @if rosters.is_empty() {
                            p class="text-muted" { "You are not on any published roster yet." }
                        } @else {
                            ul class="list-group" {
                                @for roster in &rosters {
                                    li class="list-group-item" {
                                        a href=(format!("/rosters/{}", roster.id)) { (roster.name) }
                                    }
                                }
                            }
                        }
                    }
                })
                .render(),
        )
    })
    .await?
}
