//! Templating code.
//!
//! This defines the [`Page`] item, which every HTML response is wrapped in.

use hypertext::prelude::*;

use crate::{auth::User, tournaments::Tournament};

pub struct Page<R: Renderable> {
    body: Option<R>,
    user: Option<User>,
    tournament: Option<Tournament>,
}

impl<R: Renderable> Page<R> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn tournament(mut self, tournament: Tournament) -> Self {
        self.tournament = Some(tournament);
        self
    }

    pub fn body(mut self, body: R) -> Self {
        self.body = Some(body);
        self
    }

    pub fn user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn user_opt(mut self, user: Option<User>) -> Self {
        self.user = user;
        self
    }
}

impl<R: Renderable> Renderable for Page<R> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let is_admin = self.user.as_ref().is_some_and(User::is_admin);

        maud! {
            html {
                head {
                    title {
                        @if let Some(tournament) = &self.tournament {
                            (tournament.name) " | Rosters"
                        } @else {
                            "Rosters"
                        }
                    }
                    link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css" rel="stylesheet";
                    meta
                        name="viewport"
                        content="width=device-width, initial-scale=1";
                }
                body class="d-flex flex-column vh-100" {
                    nav class="navbar navbar-expand"
                        style="background-color: #452859; display: flex; justify-content: space-between; align-items: center;"
                        data-bs-theme="dark" {
                        div class="container-fluid" style="display: flex; justify-content: space-between; align-items: center;" {
                            @if let Some(tournament) = &self.tournament {
                                @if is_admin {
                                    a class="navbar-brand text-white"
                                      href=(format!("/tournaments/{}/rosters", tournament.id)) {
                                        (tournament.name)
                                    }
                                } @else {
                                    span class="navbar-brand text-white" {
                                        (tournament.name)
                                    }
                                }
                            } @else {
                                a class="navbar-brand text-white" href="/" {
                                    "Home"
                                }
                            }
                            div {
                                ul class="navbar-nav" style="display: flex; gap: 1rem;" data-bs-theme="dark" {
                                    @if let Some(user) = &self.user {
                                        li class="nav-item" {
                                            a class="nav-link text-white" href="/user/rosters" {
                                                (user.full_name())
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                    div class="flex-grow-1" {
                        @if let Some(body) = &self.body {
                            (body)
                        }
                    }
                }
            }
        }.render_to(buffer)
    }
}

impl<R: Renderable> Default for Page<R> {
    fn default() -> Self {
        Self {
            body: Default::default(),
            user: Default::default(),
            tournament: Default::default(),
        }
    }
}
