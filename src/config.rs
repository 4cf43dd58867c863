use axum::{
    Router,
    routing::{get, post},
};
use hypertext::prelude::*;
use tower_http::trace::TraceLayer;

use crate::{
    auth::User,
    rosters::{
        manage::{
            do_add_roster_judge, do_delete_roster, do_generate_roster,
            do_publish_roster, do_remove_roster_judge, do_rename_roster,
            do_unpublish_roster, manage_rosters_page, preview_roster_page,
        },
        public::{my_rosters_page, view_roster_page},
    },
    state::AppState,
    template::Page,
    util_resp::{StandardResponse, success},
};

pub async fn home(user: Option<User>) -> StandardResponse {
    success(
        Page::new()
            .user_opt(user)
            .body(maud! {
                div class="container py-4" {
                    h1 { "Rosters" }
                    p {
                        a href="/user/rosters" { "My rosters" }
                    }
                }
            })
            .render(),
    )
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/user/rosters", get(my_rosters_page))
        .route("/tournaments/:tournament_id/rosters", get(manage_rosters_page))
        .route(
            "/tournaments/:tournament_id/rosters/preview",
            get(preview_roster_page),
        )
        .route(
            "/tournaments/:tournament_id/rosters/generate",
            post(do_generate_roster),
        )
        .route("/rosters/:roster_id", get(view_roster_page))
        .route("/rosters/:roster_id/publish", post(do_publish_roster))
        .route("/rosters/:roster_id/unpublish", post(do_unpublish_roster))
        .route("/rosters/:roster_id/rename", post(do_rename_roster))
        .route("/rosters/:roster_id/delete", post(do_delete_roster))
        .route("/rosters/:roster_id/judges", post(do_add_roster_judge))
        .route(
            "/rosters/:roster_id/judges/:roster_judge_id/remove",
            post(do_remove_roster_judge),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
