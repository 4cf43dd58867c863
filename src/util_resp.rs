use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use diesel::r2d2::PoolError;
use hypertext::{Rendered, prelude::*};
use tokio::task::JoinError;

use crate::{rosters::RosterError, template::Page, widgets::alert::ErrorAlert};

pub fn see_other_ok(to: &str) -> StandardResponse {
    Ok(SuccessResponse::SeeOther(Redirect::to(to)))
}

pub fn success(html: Rendered<String>) -> StandardResponse {
    Ok(SuccessResponse::Success(html))
}

pub fn unauthorized() -> StandardResponse {
    Err(FailureResponse::Unauthorized(()))
}

pub type StandardResponse = Result<SuccessResponse, FailureResponse>;

pub enum SuccessResponse {
    Success(Rendered<String>),
    SeeOther(Redirect),
}

#[derive(Debug)]
pub enum FailureResponse {
    BadRequest(Rendered<String>),
    NotFound(()),
    Unauthorized(()),
    Conflict(Rendered<String>),
    ServerError(()),
}

impl IntoResponse for SuccessResponse {
    fn into_response(self) -> Response {
        match self {
            SuccessResponse::Success(html) => {
                Html(html.into_inner()).into_response()
            }
            SuccessResponse::SeeOther(redirect) => redirect.into_response(),
        }
    }
}

impl IntoResponse for FailureResponse {
    fn into_response(self) -> Response {
        match self {
            FailureResponse::BadRequest(html) => {
                (StatusCode::BAD_REQUEST, Html(html.into_inner())).into_response()
            }
            FailureResponse::NotFound(()) => StatusCode::NOT_FOUND.into_response(),
            FailureResponse::Unauthorized(()) => {
                StatusCode::FORBIDDEN.into_response()
            }
            FailureResponse::Conflict(html) => {
                (StatusCode::CONFLICT, Html(html.into_inner())).into_response()
            }
            FailureResponse::ServerError(()) => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

fn message_page(msg: String) -> Rendered<String> {
    Page::new()
        .body(maud! {
            div class="container py-4" {
                ErrorAlert msg=(&msg);
            }
        })
        .render()
}

impl From<RosterError> for FailureResponse {
    fn from(e: RosterError) -> Self {
        match e {
            RosterError::TournamentNotFound(_)
            | RosterError::RosterNotFound(_)
            | RosterError::NotPublished(_) => FailureResponse::NotFound(()),
            RosterError::ConcurrentRegeneration(_)
            | RosterError::TicketExpired(_) => {
                FailureResponse::Conflict(message_page(e.to_string()))
            }
            RosterError::InvalidName(_) | RosterError::InvalidJudge(_) => {
                FailureResponse::BadRequest(message_page(e.to_string()))
            }
            RosterError::DataUnavailable(_) | RosterError::MissingRecord { .. } => {
                tracing::error!("roster request failed: {e}");
                FailureResponse::ServerError(())
            }
        }
    }
}

impl From<diesel::result::Error> for FailureResponse {
    fn from(e: diesel::result::Error) -> Self {
        RosterError::from(e).into()
    }
}

impl From<PoolError> for FailureResponse {
    fn from(e: PoolError) -> Self {
        tracing::error!("could not get a database connection: {e}");
        FailureResponse::ServerError(())
    }
}

impl From<JoinError> for FailureResponse {
    fn from(e: JoinError) -> Self {
        tracing::error!("blocking task failed: {e}");
        FailureResponse::ServerError(())
    }
}
