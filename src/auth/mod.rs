//! Viewer identity.
//!
//! Sessions are issued elsewhere; this module only reads the private login
//! cookie and loads the user it names.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use chrono::{Duration, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::task::spawn_blocking;

use crate::{schema::users, state::DbPool};

pub const LOGIN_COOKIE: &str = "jeremy_bearimy";

/// Users with at least this role manage rosters.
pub const ADMIN_ROLE: i64 = 2;

#[derive(Debug, Queryable, Selectable, Serialize, Deserialize, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub role: i64,
    pub tournament_points: i64,
    pub effort_points: i64,
    pub drops: i64,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role >= ADMIN_ROLE
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug)]
pub enum AuthError {
    NoDatabase,
    Unauthorized,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AuthError::NoDatabase => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            }
            AuthError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Unauthorized")
            }
        };
        (status, body).into_response()
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct LoginSession {
    id: String,
    expiry: NaiveDateTime,
}

#[async_trait]
impl<S> FromRequestParts<S> for User
where
    S: Send + Sync,
    DbPool: FromRef<S>,
    Key: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let jar: PrivateCookieJar<Key> =
            PrivateCookieJar::from_request_parts(parts, state)
                .await
                .map_err(|_| AuthError::Unauthorized)?;

        let login_cookie = match jar.get(LOGIN_COOKIE) {
            Some(cookie) => cookie,
            None => return Err(AuthError::Unauthorized),
        };

        let login: LoginSession =
            match serde_json::from_str::<LoginSession>(login_cookie.value()) {
                Ok(t) if Utc::now().naive_utc() < t.expiry => t,
                _ => {
                    return Err(AuthError::Unauthorized);
                }
            };

        let pool = DbPool::from_ref(state);
        let user = spawn_blocking(move || {
            let mut conn = pool.get().map_err(|_| AuthError::NoDatabase)?;
            users::table
                .filter(users::id.eq(login.id))
                .select(User::as_select())
                .first(&mut *conn)
                .optional()
                .map_err(|_| AuthError::NoDatabase)
        })
        .await
        .map_err(|_| AuthError::NoDatabase)??;

        user.ok_or(AuthError::Unauthorized)
    }
}

/// Adds a week-long login session for `id` to the jar.
pub fn set_login_cookie(id: String, jar: PrivateCookieJar) -> PrivateCookieJar {
    let session = LoginSession {
        id,
        expiry: Utc::now().naive_utc() + Duration::days(7),
    };
    match serde_json::to_string(&session) {
        Ok(value) => jar.add(Cookie::new(LOGIN_COOKIE, value)),
        Err(e) => {
            tracing::error!("could not encode login session: {e}");
            jar
        }
    }
}
