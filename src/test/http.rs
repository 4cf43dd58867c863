//! Request-level tests for the roster pages.

use std::sync::Arc;

use axum::{
    http::{
        HeaderValue, StatusCode,
        header::{COOKIE, LOCATION, SET_COOKIE},
    },
    response::IntoResponse,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_test::TestServer;
use diesel::{
    SqliteConnection,
    prelude::*,
    r2d2::{ConnectionManager, PooledConnection},
};
use diesel_migrations::MigrationHarness;

use crate::{
    MIGRATIONS,
    auth::set_login_cookie,
    config::create_app,
    rosters::{config::RosterConfig, tickets},
    schema::roster_judges,
    state::{AppState, DbPool, make_pool},
    test::fixtures::TestDb,
    tournaments::events::EventKind,
};

struct Harness {
    server: TestServer,
    key: Key,
    pool: DbPool,
}

impl Harness {
    fn new() -> Self {
        let pool = make_pool(":memory:").unwrap();
        pool.get().unwrap().run_pending_migrations(MIGRATIONS).unwrap();
        let key = Key::generate();
        let app = create_app(AppState {
            pool: pool.clone(),
            key: key.clone(),
            roster_config: Arc::new(RosterConfig {
                seed: Some(1),
                ..RosterConfig::default()
            }),
        });
        Self {
            server: TestServer::new(app).unwrap(),
            key,
            pool,
        }
    }

    /// Holds the only pooled connection; drop it before sending requests.
    fn seed(
        &self,
    ) -> TestDb<PooledConnection<ConnectionManager<SqliteConnection>>> {
        TestDb::with_conn(self.pool.get().unwrap())
    }

    fn login(&self, user_id: &str) -> HeaderValue {
        let jar = set_login_cookie(
            user_id.to_string(),
            PrivateCookieJar::new(self.key.clone()),
        );
        let response = (jar, ()).into_response();
        let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        let pair = set_cookie.split(';').next().unwrap();
        HeaderValue::from_str(pair).unwrap()
    }
}

struct Seeded {
    tournament: String,
    event: String,
    admin: String,
    member: String,
}

/// An LD event with one accepted judge (two seats). The best-ranked
/// competitor owes a drop.
fn seed_tournament(h: &Harness) -> Seeded {
    let mut db = h.seed();
    let tournament = db.tournament("City Championship");
    let ld = db.event("Lincoln-Douglas", EventKind::LincolnDouglas);
    let (_, _child) = db.judging_family(&tournament, &ld, 0);
    let dropper = db.user("Dropper", 100, 1);
    db.signup(&tournament, &ld, &dropper);
    let member = db.user("Member", 50, 0);
    db.signup(&tournament, &ld, &member);
    let admin = db.admin("Admin");
    Seeded {
        tournament,
        event: ld,
        admin,
        member,
    }
}

async fn generate(h: &Harness, seeded: &Seeded) -> String {
    let response = h
        .server
        .post(&format!("/tournaments/{}/rosters/generate", seeded.tournament))
        .add_header(COOKIE, h.login(&seeded.admin))
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    response
        .header(LOCATION)
        .to_str()
        .unwrap()
        .trim_start_matches("/rosters/")
        .to_string()
}

#[tokio::test]
async fn management_requires_an_administrator() {
    let h = Harness::new();
    let seeded = seed_tournament(&h);
    let manage = format!("/tournaments/{}/rosters", seeded.tournament);

    let anonymous = h.server.get(&manage).await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);

    let member = h
        .server
        .get(&manage)
        .add_header(COOKIE, h.login(&seeded.member))
        .await;
    assert_eq!(member.status_code(), StatusCode::FORBIDDEN);

    let generate = h
        .server
        .post(&format!("{manage}/generate"))
        .add_header(COOKIE, h.login(&seeded.member))
        .await;
    assert_eq!(generate.status_code(), StatusCode::FORBIDDEN);

    let admin = h
        .server
        .get(&manage)
        .add_header(COOKIE, h.login(&seeded.admin))
        .await;
    assert_eq!(admin.status_code(), StatusCode::OK);
    assert!(admin.text().contains("Generate roster"));
    // navbar shows who is signed in
    assert!(admin.text().contains("Admin Test"));
}

#[tokio::test]
async fn unpublished_roster_is_hidden_from_the_public() {
    let h = Harness::new();
    let seeded = seed_tournament(&h);
    let roster = generate(&h, &seeded).await;
    let page = format!("/rosters/{roster}");

    assert_eq!(h.server.get(&page).await.status_code(), StatusCode::NOT_FOUND);

    let admin = h
        .server
        .get(&page)
        .add_header(COOKIE, h.login(&seeded.admin))
        .await;
    assert_eq!(admin.status_code(), StatusCode::OK);
    assert!(admin.text().contains("has not been published"));
    assert!(admin.text().contains("Dropper Test"));
}

#[tokio::test]
async fn published_roster_shows_placeholder_for_penalties() {
    let h = Harness::new();
    let seeded = seed_tournament(&h);
    let roster = generate(&h, &seeded).await;

    let publish = h
        .server
        .post(&format!("/rosters/{roster}/publish"))
        .add_header(COOKIE, h.login(&seeded.admin))
        .await;
    assert_eq!(publish.status_code(), StatusCode::SEE_OTHER);

    let public = h.server.get(&format!("/rosters/{roster}")).await;
    assert_eq!(public.status_code(), StatusCode::OK);
    let text = public.text();
    assert!(text.contains("+1"));
    assert!(!text.contains("Dropper Test"));
    assert!(text.contains("Member Test"));

    let mine = h
        .server
        .get("/user/rosters")
        .add_header(COOKIE, h.login(&seeded.member))
        .await;
    assert!(mine.text().contains("City Championship Roster"));
}

#[tokio::test]
async fn held_ticket_answers_conflict_until_forced() {
    let h = Harness::new();
    let seeded = seed_tournament(&h);
    {
        let mut conn = h.pool.get().unwrap();
        tickets::acquire(&seeded.tournament, false, &mut *conn).unwrap();
    }
    let path = format!("/tournaments/{}/rosters/generate", seeded.tournament);

    let blocked = h
        .server
        .post(&path)
        .add_header(COOKIE, h.login(&seeded.admin))
        .await;
    assert_eq!(blocked.status_code(), StatusCode::CONFLICT);
    assert!(blocked.text().contains("Override and generate new roster"));

    let forced = h
        .server
        .post(&format!("{path}?force=true"))
        .add_header(COOKIE, h.login(&seeded.admin))
        .await;
    assert_eq!(forced.status_code(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn rename_rejects_blank_names() {
    let h = Harness::new();
    let seeded = seed_tournament(&h);
    let roster = generate(&h, &seeded).await;
    let path = format!("/rosters/{roster}/rename");

    let blank = h
        .server
        .post(&path)
        .add_header(COOKIE, h.login(&seeded.admin))
        .form(&[("name", "  ")])
        .await;
    assert_eq!(blank.status_code(), StatusCode::BAD_REQUEST);
    assert!(blank.text().contains("name must not be empty"));

    let ok = h
        .server
        .post(&path)
        .add_header(COOKIE, h.login(&seeded.admin))
        .form(&[("name", "Finals squad")])
        .await;
    assert_eq!(ok.status_code(), StatusCode::SEE_OTHER);

    let manage = h
        .server
        .get(&format!("/tournaments/{}/rosters", seeded.tournament))
        .add_header(COOKIE, h.login(&seeded.admin))
        .await;
    assert!(manage.text().contains("Finals squad"));
}

#[tokio::test]
async fn missing_roster_is_not_found() {
    let h = Harness::new();
    assert_eq!(
        h.server.get("/rosters/nope").await.status_code(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn administrators_edit_roster_judges() {
    let h = Harness::new();
    let seeded = seed_tournament(&h);
    let roster = generate(&h, &seeded).await;
    let volunteer = h.seed().user("Volunteer", 0, 0);
    let add = format!("/rosters/{roster}/judges");
    let form = [
        ("judge_id", volunteer.as_str()),
        ("child_id", seeded.member.as_str()),
        ("event_id", seeded.event.as_str()),
    ];

    let member = h
        .server
        .post(&add)
        .add_header(COOKIE, h.login(&seeded.member))
        .form(&form)
        .await;
    assert_eq!(member.status_code(), StatusCode::FORBIDDEN);

    let added = h
        .server
        .post(&add)
        .add_header(COOKIE, h.login(&seeded.admin))
        .form(&form)
        .await;
    assert_eq!(added.status_code(), StatusCode::SEE_OTHER);

    let manage = format!("/tournaments/{}/rosters", seeded.tournament);
    let page = h
        .server
        .get(&manage)
        .add_header(COOKIE, h.login(&seeded.admin))
        .await;
    assert!(page.text().contains("Volunteer Test for Member Test"));

    let again = h
        .server
        .post(&add)
        .add_header(COOKIE, h.login(&seeded.admin))
        .form(&form)
        .await;
    assert_eq!(again.status_code(), StatusCode::BAD_REQUEST);
    assert!(again.text().contains("already judges on this roster"));

    let entry = {
        let mut conn = h.pool.get().unwrap();
        roster_judges::table
            .filter(roster_judges::judge_id.eq(&volunteer))
            .select(roster_judges::id)
            .first::<String>(&mut *conn)
            .unwrap()
    };
    let removed = h
        .server
        .post(&format!("/rosters/{roster}/judges/{entry}/remove"))
        .add_header(COOKIE, h.login(&seeded.admin))
        .await;
    assert_eq!(removed.status_code(), StatusCode::SEE_OTHER);

    let page = h
        .server
        .get(&manage)
        .add_header(COOKIE, h.login(&seeded.admin))
        .await;
    assert!(!page.text().contains("Volunteer Test"));
}
