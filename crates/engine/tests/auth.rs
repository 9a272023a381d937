use chrono::{Duration, Utc};
use sea_orm::Database;

use engine::{Engine, EngineError, SignupInput};
use migration::MigratorTrait;

async fn engine() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

fn signup<'a>(username: &'a str, password: &'a str) -> SignupInput<'a> {
    SignupInput {
        username,
        password1: password,
        password2: password,
    }
}

#[tokio::test]
async fn signup_then_authenticate() {
    let engine = engine().await;
    let user = engine
        .signup(signup("maria", "tahimik-ilog-42"))
        .await
        .unwrap();
    assert_eq!(user.username, "maria");

    let logged_in = engine
        .authenticate("maria", "tahimik-ilog-42")
        .await
        .unwrap();
    assert_eq!(logged_in.username, "maria");
}

#[tokio::test]
async fn duplicate_username_is_a_field_error() {
    let engine = engine().await;
    engine
        .signup(signup("maria", "tahimik-ilog-42"))
        .await
        .unwrap();

    let err = engine
        .signup(signup("maria", "another-pass-99"))
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(
        errors.get("username"),
        ["A user with that username already exists.".to_string()]
    );
}

#[tokio::test]
async fn weak_password_is_rejected() {
    let engine = engine().await;
    let err = engine.signup(signup("maria", "12345")).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(ref e) if e.contains("password2")));
    assert_eq!(
        engine.authenticate("maria", "12345").await,
        Err(EngineError::InvalidCredentials)
    );
}

#[tokio::test]
async fn wrong_credentials_are_generic() {
    let engine = engine().await;
    engine
        .signup(signup("maria", "tahimik-ilog-42"))
        .await
        .unwrap();

    assert_eq!(
        engine.authenticate("maria", "wrong-password").await,
        Err(EngineError::InvalidCredentials)
    );
    assert_eq!(
        engine.authenticate("nobody", "tahimik-ilog-42").await,
        Err(EngineError::InvalidCredentials)
    );
    assert_eq!(
        engine.authenticate("", "").await,
        Err(EngineError::InvalidCredentials)
    );
}

#[tokio::test]
async fn sessions_resolve_until_they_expire() {
    let engine = engine().await;
    engine
        .signup(signup("maria", "tahimik-ilog-42"))
        .await
        .unwrap();

    let now = Utc::now();
    let session = engine
        .open_session("maria", Duration::hours(1), now)
        .await
        .unwrap();
    assert_eq!(session.username, "maria");

    let user = engine.session_user(&session.token, now).await.unwrap();
    assert_eq!(user.map(|u| u.username).as_deref(), Some("maria"));

    let later = now + Duration::hours(2);
    assert_eq!(engine.session_user(&session.token, later).await.unwrap(), None);
    // The expired row was removed on lookup.
    assert_eq!(engine.session_user(&session.token, now).await.unwrap(), None);
}

#[tokio::test]
async fn closing_a_session_logs_out() {
    let engine = engine().await;
    engine
        .signup(signup("maria", "tahimik-ilog-42"))
        .await
        .unwrap();
    let now = Utc::now();
    let session = engine
        .open_session("maria", Duration::days(14), now)
        .await
        .unwrap();

    engine.close_session(&session.token).await.unwrap();
    assert_eq!(engine.session_user(&session.token, now).await.unwrap(), None);
    engine.close_session("unknown-token").await.unwrap();
    assert_eq!(engine.session_user("unknown-token", now).await.unwrap(), None);
}

#[tokio::test]
async fn clear_expired_sessions_keeps_live_ones() {
    let engine = engine().await;
    engine
        .signup(signup("maria", "tahimik-ilog-42"))
        .await
        .unwrap();
    let now = Utc::now();
    let stale = engine
        .open_session("maria", Duration::minutes(1), now - Duration::hours(1))
        .await
        .unwrap();
    let live = engine
        .open_session("maria", Duration::days(1), now)
        .await
        .unwrap();

    assert_eq!(engine.clear_expired_sessions(now).await.unwrap(), 1);
    assert_eq!(engine.session_user(&stale.token, now).await.unwrap(), None);
    assert!(engine.session_user(&live.token, now).await.unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_signups_for_one_name_yield_a_field_error() {
    let engine = engine().await;

    let (first, second) = tokio::join!(
        engine.signup(signup("maria", "tahimik-ilog-42")),
        engine.signup(signup("maria", "another-pass-99")),
    );

    let mut results = [first, second];
    results.sort_by_key(|result| result.is_err());
    let [winner, loser] = results;
    assert_eq!(winner.unwrap().username, "maria");

    let EngineError::Validation(errors) = loser.unwrap_err() else {
        panic!("expected validation error");
    };
    assert_eq!(
        errors.get("username"),
        ["A user with that username already exists.".to_string()]
    );

    // The stored hash belongs to whichever signup won, and verifies off the
    // async workers.
    let logins = [
        engine.authenticate("maria", "tahimik-ilog-42").await.is_ok(),
        engine.authenticate("maria", "another-pass-99").await.is_ok(),
    ];
    assert_eq!(logins.iter().filter(|ok| **ok).count(), 1);
}
