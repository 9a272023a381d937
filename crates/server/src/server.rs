use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use std::sync::Arc;

use crate::{ServerError, account, reports, tracker};
use engine::{Engine, User};

/// Cookie carrying the session token.
pub(crate) const SESSION_COOKIE: &str = "sessionid";
pub(crate) const LOGIN_PATH: &str = "/login";
pub(crate) const HOME_PATH: &str = "/";

/// Runtime knobs of the HTTP layer.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    /// Zone used to decide what "today" is.
    pub timezone: Tz,
    /// Lifetime of a login session.
    pub session_ttl: Duration,
    /// Marks the session cookie `Secure`.
    pub secure_cookies: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            session_ttl: Duration::days(14),
            secure_cookies: false,
        }
    }
}

impl ServerOptions {
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub options: Arc<ServerOptions>,
}

pub(crate) fn session_cookie(options: &ServerOptions, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(options.secure_cookies)
        .max_age(time::Duration::seconds(options.session_ttl.num_seconds()))
        .build()
}

pub(crate) fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Resolves the session cookie to a [`User`] stored in the request
/// extensions. Anonymous requests are sent to the login page.
async fn require_session(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
        return Redirect::to(LOGIN_PATH).into_response();
    };

    let user: Option<User> = match state.engine.session_user(&token, Utc::now()).await {
        Ok(user) => user,
        Err(err) => return ServerError::from(err).into_response(),
    };

    let Some(user) = user else {
        tracing::debug!("stale session cookie, redirecting to login");
        return (jar.remove(expired_session_cookie()), Redirect::to(LOGIN_PATH)).into_response();
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}

/// Builds the full application router.
pub fn router(engine: Engine, options: ServerOptions) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
        options: Arc::new(options),
    };

    let protected = Router::new()
        .route(HOME_PATH, get(tracker::dashboard).post(tracker::create))
        .route("/edit/{id}", get(tracker::edit_form).post(tracker::update))
        .route("/delete/{id}", post(tracker::delete))
        .route("/reports", get(reports::report))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/signup", get(account::signup_page).post(account::signup))
        .route(LOGIN_PATH, get(account::login_page).post(account::login))
        .route("/logout", get(account::logout).post(account::logout))
        .merge(protected)
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    options: ServerOptions,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(engine, options)).await
}
