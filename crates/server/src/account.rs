//! Signup, login and logout.

use api_types::{
    auth::{LoginForm, LoginPage, SignupForm, SignupPage},
    message::Message,
};
use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use engine::{EngineError, SignupInput};

use crate::{
    ServerError, flash,
    server::{
        HOME_PATH, LOGIN_PATH, SESSION_COOKIE, ServerState, expired_session_cookie,
        session_cookie,
    },
    views,
};

pub async fn signup_page(jar: CookieJar) -> (CookieJar, Json<SignupPage>) {
    let (jar, messages) = flash::take(jar);
    let page = SignupPage {
        messages,
        ..Default::default()
    };
    (jar, Json(page))
}

/// Creates the account and sends the user to the login page. The new account
/// is not logged in.
pub async fn signup(
    State(state): State<ServerState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, ServerError> {
    let input = SignupInput {
        username: &form.username,
        password1: &form.password1,
        password2: &form.password2,
    };
    let result = state.engine.signup(input).await;

    match result {
        Ok(user) => {
            tracing::info!(username = %user.username, "account created");
            let jar = flash::push(
                jar,
                Message::success("Account created successfully! Please log in."),
            );
            Ok((jar, Redirect::to(LOGIN_PATH)).into_response())
        }
        Err(EngineError::Validation(errors)) => {
            let (jar, mut messages) = flash::take(jar);
            messages.extend(
                errors
                    .iter()
                    .map(|(field, error)| Message::error(format!("Error in {field}: {error}"))),
            );
            let page = SignupPage {
                messages,
                username: form.username,
                errors: views::field_errors(&errors),
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, jar, Json(page)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn login_page(jar: CookieJar) -> (CookieJar, Json<LoginPage>) {
    let (jar, messages) = flash::take(jar);
    let page = LoginPage {
        messages,
        ..Default::default()
    };
    (jar, Json(page))
}

/// Opens a session on valid credentials. Any session the client already held
/// is closed first.
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, ServerError> {
    let result = state
        .engine
        .authenticate(&form.username, &form.password)
        .await;

    match result {
        Ok(user) => {
            if let Some(previous) = jar.get(SESSION_COOKIE) {
                state.engine.close_session(previous.value()).await?;
            }
            let session = state
                .engine
                .open_session(&user.username, state.options.session_ttl, Utc::now())
                .await?;
            tracing::info!(username = %user.username, "logged in");

            let jar = jar.add(session_cookie(&state.options, session.token));
            let jar = flash::push(
                jar,
                Message::success(format!("Welcome back, {}!", user.username)),
            );
            Ok((jar, Redirect::to(HOME_PATH)).into_response())
        }
        Err(EngineError::InvalidCredentials) => {
            tracing::warn!(username = %form.username, "failed login attempt");
            let (jar, mut messages) = flash::take(jar);
            messages.push(Message::error(EngineError::InvalidCredentials.to_string()));
            let page = LoginPage {
                messages,
                username: form.username,
            };
            Ok((StatusCode::UNAUTHORIZED, jar, Json(page)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// Ends the session, if any, and returns to the login page.
pub async fn logout(
    State(state): State<ServerState>,
    jar: CookieJar,
) -> Result<Response, ServerError> {
    if let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
        state.engine.close_session(&token).await?;
    }

    let jar = jar.remove(expired_session_cookie());
    let jar = flash::push(jar, Message::info("You have been logged out."));
    Ok((jar, Redirect::to(LOGIN_PATH)).into_response())
}
