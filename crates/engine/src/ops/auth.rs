use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveValue, QueryFilter, SqlErr, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, FieldErrors, ResultEngine, Session, SignupInput, User,
    password::{hash_password, normalize_username, verify_password},
    sessions, users,
};

use super::Engine;

fn username_taken() -> EngineError {
    let mut errors = FieldErrors::new();
    errors.add("username", "A user with that username already exists.");
    errors.into()
}

/// Runs CPU-bound password work off the async workers.
async fn blocking<T, F>(work: F) -> ResultEngine<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| EngineError::Password(err.to_string()))
}

impl Engine {
    /// Registers a new account.
    ///
    /// Shape and policy problems, and an already taken username, come back as
    /// [`EngineError::Validation`].
    pub async fn signup(&self, input: SignupInput<'_>) -> ResultEngine<User> {
        let valid = input.validate()?;

        if users::Entity::find_by_id(valid.username.clone())
            .one(&self.database)
            .await?
            .is_some()
        {
            return Err(username_taken());
        }

        let password = valid.password;
        let hash = blocking(move || hash_password(&password)).await??;

        let active = users::ActiveModel {
            username: ActiveValue::Set(valid.username),
            password: ActiveValue::Set(hash),
            date_joined: ActiveValue::Set(Utc::now()),
        };
        // A concurrent signup may take the name between the check and here.
        match active.insert(&self.database).await {
            Ok(model) => Ok(model.into()),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(username_taken())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Checks a username/password pair.
    ///
    /// Unknown users and wrong passwords both yield
    /// [`EngineError::InvalidCredentials`].
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<User> {
        let username = normalize_username(username);
        if username.is_empty() || password.is_empty() {
            return Err(EngineError::InvalidCredentials);
        }

        let user = users::Entity::find_by_id(username)
            .one(&self.database)
            .await?
            .ok_or(EngineError::InvalidCredentials)?;

        let candidate = password.to_string();
        let stored = user.password.clone();
        if !blocking(move || verify_password(&candidate, &stored)).await? {
            return Err(EngineError::InvalidCredentials);
        }
        Ok(user.into())
    }

    /// Opens a session for `username` valid for `ttl` from `now`.
    pub async fn open_session(
        &self,
        username: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> ResultEngine<Session> {
        let active = sessions::ActiveModel {
            token: ActiveValue::Set(Uuid::new_v4().simple().to_string()),
            username: ActiveValue::Set(username.to_string()),
            created_at: ActiveValue::Set(now),
            expires_at: ActiveValue::Set(now + ttl),
        };
        let model = active.insert(&self.database).await?;
        Ok(model.into())
    }

    /// Resolves a session token to its user.
    ///
    /// Unknown tokens yield `None`; expired sessions are deleted and also
    /// yield `None`.
    pub async fn session_user(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Option<User>> {
        let Some(session) = sessions::Entity::find_by_id(token.to_string())
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };

        if session.is_expired(now) {
            sessions::Entity::delete_by_id(session.token)
                .exec(&self.database)
                .await?;
            return Ok(None);
        }

        let user = users::Entity::find_by_id(session.username)
            .one(&self.database)
            .await?;
        Ok(user.map(User::from))
    }

    /// Ends a session. Closing an unknown token is not an error.
    pub async fn close_session(&self, token: &str) -> ResultEngine<()> {
        sessions::Entity::delete_by_id(token.to_string())
            .exec(&self.database)
            .await?;
        Ok(())
    }

    /// Deletes every session expired at `now`, returning how many were removed.
    pub async fn clear_expired_sessions(&self, now: DateTime<Utc>) -> ResultEngine<u64> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::ExpiresAt.lte(now))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected)
    }
}
