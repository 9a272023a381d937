//! Account credential rules: username shape, password policy and hashing.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, FieldErrors, ResultEngine, validation::required};

pub const USERNAME_MAX_CHARS: usize = 150;
pub const PASSWORD_MIN_CHARS: usize = 8;

/// Passwords rejected outright, compared case-insensitively.
const COMMON_PASSWORDS: &[&str] = &[
    "123456", "12345678", "123456789", "1234567890", "password", "password1", "password123",
    "qwerty", "qwerty123", "qwertyuiop", "abc123", "111111", "iloveyou", "letmein", "welcome",
    "monkey", "dragon", "football", "baseball", "sunshine", "princess", "admin123", "trustno1",
    "passw0rd", "whatever", "starwars", "superman", "1q2w3e4r", "zaq12wsx", "changeme",
];

/// Signup form as submitted.
#[derive(Clone, Copy, Debug, Default)]
pub struct SignupInput<'a> {
    pub username: &'a str,
    pub password1: &'a str,
    pub password2: &'a str,
}

/// A signup that passed every shape and policy check. Uniqueness is checked
/// against the database separately.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidSignup {
    pub username: String,
    pub password: String,
}

/// NFKC-normalizes a username so visually identical names collide.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().nfkc().collect()
}

fn username_char_allowed(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || matches!(c, '@' | '.' | '+' | '-')
}

impl SignupInput<'_> {
    pub fn validate(&self) -> Result<ValidSignup, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = required(&mut errors, "username", self.username).and_then(|raw| {
            let username = normalize_username(raw);
            let chars = username.chars().count();
            if chars > USERNAME_MAX_CHARS {
                errors.add(
                    "username",
                    format!(
                        "Ensure this value has at most {USERNAME_MAX_CHARS} characters (it has {chars})."
                    ),
                );
                return None;
            }
            if !username.chars().all(username_char_allowed) {
                errors.add(
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                );
                return None;
            }
            Some(username)
        });

        // Passwords are not trimmed.
        if self.password1.is_empty() {
            errors.add("password1", crate::validation::REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", crate::validation::REQUIRED);
        }

        if !self.password1.is_empty() && !self.password2.is_empty() {
            if self.password1 != self.password2 {
                errors.add("password2", "The two password fields didn't match.");
            } else {
                for message in password_policy_errors(self.password1, username.as_deref()) {
                    errors.add("password2", message);
                }
            }
        }

        match username {
            Some(username) if errors.is_empty() => Ok(ValidSignup {
                username,
                password: self.password1.to_string(),
            }),
            _ => Err(errors),
        }
    }
}

/// Returns every policy rule `password` breaks.
pub fn password_policy_errors(password: &str, username: Option<&str>) -> Vec<String> {
    let mut messages = Vec::new();
    let lowered = password.to_lowercase();

    if let Some(username) = username.map(str::to_lowercase)
        && username.chars().count() >= 3
        && (lowered.contains(&username) || username.contains(&lowered))
    {
        messages.push("The password is too similar to the username.".to_string());
    }
    if password.chars().count() < PASSWORD_MIN_CHARS {
        messages.push(format!(
            "This password is too short. It must contain at least {PASSWORD_MIN_CHARS} characters."
        ));
    }
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        messages.push("This password is too common.".to_string());
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        messages.push("This password is entirely numeric.".to_string());
    }

    messages
}

/// Hashes `password` with Argon2id and a random salt (PHC string format).
pub fn hash_password(password: &str) -> ResultEngine<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::Password(err.to_string()))
}

/// Checks `password` against a stored PHC hash.
pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|hash| {
            Argon2::default()
                .verify_password(password.as_bytes(), &hash)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup<'a>(username: &'a str, password1: &'a str, password2: &'a str) -> SignupInput<'a> {
        SignupInput {
            username,
            password1,
            password2,
        }
    }

    #[test]
    fn accepts_a_reasonable_signup() {
        let valid = signup(" maria ", "tahimik-ilog-42", "tahimik-ilog-42")
            .validate()
            .unwrap();
        assert_eq!(valid.username, "maria");
        assert_eq!(valid.password, "tahimik-ilog-42");
    }

    #[test]
    fn username_is_nfkc_normalized() {
        // Fullwidth letters fold to ASCII.
        assert_eq!(normalize_username("ｍａｒｉａ"), "maria");
    }

    #[test]
    fn username_rejects_spaces_and_symbols() {
        let errors = signup("bad name!", "tahimik-ilog-42", "tahimik-ilog-42")
            .validate()
            .unwrap_err();
        assert!(errors.contains("username"));
        assert!(!errors.contains("password2"));
    }

    #[test]
    fn mismatched_passwords_are_rejected() {
        let errors = signup("maria", "tahimik-ilog-42", "tahimik-ilog-43")
            .validate()
            .unwrap_err();
        assert_eq!(
            errors.get("password2"),
            ["The two password fields didn't match.".to_string()]
        );
    }

    #[test]
    fn policy_reports_every_broken_rule() {
        let messages = password_policy_errors("1234567", None);
        assert_eq!(
            messages,
            [
                "This password is too short. It must contain at least 8 characters.",
                "This password is entirely numeric.",
            ]
        );
        assert_eq!(
            password_policy_errors("Password", None),
            ["This password is too common."]
        );
        assert_eq!(
            password_policy_errors("maria2024!", Some("Maria")),
            ["The password is too similar to the username."]
        );
    }

    #[test]
    fn hash_verifies_only_the_hashed_password() {
        let hash = hash_password("tahimik-ilog-42").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("tahimik-ilog-42", &hash));
        assert!(!verify_password("tahimik-ilog-43", &hash));
        assert!(!verify_password("tahimik-ilog-42", "not a hash"));
    }
}
