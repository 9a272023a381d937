//! One-shot messages carried to the next page in the `messages` cookie.
//!
//! The cookie holds the pending messages as URL-safe base64 of a JSON array.
//! Rendering a page drains it.

use api_types::message::Message;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

const FLASH_COOKIE: &str = "messages";

fn decode(value: &str) -> Option<Vec<Message>> {
    let bytes = URL_SAFE_NO_PAD.decode(value).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn encode(messages: &[Message]) -> String {
    URL_SAFE_NO_PAD.encode(serde_json::to_vec(messages).unwrap_or_default())
}

/// Pending messages. A tampered or malformed cookie reads as empty.
fn pending(jar: &CookieJar) -> Vec<Message> {
    jar.get(FLASH_COOKIE)
        .and_then(|cookie| decode(cookie.value()))
        .unwrap_or_default()
}

/// Queues `message` after any message still pending.
pub(crate) fn push(jar: CookieJar, message: Message) -> CookieJar {
    let mut messages = pending(&jar);
    messages.push(message);
    let cookie = Cookie::build((FLASH_COOKIE, encode(&messages)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Drains the pending messages, clearing the cookie when one was sent.
pub(crate) fn take(jar: CookieJar) -> (CookieJar, Vec<Message>) {
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, Vec::new());
    }
    let messages = pending(&jar);
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), messages)
}

#[cfg(test)]
mod tests {
    use api_types::message::Level;

    use super::*;

    #[test]
    fn pushed_messages_are_taken_in_order() {
        let jar = push(CookieJar::new(), Message::success("first"));
        let jar = push(jar, Message::error("second"));

        let (_, messages) = take(jar);
        assert_eq!(
            messages,
            [
                Message::new(Level::Success, "first"),
                Message::new(Level::Error, "second")
            ]
        );
    }

    #[test]
    fn cookie_value_is_url_safe() {
        let jar = push(CookieJar::new(), Message::info("a/b+c=d & é"));
        let value = jar.get(FLASH_COOKIE).unwrap().value().to_string();
        assert!(
            value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn garbage_cookie_reads_as_empty() {
        let jar = CookieJar::new().add(Cookie::new(FLASH_COOKIE, "%%%not base64"));
        let (jar, messages) = take(jar);
        assert!(messages.is_empty());
        assert!(jar.get(FLASH_COOKIE).is_none());
    }

    #[test]
    fn nothing_pending_without_cookie() {
        let (_, messages) = take(CookieJar::new());
        assert!(messages.is_empty());
    }
}
