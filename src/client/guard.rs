//! Navigation gate run before rendering protected pages.
//!
//! The token payload is decoded without checking the signature, so this only
//! spares users a round trip with an obviously dead session. Every protected
//! endpoint still verifies the token server-side.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::client::session::Session;

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";

pub const MSG_LOGIN_REQUIRED: &str = "You must be logged in to access this page.";
pub const MSG_SESSION_EXPIRED: &str = "Session expired. Please log in again.";

/// Surface for user-facing messages (toasts in the browser).
pub trait Notifier {
    fn error(&self, message: &str);
}

/// Reports through the log when there is no UI to show a toast. Provided for
/// embedders driving the guard outside a browser (CLIs, headless tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn error(&self, message: &str) {
        warn!(notice = message, "access guard");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct AccessGuard {
    login_path: String,
    public_paths: Vec<String>,
}

impl Default for AccessGuard {
    fn default() -> Self {
        Self {
            login_path: LOGIN_PATH.into(),
            public_paths: vec![LOGIN_PATH.into(), REGISTER_PATH.into()],
        }
    }
}

impl AccessGuard {
    /// Guard for an app whose login page or public pages live elsewhere than
    /// the default `/auth/*` routes.
    pub fn new(login_path: impl Into<String>, public_paths: Vec<String>) -> Self {
        Self {
            login_path: login_path.into(),
            public_paths,
        }
    }

    pub fn check(&self, path: &str, session: &Session, notifier: &dyn Notifier) -> Navigation {
        self.check_at(path, session, notifier, OffsetDateTime::now_utc())
    }

    pub fn check_at(
        &self,
        path: &str,
        session: &Session,
        notifier: &dyn Notifier,
        now: OffsetDateTime,
    ) -> Navigation {
        if self.public_paths.iter().any(|p| p == path) {
            return Navigation::Proceed;
        }

        let Some(token) = session.token() else {
            notifier.error(MSG_LOGIN_REQUIRED);
            return Navigation::Redirect(self.login_path.clone());
        };

        if !token_unexpired(&token, now) {
            debug!(path, "stored token expired or malformed");
            session.clear();
            notifier.error(MSG_SESSION_EXPIRED);
            return Navigation::Redirect(self.login_path.clone());
        }

        Navigation::Proceed
    }
}

#[derive(Deserialize)]
struct UnverifiedPayload {
    exp: Option<f64>,
}

/// Reads `exp` from the payload segment without verifying the signature.
pub fn unverified_expiry(token: &str) -> Option<f64> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };
    let bytes = Base64UrlUnpadded::decode_vec(payload.trim_end_matches('=')).ok()?;
    let payload: UnverifiedPayload = serde_json::from_slice(&bytes).ok()?;
    payload.exp
}

pub fn token_unexpired(token: &str, now: OffsetDateTime) -> bool {
    match unverified_expiry(token) {
        Some(exp) => exp > now.unix_timestamp_nanos() as f64 / 1e9,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<String>>);

    impl Notifier for Recorder {
        fn error(&self, message: &str) {
            self.0.borrow_mut().push(message.to_string());
        }
    }

    fn token_with_payload(payload: &str) -> String {
        format!(
            "{}.{}.c2lnbmF0dXJl",
            Base64UrlUnpadded::encode_string(br#"{"alg":"HS256","typ":"JWT"}"#),
            Base64UrlUnpadded::encode_string(payload.as_bytes())
        )
    }

    fn at(ts: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(ts).unwrap()
    }

    #[test]
    fn auth_pages_skip_checks() {
        let session = Session::in_memory();
        let notifier = Recorder::default();
        let guard = AccessGuard::default();
        assert_eq!(
            guard.check_at("/auth/login", &session, &notifier, at(0)),
            Navigation::Proceed
        );
        assert_eq!(
            guard.check_at("/auth/register", &session, &notifier, at(0)),
            Navigation::Proceed
        );
        assert!(notifier.0.borrow().is_empty());
    }

    #[test]
    fn missing_token_redirects_to_login() {
        let session = Session::in_memory();
        let notifier = Recorder::default();
        let nav = AccessGuard::default().check_at("/", &session, &notifier, at(0));
        assert_eq!(nav, Navigation::Redirect("/auth/login".into()));
        assert_eq!(*notifier.0.borrow(), vec![MSG_LOGIN_REQUIRED.to_string()]);
    }

    #[test]
    fn live_token_proceeds_and_is_kept() {
        let session = Session::in_memory();
        let token = token_with_payload(r#"{"sub":"x","exp":2000}"#);
        session.store_token(token.clone());
        let notifier = Recorder::default();
        let nav = AccessGuard::default().check_at("/", &session, &notifier, at(1999));
        assert_eq!(nav, Navigation::Proceed);
        assert_eq!(session.token(), Some(token));
    }

    #[test]
    fn expired_token_is_cleared_even_with_any_signature() {
        let session = Session::in_memory();
        session.store_token(token_with_payload(r#"{"exp":2000}"#));
        let notifier = Recorder::default();
        let nav = AccessGuard::default().check_at("/", &session, &notifier, at(2000));
        assert_eq!(nav, Navigation::Redirect("/auth/login".into()));
        assert_eq!(session.token(), None);
        assert_eq!(*notifier.0.borrow(), vec![MSG_SESSION_EXPIRED.to_string()]);
    }

    #[test]
    fn fractional_expiry_is_compared_with_subsecond_precision() {
        let token = token_with_payload(r#"{"exp":2000.5}"#);
        let nanos = |ms: i128| OffsetDateTime::from_unix_timestamp_nanos(ms * 1_000_000).unwrap();
        assert!(token_unexpired(&token, nanos(2_000_400)));
        assert!(!token_unexpired(&token, nanos(2_000_600)));
    }

    #[test]
    fn custom_paths_and_log_notifier() {
        let guard = AccessGuard::new("/signin", vec!["/signin".into(), "/about".into()]);
        let session = Session::in_memory();
        assert_eq!(
            guard.check_at("/about", &session, &LogNotifier, at(0)),
            Navigation::Proceed
        );
        assert_eq!(
            guard.check_at("/auth/login", &session, &LogNotifier, at(0)),
            Navigation::Redirect("/signin".into())
        );
    }

    #[test]
    fn malformed_tokens_are_treated_as_expired() {
        for bad in [
            "not-a-jwt".to_string(),
            "a.b".to_string(),
            "a.!!!.c".to_string(),
            token_with_payload("not json"),
            token_with_payload(r#"{"sub":"no-exp"}"#),
            format!("{}.extra", token_with_payload(r#"{"exp":9999999999}"#)),
        ] {
            let session = Session::in_memory();
            session.store_token(bad.clone());
            let notifier = Recorder::default();
            let nav = AccessGuard::default().check_at("/", &session, &notifier, at(0));
            assert_eq!(nav, Navigation::Redirect("/auth/login".into()), "{bad}");
            assert_eq!(session.token(), None);
        }
    }

    #[test]
    fn padded_payload_is_accepted() {
        let payload = Base64UrlUnpadded::encode_string(br#"{"exp":10}"#);
        let token = format!("h.{payload}==.s");
        assert_eq!(unverified_expiry(&token), Some(10.0));
    }
}
