use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng;
use rand::distributions::Alphanumeric;

pub const SESSION_COOKIE: &str = "admin_session";
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24);
const TOKEN_LEN: usize = 32;

/// In-memory registry of issued admin session tokens.
#[derive(Debug, Default)]
pub struct AdminSessions {
    tokens: Mutex<HashMap<String, Instant>>,
}

impl AdminSessions {
    pub fn issue(&self) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();

        let mut tokens = self.tokens.lock();
        let now = Instant::now();
        tokens.retain(|_, issued| now.duration_since(*issued) < SESSION_TTL);
        tokens.insert(token.clone(), now);
        token
    }

    pub fn is_valid(&self, token: &str) -> bool {
        self.tokens
            .lock()
            .get(token)
            .is_some_and(|issued| issued.elapsed() < SESSION_TTL)
    }

    /// `Set-Cookie` value for a freshly issued token.
    pub fn cookie(token: &str) -> String {
        format!(
            "{SESSION_COOKIE}={token}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            SESSION_TTL.as_secs()
        )
    }
}

/// Pull the session token out of a raw `Cookie` header.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
    })
}
