//! Session service - opaque login tokens
//!
//! Tokens are random 32-byte values handed to the browser as a cookie and
//! mapped back to a user id in this in-process store. Nothing about the
//! user is derivable from the token itself.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use base64::Engine;
use rand::RngCore;
use uuid::Uuid;

/// Sessions live for a day unless configured otherwise
pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 24;

struct SessionEntry {
    user_id: Uuid,
    expires_at: Instant,
}

/// In-process session store with TTL expiry
pub struct SessionService {
    ttl: Duration,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionService {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Start a session for a user and return the opaque token
    pub fn create(&self, user_id: Uuid) -> String {
        let token = generate_token();
        let mut sessions = self.sessions.lock().unwrap();

        // Opportunistic sweep so abandoned sessions don't pile up
        let now = Instant::now();
        sessions.retain(|_, entry| entry.expires_at > now);

        sessions.insert(
            token.clone(),
            SessionEntry {
                user_id,
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// Resolve a token to its user id. Expired tokens are dropped on contact.
    pub fn resolve(&self, token: &str) -> Option<Uuid> {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get(token) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.user_id),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    /// End a session (logout). Unknown tokens are ignored.
    pub fn revoke(&self, token: &str) {
        self.sessions.lock().unwrap().remove(token);
    }

    /// Number of live sessions
    pub fn active_count(&self) -> usize {
        let now = Instant::now();
        self.sessions
            .lock()
            .unwrap()
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_resolve() {
        let service = SessionService::new(Duration::from_secs(60));
        let user_id = Uuid::new_v4();

        let token = service.create(user_id);
        assert_eq!(service.resolve(&token), Some(user_id));
        assert_eq!(service.active_count(), 1);
    }

    #[test]
    fn test_tokens_are_unique_and_opaque() {
        let service = SessionService::new(Duration::from_secs(60));
        let user_id = Uuid::new_v4();

        let first = service.create(user_id);
        let second = service.create(user_id);
        assert_ne!(first, second);
        assert!(!first.contains(&user_id.to_string()));
    }

    #[test]
    fn test_revoke_ends_session() {
        let service = SessionService::new(Duration::from_secs(60));
        let token = service.create(Uuid::new_v4());

        service.revoke(&token);
        assert_eq!(service.resolve(&token), None);

        // Revoking twice is harmless
        service.revoke(&token);
    }

    #[test]
    fn test_expired_sessions_do_not_resolve() {
        let service = SessionService::new(Duration::ZERO);
        let token = service.create(Uuid::new_v4());

        assert_eq!(service.resolve(&token), None);
        assert_eq!(service.active_count(), 0);
    }

    #[test]
    fn test_unknown_token_does_not_resolve() {
        let service = SessionService::new(Duration::from_secs(60));
        assert_eq!(service.resolve("not-a-token"), None);
    }
}
