use crate::domain::DomainError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE: &str = "sessionid";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    /// Must match the user's stored `session_version`; logout bumps it.
    pub ver: i64,
    pub exp: usize,
}

/// Identity carried by a valid session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub version: i64,
}

/// Issues and verifies signed session tokens.
pub struct SessionService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    cookie_secure: bool,
}

impl SessionService {
    pub fn new(secret: &str, ttl_hours: i64, cookie_secure: bool) -> Self {
        tracing::debug!(
            "Initializing SessionService with secret length: {}",
            secret.len()
        );

        if secret.len() < 32 {
            tracing::warn!(
                "Session secret is too short ({} chars). Minimum recommended is 32 chars.",
                secret.len()
            );
        }

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
            cookie_secure,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    pub fn issue(
        &self,
        user_id: i64,
        username: &str,
        version: i64,
    ) -> Result<String, DomainError> {
        tracing::debug!(
            "Issuing session token for user_id: {}, username: {}",
            user_id,
            username
        );

        let claims = Claims {
            user_id,
            username: username.to_string(),
            ver: version,
            exp: (Utc::now() + self.ttl).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode session token: {}", e);
            DomainError::InternalError(format!("Failed to issue session token: {}", e))
        })
    }

    /// Checks signature and expiry only. Whether the session is still live
    /// is decided against the user record by `AuthService::resolve_session`.
    pub fn verify(&self, token: &str) -> Result<SessionUser, DomainError> {
        match decode::<Claims>(token, &self.decoding_key, &Validation::default()) {
            Ok(data) => {
                tracing::debug!("Session verified for user_id: {}", data.claims.user_id);
                Ok(SessionUser {
                    id: data.claims.user_id,
                    username: data.claims.username,
                    version: data.claims.ver,
                })
            }
            Err(e) => {
                tracing::debug!("Session verification failed: {}", e);
                Err(DomainError::Unauthorized(format!("Invalid session: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn issued_token_verifies() {
        let sessions = SessionService::new(SECRET, 24, false);
        let token = sessions.issue(42, "alice", 3).unwrap();
        let user = sessions.verify(&token).unwrap();
        assert_eq!(
            user,
            SessionUser {
                id: 42,
                username: "alice".into(),
                version: 3,
            }
        );
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let ours = SessionService::new(SECRET, 24, false);
        let theirs = SessionService::new(&"z".repeat(32), 24, false);
        let token = theirs.issue(1, "mallory", 0).unwrap();
        assert!(matches!(
            ours.verify(&token),
            Err(DomainError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let sessions = SessionService::new(SECRET, -1, false);
        let token = sessions.issue(1, "alice", 0).unwrap();
        assert!(sessions.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let sessions = SessionService::new(SECRET, 24, false);
        assert!(sessions.verify("not-a-token").is_err());
    }
}
