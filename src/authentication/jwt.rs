use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::VerifyWithKey;
use potion::HtmlError;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::schema::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Uuid,
    pub username: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionData {
    pub user_id: Uuid,
    pub username: String,
}

impl Into<SessionData> for JwtSessionData {
    fn into(self) -> SessionData {
        SessionData {
            user_id: self.user_id,
            username: self.username,
        }
    }
}

/// Verifies a session token signed elsewhere with the shared `secret`.
pub fn verify_jwt_session(token: String, secret: &str) -> Result<JwtSessionData, potion::Error> {
    let key: Hmac<Sha256> = Hmac::new_from_slice(secret.as_bytes())
        .map_err(|_| HtmlError::InvalidSession.new("Invalid session; Bad key"))?;

    token
        .verify_with_key(&key)
        .map_err(|_| HtmlError::InvalidSession.new("Invalid Session; Invalid token"))
        .map(|session: JwtSessionData| {
            let now = Local::now().timestamp();

            if (session.exp - now).is_negative() {
                return Err(HtmlError::InvalidSession.new("Invalid session; Token expired"));
            }
            return Ok(session);
        })?
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::Duration;
    use jwt::SignWithKey;

    use super::*;

    pub(crate) fn sign(user_id: Uuid, lifetime: Duration, secret: &str) -> String {
        let now = Local::now();
        let claims = JwtSessionData {
            user_id,
            username: String::from("tester"),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        };
        let key: Hmac<Sha256> = Hmac::new_from_slice(secret.as_bytes()).unwrap();

        claims.sign_with_key(&key).unwrap()
    }

    #[test]
    fn valid_token_yields_the_session() {
        let token = sign(7, Duration::hours(1), "secret");
        let session: SessionData = verify_jwt_session(token, "secret").unwrap().into();

        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "tester");
    }

    #[test]
    fn foreign_or_expired_tokens_are_rejected() {
        let foreign = sign(7, Duration::hours(1), "other");
        assert!(verify_jwt_session(foreign, "secret").is_err());

        let expired = sign(7, Duration::hours(-1), "secret");
        assert!(verify_jwt_session(expired, "secret").is_err());

        assert!(verify_jwt_session(String::from("garbage"), "secret").is_err());
    }
}
