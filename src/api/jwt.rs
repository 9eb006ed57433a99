use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// 令牌用途；令牌只在其自身用途下有效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum TokenKind {
    Session,
    Verify,
    Reset,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// zID
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: String,
    /// 仅重置令牌携带，对应 users.reset_nonce
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_ttl: Duration,
    verify_ttl: Duration,
    reset_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, session_ttl: Duration, verify_ttl: Duration, reset_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            session_ttl,
            verify_ttl,
            reset_ttl,
        }
    }

    pub fn from_config() -> Self {
        let config = crate::config::get_config();
        let session = &config.session;

        let secret = if session.jwt_secret.is_empty() {
            tracing::warn!("session.jwt_secret is empty; using a random secret, sessions will not survive a restart");
            crate::utils::generate_secure_token()
        } else {
            session.jwt_secret.clone()
        };

        Self::new(
            &secret,
            Duration::hours(session.session_hours as i64),
            Duration::hours(session.verify_token_hours as i64),
            Duration::minutes(session.reset_token_minutes as i64),
        )
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Session => self.session_ttl,
            TokenKind::Verify => self.verify_ttl,
            TokenKind::Reset => self.reset_ttl,
        }
    }

    pub fn issue(&self, kind: TokenKind, z_id: &str) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_with_nonce(kind, z_id, None)
    }

    pub fn issue_with_nonce(
        &self,
        kind: TokenKind,
        z_id: &str,
        nonce: Option<&str>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: z_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl(kind)).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: kind.to_string(),
            nonce: nonce.map(str::to_string),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// 校验签名、过期时间与用途，返回令牌所属的 zID
    pub fn validate(&self, kind: TokenKind, token: &str) -> Result<String, jsonwebtoken::errors::Error> {
        Ok(self.claims(kind, token)?.sub)
    }

    /// 校验后返回完整 claims
    pub fn claims(&self, kind: TokenKind, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;

        if token_data.claims.token_type != kind.as_ref() {
            return Err(jsonwebtoken::errors::Error::from(
                jsonwebtoken::errors::ErrorKind::InvalidToken,
            ));
        }

        Ok(token_data.claims)
    }
}
