use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use turnate_config::Config;
use turnate_error::{AppError, AppResult};
use turnate_types::{Principal, SessionClaims};

/// A freshly signed session token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256 session tokens
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    issuer: String,
}

impl SessionManager {
    pub fn new(config: &Config) -> Result<Self> {
        if config.jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.jwt_issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            ttl: Duration::hours(config.session_ttl_hours),
            issuer: config.jwt_issuer.clone(),
        })
    }

    /// Sign a session token for `principal`, valid for the configured TTL
    ///
    /// Disabled accounts never receive a token.
    pub fn issue(&self, principal: &Principal) -> AppResult<IssuedToken> {
        self.issue_at(principal, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> AppResult<IssuedToken> {
        if !principal.is_active {
            return Err(AppError::unauthenticated("Account is disabled"));
        }

        let expires_at = now + self.ttl;
        let claims = SessionClaims {
            user_id: principal.id.to_string(),
            username: principal.username.clone(),
            role: principal.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Check signature, algorithm, issuer and expiry
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}
