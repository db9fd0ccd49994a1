//! Signed session tokens
//!
//! Sessions are stateless HS256 JWTs carrying the upstream credentials needed
//! for later resource calls. Validity is decided by signature and expiry only.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use valstore_types::Region;

use crate::crypto::fingerprint;
use crate::identity::IdentityResult;
use crate::AuthError;

/// Minimum HMAC secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Session token payload
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: String,
    /// `name#tag`, or `name` when the tag is empty
    #[serde(rename = "username")]
    pub display_name: String,
    pub access_token: String,
    pub entitlement_token: String,
    pub region: Region,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

impl SessionClaims {
    /// Whether the session is expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl std::fmt::Debug for SessionClaims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClaims")
            .field("user_id", &self.user_id)
            .field("display_name", &self.display_name)
            .field("region", &self.region)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish_non_exhaustive()
    }
}

/// A freshly signed session
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
    pub expires_at: DateTime<Utc>,
}

/// Signs and validates session tokens
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl SessionIssuer {
    /// Create an issuer for `secret`.
    ///
    /// The secret must be at least [`MIN_SECRET_LEN`] bytes.
    pub fn new(secret: &str, lifetime: Duration) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Configuration(
                "session secret must not be empty".to_string(),
            ));
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::Configuration(format!(
                "session secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        })
    }

    /// Session lifetime
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Sign a session for `identity` starting now
    pub fn issue(&self, identity: &IdentityResult) -> Result<IssuedSession, AuthError> {
        self.issue_at(identity, Utc::now())
    }

    /// Sign a session for `identity` starting at `now`
    pub fn issue_at(
        &self,
        identity: &IdentityResult,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, AuthError> {
        let lifetime = chrono::Duration::from_std(self.lifetime)
            .map_err(|_| AuthError::TokenSigningFailed("session lifetime out of range".into()))?;
        let expires_at = now
            .checked_add_signed(lifetime)
            .ok_or_else(|| AuthError::TokenSigningFailed("session expiry out of range".into()))?;

        let claims = SessionClaims {
            user_id: identity.user_id.clone(),
            display_name: identity.formatted_name(),
            access_token: identity.access_token.clone(),
            entitlement_token: identity.entitlement_token.clone(),
            region: identity.region,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(
            |e| {
                tracing::error!(error = %e, "Failed to sign session token");
                AuthError::TokenSigningFailed(e.to_string())
            },
        )?;

        tracing::debug!(
            user_id = %claims.user_id,
            session_fp = %fingerprint(&token),
            %expires_at,
            "Session issued"
        );

        Ok(IssuedSession {
            token,
            claims,
            expires_at,
        })
    }

    /// Validate a session token against the current time
    pub fn validate(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a session token against `now`.
    ///
    /// The algorithm is pinned to HS256 regardless of the token header. Expiry
    /// is checked here with zero leeway: a token is expired once `now >= exp`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Session token rejected");
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidToken,
                _ => AuthError::MalformedToken,
            }
        })?;

        let claims = data.claims;
        if claims.is_expired_at(now) {
            tracing::debug!(user_id = %claims.user_id, exp = claims.exp, "Session token expired");
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}
