use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::config::JwtConfig;

/// Why a presented token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience => TokenError::SignatureInvalid,
            ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// Issues and verifies HS256 bearer tokens. Built once at startup from [`JwtConfig`].
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl TokenService {
    pub fn new(cfg: &JwtConfig) -> anyhow::Result<Self> {
        if cfg.secret.is_empty() {
            anyhow::bail!("refusing to sign tokens with an empty secret");
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::minutes(cfg.ttl_minutes),
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject: Uuid) -> anyhow::Result<String> {
        self.issue_at(subject, OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, subject: Uuid, now: OffsetDateTime) -> anyhow::Result<String> {
        let claims = Claims {
            sub: subject,
            iat: now.unix_timestamp(),
            exp: (now + self.ttl).unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %subject, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Checks signature first, then the `[iat, exp)` window against `now`.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_audience(std::slice::from_ref(&self.audience));

        let claims = decode::<Claims>(token, &self.decoding, &validation)?.claims;

        let now = now.unix_timestamp();
        if now >= claims.exp || now < claims.iat {
            return Err(TokenError::Expired);
        }

        debug!(user_id = %claims.sub, "jwt verified");
        Ok(claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_service(secret: &str) -> TokenService {
        TokenService::new(&JwtConfig {
            secret: secret.into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 60,
        })
        .expect("service should build")
    }

    fn swap_char(segment: &str, idx: usize) -> String {
        segment
            .char_indices()
            .map(|(i, c)| match (i == idx, c) {
                (true, 'A') => 'B',
                (true, _) => 'A',
                (false, c) => c,
            })
            .collect()
    }

    #[test]
    fn issued_token_verifies_to_same_subject() {
        let svc = make_service("dev-secret");
        let user_id = Uuid::new_v4();
        let token = svc.issue(user_id).expect("sign");
        assert_eq!(svc.verify(&token), Ok(user_id));
    }

    #[test]
    fn ttl_defaults_to_one_hour() {
        assert_eq!(make_service("dev-secret").ttl(), Duration::hours(1));
    }

    #[test]
    fn token_expires_after_ttl() {
        let svc = make_service("dev-secret");
        let user_id = Uuid::new_v4();
        let issued = OffsetDateTime::now_utc();
        let token = svc.issue_at(user_id, issued).unwrap();

        let just_before = issued + svc.ttl() - Duration::seconds(1);
        assert_eq!(svc.verify_at(&token, just_before), Ok(user_id));

        let at_expiry = issued + svc.ttl();
        assert_eq!(svc.verify_at(&token, at_expiry), Err(TokenError::Expired));
    }

    #[test]
    fn token_from_the_future_is_rejected() {
        let svc = make_service("dev-secret");
        let issued = OffsetDateTime::now_utc() + Duration::minutes(10);
        let token = svc.issue_at(Uuid::new_v4(), issued).unwrap();
        assert_eq!(svc.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_payload_fails_signature_check() {
        let svc = make_service("dev-secret");
        let token = svc.issue(Uuid::new_v4()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], swap_char(parts[1], 5), parts[2]);
        assert_eq!(svc.verify(&forged), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn tampered_signature_fails_signature_check() {
        let svc = make_service("dev-secret");
        let token = svc.issue(Uuid::new_v4()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], parts[1], swap_char(parts[2], 0));
        assert_eq!(svc.verify(&forged), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = make_service("secret-a").issue(Uuid::new_v4()).unwrap();
        assert_eq!(
            make_service("secret-b").verify(&token),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let svc = make_service("dev-secret");
        assert_eq!(svc.verify("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(svc.verify(""), Err(TokenError::Malformed));
    }

    #[test]
    fn empty_secret_is_refused() {
        let err = TokenService::new(&JwtConfig {
            secret: String::new(),
            issuer: "i".into(),
            audience: "a".into(),
            ttl_minutes: 60,
        });
        assert!(err.is_err());
    }
}
