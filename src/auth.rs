// Password hashing, bearer tokens and the authorization gates.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::SharedState;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::User;
use crate::sessions::{Session, SessionStore};

// ===== PASSWORDS =====

pub fn hash_password(password: &str, cost: u32) -> Result<String, ApiError> {
    bcrypt::hash(password, cost).map_err(|e| ApiError::Internal(format!("password hash failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// 3-50 chars, no whitespace.
pub fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.len() < 3 || username.len() > 50 {
        return Err(ApiError::Validation("username must be 3-50 characters".into()));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(ApiError::Validation("username must not contain spaces".into()));
    }
    Ok(())
}

/// At least 8 chars with an upper, a lower and a digit.
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    let ok = password.len() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit());
    if !ok {
        return Err(ApiError::Validation(
            "password must be at least 8 characters and include upper, lower, and a digit".into(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    let looks_like_email = email.len() <= 100
        && email.split_once('@').map_or(false, |(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        });
    if !looks_like_email {
        return Err(ApiError::Validation("email is not valid".into()));
    }
    Ok(())
}

// ===== TOKENS =====

fn is_false(v: &bool) -> bool {
    !*v
}

/// Claims embedded in every access token. `jti` points at the session
/// record; the token itself is never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub jti: Uuid,
    #[serde(default, skip_serializing_if = "is_false")]
    pub admin: bool,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_secs: i64,
}

impl TokenIssuer {
    pub fn new(config: &Config) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            expiry_secs: config.jwt_expiry_secs,
        }
    }

    /// Create a session for the user and sign a token embedding its jti.
    /// Returns the token together with the session id, since the session
    /// endpoints are keyed by jti on the client side.
    pub async fn issue(&self, user: &User, sessions: &dyn SessionStore) -> Result<(String, Uuid), ApiError> {
        let session = Session::for_user(user);
        let jti = session.jti;
        sessions.create(session).await;

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            jti,
            admin: user.is_admin,
            iat: now,
            exp: now + self.expiry_secs,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))?;
        Ok((token, jti))
    }

    /// Signature and expiry checks, then the mandatory session-liveness
    /// lookup. Skipping the lookup would let a logged-out token keep
    /// working until its exp claim runs out.
    pub async fn verify(&self, token: &str, sessions: &dyn SessionStore) -> Result<Claims, ApiError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| ApiError::Unauthorized("invalid or expired token".into()))?;
        if sessions.get(data.claims.jti).await.is_none() {
            return Err(ApiError::Unauthorized("token has been revoked".into()));
        }
        Ok(data.claims)
    }
}

// ===== EXTRACTORS =====

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".into()))?;
    match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => Ok(token),
        _ => Err(ApiError::Unauthorized("malformed Authorization header".into())),
    }
}

/// Verified identity for an authenticated route. Public routes simply
/// do not use this extractor; the allow-list is the router itself.
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.auth.verify(token, state.sessions.as_ref()).await?;
        Ok(AuthUser(claims))
    }
}

/// Admin gate: the admin claim must be literally true.
pub struct AdminUser(pub Claims);

#[async_trait]
impl FromRequestParts<SharedState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if !claims.admin {
            return Err(ApiError::Forbidden("admin privileges required".into()));
        }
        Ok(AdminUser(claims))
    }
}

/// Ownership-or-admin gate. Callers check existence first, so a missing
/// resource reports not-found rather than forbidden.
pub fn require_owner_or_admin(claims: &Claims, owner_id: Uuid) -> Result<(), ApiError> {
    if claims.sub == owner_id || claims.admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden("not the owner of this resource".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::MemorySessionStore;
    use rust_decimal_macros::dec;

    fn test_config() -> Config {
        Config {
            bind_addr: ([127, 0, 0, 1], 0).into(),
            jwt_secret: "test-secret".into(),
            jwt_expiry_secs: 3600,
            bcrypt_cost: 4,
            state_file: None,
        }
    }

    fn user() -> User {
        User::new("alice".into(), "alice@example.com".into(), None, dec!(100))
    }

    #[test]
    fn hash_never_equals_plaintext() {
        let hash = hash_password("Str0ngPass1", 4).unwrap();
        assert_ne!(hash, "Str0ngPass1");
        assert!(verify_password("Str0ngPass1", &hash));
        assert!(!verify_password("WrongPass1", &hash));
    }

    #[test]
    fn password_policy() {
        assert!(validate_password("Str0ngPass").is_ok());
        assert!(validate_password("short1A").is_err());
        assert!(validate_password("alllowercase1").is_err());
        assert!(validate_password("ALLUPPERCASE1").is_err());
        assert!(validate_password("NoDigitsHere").is_err());
    }

    #[test]
    fn username_policy() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("al").is_err());
        assert!(validate_username("has space").is_err());
    }

    #[tokio::test]
    async fn issued_token_verifies_and_session_resolves() {
        let issuer = TokenIssuer::new(&test_config());
        let sessions = MemorySessionStore::new();
        let user = user();

        let (token, jti) = issuer.issue(&user, &sessions).await.unwrap();
        assert!(sessions.get(jti).await.is_some());

        let claims = issuer.verify(&token, &sessions).await.unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.jti, jti);
        assert!(!claims.admin);
    }

    #[tokio::test]
    async fn revoked_session_rejects_a_still_valid_token() {
        let issuer = TokenIssuer::new(&test_config());
        let sessions = MemorySessionStore::new();
        let (token, jti) = issuer.issue(&user(), &sessions).await.unwrap();

        assert!(sessions.delete(jti).await);
        let err = issuer.verify(&token, &sessions).await.unwrap_err();
        assert_eq!(err.code(), "unauthorized");
    }

    #[tokio::test]
    async fn tampered_and_expired_tokens_are_rejected() {
        let config = test_config();
        let issuer = TokenIssuer::new(&config);
        let sessions = MemorySessionStore::new();
        let (token, _) = issuer.issue(&user(), &sessions).await.unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(issuer.verify(&tampered, &sessions).await.is_err());

        // Hand-craft a token whose exp is well past the validation leeway.
        let u = user();
        let session = Session::for_user(&u);
        let jti = session.jti;
        sessions.create(session).await;
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: u.id,
            username: u.username.clone(),
            jti,
            admin: false,
            iat: now - 7200,
            exp: now - 3600,
        };
        let expired = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();
        assert!(issuer.verify(&expired, &sessions).await.is_err());
    }

    #[test]
    fn ownership_gate() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let claims = Claims {
            sub: me,
            username: "alice".into(),
            jti: Uuid::new_v4(),
            admin: false,
            iat: 0,
            exp: 0,
        };
        assert!(require_owner_or_admin(&claims, me).is_ok());
        assert!(require_owner_or_admin(&claims, other).is_err());

        let admin = Claims { admin: true, ..claims };
        assert!(require_owner_or_admin(&admin, other).is_ok());
    }
}
