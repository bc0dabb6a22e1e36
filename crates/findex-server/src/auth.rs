use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

// claims
// ----------------------------------------------------------------------------

/// Claim set carried by every bearer token: the user id (as a string, per the
/// `sub` convention), the account email, and the provider that minted it.
/// No expiry is set, so a token holds for as long as the signing secret does.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl Claims {
    pub fn new(user_id: i32, email: &str, provider: Option<&str>) -> Self {
        Self {
            sub: user_id.to_string(),
            email: email.to_owned(),
            provider: provider.map(str::to_owned),
        }
    }

    /// Display name for the profile: the email truncated at its domain.
    pub fn username(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }

    /// Numeric user id from the subject claim.
    pub fn user_id(&self) -> Result<i32, AuthError> {
        self.sub.parse().map_err(|_| AuthError::MissingClaims)
    }
}

// passwords
// ----------------------------------------------------------------------------

/// One-way, salted argon2 hash in PHC string format.
pub fn hash_password(plain: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(plain.as_bytes(), &salt)?
        .to_string())
}

/// Verify a candidate password against a stored hash. Unparseable hashes
/// verify as false rather than erroring; the caller cannot tell the two apart.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// tokens
// ----------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("token has expired")]
    Expired,

    /// Bad signature or otherwise undecodable token.
    #[error("could not validate credentials")]
    Malformed,

    #[error("invalid token payload")]
    MissingClaims,

    #[error("missing bearer token")]
    MissingToken,
}

/// Process-wide HS256 signing keys, loaded once at startup and handed to the
/// app as shared read-only data.
#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl AuthKeys {
    pub fn from_env() -> Self {
        let secret = dotenv::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        Self::new(secret.as_bytes())
    }

    pub fn new(secret: &[u8]) -> Self {
        // tokens carry no exp claim; validity is signature match alone
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Mint a compact signed token for the given claim set.
    pub fn issue(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::default(), claims, &self.encoding)
    }

    /// Check signature and structural validity, returning the verified claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                jsonwebtoken::errors::ErrorKind::Json(_)
                | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_) => {
                    AuthError::MissingClaims
                }
                _ => AuthError::Malformed,
            })
    }
}

// extraction
// ----------------------------------------------------------------------------

/// Verified caller identity, pulled from the `Authorization: Bearer` header of
/// the current request.
pub struct Identity(pub Claims);

impl FromRequest for Identity {
    type Error = crate::error::ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(extract(req).map(Identity).map_err(Into::into))
    }
}

fn extract(req: &HttpRequest) -> Result<Claims, AuthError> {
    let keys = req
        .app_data::<web::Data<AuthKeys>>()
        .expect("AuthKeys registered as app data");
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingToken)?;
    let mut parts = header.splitn(2, ' ');
    let (scheme, token) = match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) => (scheme, token.trim()),
        _ => return Err(AuthError::MissingToken),
    };
    if !scheme.eq_ignore_ascii_case("Bearer") || token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    keys.verify(token)
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> AuthKeys {
        AuthKeys::new(b"unit-test-secret")
    }

    #[test]
    fn issue_then_verify_roundtrips_claims() {
        let keys = keys();
        let token = keys
            .issue(&Claims::new(42, "alice@example.com", Some("credentials")))
            .unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.provider.as_deref(), Some("credentials"));
    }

    #[test]
    fn tampered_token_is_malformed() {
        let keys = keys();
        let mut token = keys
            .issue(&Claims::new(1, "alice@example.com", None))
            .unwrap();
        token.push('x');
        assert_eq!(keys.verify(&token), Err(AuthError::Malformed));
    }

    #[test]
    fn token_from_other_secret_is_malformed() {
        let token = AuthKeys::new(b"someone-elses-secret")
            .issue(&Claims::new(1, "alice@example.com", None))
            .unwrap();
        assert_eq!(keys().verify(&token), Err(AuthError::Malformed));
    }

    #[test]
    fn token_without_required_claims_is_rejected() {
        // a correctly signed token whose payload is missing `email`
        let token = encode(
            &Header::default(),
            &serde_json::json!({ "sub": "7" }),
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();
        assert_eq!(keys().verify(&token), Err(AuthError::MissingClaims));
    }

    #[test]
    fn username_truncates_email_at_domain() {
        let claims = Claims::new(1, "alice@example.com", None);
        assert_eq!(claims.username(), "alice");
    }

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = hash_password("secret").unwrap();
        assert_ne!(hash, "secret");
        assert!(verify_password("secret", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("secret", "not-a-phc-hash"));
    }
}
