use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

#[derive(Debug)]
pub enum TokenError {
    DecodingError(jsonwebtoken::errors::Error),
    EncodingError(jsonwebtoken::errors::Error),
    TokenInvalid,
    TokenExpired,
    SystemResourceAccessFailure,
}

impl std::error::Error for TokenError {}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::DecodingError(e) => write!(f, "DecodingError: {}", e),
            TokenError::EncodingError(e) => write!(f, "EncodingError: {}", e),
            TokenError::TokenInvalid => write!(f, "TokenInvalid"),
            TokenError::TokenExpired => write!(f, "TokenExpired"),
            TokenError::SystemResourceAccessFailure => write!(f, "SystemResourceAccessFailure"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenParams<'a> {
    pub user_id: &'a Uuid,
    pub username: &'a str,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String, // Username of the token holder
    pub uid: Uuid,   // User ID
    pub exp: u64,    // Expiration in seconds since UNIX epoch
}

impl TokenClaims {
    /// Time until the embedded expiration, `Duration::ZERO` if it has passed.
    pub fn remaining_lifetime(&self) -> Duration {
        let time_since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);

        Duration::from_secs(self.exp.saturating_sub(time_since_epoch.as_secs()))
    }
}

pub fn generate_access_token(
    params: TokenParams,
    key: &[u8],
    algorithm: Algorithm,
    lifetime: Duration,
) -> Result<String, TokenError> {
    let time_since_epoch = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(t) => t,
        Err(_) => return Err(TokenError::SystemResourceAccessFailure),
    };

    let claims = TokenClaims {
        sub: String::from(params.username),
        uid: *params.user_id,
        exp: time_since_epoch.as_secs() + lifetime.as_secs(),
    };

    jsonwebtoken::encode(
        &Header::new(algorithm),
        &claims,
        &EncodingKey::from_secret(key),
    )
    .map_err(TokenError::EncodingError)
}

pub fn validate_access_token(
    token: &str,
    key: &[u8],
    algorithm: Algorithm,
) -> Result<TokenClaims, TokenError> {
    let decoded_token = match jsonwebtoken::decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(key),
        &Validation::new(algorithm),
    ) {
        Ok(t) => t,
        Err(e) => {
            return match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(TokenError::TokenExpired),
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature
                | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName
                | jsonwebtoken::errors::ErrorKind::InvalidKeyFormat
                | jsonwebtoken::errors::ErrorKind::InvalidIssuer
                | jsonwebtoken::errors::ErrorKind::InvalidAudience
                | jsonwebtoken::errors::ErrorKind::InvalidSubject
                | jsonwebtoken::errors::ErrorKind::ImmatureSignature
                | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => {
                    Err(TokenError::TokenInvalid)
                }
                _ => Err(TokenError::DecodingError(e)),
            }
        }
    };

    Ok(decoded_token.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &[u8] = b"test-signing-key-for-token-module";

    fn test_params(user_id: &Uuid) -> TokenParams {
        TokenParams {
            user_id,
            username: "test_user",
        }
    }

    #[test]
    fn test_generate_access_token_embeds_claims() {
        let user_id = Uuid::new_v4();
        let lifetime = Duration::from_secs(1800);

        let token = generate_access_token(
            test_params(&user_id),
            TEST_KEY,
            Algorithm::HS256,
            lifetime,
        )
        .unwrap();

        assert!(!token.contains(&user_id.to_string()));
        assert!(!token.contains("test_user"));

        let claims = validate_access_token(&token, TEST_KEY, Algorithm::HS256).unwrap();

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        assert_eq!(claims.sub, "test_user");
        assert_eq!(claims.uid, user_id);
        assert!(claims.exp > now);
        assert!(claims.exp <= now + lifetime.as_secs());
    }

    #[test]
    fn test_validate_access_token_rejects_wrong_key() {
        let user_id = Uuid::new_v4();
        let token = generate_access_token(
            test_params(&user_id),
            TEST_KEY,
            Algorithm::HS256,
            Duration::from_secs(1800),
        )
        .unwrap();

        let result = validate_access_token(&token, b"a-different-key", Algorithm::HS256);
        assert!(matches!(result, Err(TokenError::TokenInvalid)));
    }

    #[test]
    fn test_validate_access_token_rejects_tampered_token() {
        let user_id = Uuid::new_v4();
        let token = generate_access_token(
            test_params(&user_id),
            TEST_KEY,
            Algorithm::HS256,
            Duration::from_secs(1800),
        )
        .unwrap();

        // Remove the last char of the token
        let broken_token = &token[0..token.len() - 1];

        assert!(validate_access_token(broken_token, TEST_KEY, Algorithm::HS256).is_err());
        assert!(validate_access_token("not-even-a-token", TEST_KEY, Algorithm::HS256).is_err());
    }

    #[test]
    fn test_validate_access_token_rejects_expired_token() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        let claims = TokenClaims {
            sub: String::from("test_user"),
            uid: Uuid::new_v4(),
            // Far enough in the past to clear the validation leeway
            exp: now - 3600,
        };

        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(TEST_KEY),
        )
        .unwrap();

        let result = validate_access_token(&token, TEST_KEY, Algorithm::HS256);
        assert!(matches!(result, Err(TokenError::TokenExpired)));
    }

    #[test]
    fn test_remaining_lifetime() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        let live_claims = TokenClaims {
            sub: String::from("test_user"),
            uid: Uuid::new_v4(),
            exp: now + 600,
        };
        let remaining = live_claims.remaining_lifetime();
        assert!(remaining > Duration::from_secs(590));
        assert!(remaining <= Duration::from_secs(600));

        let expired_claims = TokenClaims {
            sub: String::from("test_user"),
            uid: Uuid::new_v4(),
            exp: now - 600,
        };
        assert_eq!(expired_claims.remaining_lifetime(), Duration::ZERO);
    }
}
