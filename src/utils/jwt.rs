use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub role: Role,
    pub exp: usize, // expiration time
    pub iat: usize, // issued at
}

pub fn create_token(
    user_id: &str,
    role: Role,
    secret: &str,
    expiration_secs: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: (now + expiration_secs) as usize,
        iat: now as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip_keeps_role() {
        let token = create_token("65a1f0c2e4b0a1b2c3d4e5f6", Role::Publisher, "test-secret", 3600).unwrap();
        let claims = verify_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(claims.role, Role::Publisher);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = create_token("abc", Role::User, "one", 3600).unwrap();
        assert!(verify_token(&token, "two").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = create_token("abc", Role::Admin, "secret", -3600).unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }
}
