use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminant des tokens de session membre
pub const MEMBER_TOKEN_TYPE: &str = "member";

/// Durée de vie d'un token (et de la session associée)
pub fn token_lifetime() -> Duration {
    Duration::days(7)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,     // member_id
    pub typ: String,  // "member"
    pub jti: Uuid,    // deux tokens émis dans la même seconde restent distincts
    pub iat: i64,
    pub exp: i64,     // expiration timestamp
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Résultat détaillé de la vérification, réduit à "invalide" vers l'extérieur
#[derive(Debug)]
pub enum TokenCheck {
    Valid(Claims),
    Expired,
    Malformed,
    WrongType,
}

/// Émet et vérifie les JWT membres (HS256)
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: token_lifetime(),
        }
    }

    /// Génère un JWT token pour un membre
    pub fn issue(&self, member_id: i32) -> Result<IssuedToken, String> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.lifetime)
            .ok_or("Failed to calculate expiration")?;

        let claims = Claims {
            sub: member_id,
            typ: MEMBER_TOKEN_TYPE.to_string(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| format!("Failed to generate token: {}", e))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Vérifie signature, expiration et type du token
    pub fn inspect(&self, token: &str) -> TokenCheck {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) if data.claims.typ == MEMBER_TOKEN_TYPE => TokenCheck::Valid(data.claims),
            Ok(_) => TokenCheck::WrongType,
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => TokenCheck::Expired,
                _ => TokenCheck::Malformed,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret")
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_generate_and_verify_token() {
        let issued = issuer().issue(123).unwrap();

        match issuer().inspect(&issued.token) {
            TokenCheck::Valid(claims) => {
                assert_eq!(claims.sub, 123);
                assert_eq!(claims.typ, MEMBER_TOKEN_TYPE);
                assert_eq!(claims.exp, issued.expires_at.timestamp());
            }
            other => panic!("expected a valid token, got {:?}", other),
        }
    }

    #[test]
    fn test_expiry_is_seven_days() {
        let issued = issuer().issue(1).unwrap();
        let remaining = issued.expires_at - Utc::now();
        assert!(remaining > Duration::days(7) - Duration::minutes(1));
        assert!(remaining <= Duration::days(7));
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = issuer().issue(1).unwrap();
        let b = issuer().issue(1).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_invalid_token() {
        assert!(matches!(issuer().inspect("invalid.token.here"), TokenCheck::Malformed));
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let issued = TokenIssuer::new("another-secret").issue(1).unwrap();
        assert!(matches!(issuer().inspect(&issued.token), TokenCheck::Malformed));
    }

    #[test]
    fn test_expired_token() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            typ: MEMBER_TOKEN_TYPE.to_string(),
            jti: Uuid::new_v4(),
            iat: now - 3600,
            exp: now - 60,
        };
        let token = sign(&claims, "test-secret");
        assert!(matches!(issuer().inspect(&token), TokenCheck::Expired));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            typ: "admin".to_string(),
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + 3600,
        };
        let token = sign(&claims, "test-secret");
        assert!(matches!(issuer().inspect(&token), TokenCheck::WrongType));
    }
}
