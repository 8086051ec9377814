use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

const SECURE_TOKEN_BYTES: usize = 32;

/// Token opaque pour les liens email: 32 octets du CSPRNG de l'OS, base64 URL-safe (43 caractères)
pub fn generate() -> String {
    let mut bytes = [0u8; SECURE_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Empreinte SHA-256 (hex) stockée à la place du token
pub fn fingerprint(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_url_safe_and_unique() {
        let a = generate();
        let b = generate();

        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint() {
        let token = generate();
        assert_eq!(fingerprint(&token), fingerprint(&token));
        assert_eq!(fingerprint(&token).len(), 64);
        assert_ne!(fingerprint(&token), token);
        assert_ne!(fingerprint("a"), fingerprint("b"));
    }
}
