use base64::{Engine, engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD}};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const LEGACY_PREFIX: &str = "pbkdf2:sha256:";

/// bcrypt ignore tout ce qui dépasse 72 octets
pub const BCRYPT_MAX_BYTES: usize = 72;

/// Hash des mots de passe membres
/// Nouveaux hashs en bcrypt, anciens hashs Werkzeug (PBKDF2) acceptés en lecture
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    // Hash de référence pour payer le coût bcrypt même quand le membre n'existe pas
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, String> {
        let dummy_hash = bcrypt::hash("dummy-password-for-timing", cost)
            .map_err(|e| format!("Failed to hash password: {}", e))?;
        Ok(Self { cost, dummy_hash })
    }

    pub fn hash(&self, password: &str) -> Result<String, String> {
        if password.len() > BCRYPT_MAX_BYTES {
            return Err(format!("Password longer than {} bytes", BCRYPT_MAX_BYTES));
        }
        bcrypt::hash(password, self.cost).map_err(|e| format!("Failed to hash password: {}", e))
    }

    /// Vérifie un mot de passe contre un hash bcrypt ou Werkzeug
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, String> {
        if is_legacy_hash(stored_hash) {
            return verify_legacy(password, stored_hash);
        }
        let matches =
            bcrypt::verify(password, stored_hash).map_err(|e| format!("Password verification error: {}", e))?;
        // Au-delà de 72 octets bcrypt ne compare que le préfixe
        Ok(matches && password.len() <= BCRYPT_MAX_BYTES)
    }

    /// Même coût qu'une vérification réelle, résultat ignoré
    pub fn verify_dummy(&self, password: &str) {
        let _ = bcrypt::verify(password, &self.dummy_hash);
    }

    /// bcrypt est CPU-intensif: exécuté hors du thread du worker actix
    pub async fn hash_blocking(&self, password: &str) -> Result<String, String> {
        let hasher = self.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| format!("Hashing task failed: {}", e))?
    }

    pub async fn verify_blocking(&self, password: &str, stored_hash: Option<&str>) -> Result<bool, String> {
        let hasher = self.clone();
        let password = password.to_string();
        let stored_hash = stored_hash.map(str::to_string);
        tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => hasher.verify(&password, &hash),
            None => {
                hasher.verify_dummy(&password);
                Ok(false)
            }
        })
        .await
        .map_err(|e| format!("Verification task failed: {}", e))?
    }
}

pub fn is_legacy_hash(stored_hash: &str) -> bool {
    stored_hash.starts_with(LEGACY_PREFIX)
}

/// Vérifie un mot de passe contre un hash Werkzeug
/// Format: pbkdf2:sha256:iterations$salt$hash, salt et hash en base64 ou hex
fn verify_legacy(password: &str, stored_hash: &str) -> Result<bool, String> {
    let parts: Vec<&str> = stored_hash.split('$').collect();
    if parts.len() != 3 {
        return Err("Invalid hash format".to_string());
    }

    let iterations = parts[0]
        .strip_prefix(LEGACY_PREFIX)
        .ok_or("Invalid header")?
        .parse::<u32>()
        .map_err(|_| "Invalid iterations".to_string())?;

    let salt = decode_flexible(parts[1])?;
    let expected_hash = decode_flexible(parts[2])?;

    let mut computed = vec![0u8; expected_hash.len()];
    pbkdf2::<HmacSha256>(password.as_bytes(), &salt, iterations, &mut computed)
        .map_err(|e| format!("PBKDF2 hash verification failed: {}", e))?;

    // Comparaison sans sortie anticipée
    let diff = computed
        .iter()
        .zip(expected_hash.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));
    Ok(diff == 0 && computed.len() == expected_hash.len())
}

/// Décode une chaîne encodée en base64 ou hexadécimal
fn decode_flexible(input: &str) -> Result<Vec<u8>, String> {
    // Format hexadécimal (64 caractères = 32 bytes)
    if input.len() == 64 && input.chars().all(|c| c.is_ascii_hexdigit()) {
        return hex::decode(input).map_err(|e| format!("Hex decode failed: {}", e));
    }

    let padded = add_base64_padding(input);

    if let Ok(decoded) = STANDARD.decode(&padded) {
        return Ok(decoded);
    }
    if let Ok(decoded) = URL_SAFE.decode(&padded) {
        return Ok(decoded);
    }
    if let Ok(decoded) = URL_SAFE_NO_PAD.decode(input) {
        return Ok(decoded);
    }
    if let Ok(decoded) = STANDARD_NO_PAD.decode(input) {
        return Ok(decoded);
    }

    hex::decode(input).map_err(|_| "Failed to decode".to_string())
}

/// Ajoute le padding '=' manquant pour base64
fn add_base64_padding(input: &str) -> String {
    let padding_needed = (4 - (input.len() % 4)) % 4;
    format!("{}{}", input, "=".repeat(padding_needed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_hash(password: &str, salt: &[u8], iterations: u32) -> String {
        let mut key = [0u8; 32];
        pbkdf2::<HmacSha256>(password.as_bytes(), salt, iterations, &mut key).unwrap();
        format!(
            "{}{}${}${}",
            LEGACY_PREFIX,
            iterations,
            URL_SAFE_NO_PAD.encode(salt),
            URL_SAFE_NO_PAD.encode(key)
        )
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(4).unwrap();
        let hash = hasher.hash("Abcd1234").unwrap();

        assert!(hash.starts_with("$2"));
        assert!(!hash.contains("Abcd1234"));
        assert!(hasher.verify("Abcd1234", &hash).unwrap());
        assert!(!hasher.verify("Abcd12345", &hash).unwrap());
    }

    #[test]
    fn test_bytes_after_the_bcrypt_limit_are_not_ignored() {
        let hasher = PasswordHasher::new(4).unwrap();
        let prefix = format!("Aa1{}", "x".repeat(BCRYPT_MAX_BYTES - 3));
        assert_eq!(prefix.len(), BCRYPT_MAX_BYTES);

        let hash = hasher.hash(&prefix).unwrap();
        assert!(hasher.verify(&prefix, &hash).unwrap());
        assert!(!hasher.verify(&format!("{}WRONG", prefix), &hash).unwrap());
        assert!(hasher.hash(&format!("{}REAL", prefix)).is_err());
    }

    #[test]
    fn test_verify_legacy_base64() {
        let hasher = PasswordHasher::new(4).unwrap();
        let hash = legacy_hash("Secret123", b"0123456789abcdef", 1000);

        assert!(is_legacy_hash(&hash));
        assert!(hasher.verify("Secret123", &hash).unwrap());
        assert!(!hasher.verify("Secret124", &hash).unwrap());
    }

    #[test]
    fn test_verify_legacy_hex() {
        let hasher = PasswordHasher::new(4).unwrap();
        let salt = b"saltsaltsaltsalt";
        let mut key = [0u8; 32];
        pbkdf2::<HmacSha256>(b"Secret123", salt, 1000, &mut key).unwrap();
        let hash = format!("{}1000${}${}", LEGACY_PREFIX, URL_SAFE_NO_PAD.encode(salt), hex::encode(key));

        assert!(hasher.verify("Secret123", &hash).unwrap());
    }

    #[test]
    fn test_malformed_legacy_hash() {
        let hasher = PasswordHasher::new(4).unwrap();
        assert!(hasher.verify("x", "pbkdf2:sha256:abc$salt$hash").is_err());
        assert!(hasher.verify("x", "pbkdf2:sha256:1000$only-two").is_err());
    }

    #[actix_web::test]
    async fn test_verify_without_hash_is_false() {
        let hasher = PasswordHasher::new(4).unwrap();
        assert!(!hasher.verify_blocking("Abcd1234", None).await.unwrap());

        let hash = hasher.hash_blocking("Abcd1234").await.unwrap();
        assert!(hasher.verify_blocking("Abcd1234", Some(&hash)).await.unwrap());
    }
}
