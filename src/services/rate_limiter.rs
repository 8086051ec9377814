//! Limiteur de débit en mémoire pour les routes sensibles (inscription, login,
//! mot de passe oublié).
//!
//! Fenêtre fixe par clé: le premier appel ouvre la fenêtre, les suivants
//! incrémentent le compteur jusqu'à la limite. Les clés sont conservées dans un
//! LRU de capacité bornée: au-delà, l'adresse la moins récemment vue est oubliée.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

/// Service injecté dans l'état applicatif
pub trait RateLimiter: Send + Sync {
    /// `true` si l'appel est autorisé (et comptabilisé)
    fn check(&self, key: &str, limit: u32, window: Duration) -> bool;
}

/// Politique appliquée à une action
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub action: &'static str,
    pub limit: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn key(&self, client_address: &str) -> String {
        format!("{}:{}", self.action, client_address)
    }
}

pub const REGISTER_POLICY: RateLimitPolicy = RateLimitPolicy {
    action: "register",
    limit: 5,
    window: Duration::from_secs(60 * 60),
};

pub const LOGIN_POLICY: RateLimitPolicy = RateLimitPolicy {
    action: "login",
    limit: 10,
    window: Duration::from_secs(60),
};

pub const FORGOT_PASSWORD_POLICY: RateLimitPolicy = RateLimitPolicy {
    action: "forgot-password",
    limit: 3,
    window: Duration::from_secs(60 * 60),
};

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

pub struct InMemoryRateLimiter {
    entries: Mutex<LruCache<String, WindowEntry>>,
}

impl InMemoryRateLimiter {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn check_at(&self, key: &str, limit: u32, window: Duration, now: Instant) -> bool {
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get_mut(key) {
            if now < entry.reset_at {
                if entry.count < limit {
                    entry.count += 1;
                    return true;
                }
                return false;
            }
        }

        // Aucune entrée ou fenêtre écoulée: nouvelle fenêtre
        entries.put(
            key.to_string(),
            WindowEntry {
                count: 1,
                reset_at: now + window,
            },
        );
        limit > 0
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn check(&self, key: &str, limit: u32, window: Duration) -> bool {
        self.check_at(key, limit, window, Instant::now())
    }
}
