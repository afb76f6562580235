//! Player identity for a contest session.
//!
//! There is no real login; [`RandomPoolIdentity`] hands out players from a
//! configured pool. Anything that can name a player can replace it.

use rand::seq::IndexedRandom;

use crate::types::PlayerId;

const FALLBACK_PLAYER: &str = "guest@example.com";

pub trait IdentityProvider: Send + Sync {
    /// Decide which player this session plays as. `current` is the player
    /// already bound to the session, if any.
    fn identify(&self, current: Option<&str>) -> PlayerId;
}

/// Picks a random player from a fixed pool, keeping a session's player while
/// it is still part of the pool
#[derive(Debug, Clone)]
pub struct RandomPoolIdentity {
    pool: Vec<PlayerId>,
}

impl RandomPoolIdentity {
    pub fn new(pool: Vec<PlayerId>) -> Self {
        if pool.is_empty() {
            tracing::warn!("Empty player pool, every session plays as {}", FALLBACK_PLAYER);
        }
        Self { pool }
    }
}

impl IdentityProvider for RandomPoolIdentity {
    fn identify(&self, current: Option<&str>) -> PlayerId {
        if let Some(current) = current {
            if self.pool.iter().any(|p| p == current) {
                return current.to_string();
            }
        }

        self.pool
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| FALLBACK_PLAYER.to_string())
    }
}

/// Always the same player
#[derive(Debug, Clone)]
pub struct FixedIdentity(pub PlayerId);

impl IdentityProvider for FixedIdentity {
    fn identify(&self, _current: Option<&str>) -> PlayerId {
        self.0.clone()
    }
}
