mod highscore;
mod play;
mod score;
mod start;

pub use highscore::{unique_highscores, HighscoreEntry, Highscores};
pub use play::{ClickOutcome, Completion};
pub use score::{average_turn_seconds, calculate_score, suspicion_reason};
pub use start::{GameData, StartedGame};

use std::sync::Arc;

use crate::config::ContestConfig;
use crate::identity::IdentityProvider;
use crate::store::GameStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GameStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub config: ContestConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn GameStore>,
        identity: Arc<dyn IdentityProvider>,
        config: ContestConfig,
    ) -> Self {
        Self {
            store,
            identity,
            config,
        }
    }
}
