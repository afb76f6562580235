//! Per-browser session context.
//!
//! Everything the contest keeps in the HTTP session lives in one
//! [`SessionContext`] value under a single key. Handlers load it, pass it by
//! `&mut` into the game logic and store it again before responding.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::types::{Click, GameId, PlayerId};

const SESSION_KEY: &str = "contest";

/// First turn sequence number of every game
pub const FIRST_TURN: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub player: Option<PlayerId>,
    /// Game currently being played; cleared when it completes
    pub game: Option<GameId>,
    /// Mirror of the game's pending click
    pub pending_click: Option<Click>,
    /// Sequence number for the next turn of the current game
    pub next_turn: u32,
    pub csrf_token: Option<String>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            player: None,
            game: None,
            pending_click: None,
            next_turn: FIRST_TURN,
            csrf_token: None,
        }
    }
}

impl SessionContext {
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        Ok(session
            .get::<SessionContext>(SESSION_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn store(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(SESSION_KEY, self).await
    }

    /// Take the turn sequence number for the next turn
    pub fn take_turn_seq(&mut self) -> u32 {
        let seq = self.next_turn;
        self.next_turn += 1;
        seq
    }

    /// Bind a freshly created game, dropping whatever round was in progress
    pub fn bind_game(&mut self, game: GameId) {
        self.game = Some(game);
        self.pending_click = None;
        self.next_turn = FIRST_TURN;
    }

    pub fn release_game(&mut self) -> Option<GameId> {
        self.pending_click = None;
        self.game.take()
    }
}
