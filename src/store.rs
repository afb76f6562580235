//! Persistence seam for games, turns and suspected games.
//!
//! The relational database lives outside this crate; handlers only see the
//! [`GameStore`] trait. [`MemoryStore`] keeps everything in process memory.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::*;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Game {0} not found")]
    GameNotFound(GameId),

    #[error("Turn {0} already exists")]
    DuplicateTurn(TurnId),
}

#[async_trait]
pub trait GameStore: Send + Sync {
    /// Persist a new game; the store assigns its id and creation time
    async fn create_game(&self, new_game: NewGame) -> StoreResult<Game>;

    /// Game `id` if it is active, unfinished and owned by `player`
    async fn active_game(&self, id: GameId, player: &str) -> StoreResult<Option<Game>>;

    async fn active_games_for_player(&self, player: &str) -> StoreResult<Vec<Game>>;

    async fn save_game(&self, game: &Game) -> StoreResult<()>;

    /// Mark every active, unfinished game of `player` inactive. Returns how many changed.
    async fn stop_active_games(&self, player: &str) -> StoreResult<usize>;

    async fn create_turn(&self, turn: Turn) -> StoreResult<()>;

    /// Turns of a game in sequence order
    async fn turns(&self, game_id: GameId) -> StoreResult<Vec<Turn>>;

    async fn create_suspect(&self, suspect: NewSuspect) -> StoreResult<SuspectedGame>;

    async fn suspects(&self) -> StoreResult<Vec<SuspectedGame>>;

    /// Finished, inactive games, highest score first
    async fn finished_games(&self) -> StoreResult<Vec<Game>>;
}

/// In-memory store
#[derive(Clone, Default)]
pub struct MemoryStore {
    games: Arc<RwLock<HashMap<GameId, Game>>>,
    turns: Arc<RwLock<BTreeMap<TurnId, Turn>>>,
    suspects: Arc<RwLock<Vec<SuspectedGame>>>,
    next_game_id: Arc<RwLock<GameId>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up any game regardless of state
    pub async fn game(&self, id: GameId) -> Option<Game> {
        self.games.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn create_game(&self, new_game: NewGame) -> StoreResult<Game> {
        let mut next_id = self.next_game_id.write().await;
        *next_id += 1;

        let game = Game {
            id: *next_id,
            player: new_game.player,
            kind: new_game.kind,
            seed: new_game.seed,
            playfield: new_game.playfield,
            active: true,
            finished: false,
            score: Default::default(),
            average_turn_seconds: 0.0,
            created: chrono::Utc::now(),
            pending_click: None,
        };

        self.games.write().await.insert(game.id, game.clone());
        Ok(game)
    }

    async fn active_game(&self, id: GameId, player: &str) -> StoreResult<Option<Game>> {
        Ok(self
            .games
            .read()
            .await
            .get(&id)
            .filter(|g| g.player == player && g.is_playable())
            .cloned())
    }

    async fn active_games_for_player(&self, player: &str) -> StoreResult<Vec<Game>> {
        let mut games: Vec<Game> = self
            .games
            .read()
            .await
            .values()
            .filter(|g| g.player == player && g.is_playable())
            .cloned()
            .collect();
        games.sort_by_key(|g| g.created);
        Ok(games)
    }

    async fn save_game(&self, game: &Game) -> StoreResult<()> {
        let mut games = self.games.write().await;
        match games.get_mut(&game.id) {
            Some(stored) => {
                *stored = game.clone();
                Ok(())
            }
            None => Err(StoreError::GameNotFound(game.id)),
        }
    }

    async fn stop_active_games(&self, player: &str) -> StoreResult<usize> {
        let mut games = self.games.write().await;
        let mut stopped = 0;
        for game in games
            .values_mut()
            .filter(|g| g.player == player && g.is_playable())
        {
            game.active = false;
            stopped += 1;
        }
        Ok(stopped)
    }

    async fn create_turn(&self, turn: Turn) -> StoreResult<()> {
        if !self.games.read().await.contains_key(&turn.game_id()) {
            return Err(StoreError::GameNotFound(turn.game_id()));
        }

        let mut turns = self.turns.write().await;
        if turns.contains_key(&turn.id) {
            return Err(StoreError::DuplicateTurn(turn.id));
        }
        turns.insert(turn.id, turn);
        Ok(())
    }

    async fn turns(&self, game_id: GameId) -> StoreResult<Vec<Turn>> {
        let lower = TurnId {
            game: game_id,
            seq: 0,
        };
        let upper = TurnId {
            game: game_id,
            seq: u32::MAX,
        };
        Ok(self
            .turns
            .read()
            .await
            .range(lower..=upper)
            .map(|(_, turn)| turn.clone())
            .collect())
    }

    async fn create_suspect(&self, suspect: NewSuspect) -> StoreResult<SuspectedGame> {
        let mut suspects = self.suspects.write().await;
        let record = SuspectedGame {
            id: suspects.len() as SuspectId + 1,
            game_id: suspect.game_id,
            player: suspect.player,
            reason: suspect.reason,
            created: chrono::Utc::now(),
        };
        suspects.push(record.clone());
        Ok(record)
    }

    async fn suspects(&self) -> StoreResult<Vec<SuspectedGame>> {
        Ok(self.suspects.read().await.clone())
    }

    async fn finished_games(&self) -> StoreResult<Vec<Game>> {
        let mut games: Vec<Game> = self
            .games
            .read()
            .await
            .values()
            .filter(|g| g.finished && !g.active)
            .cloned()
            .collect();
        games.sort_by(|a, b| b.score.cmp(&a.score).then(a.created.cmp(&b.created)));
        Ok(games)
    }
}
