use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::AppState;
use crate::store::StoreResult;
use crate::types::*;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HighscoreEntry {
    pub game_id: GameId,
    pub player: PlayerId,
    pub score: Decimal,
    pub created: DateTime<Utc>,
}

impl From<&Game> for HighscoreEntry {
    fn from(game: &Game) -> Self {
        Self {
            game_id: game.id,
            player: game.player.clone(),
            score: game.display_score(),
            created: game.created,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Highscores {
    pub player: Option<PlayerId>,
    pub best_score: Option<HighscoreEntry>,
    pub highscores: Vec<HighscoreEntry>,
    pub unique_highscores: Vec<HighscoreEntry>,
    /// Whether there were enough eligible players to fill the unique list
    pub enough_unique: bool,
}

/// Best game per player, skipping suspected games and every player with more
/// than one suspected game. `games` must be sorted best first.
pub fn unique_highscores<'a>(
    games: &'a [Game],
    suspects: &[SuspectedGame],
    limit: usize,
) -> (Vec<&'a Game>, bool) {
    let finished: HashMap<GameId, &PlayerId> = games.iter().map(|g| (g.id, &g.player)).collect();

    let mut suspects_per_player: HashMap<&PlayerId, usize> = HashMap::new();
    let mut suspected_games: HashSet<GameId> = HashSet::new();
    for suspect in suspects {
        if let Some(player) = finished.get(&suspect.game_id) {
            *suspects_per_player.entry(*player).or_insert(0) += 1;
            suspected_games.insert(suspect.game_id);
        }
    }

    let mut seen: HashSet<&PlayerId> = HashSet::new();
    let mut winners: Vec<&Game> = Vec::new();
    for game in games {
        if winners.len() >= limit {
            break;
        }
        let disqualified = suspects_per_player.get(&game.player).copied().unwrap_or(0) > 1;
        if disqualified || suspected_games.contains(&game.id) {
            continue;
        }
        if seen.insert(&game.player) {
            winners.push(game);
        }
    }

    let enough = winners.len() >= limit;
    (winners, enough)
}

impl AppState {
    /// Best finished game of `player`
    pub async fn player_best(&self, player: &str) -> StoreResult<Option<Game>> {
        Ok(self
            .store
            .finished_games()
            .await?
            .into_iter()
            .find(|g| g.player == player))
    }

    pub async fn highscores(&self, player: Option<&str>) -> StoreResult<Highscores> {
        let games = self.store.finished_games().await?;
        let suspects = self.store.suspects().await?;
        let limit = self.config.highscore_limit;

        let best_score = player
            .and_then(|p| games.iter().find(|g| g.player == p))
            .map(HighscoreEntry::from);

        let (unique, enough_unique) = unique_highscores(&games, &suspects, limit);
        if !enough_unique {
            tracing::info!(
                found = unique.len(),
                limit,
                "There are not enough unique contestants to fill the highscore list"
            );
        }

        Ok(Highscores {
            player: player.map(str::to_string),
            best_score,
            highscores: games.iter().take(limit).map(HighscoreEntry::from).collect(),
            unique_highscores: unique.into_iter().map(HighscoreEntry::from).collect(),
            enough_unique,
        })
    }
}
