use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::AppState;
use crate::store::StoreResult;
use crate::types::*;

/// Points for every matched turn
const CORRECT_AWARD: f64 = 150.0;
/// Share of the award lost per card of a missed turn
const MISS_PENALTY_RATE: f64 = 0.11123;
/// Seconds from first to last turn before the time bonus runs out
const TIME_ALLOWANCE_SECONDS: f64 = 60.0;
const POINTS_PER_SECOND_LEFT: f64 = 5.123214;

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

/// Score for a finished game from its turns (in order), rounded to 3 decimals.
///
/// Matched turns earn [`CORRECT_AWARD`], each missed turn costs twice the miss
/// penalty, and every second left of the allowance between the first and last
/// turn adds [`POINTS_PER_SECOND_LEFT`]. Overrunning the allowance subtracts.
pub fn calculate_score(turns: &[Turn]) -> Decimal {
    let (Some(first), Some(last)) = (turns.first(), turns.last()) else {
        return Decimal::ZERO;
    };

    let total = turns.len() as f64;
    let correct = turns.iter().filter(|t| t.is_match).count() as f64;
    let seconds_left = TIME_ALLOWANCE_SECONDS - seconds_between(first.created, last.created);

    let mut points = correct * CORRECT_AWARD;
    points -= (total - correct) * 2.0 * CORRECT_AWARD * MISS_PENALTY_RATE;
    points += seconds_left * POINTS_PER_SECOND_LEFT;

    Decimal::from_f64_retain(points)
        .unwrap_or_default()
        .round_dp(3)
}

/// Seconds per turn from game creation to the last turn
pub fn average_turn_seconds(game_created: DateTime<Utc>, turns: &[Turn]) -> f64 {
    match turns.last() {
        Some(last) => seconds_between(game_created, last.created) / turns.len() as f64,
        None => 0.0,
    }
}

/// Why a finished game looks automated, if it does
pub fn suspicion_reason(game: &Game, threshold: f64) -> Option<String> {
    if game.average_turn_seconds < threshold {
        Some(format!(
            "Game {} by {} averaged {:.3} s per turn, below the {:.3} s threshold",
            game.id, game.player, game.average_turn_seconds, threshold
        ))
    } else {
        None
    }
}

impl AppState {
    /// Record a suspected game when the finished game was played too fast.
    /// Returns whether it was flagged.
    pub(super) async fn flag_if_suspected(&self, game: &Game) -> StoreResult<bool> {
        let Some(reason) = suspicion_reason(game, self.config.suspected_threshold) else {
            return Ok(false);
        };

        tracing::warn!(game_id = game.id, player = %game.player, "{}", reason);
        self.store
            .create_suspect(NewSuspect {
                game_id: game.id,
                player: game.player.clone(),
                reason,
            })
            .await?;
        Ok(true)
    }
}
