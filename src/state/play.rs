use rust_decimal::Decimal;

use super::score::{average_turn_seconds, calculate_score};
use super::AppState;
use crate::error::{ContestError, ContestResult};
use crate::session::{SessionContext, FIRST_TURN};
use crate::types::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub score: Decimal,
    pub average_turn_seconds: f64,
    pub suspected: bool,
}

/// Result of evaluating one click
#[derive(Debug, Clone)]
pub enum ClickOutcome {
    /// First click of a round: the card is revealed and held
    Opened(RevealedCard),
    /// Second click of a round: the turn is stored, possibly finishing the game
    Resolved {
        turn: Turn,
        completion: Option<Completion>,
    },
}

fn is_matched(turns: &[Turn], card: CardId) -> bool {
    turns.iter().any(|t| t.is_match && t.clicks[0].card == card)
}

/// All pairs found
fn is_complete(playfield: &Playfield, turns: &[Turn]) -> bool {
    turns.iter().filter(|t| t.is_match).count() == playfield.pairs()
}

impl AppState {
    /// Advance the session's game by one click
    pub async fn play_click(
        &self,
        ctx: &mut SessionContext,
        click: Click,
    ) -> ContestResult<ClickOutcome> {
        let (Some(game_id), Some(player)) = (ctx.game, ctx.player.clone()) else {
            tracing::warn!("Game id not found in session");
            return Err(ContestError::MissingSessionState);
        };

        let Some(mut game) = self.store.active_game(game_id, &player).await? else {
            tracing::info!(
                player = %player,
                game_id,
                "No active game associated with this session"
            );
            return Err(ContestError::GameNotFound(game_id));
        };

        let card = game.playfield.card_at(click).ok_or_else(|| {
            ContestError::MalformedClick(format!(
                "cell ({}, {}) is outside the {}x{} playfield",
                click.row,
                click.column,
                game.playfield.rows(),
                game.playfield.columns()
            ))
        })?;

        let mut turns = self.store.turns(game.id).await?;
        if is_matched(&turns, card) {
            return Err(ContestError::MalformedClick(format!(
                "card at ({}, {}) is already matched",
                click.row, click.column
            )));
        }

        if ctx.pending_click != game.pending_click {
            tracing::warn!(
                game_id,
                session = ?ctx.pending_click,
                stored = ?game.pending_click,
                "Session and game disagree on the pending click, following the game"
            );
            ctx.pending_click = game.pending_click;
        }

        let Some(first) = game.pending_click else {
            game.pending_click = Some(click);
            self.store.save_game(&game).await?;
            ctx.pending_click = Some(click);
            tracing::debug!(game_id, ?click, "Opened round");
            return Ok(ClickOutcome::Opened(RevealedCard::at(click, card)));
        };

        if first == click {
            return Err(ContestError::MalformedClick(
                "the same cell was clicked twice".to_string(),
            ));
        }
        let first_card = game.playfield.card_at(first).ok_or_else(|| {
            ContestError::MalformedClick("pending click is outside the playfield".to_string())
        })?;

        let stored_next = turns.last().map(|t| t.id.seq + 1).unwrap_or(FIRST_TURN);
        if ctx.next_turn < stored_next {
            tracing::warn!(
                game_id,
                session = ctx.next_turn,
                stored = stored_next,
                "Session turn counter is behind the stored turns"
            );
            ctx.next_turn = stored_next;
        }

        let turn = Turn {
            id: TurnId {
                game: game.id,
                seq: ctx.take_turn_seq(),
            },
            clicks: [
                RevealedCard::at(first, first_card),
                RevealedCard::at(click, card),
            ],
            is_match: first_card == card,
            created: chrono::Utc::now(),
        };
        self.store.create_turn(turn.clone()).await?;

        game.pending_click = None;
        ctx.pending_click = None;
        self.store.save_game(&game).await?;
        tracing::debug!(game_id, turn = %turn.id, is_match = turn.is_match, "Resolved turn");

        turns.push(turn.clone());
        let completion = if is_complete(&game.playfield, &turns) {
            Some(self.complete_game(ctx, &mut game, &turns).await?)
        } else {
            None
        };

        Ok(ClickOutcome::Resolved { turn, completion })
    }

    /// Score, close and audit a game whose pairs have all been found
    async fn complete_game(
        &self,
        ctx: &mut SessionContext,
        game: &mut Game,
        turns: &[Turn],
    ) -> ContestResult<Completion> {
        ctx.release_game();

        let score = calculate_score(turns);
        let average = average_turn_seconds(game.created, turns);
        game.finish(score, average);
        self.store.save_game(game).await?;

        let completion = Completion {
            score: game.score,
            average_turn_seconds: average,
            suspected: self.flag_if_suspected(game).await?,
        };
        tracing::info!(
            player = %game.player,
            game_id = game.id,
            turns = turns.len(),
            score = %completion.score,
            average_turn_seconds = completion.average_turn_seconds,
            suspected = completion.suspected,
            "Game completed"
        );

        Ok(completion)
    }
}
