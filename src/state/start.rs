use rust_decimal::Decimal;
use serde::Serialize;

use super::AppState;
use crate::csrf;
use crate::error::ContestResult;
use crate::session::SessionContext;
use crate::types::*;

const FONT_FAMILY: &str = "Press Start 2P";

/// Everything the browser needs to draw a fresh game
#[derive(Debug, Clone, Serialize)]
pub struct GameData {
    pub success: bool,
    pub name: String,
    pub best_score: Decimal,
    pub rows: usize,
    pub cols: usize,
    /// Card face image per card id
    pub pieces: Vec<String>,
    #[serde(rename = "backPiece")]
    pub back_piece: String,
    pub font_url: String,
    pub font_family: String,
    pub audio_win: String,
    pub audio_hit: String,
    pub audio_miss: String,
}

#[derive(Debug, Clone)]
pub struct StartedGame {
    pub player: PlayerId,
    pub game: Game,
    pub data: GameData,
    pub csrf_token: String,
}

impl AppState {
    /// Start a new game for the session's player.
    ///
    /// Any game still bound to the session is dropped, the player's other
    /// active games are stopped, and a new playfield is generated from a
    /// fresh seed.
    pub async fn start_game(&self, ctx: &mut SessionContext) -> ContestResult<StartedGame> {
        let player = self.identity.identify(ctx.player.as_deref());
        ctx.player = Some(player.clone());

        if let Some(stale) = ctx.game {
            tracing::warn!(player = %player, game_id = stale, "Found existing game in session, removing");
        }
        if let Some(click) = ctx.pending_click {
            tracing::warn!(player = %player, ?click, "Found pending click in session, removing");
        }
        ctx.release_game();

        let active = self.store.active_games_for_player(&player).await?;
        if active.len() > 1 {
            let game_ids: Vec<GameId> = active.iter().map(|g| g.id).collect();
            tracing::warn!(player = %player, ?game_ids, "Player has more than one active game");
        }

        let stopped = self.store.stop_active_games(&player).await?;
        if stopped > 0 {
            tracing::debug!(player = %player, stopped, "Stopped active games");
        }

        let seed = ulid::Ulid::new().to_string();
        let playfield = Playfield::generate(self.config.rows, self.config.columns, &seed)?;
        let game = self
            .store
            .create_game(NewGame {
                player: player.clone(),
                kind: GameKind::Memory,
                seed,
                playfield,
            })
            .await?;
        ctx.bind_game(game.id);

        let csrf_token = csrf::generate_token();
        ctx.csrf_token = Some(csrf_token.clone());

        tracing::info!(player = %player, game_id = game.id, seed = %game.seed, "Created game");

        let best_score = self
            .player_best(&player)
            .await?
            .map(|g| g.display_score())
            .unwrap_or(Decimal::ZERO);
        let data = self.game_data(&game, best_score);

        Ok(StartedGame {
            player,
            game,
            data,
            csrf_token,
        })
    }

    fn game_data(&self, game: &Game, best_score: Decimal) -> GameData {
        let config = &self.config;
        GameData {
            success: true,
            name: game.kind.display_name().to_string(),
            best_score,
            rows: game.playfield.rows(),
            cols: game.playfield.columns(),
            pieces: (1..=config.card_images)
                .map(|i| config.static_asset(&format!("img/memory/stack/{}.jpg", i)))
                .collect(),
            back_piece: config.static_asset("img/memory/card-backside-default.png"),
            font_url: config.static_asset("games/fonts/press-start-2p.css"),
            font_family: FONT_FAMILY.to_string(),
            audio_win: config.static_asset("games/sfx/memory-win.wav"),
            audio_hit: config.static_asset("games/sfx/memory-hit.wav"),
            audio_miss: config.static_asset("games/sfx/memory-miss.wav"),
        }
    }
}
