use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type GameId = u64;
pub type SuspectId = u64;
pub type PlayerId = String;
pub type CardId = u32;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    #[default]
    Memory,
}

impl GameKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            GameKind::Memory => "Memory",
        }
    }
}

/// A cell coordinate sent by the browser
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Click {
    pub row: usize,
    #[serde(alias = "col")]
    pub column: usize,
}

impl Click {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// A click together with the card that sits under it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevealedCard {
    pub row: usize,
    pub column: usize,
    pub card: CardId,
}

impl RevealedCard {
    pub fn at(click: Click, card: CardId) -> Self {
        Self {
            row: click.row,
            column: click.column,
            card,
        }
    }
}

/// Grid of card ids, stored row-major. Every card id appears exactly twice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Playfield {
    pub(crate) rows: usize,
    pub(crate) columns: usize,
    pub(crate) cells: Vec<CardId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub player: PlayerId,
    pub kind: GameKind,
    /// Seed the playfield was generated from (kept for auditing/replay)
    pub seed: String,
    pub playfield: Playfield,
    pub active: bool,
    pub finished: bool,
    pub score: Decimal,
    pub average_turn_seconds: f64,
    pub created: DateTime<Utc>,
    /// First click of the round in progress, if any
    pub pending_click: Option<Click>,
}

impl Game {
    pub fn is_playable(&self) -> bool {
        self.active && !self.finished
    }

    /// Score as shown to players: never below zero
    pub fn display_score(&self) -> Decimal {
        self.score.max(Decimal::ZERO)
    }

    pub fn finish(&mut self, score: Decimal, average_turn_seconds: f64) {
        self.score = score;
        self.average_turn_seconds = average_turn_seconds;
        self.finished = true;
        self.active = false;
    }
}

/// Fields supplied when creating a game; the store assigns id and timestamp
#[derive(Debug, Clone)]
pub struct NewGame {
    pub player: PlayerId,
    pub kind: GameKind,
    pub seed: String,
    pub playfield: Playfield,
}

/// Composite turn key: owning game plus a sequence number scoped to that game
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnId {
    pub game: GameId,
    pub seq: u32,
}

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.game, self.seq)
    }
}

/// One round: two clicks and whether they matched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub clicks: [RevealedCard; 2],
    pub is_match: bool,
    pub created: DateTime<Utc>,
}

impl Turn {
    pub fn game_id(&self) -> GameId {
        self.id.game
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspectedGame {
    pub id: SuspectId,
    pub game_id: GameId,
    pub player: PlayerId,
    pub reason: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSuspect {
    pub game_id: GameId,
    pub player: PlayerId,
    pub reason: String,
}
