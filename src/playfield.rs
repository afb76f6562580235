//! Deterministic playfield generation.
//!
//! A seed string is hashed into a 32-byte RNG seed, so the same seed and
//! dimensions always produce the same layout. That lets a finished game be
//! replayed or audited from its stored seed alone.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use sha2::{Digest, Sha256};
use std::time::Instant;

use crate::types::{CardId, Click, Playfield};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayfieldError {
    #[error("Playfield must have at least one row and one column")]
    EmptyGrid,

    #[error("Playfield {rows}x{columns} has an odd number of cells")]
    OddCellCount { rows: usize, columns: usize },

    #[error("Playfield {rows}x{columns} is too large")]
    TooLarge { rows: usize, columns: usize },
}

fn rng_from_seed(seed: &str) -> StdRng {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    let digest = hasher.finalize();
    let mut seed_bytes = [0u8; 32];
    seed_bytes.copy_from_slice(&digest[..32]);
    StdRng::from_seed(seed_bytes)
}

impl Playfield {
    /// Lay out `rows * columns / 2` card pairs on the grid, shuffled by `seed`.
    pub fn generate(rows: usize, columns: usize, seed: &str) -> Result<Self, PlayfieldError> {
        if rows == 0 || columns == 0 {
            return Err(PlayfieldError::EmptyGrid);
        }
        let cell_count = rows
            .checked_mul(columns)
            .ok_or(PlayfieldError::TooLarge { rows, columns })?;
        if cell_count % 2 != 0 {
            return Err(PlayfieldError::OddCellCount { rows, columns });
        }
        let pairs = CardId::try_from(cell_count / 2)
            .map_err(|_| PlayfieldError::TooLarge { rows, columns })?;

        let started = Instant::now();
        let mut cells: Vec<CardId> = (0..pairs).flat_map(|card| [card, card]).collect();
        cells.shuffle(&mut rng_from_seed(seed));

        tracing::debug!(
            rows,
            columns,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Generated playfield"
        );

        Ok(Self {
            rows,
            columns,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of distinct cards, i.e. matches needed to finish
    pub fn pairs(&self) -> usize {
        self.cells.len() / 2
    }

    /// Card under a cell, or `None` when the click is outside the grid
    pub fn card_at(&self, click: Click) -> Option<CardId> {
        if click.row >= self.rows || click.column >= self.columns {
            return None;
        }
        self.cells.get(click.row * self.columns + click.column).copied()
    }

    /// The layout as a list of rows
    pub fn grid(&self) -> Vec<Vec<CardId>> {
        self.cells
            .chunks(self.columns)
            .map(|row| row.to_vec())
            .collect()
    }

    /// Both cells holding `card`
    pub fn cells_of(&self, card: CardId) -> Vec<Click> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == card)
            .map(|(i, _)| Click::new(i / self.columns, i % self.columns))
            .collect()
    }
}
