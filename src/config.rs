//! Contest configuration loaded from environment variables

use std::net::SocketAddr;

const DEFAULT_PLAYERS: &[&str] = &[
    "player.one@example.com",
    "player.two@example.com",
    "player.three@example.com",
];
const DEFAULT_GRID: (usize, usize) = (2, 3);
const DEFAULT_CARD_IMAGES: usize = 10;
const DEFAULT_SUSPECTED_THRESHOLD: f64 = 1.0;
const DEFAULT_HIGHSCORE_LIMIT: usize = 5;
const DEFAULT_STATIC_URL: &str = "/static/";
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8000);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Grid must look like <rows>x<columns>, got '{0}'")]
    Format(String),

    #[error("Grid {rows}x{columns} has an odd number of cells")]
    OddCellCount { rows: usize, columns: usize },

    #[error("Grid {rows}x{columns} needs {needed} card images but only {available} exist")]
    NotEnoughCards {
        rows: usize,
        columns: usize,
        needed: usize,
        available: usize,
    },
}

/// Parse a grid size such as `2x3` into (rows, columns)
pub fn parse_grid(value: &str) -> Result<(usize, usize), GridError> {
    let (rows, columns): (usize, usize) = value
        .trim()
        .to_lowercase()
        .split_once('x')
        .and_then(|(r, c)| Some((r.trim().parse().ok()?, c.trim().parse().ok()?)))
        .ok_or_else(|| GridError::Format(value.to_string()))?;

    let cells = rows
        .checked_mul(columns)
        .filter(|&cells| cells > 0)
        .ok_or_else(|| GridError::Format(value.to_string()))?;
    if cells % 2 != 0 {
        return Err(GridError::OddCellCount { rows, columns });
    }
    Ok((rows, columns))
}

#[derive(Debug, Clone)]
pub struct ContestConfig {
    /// Pool the stand-in identity provider draws players from
    pub players: Vec<String>,
    pub rows: usize,
    pub columns: usize,
    /// Number of card face images available under `img/memory/stack/`
    pub card_images: usize,
    /// Average seconds per turn below which a finished game is flagged
    pub suspected_threshold: f64,
    pub highscore_limit: usize,
    pub static_url: String,
    pub csrf_enforced: bool,
    pub secure_cookies: bool,
    pub bind_addr: SocketAddr,
}

impl Default for ContestConfig {
    fn default() -> Self {
        Self {
            players: DEFAULT_PLAYERS.iter().map(|p| p.to_string()).collect(),
            rows: DEFAULT_GRID.0,
            columns: DEFAULT_GRID.1,
            card_images: DEFAULT_CARD_IMAGES,
            suspected_threshold: DEFAULT_SUSPECTED_THRESHOLD,
            highscore_limit: DEFAULT_HIGHSCORE_LIMIT,
            static_url: DEFAULT_STATIC_URL.to_string(),
            csrf_enforced: true,
            secure_cookies: false,
            bind_addr: SocketAddr::from(DEFAULT_BIND_ADDR),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_flag(name: &str, default: bool) -> bool {
    env_var(name)
        .map(|v| v != "0" && v.to_lowercase() != "false")
        .unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env_var(name) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, "Invalid value, using default");
            default
        }),
        None => default,
    }
}

impl ContestConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let players: Vec<String> = env_var("CONTEST_PLAYERS")
            .map(|raw| {
                raw.split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let players = if players.is_empty() {
            defaults.players.clone()
        } else {
            players
        };

        let card_images = env_parsed("CONTEST_CARD_IMAGES", defaults.card_images);

        let default_grid = (defaults.rows, defaults.columns);
        let grid = match env_var("CONTEST_GRID").map(|raw| parse_grid(&raw)) {
            Some(Ok(grid)) => grid,
            Some(Err(e)) => {
                tracing::warn!("CONTEST_GRID rejected: {}. Using default", e);
                default_grid
            }
            None => default_grid,
        };

        // Every card id on the grid needs a face image
        let ((rows, columns), card_images) = match check_cards(grid, card_images) {
            Ok(grid) => (grid, card_images),
            Err(e) if grid != default_grid => {
                tracing::warn!("CONTEST_GRID rejected: {}. Using default", e);
                match check_cards(default_grid, card_images) {
                    Ok(grid) => (grid, card_images),
                    Err(e) => {
                        tracing::warn!("{}. Using default card images", e);
                        (default_grid, defaults.card_images)
                    }
                }
            }
            Err(e) => {
                tracing::warn!("{}. Using default card images", e);
                (default_grid, defaults.card_images)
            }
        };

        let config = Self {
            players,
            rows,
            columns,
            card_images,
            suspected_threshold: env_parsed("SUSPECTED_THRESHOLD", defaults.suspected_threshold),
            highscore_limit: env_parsed("HIGHSCORE_LIMIT", defaults.highscore_limit),
            static_url: env_var("STATIC_URL").unwrap_or(defaults.static_url),
            csrf_enforced: env_flag("CSRF_ENFORCED", defaults.csrf_enforced),
            secure_cookies: env_flag("SECURE_COOKIES", defaults.secure_cookies),
            bind_addr: env_parsed("BIND_ADDR", defaults.bind_addr),
        };

        if !config.csrf_enforced {
            tracing::warn!("Anti-forgery check DISABLED for the play endpoint");
        }

        tracing::info!(
            players = config.players.len(),
            rows = config.rows,
            columns = config.columns,
            suspected_threshold = config.suspected_threshold,
            highscore_limit = config.highscore_limit,
            "Contest config loaded"
        );

        config
    }

    /// URL of a static asset under the configured prefix
    pub fn static_asset(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.static_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn check_cards(
    (rows, columns): (usize, usize),
    available: usize,
) -> Result<(usize, usize), GridError> {
    let needed = rows.saturating_mul(columns) / 2;
    if needed > available {
        return Err(GridError::NotEnoughCards {
            rows,
            columns,
            needed,
            available,
        });
    }
    Ok((rows, columns))
}
