//! Minimal HTML pages. The browser-side game reads its configuration from
//! the JSON embedded in the contest page.

use std::fmt::Write;

use crate::state::{HighscoreEntry, Highscores, StartedGame};

/// Id of the `<script>` element holding the game configuration
pub const GAME_DATA_ID: &str = "game-data";

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON that is safe inside a `<script>` element
fn script_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn page(title: &str, head: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n{}</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        head,
        body
    )
}

pub fn contest_page(started: &StartedGame) -> Result<String, serde_json::Error> {
    let game_data = serde_json::to_string(&started.data)?;

    let head = format!(
        "<meta name=\"csrf-token\" content=\"{}\">\n<link rel=\"stylesheet\" href=\"{}\">\n",
        escape_html(&started.csrf_token),
        escape_html(&started.data.font_url)
    );
    let body = format!(
        "<h1>{}</h1>\n<p class=\"player\">{}</p>\n<div id=\"playfield\"></div>\n<script id=\"{}\" type=\"application/json\">{}</script>\n",
        escape_html(&started.data.name),
        escape_html(&started.player),
        GAME_DATA_ID,
        script_json(&game_data)
    );

    Ok(page(&started.data.name, &head, &body))
}

fn score_table(class: &str, entries: &[HighscoreEntry]) -> String {
    let mut table = format!(
        "<table class=\"{}\">\n<tr><th>#</th><th>Player</th><th>Score</th></tr>\n",
        class
    );
    for (rank, entry) in entries.iter().enumerate() {
        // Writing to a String cannot fail
        let _ = writeln!(
            table,
            "<tr><td>{}</td><td>{}</td><td>{:.3}</td></tr>",
            rank + 1,
            escape_html(&entry.player),
            entry.score
        );
    }
    table.push_str("</table>\n");
    table
}

pub fn highscore_page(highscores: &Highscores) -> String {
    let mut body = String::from("<h1>Highscores</h1>\n");

    if let Some(player) = &highscores.player {
        let best = highscores
            .best_score
            .as_ref()
            .map(|entry| format!("{:.3}", entry.score))
            .unwrap_or_else(|| "no finished games yet".to_string());
        let _ = writeln!(
            body,
            "<p class=\"best-score\">{}: {}</p>",
            escape_html(player),
            best
        );
    }

    body.push_str("<h2>Top scores</h2>\n");
    body.push_str(&score_table("highscores", &highscores.highscores));
    body.push_str("<h2>Top players</h2>\n");
    body.push_str(&score_table("unique-highscores", &highscores.unique_highscores));

    page("Highscores", "", &body)
}
