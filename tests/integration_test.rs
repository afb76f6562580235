use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use memory_contest::api::PlayResponse;
use memory_contest::app::build_router;
use memory_contest::config::ContestConfig;
use memory_contest::csrf::CSRF_HEADER;
use memory_contest::identity::FixedIdentity;
use memory_contest::state::AppState;
use memory_contest::store::{GameStore, MemoryStore};
use memory_contest::types::{CardId, Click, Game};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const PLAYER: &str = "contestant@example.com";

fn test_app(config: ContestConfig) -> (Router, MemoryStore) {
    let store = MemoryStore::new();
    let state = Arc::new(AppState::new(
        Arc::new(store.clone()),
        Arc::new(FixedIdentity(PLAYER.to_string())),
        config,
    ));
    (build_router(state), store)
}

/// A browser: keeps the session cookie and the anti-forgery token
struct Browser {
    app: Router,
    cookie: Option<String>,
    csrf_token: Option<String>,
}

impl Browser {
    fn new(app: &Router) -> Self {
        Self {
            app: app.clone(),
            cookie: None,
            csrf_token: None,
        }
    }

    async fn send(&mut self, mut request: Request<Body>) -> (StatusCode, String) {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.app.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn get(&mut self, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// Load the contest page and pick up the game data and token
    async fn start(&mut self) -> Value {
        let (status, html) = self.get("/contest").await;
        assert_eq!(status, StatusCode::OK);

        self.csrf_token = Some(between(&html, "<meta name=\"csrf-token\" content=\"", "\"").to_string());
        let data = between(
            &html,
            "<script id=\"game-data\" type=\"application/json\">",
            "</script>",
        );
        serde_json::from_str(data).unwrap()
    }

    async fn post_raw(&mut self, body: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/contest/play")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = &self.csrf_token {
            builder = builder.header(CSRF_HEADER, token.as_str());
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        let (status, text) = self.send(request).await;
        (status, serde_json::from_str(&text).unwrap())
    }

    async fn click(&mut self, click: Click) -> (StatusCode, Value) {
        let body = json!({ "click": { "row": click.row, "column": click.column } });
        self.post_raw(&body.to_string()).await
    }
}

fn between<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    let from = text.find(start).expect("start marker") + start.len();
    let to = text[from..].find(end).expect("end marker") + from;
    &text[from..to]
}

async fn current_game(store: &MemoryStore) -> Game {
    let mut games = store.active_games_for_player(PLAYER).await.unwrap();
    assert_eq!(games.len(), 1, "expected exactly one active game");
    games.remove(0)
}

fn pair(game: &Game, card: CardId) -> (Click, Click) {
    let cells = game.playfield.cells_of(card);
    (cells[0], cells[1])
}

#[tokio::test]
async fn test_contest_page_embeds_game_data() {
    let (app, store) = test_app(ContestConfig::default());
    let mut browser = Browser::new(&app);

    let data = browser.start().await;
    assert_eq!(data["success"], true);
    assert_eq!(data["name"], "Memory");
    assert_eq!(data["rows"], 2);
    assert_eq!(data["cols"], 3);
    assert_eq!(data["best_score"], 0.0);
    assert_eq!(data["pieces"].as_array().unwrap().len(), 10);
    assert_eq!(data["backPiece"], "/static/img/memory/card-backside-default.png");
    assert_eq!(data["audio_win"], "/static/games/sfx/memory-win.wav");

    assert!(browser.cookie.is_some());
    assert_eq!(browser.csrf_token.as_ref().unwrap().len(), 64);

    let game = current_game(&store).await;
    assert_eq!(game.player, PLAYER);
    assert!(game.is_playable());
}

#[tokio::test]
async fn test_first_click_reveals_card() {
    let (app, store) = test_app(ContestConfig::default());
    let mut browser = Browser::new(&app);
    browser.start().await;
    let game = current_game(&store).await;

    let (status, body) = browser.click(Click::new(0, 0)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["click"],
        json!([{
            "row": 0,
            "column": 0,
            "card": game.playfield.card_at(Click::new(0, 0)).unwrap()
        }])
    );
    assert!(body.get("match").is_none());
    assert_eq!(body["csrf_token"], json!(browser.csrf_token.clone().unwrap()));
    assert!(store.turns(game.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_second_click_resolves_turn() {
    let (app, store) = test_app(ContestConfig::default());
    let mut browser = Browser::new(&app);
    browser.start().await;
    let game = current_game(&store).await;

    // (0,0) and (0,1) may hold the same card; pick a partner that differs
    let first = Click::new(0, 0);
    let first_card = game.playfield.card_at(first).unwrap();
    let second = [Click::new(0, 1), Click::new(0, 2), Click::new(1, 0)]
        .into_iter()
        .find(|c| game.playfield.card_at(*c) != Some(first_card))
        .unwrap();

    browser.click(first).await;
    let (status, body) = browser.click(second).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["match"], false);
    assert_eq!(body["click"].as_array().unwrap().len(), 2);
    assert!(body.get("completed").is_none());
    assert_eq!(store.turns(game.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_full_game_completes_after_three_matches() {
    let (app, store) = test_app(ContestConfig::default());
    let mut browser = Browser::new(&app);
    browser.start().await;
    let game = current_game(&store).await;

    let mut last = Value::Null;
    for card in 0..3 {
        let (a, b) = pair(&game, card);
        let (status, _) = browser.click(a).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = browser.click(b).await;
        assert_eq!(status, StatusCode::OK);
        let response: PlayResponse = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(response.is_match, Some(true));
        assert_eq!(response.completed.is_some(), card == 2);
        last = body;
    }

    assert_eq!(last["completed"], true);
    let stored = store.game(game.id).await.unwrap();
    assert!(stored.finished);
    assert!(!stored.active);
    let stored_score: f64 = stored.score.to_string().parse().unwrap();
    assert!((last["score"].as_f64().unwrap() - stored_score).abs() < 1e-6);
    assert_eq!(store.turns(game.id).await.unwrap().len(), 3);

    // Played far faster than any human
    assert_eq!(store.suspects().await.unwrap().len(), 1);

    // The session no longer has a game
    let (status, body) = browser.click(Click::new(0, 0)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);

    // The finished game shows up on the highscore endpoints
    let (status, text) = browser.get("/api/highscores").await;
    assert_eq!(status, StatusCode::OK);
    let highscores: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(highscores["player"], PLAYER);
    assert_eq!(highscores["best_score"]["game_id"], game.id);
    assert_eq!(highscores["highscores"].as_array().unwrap().len(), 1);
    // Its only game is suspected
    assert!(highscores["unique_highscores"].as_array().unwrap().is_empty());

    let (status, html) = browser.get("/highscore").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(PLAYER));
}

#[tokio::test]
async fn test_play_without_session_game() {
    let (app, _store) = test_app(ContestConfig::default());
    let mut browser = Browser::new(&app);

    let (status, body) = browser.click(Click::new(0, 0)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_play_finished_game_not_found() {
    let (app, store) = test_app(ContestConfig::default());
    let mut browser = Browser::new(&app);
    browser.start().await;

    let mut game = current_game(&store).await;
    game.finish(rust_decimal::Decimal::new(100, 0), 5.0);
    store.save_game(&game).await.unwrap();

    let (status, body) = browser.click(Click::new(0, 0)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["msg"].as_str().unwrap().contains("No active game"));
}

#[tokio::test]
async fn test_play_game_of_stopped_session() {
    let (app, store) = test_app(ContestConfig::default());
    let mut first_tab = Browser::new(&app);
    first_tab.start().await;

    // A second session for the same player stops the first session's game
    let mut second_tab = Browser::new(&app);
    second_tab.start().await;
    let game = current_game(&store).await;

    let (status, _) = first_tab.click(Click::new(0, 0)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = second_tab.click(Click::new(0, 0)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        store.game(game.id).await.unwrap().pending_click,
        Some(Click::new(0, 0))
    );
}

#[tokio::test]
async fn test_play_requires_csrf_token() {
    let (app, store) = test_app(ContestConfig::default());
    let mut browser = Browser::new(&app);
    browser.start().await;
    browser.csrf_token = Some("forged".to_string());

    let (status, body) = browser.click(Click::new(0, 0)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(current_game(&store).await.pending_click, None);
}

#[tokio::test]
async fn test_csrf_can_be_disabled() {
    let config = ContestConfig {
        csrf_enforced: false,
        ..ContestConfig::default()
    };
    let (app, _store) = test_app(config);
    let mut browser = Browser::new(&app);
    browser.start().await;
    browser.csrf_token = None;

    let (status, _) = browser.click(Click::new(1, 1)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_clicks_rejected() {
    let (app, store) = test_app(ContestConfig::default());
    let mut browser = Browser::new(&app);
    browser.start().await;

    let (status, body) = browser.post_raw("{\"click\": \"nope\"").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = browser.click(Click::new(5, 5)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    browser.click(Click::new(0, 0)).await;
    let (status, _) = browser.click(Click::new(0, 0)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let game = current_game(&store).await;
    assert!(store.turns(game.id).await.unwrap().is_empty());
    assert_eq!(game.pending_click, Some(Click::new(0, 0)));
}

#[tokio::test]
async fn test_col_alias_accepted() {
    let (app, store) = test_app(ContestConfig::default());
    let mut browser = Browser::new(&app);
    browser.start().await;

    let (status, body) = browser.post_raw(r#"{"click": {"row": 1, "col": 2}}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["click"][0]["column"], 2);
    assert_eq!(
        current_game(&store).await.pending_click,
        Some(Click::new(1, 2))
    );
}

#[tokio::test]
async fn test_restart_resets_session_round() {
    let (app, store) = test_app(ContestConfig::default());
    let mut browser = Browser::new(&app);
    browser.start().await;
    let first = current_game(&store).await;
    browser.click(Click::new(0, 0)).await;

    browser.start().await;
    let second = current_game(&store).await;
    assert_ne!(first.id, second.id);
    assert!(!store.game(first.id).await.unwrap().active);

    // The new game starts without a pending click
    let (status, body) = browser.click(Click::new(1, 1)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["click"].as_array().unwrap().len(), 1);
}
