use super::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use clap::Parser;
use furrow_engine::{LogLayout, SessionEnd, Timeouts};
use furrow_protocol::{GameState, PlayerId};
use futures_util::{stream, StreamExt};
use reqwest::Url;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct Fake {
    chunks: Vec<String>,
    hang: bool,
    state: GameState,
    started: AtomicBool,
    stops: AtomicUsize,
    fetches: AtomicUsize,
}

impl Fake {
    fn new(chunks: Vec<String>) -> Self {
        Self {
            chunks,
            hang: false,
            state: snapshot(),
            started: AtomicBool::new(false),
            stops: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }

    fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

async fn serve_start(State(fake): State<Arc<Fake>>) -> Response {
    fake.started.store(true, Ordering::SeqCst);
    let chunks = stream::iter(
        fake.chunks
            .clone()
            .into_iter()
            .map(|c| Ok::<_, io::Error>(Bytes::from(c))),
    );
    if fake.hang {
        Body::from_stream(chunks.chain(stream::pending())).into_response()
    } else {
        Body::from_stream(chunks).into_response()
    }
}

async fn serve_stop(State(fake): State<Arc<Fake>>) -> Json<serde_json::Value> {
    fake.stops.fetch_add(1, Ordering::SeqCst);
    fake.started.store(false, Ordering::SeqCst);
    Json(serde_json::json!({ "message": "Game stopped" }))
}

async fn serve_state(State(fake): State<Arc<Fake>>) -> Response {
    if !fake.started.load(Ordering::SeqCst) {
        let detail = serde_json::json!({ "detail": "Game not started" });
        return (StatusCode::BAD_REQUEST, Json(detail)).into_response();
    }
    fake.fetches.fetch_add(1, Ordering::SeqCst);
    Json(fake.state.clone()).into_response()
}

async fn spawn_fake(fake: Arc<Fake>) -> Url {
    let app = Router::new()
        .route("/start_game", post(serve_start))
        .route("/stop_game", post(serve_stop))
        .route("/game_state", get(serve_state))
        .with_state(fake);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/")).unwrap()
}

fn snapshot() -> GameState {
    serde_json::from_value(serde_json::json!({
        "current_day": 5,
        "player1": {
            "season": "Summer", "weather": "Drought", "money": 870, "energy": 62.5,
            "plots": [{"soil_quality": 0.9, "crop": {"type": "Corn", "growth_progress": 0.25}}],
            "harvested_crops": {"Wheat": 2}
        },
        "player2": {
            "season": "Summer", "weather": "Drought", "money": 1010, "energy": 80,
            "plots": [{"soil_quality": 0.7, "crop": null}]
        },
        "game_log": [
            "Day 4, Player 1: Planted Corn in plot 1.",
            "Day 4, Player 2: Insufficient energy to harvest."
        ]
    }))
    .unwrap()
}

fn settings(server: Url) -> Settings {
    Settings {
        server,
        layout: LogLayout::ByPlayer,
        timeouts: Timeouts {
            open: Duration::from_secs(5),
            read: Duration::from_secs(5),
            request: Duration::from_secs(5),
        },
        max_frame_bytes: 64 * 1024,
        color: false,
        log_level: Level::WARN,
    }
}

#[tokio::test]
async fn full_game_over_http() {
    let fake = Arc::new(Fake::new(vec![
        // Two days back to back with no delimiter, then a newline-terminated one.
        concat!(
            r#"{"day":1,"player1_action":{"name":"Plant","parameters":["Corn","1"]},"player2_action":""}"#,
            r#"{"day":2,"player1_action":{"name":"Rest","parameters":[]},"player2_action":{"name":"Harvest","parameters":["1"]}}"#,
        )
        .to_string(),
        "\n{\"day\":3,\"game_over\":true,\"winner\":\"Player 2\",".to_string(),
        "\"player1_score\":870,\"player2_score\":1010}\n".to_string(),
    ]));
    let url = spawn_fake(fake.clone()).await;

    let mut out = Vec::new();
    let session = watch(&settings(url), &mut out, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(session.end(), Some(&SessionEnd::GameOver));
    assert_eq!(session.last_day(), Some(3));
    assert!(!session.is_running());
    let p1 = session.charts().series(PlayerId::One);
    assert_eq!(p1.labels(), ["Plant", "Rest"]);
    let p2 = session.charts().series(PlayerId::Two);
    assert_eq!(p2.points().len(), 1);
    // The day's log ended in a failure for player 2.
    assert!(!p2.points()[0].success);
    // One refresh per day plus the final one.
    assert_eq!(fake.fetches(), 3);
    assert_eq!(fake.stops(), 0);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Game over on day 3: Player 2 (Player 1 870, Player 2 1010)"));
    assert!(text.contains("☀️ Summer  🏜️ Drought"));
    assert!(text.contains("-- Player 2 log --"));
}

#[tokio::test]
async fn game_without_actions_still_ends_on_the_outcome() {
    let fake = Arc::new(Fake::new(vec![concat!(
        r#"{"day":1,"message":"Processed day 1"}"#,
        r#"{"day":2,"game_over":true,"winner":"Player 2","player1_score":870,"player2_score":1010}"#,
    )
    .to_string()]));
    let url = spawn_fake(fake.clone()).await;

    let mut out = Vec::new();
    let session = watch(&settings(url), &mut out, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(session.end(), Some(&SessionEnd::GameOver));
    assert!(session.charts().is_empty());

    let text = String::from_utf8(out).unwrap();
    let last_screen = text.rsplit("[start: ").next().unwrap();
    assert!(last_screen.starts_with("on] [stop: off]"), "{last_screen}");
    assert!(
        last_screen.contains("Game over on day 2: Player 2 (Player 1 870, Player 2 1010)"),
        "{last_screen}"
    );
}

#[tokio::test]
async fn cancelling_the_watch_notifies_the_server() {
    let fake = Arc::new(Fake::new(vec![r#"{"day":1}"#.to_string()]).hanging());
    let url = spawn_fake(fake.clone()).await;

    let stop = CancellationToken::new();
    let trigger = stop.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let session = watch(&settings(url), io::sink(), stop).await.unwrap();
    assert_eq!(session.end(), Some(&SessionEnd::Stopped));
    assert_eq!(session.last_day(), Some(1));
    assert!(!session.has_open_stream());
    assert_eq!(fake.stops(), 1);
}

#[tokio::test]
async fn unreachable_server_fails_the_session() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("http://{addr}/")).unwrap();
    let session = watch(&settings(url), io::sink(), CancellationToken::new())
        .await
        .unwrap();
    assert!(matches!(session.end(), Some(SessionEnd::Failed(_))));
    assert!(session.controls().start_enabled);
}

#[tokio::test]
async fn state_before_start_reports_the_status() {
    let url = spawn_fake(Arc::new(Fake::new(Vec::new()))).await;
    let err = show_state(&settings(url), io::sink()).await.unwrap_err();
    assert!(err.to_string().contains("status 400"), "{err}");
}

#[tokio::test]
async fn state_command_draws_the_snapshot() {
    let fake = Fake::new(Vec::new());
    fake.started.store(true, Ordering::SeqCst);
    let url = spawn_fake(Arc::new(fake)).await;

    let mut out = Vec::new();
    show_state(&settings(url), &mut out).await.unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Day 5"));
    assert!(text.contains("money 870  energy 62.5"));
    assert!(text.contains("harvested: Wheat 2"));
    assert!(text.contains("plot  1  soil 0.70  vacant"));
    assert!(text.contains("✗ Day 4, Player 2: Insufficient energy to harvest."));
}

#[tokio::test]
async fn stop_command_reaches_the_server() {
    let fake = Arc::new(Fake::new(Vec::new()));
    let url = spawn_fake(fake.clone()).await;
    stop_game(&settings(url)).await.unwrap();
    assert_eq!(fake.stops(), 1);
}

#[test]
fn base_url_gains_a_trailing_slash() {
    let base = Url::parse("http://127.0.0.1:8000/farm").unwrap();
    let server = HttpGameServer::new(base, 1024, Duration::from_secs(1)).unwrap();
    assert_eq!(server.base().as_str(), "http://127.0.0.1:8000/farm/");
}

#[test]
fn empty_config_file_is_all_defaults() {
    let file = FileConfig::parse("  \n").unwrap();
    assert!(file.server.is_none());
    assert!(file.log_layout.is_none());
}

#[test]
fn unknown_config_keys_are_rejected() {
    assert!(FileConfig::parse("sever: http://typo\n").is_err());
}

#[test]
fn command_line_wins_over_config_file() {
    let file = FileConfig::parse(
        "server: http://file.example:9000\nlog_layout: interleaved\nread_timeout_secs: 30\ncolor: false\nlog_level: debug\n",
    )
    .unwrap();
    let cli = Cli::try_parse_from([
        "furrow",
        "--server",
        "http://cli.example:1",
        "--read-timeout",
        "7",
        "state",
    ])
    .unwrap();

    let settings = Settings::resolve(&cli, file).unwrap();
    assert_eq!(settings.server.as_str(), "http://cli.example:1/");
    assert_eq!(settings.layout, LogLayout::Interleaved);
    assert_eq!(settings.timeouts.read, Duration::from_secs(7));
    assert_eq!(settings.timeouts.open, Timeouts::default().open);
    assert!(!settings.color);
    assert_eq!(settings.log_level, Level::DEBUG);
    assert_eq!(cli.command, Some(Command::State));
}

#[test]
fn verbosity_flags_override_configured_level() {
    let file = FileConfig::parse("log_level: error\n").unwrap();
    let cli = Cli::try_parse_from(["furrow", "-vv", "--log-layout", "combined"]).unwrap();
    let settings = Settings::resolve(&cli, file).unwrap();
    assert_eq!(settings.log_level, Level::DEBUG);
    assert_eq!(settings.layout, LogLayout::Combined);
    assert_eq!(cli.command.unwrap_or_default(), Command::Watch);
}

#[test]
fn invalid_server_url_is_an_error() {
    let cli = Cli::try_parse_from(["furrow", "--server", "not a url"]).unwrap();
    assert!(Settings::resolve(&cli, FileConfig::default()).is_err());
}
