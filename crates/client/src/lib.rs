//! HTTP transport, terminal view and command line for the furrow client.

pub mod config;
pub mod http;
pub mod text_view;

pub use config::{Cli, Command, FileConfig, Settings};
pub use http::HttpGameServer;
pub use text_view::TextView;

use anyhow::Context;
use furrow_engine::{Controller, GameServer, SessionState, StateRenderer, View};
use std::io::Write;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::Level;

/// Installs the stderr subscriber. A second call is a no-op.
pub fn init_tracing(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn server_for(settings: &Settings) -> anyhow::Result<HttpGameServer> {
    HttpGameServer::new(
        settings.server.clone(),
        settings.max_frame_bytes,
        settings.timeouts.open,
    )
    .context("build http client")
}

/// Plays one game to the end, drawing onto `out`. Cancelling `stop` stops the game.
pub async fn watch<W: Write>(
    settings: &Settings,
    out: W,
    stop: CancellationToken,
) -> anyhow::Result<SessionState> {
    let server = server_for(settings)?;
    let view = TextView::new(out, settings.color);
    let mut controller = Controller::new(
        server,
        view,
        StateRenderer::new(settings.layout),
        settings.timeouts,
    );
    Ok(controller.play(&stop).await)
}

/// Fetches the current snapshot and draws it once.
pub async fn show_state<W: Write>(settings: &Settings, out: W) -> anyhow::Result<()> {
    let server = server_for(settings)?;
    let state = timeout(settings.timeouts.request, server.game_state())
        .await
        .context("game state request timed out")??;

    let mut view = TextView::new(out, settings.color);
    StateRenderer::new(settings.layout).render(&state, &mut view);
    view.flush();
    Ok(())
}

pub async fn stop_game(settings: &Settings) -> anyhow::Result<()> {
    let server = server_for(settings)?;
    timeout(settings.timeouts.request, server.stop_game())
        .await
        .context("stop request timed out")??;
    Ok(())
}

#[cfg(test)]
mod tests;
