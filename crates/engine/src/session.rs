//! Game session lifecycle: start, tick consumption, stop.
//!
//! All lifecycle state lives in [`SessionState`], which each operation takes by
//! value and hands back. The controller itself only holds its collaborators.

use crate::charts::ActionCharts;
use crate::codec::{Frame, TickStream};
use crate::error::TransportError;
use crate::render::StateRenderer;
use crate::view::{Controls, View};
use furrow_protocol::{GameOutcome, GameState, GameTick, PlayerId};
use futures_util::StreamExt;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// The three server endpoints the client depends on.
pub trait GameServer {
    /// `POST /start_game`: opens the tick stream.
    fn start_game(&self) -> impl Future<Output = Result<TickStream, TransportError>> + Send;
    /// `POST /stop_game`.
    fn stop_game(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
    /// `GET /game_state`.
    fn game_state(&self) -> impl Future<Output = Result<GameState, TransportError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    GameOver,
    Stopped,
    /// The server closed the stream without a game-over tick.
    StreamClosed,
    Failed(String),
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameOver => f.write_str("game over"),
            Self::Stopped => f.write_str("stopped"),
            Self::StreamClosed => f.write_str("stream closed by server"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

pub struct SessionState {
    running: bool,
    ticks: Option<TickStream>,
    charts: ActionCharts,
    last_day: Option<u32>,
    skipped_frames: usize,
    outcome: Option<GameOutcome>,
    end: Option<SessionEnd>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("running", &self.running)
            .field("stream_open", &self.ticks.is_some())
            .field("charts", &self.charts)
            .field("last_day", &self.last_day)
            .field("skipped_frames", &self.skipped_frames)
            .field("outcome", &self.outcome)
            .field("end", &self.end)
            .finish()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            running: false,
            ticks: None,
            charts: ActionCharts::new(),
            last_day: None,
            skipped_frames: 0,
            outcome: None,
            end: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn controls(&self) -> Controls {
        if self.running {
            Controls::RUNNING
        } else {
            Controls::IDLE
        }
    }

    pub fn has_open_stream(&self) -> bool {
        self.ticks.is_some()
    }

    pub fn charts(&self) -> &ActionCharts {
        &self.charts
    }

    pub fn last_day(&self) -> Option<u32> {
        self.last_day
    }

    /// Frames dropped because they did not decode to a tick.
    pub fn skipped_frames(&self) -> usize {
        self.skipped_frames
    }

    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    pub fn end(&self) -> Option<&SessionEnd> {
        self.end.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub open: Duration,
    pub read: Duration,
    pub request: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            open: Duration::from_secs(10),
            // A simulated day waits on both players' decisions server-side.
            read: Duration::from_secs(120),
            request: Duration::from_secs(10),
        }
    }
}

pub struct Controller<S, V> {
    server: S,
    view: V,
    renderer: StateRenderer,
    timeouts: Timeouts,
}

impl<S: GameServer, V: View> Controller<S, V> {
    pub fn new(server: S, view: V, renderer: StateRenderer, timeouts: Timeouts) -> Self {
        Self {
            server,
            view,
            renderer,
            timeouts,
        }
    }

    pub fn server(&self) -> &S {
        &self.server
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn into_view(self) -> V {
        self.view
    }

    /// Starts a session and consumes it until game over, stop or failure.
    pub async fn play(&mut self, stop: &CancellationToken) -> SessionState {
        let session = self.start(SessionState::new()).await;
        self.consume(session, stop).await
    }

    /// No-op while a game is in progress. Otherwise resets the displays and the
    /// charts and opens the tick stream.
    pub async fn start(&mut self, session: SessionState) -> SessionState {
        if session.running {
            debug!("start ignored: a game is already in progress");
            return session;
        }

        let mut session = SessionState::new();
        session.running = true;
        self.view.render_controls(Controls::RUNNING);
        self.renderer.clear(&mut self.view);
        self.view.render_charts(&session.charts);
        self.view.flush();

        info!("starting game");
        match timeout(self.timeouts.open, self.server.start_game()).await {
            Ok(Ok(ticks)) => {
                session.ticks = Some(ticks);
                session
            }
            Ok(Err(err)) => self.fail(session, err).await,
            Err(_) => {
                let err = TransportError::Timeout {
                    waiting_for: "tick stream to open",
                    after: self.timeouts.open,
                };
                self.fail(session, err).await
            }
        }
    }

    /// No-op when no game is in progress. Otherwise the controls flip back to idle
    /// first, then the server is told (best effort) and the stream is dropped.
    pub async fn stop(&mut self, session: SessionState) -> SessionState {
        self.halt(session, SessionEnd::Stopped).await
    }

    /// Reads ticks until the session ends. Cancelling the token behaves like
    /// [`Controller::stop`].
    pub async fn consume(
        &mut self,
        mut session: SessionState,
        stop: &CancellationToken,
    ) -> SessionState {
        while session.running {
            let Some(ticks) = session.ticks.as_mut() else {
                return self.finish(session, SessionEnd::StreamClosed);
            };

            let read = tokio::select! {
                biased;
                _ = stop.cancelled() => None,
                read = timeout(self.timeouts.read, ticks.next()) => Some(read),
            };

            let read = match read {
                Some(read) if !stop.is_cancelled() => read,
                _ => {
                    info!("stop requested");
                    return self.stop(session).await;
                }
            };

            match read {
                Err(_) => {
                    let err = TransportError::Timeout {
                        waiting_for: "next tick",
                        after: self.timeouts.read,
                    };
                    return self.fail(session, err).await;
                }
                Ok(None) => {
                    info!("tick stream closed before game over");
                    return self.finish(session, SessionEnd::StreamClosed);
                }
                Ok(Some(Err(err))) => return self.fail(session, err.into()).await,
                Ok(Some(Ok(Frame::Malformed(bad)))) => {
                    session.skipped_frames += 1;
                    warn!(
                        reason = %bad.reason,
                        discarded = bad.discarded,
                        "skipping malformed tick"
                    );
                }
                Ok(Some(Ok(Frame::Tick(tick)))) => {
                    session = self.apply_tick(session, tick, stop).await;
                }
            }
        }
        session
    }

    async fn apply_tick(
        &mut self,
        mut session: SessionState,
        tick: GameTick,
        stop: &CancellationToken,
    ) -> SessionState {
        session.last_day = Some(tick.day);

        if tick.game_over {
            info!(day = tick.day, winner = ?tick.winner, "game over");
            session.outcome = tick.outcome();
            let session = self.finish(session, SessionEnd::GameOver);
            match self.fetch_state().await {
                Ok(state) => {
                    self.renderer.render(&state, &mut self.view);
                }
                Err(err) => warn!(error = %err, "final state refresh failed"),
            }
            if let Some(outcome) = &session.outcome {
                self.view.render_outcome(outcome);
            }
            self.view.render_charts(&session.charts);
            self.view.flush();
            return session;
        }

        debug!(day = tick.day, "day processed");
        self.view.render_day(tick.day);
        let fetched = tokio::select! {
            biased;
            _ = stop.cancelled() => None,
            fetched = self.fetch_state() => Some(fetched),
        };
        // A stop that lands during the fetch wins over whatever the fetch returned.
        let state = match fetched {
            Some(Ok(state)) if !stop.is_cancelled() => state,
            Some(Err(err)) if !stop.is_cancelled() => return self.fail(session, err).await,
            _ => {
                info!("stop requested");
                return self.stop(session).await;
            }
        };

        let book = self.renderer.render(&state, &mut self.view);
        for player in PlayerId::ALL {
            if let Some(action) = tick.action(player) {
                session
                    .charts
                    .record(tick.day, player, action, book.last_entry_failed(player));
            }
        }
        self.view.render_charts(&session.charts);
        self.view.flush();
        session
    }

    async fn fetch_state(&self) -> Result<GameState, TransportError> {
        match timeout(self.timeouts.request, self.server.game_state()).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                waiting_for: "game state",
                after: self.timeouts.request,
            }),
        }
    }

    async fn halt(&mut self, mut session: SessionState, end: SessionEnd) -> SessionState {
        if !session.running {
            debug!("stop ignored: no game in progress");
            return session;
        }
        session.running = false;
        session.end = Some(end);
        self.view.render_controls(Controls::IDLE);
        self.view.flush();

        match timeout(self.timeouts.request, self.server.stop_game()).await {
            Ok(Ok(())) => info!("server acknowledged stop"),
            Ok(Err(err)) => warn!(error = %err, "stop notification failed"),
            Err(_) => warn!(after = ?self.timeouts.request, "stop notification timed out"),
        }
        if session.ticks.take().is_some() {
            debug!("tick stream cancelled");
        }
        session
    }

    async fn fail(&mut self, session: SessionState, err: TransportError) -> SessionState {
        error!(error = %err, "session ended by transport failure");
        self.halt(session, SessionEnd::Failed(err.to_string())).await
    }

    // Ends a session the server already considers over; no stop notification.
    fn finish(&mut self, mut session: SessionState, end: SessionEnd) -> SessionState {
        session.running = false;
        session.ticks = None;
        session.end = Some(end);
        self.view.render_controls(Controls::IDLE);
        self.view.flush();
        session
    }
}
