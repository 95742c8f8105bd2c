use furrow_engine::{frame_ticks, GameServer, TickDecoder, TickStream, TransportError};
use furrow_protocol::{routes, GameState};
use futures_util::TryStreamExt;
use reqwest::{Client, Response, Url};
use std::io;
use std::time::Duration;
use tracing::debug;

/// [`GameServer`] over plain HTTP. Per-call deadlines are left to the controller;
/// only connection setup is bounded here.
#[derive(Debug, Clone)]
pub struct HttpGameServer {
    http: Client,
    base: Url,
    max_frame_bytes: usize,
}

impl HttpGameServer {
    pub fn new(
        mut base: Url,
        max_frame_bytes: usize,
        connect_timeout: Duration,
    ) -> anyhow::Result<Self> {
        // Routes resolve relative to the base, so a mount path must end in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("furrow/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base,
            max_frame_bytes,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, route: &'static str) -> Result<Url, TransportError> {
        self.base
            .join(route.trim_start_matches('/'))
            .map_err(|e| TransportError::http(route, e))
    }

    async fn send(
        &self,
        route: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<Response, TransportError> {
        let resp = request
            .send()
            .await
            .map_err(|e| TransportError::http(route, e))?;
        let status = resp.status();
        debug!(route, %status, "response");
        if !status.is_success() {
            return Err(TransportError::Status {
                route,
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }
}

impl GameServer for HttpGameServer {
    async fn start_game(&self) -> Result<TickStream, TransportError> {
        let url = self.url(routes::START_GAME)?;
        let resp = self.send(routes::START_GAME, self.http.post(url)).await?;
        let chunks = resp.bytes_stream().map_err(io::Error::other);
        Ok(frame_ticks(chunks, TickDecoder::new(self.max_frame_bytes)))
    }

    async fn stop_game(&self) -> Result<(), TransportError> {
        let url = self.url(routes::STOP_GAME)?;
        self.send(routes::STOP_GAME, self.http.post(url)).await?;
        Ok(())
    }

    async fn game_state(&self) -> Result<GameState, TransportError> {
        let url = self.url(routes::GAME_STATE)?;
        let resp = self.send(routes::GAME_STATE, self.http.get(url)).await?;
        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::http(routes::GAME_STATE, e))?;
        Ok(serde_json::from_slice(&body)?)
    }
}
