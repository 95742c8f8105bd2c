//! Client-side core for the furrow farming simulation.
//!
//! Consumes the server's tick stream, refetches snapshots and reconciles an injected
//! [`View`] against them. Nothing here knows how the view is drawn or how bytes reach
//! the client; see `furrow-client` for the HTTP and terminal implementations.

pub mod charts;
pub mod codec;
pub mod error;
pub mod logbook;
pub mod render;
pub mod session;
pub mod view;

pub use charts::{ActionCharts, ChartPoint, ChartSeries, PointColor};
pub use codec::{frame_ticks, Frame, MalformedFrame, TickDecoder, TickStream};
pub use error::TransportError;
pub use logbook::{classify, LogBook, LogLayout, LogLine, LogPanel, LogTone};
pub use render::{season_label, weather_label, CropRow, PlotRow, StateRenderer, StatsRow};
pub use session::{Controller, GameServer, SessionEnd, SessionState, Timeouts};
pub use view::{Controls, View};
