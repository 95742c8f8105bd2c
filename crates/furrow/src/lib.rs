//! Umbrella crate for furrow.
//!
//! Re-exports the engine and protocol crates so a custom front end can depend on a
//! single crate name (`furrow`) and implement [`engine::View`] and
//! [`engine::GameServer`] against it.

pub use furrow_engine as engine;
pub use furrow_protocol as protocol;
