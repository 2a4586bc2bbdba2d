//! Manna - request-interception caching gateway
//!
//! "Gather enough for today" - Exodus 16:4
//!
//! Manna sits between clients and a site origin, intercepting requests and
//! serving them through per-kind cache namespaces so the application keeps
//! working offline and loads fast when online.
//!
//! ## Pieces
//!
//! - **Router**: ordered URL-pattern rules deciding which requests are
//!   intercepted and with which strategy
//! - **Strategies**: CacheForever, FetchThenCache, StaleWhileRevalidate
//! - **Registry**: versioned namespace naming; bumping the build version
//!   retargets every versioned namespace at once
//! - **Gateway**: install/activate/fetch lifecycle tying it all together
//! - **Server**: hyper front-end plus `/healthz` and `/version`

pub mod config;
pub mod fetch;
pub mod gateway;
pub mod namespace;
pub mod request;
pub mod router;
pub mod server;
pub mod store;
pub mod strategy;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Args;
pub use gateway::Gateway;
pub use server::{run, AppState};
pub use types::{GatewayError, Result};
