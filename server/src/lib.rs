//! Estate HTTP API server.
//!
//! Wires the domain services from `estate-core` to a store, exposes them
//! through an Axum router and runs the periodic stay completion sweep.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  routes + api handlers (this crate)          │  ← HTTP, JSON, bearer auth
//! ├──────────────────────────────────────────────┤
//! │  services (estate-core)                      │  ← rules, Actor checks
//! │  availability / pricing / lifecycle          │  ← pure functions
//! ├──────────────────────────────────────────────┤
//! │  stores: PostgresStore | InMemoryStore       │  ← atomic check + write
//! └──────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod auth;
pub mod config;
pub mod jobs;
pub mod routes;
pub mod state;

pub use auth::{AuthUser, hash_token};
pub use config::Config;
pub use routes::build_router;
pub use state::{AppState, DatabaseProbe};
