//! bidgrid-core — shared types for the bidgrid placement core.
//!
//! bidgrid places long-running process instances across a fleet of worker
//! nodes ("reps") by running auctions: the orchestrator solicits bids from
//! a pool of reps and awards the work to the best bidder, with optimistic
//! reservation to resolve races.
//!
//! This crate holds the vocabulary shared by the rep-side engine
//! (`bidgrid-rep`) and the auction drivers (`bidgrid-auction`):
//!
//! - **`resources`** — componentwise memory/disk/container accounting
//! - **`instance`** — one placed (or reserved) copy of a process
//! - **`requests`** — start/stop auction request records
//! - **`results`** — per-auction outcome records
//! - **`rules`** — auction tunables, TOML-loadable
//! - **`error`** — the error taxonomy drivers dispatch on

pub mod error;
pub mod instance;
pub mod requests;
pub mod results;
pub mod resources;
pub mod rules;

pub use error::{AuctionError, ClientError, ClientResult, RepError, RepResult, SettingsError};
pub use instance::Instance;
pub use requests::{StartAuctionRequest, StopAuctionRequest, StopInstanceRequest};
pub use results::{StartAuctionResult, StopAuctionResult};
pub use resources::Resources;
pub use rules::{Algorithm, AuctionRules, AuctionSettings, PoolTuning};
