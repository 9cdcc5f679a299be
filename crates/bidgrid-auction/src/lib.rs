//! bidgrid-auction — auction drivers for the bidgrid placement core.
//!
//! The drivers coordinate bids across a fleet of reps:
//!
//! - **`client`** — the `RepPoolClient` seam drivers speak through; one
//!   interface across transports
//! - **`inprocess`** — a pool client over in-process reps with bounded
//!   fan-out and per-call deadlines
//! - **`start`** — multi-round start auctions with reserve-commit and
//!   retry
//! - **`stop`** — one-shot stop auctions that prune redundant copies
//! - **`runner`** — batches auctions with bounded concurrency and samples
//!   bidding pools
//!
//! Winner selection is always a deterministic reduction over the gathered
//! bid set — lowest score, ties to the lexicographically smallest rep
//! guid — never "first good bid", so nondeterministic gather order cannot
//! change outcomes.

pub mod client;
pub mod inprocess;
pub mod runner;
mod start;
mod stop;

pub use client::{RepPoolClient, StartBid, StopBid};
pub use inprocess::InProcessClient;
pub use runner::AuctionRunner;
