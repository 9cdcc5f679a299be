//! bidgrid-rep — the per-rep bidding and reservation engine.
//!
//! A rep is one worker node participating in auctions. This crate is the
//! rep side of the protocol:
//!
//! - **`ledger`** — capacity accounting for reserved and running instances
//! - **`delegate`** — the pluggable seam between the engine and whatever
//!   actually manages workloads (production executor or simulation)
//! - **`memory`** — an in-memory delegate backed by the ledger, used by
//!   simulation and tests
//! - **`score`** — the bid formulas and admission constraints
//! - **`rep`** — the `AuctionRep` engine, serializing every public
//!   operation under one per-rep lock
//!
//! The engine is synchronous by design: no public operation suspends while
//! the rep lock is held, which is what makes the resource invariant hold
//! under concurrent bidders.

pub mod delegate;
pub mod ledger;
pub mod memory;
pub mod rep;
pub mod score;

pub use delegate::{RepDelegate, SimulationRepDelegate};
pub use ledger::{InstanceLedger, InstanceState};
pub use memory::InMemoryRepDelegate;
pub use rep::AuctionRep;
pub use score::{start_bid, stop_bid, ScoreContext};
