//! Per-auction outcome records.
//!
//! Shape matters for observability: callers aggregate rounds,
//! communication counts, and durations across batches. A populated `error`
//! field voids the winner.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AuctionError;

/// Outcome of one start auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartAuctionResult {
    pub instance_guid: String,
    /// Guid of the rep that committed the instance; `None` on failure.
    pub winner: Option<String>,
    pub num_rounds: u32,
    /// Every rep RPC made for this request: bids, reserve, run, releases.
    pub num_communications: u32,
    /// Time spent gathering bids, summed across rounds.
    pub bidding_duration: Duration,
    /// Wall-clock time of the whole attempt.
    pub duration: Duration,
    pub error: Option<AuctionError>,
}

impl StartAuctionResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.winner.is_some()
    }
}

/// Outcome of one stop auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StopAuctionResult {
    pub process_guid: String,
    pub index: u32,
    /// Rep keeping the surviving copy; `None` when no rep was running one.
    pub winner: Option<String>,
    pub duration: Duration,
    pub error: Option<AuctionError>,
}
