//! The rep-pool client seam.
//!
//! Drivers address reps only through this interface, so the same auction
//! logic runs over in-process calls, message-bus RPC, or HTTP fan-out.
//! Fan-out methods return only the bids that arrived; a rep that errored,
//! declined, or timed out is simply absent from the gathered set.

use async_trait::async_trait;
use bidgrid_core::{
    Algorithm, ClientResult, StartAuctionRequest, StopAuctionRequest, StopInstanceRequest,
};
use serde::{Deserialize, Serialize};

/// A rep's answer to a start solicitation. Lower scores are better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartBid {
    pub rep_guid: String,
    pub score: f64,
}

/// A rep's answer to a stop solicitation: its score plus the guids of the
/// redundant copies it is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StopBid {
    pub rep_guid: String,
    pub score: f64,
    pub instance_guids: Vec<String>,
}

/// Uniform client over a pool of reps.
///
/// Fan-out calls run their legs in parallel, bounded by the client's
/// concurrency cap; single-rep calls share the same cap. Every leg
/// carries a deadline, with `run` on a separate, longer one because the
/// rep may perform non-trivial work inline.
///
/// Start solicitations carry the auction's scoring algorithm so every
/// rep in one auction scores under the same rules.
#[async_trait]
pub trait RepPoolClient: Send + Sync {
    /// Solicit start bids from the named reps, in parallel.
    async fn bid_for_start(
        &self,
        rep_guids: &[String],
        req: &StartAuctionRequest,
        algorithm: Algorithm,
    ) -> Vec<StartBid>;

    /// Solicit stop bids from the named reps, in parallel.
    async fn bid_for_stop(&self, rep_guids: &[String], req: &StopAuctionRequest)
        -> Vec<StopBid>;

    /// Ask one rep to re-score under the auction's algorithm and
    /// tentatively reserve.
    async fn rebid_then_reserve(
        &self,
        rep_guid: &str,
        req: &StartAuctionRequest,
        algorithm: Algorithm,
    ) -> ClientResult<f64>;

    async fn release_reservation(
        &self,
        rep_guid: &str,
        req: &StartAuctionRequest,
    ) -> ClientResult<()>;

    /// Commit a reservation on one rep.
    async fn run(&self, rep_guid: &str, req: &StartAuctionRequest) -> ClientResult<()>;

    /// Stop one instance on one rep.
    async fn stop(&self, rep_guid: &str, req: &StopInstanceRequest) -> ClientResult<()>;
}
