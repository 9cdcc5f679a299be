//! Start auction driver.
//!
//! One auction places one instance. Each round fans bids out to the
//! bidding pool, picks the best admissible bidder, and tries to convert
//! its bid into a reservation and then a commit. A rep whose reservation
//! attempt fails leaves the pool; the auction fails once rounds or
//! bidders run out.

use std::time::{Duration, Instant};

use bidgrid_core::{
    AuctionError, AuctionRules, ClientError, RepError, StartAuctionRequest, StartAuctionResult,
};
use tracing::{debug, info, warn};

use crate::client::{RepPoolClient, StartBid};

/// Deterministic winner selection: lowest score, ties to the
/// lexicographically smallest rep guid.
fn select_winner(bids: &[StartBid]) -> Option<&StartBid> {
    bids.iter().min_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.rep_guid.cmp(&b.rep_guid))
    })
}

/// Release a reservation that must not outlive the auction, tolerating
/// the cases where it never materialized.
async fn release_quietly(client: &dyn RepPoolClient, rep_guid: &str, req: &StartAuctionRequest) {
    match client.release_reservation(rep_guid, req).await {
        Ok(()) => {}
        Err(ClientError::Rep(RepError::NoSuchInstance(_))) => {
            debug!(rep = %rep_guid, instance_guid = %req.instance_guid, "no reservation to release");
        }
        Err(err) => {
            warn!(rep = %rep_guid, instance_guid = %req.instance_guid, error = %err,
                "failed to release reservation");
        }
    }
}

/// Run one start auction over an already-sampled bidding pool.
pub(crate) async fn run_start_auction(
    client: &dyn RepPoolClient,
    rules: &AuctionRules,
    mut pool: Vec<String>,
    req: &StartAuctionRequest,
) -> StartAuctionResult {
    let auction_started = Instant::now();
    let mut bidding_duration = Duration::ZERO;
    let mut num_communications = 0u32;
    let mut num_rounds = 0u32;

    let result = |winner: Option<String>,
                      num_rounds: u32,
                      num_communications: u32,
                      bidding_duration: Duration,
                      error: Option<AuctionError>| {
        StartAuctionResult {
            instance_guid: req.instance_guid.clone(),
            winner,
            num_rounds,
            num_communications,
            bidding_duration,
            duration: auction_started.elapsed(),
            error,
        }
    };

    while num_rounds < rules.max_rounds {
        num_rounds += 1;

        let bids_started = Instant::now();
        let bids = client.bid_for_start(&pool, req, rules.algorithm).await;
        bidding_duration += bids_started.elapsed();
        num_communications += pool.len() as u32;

        let Some(winner) = select_winner(&bids) else {
            // Nobody can admit the instance; more rounds won't help.
            break;
        };
        let winner_guid = winner.rep_guid.clone();
        debug!(
            instance_guid = %req.instance_guid,
            round = num_rounds,
            bids = bids.len(),
            winner = %winner_guid,
            score = winner.score,
            "selected best bidder"
        );

        num_communications += 1;
        match client.rebid_then_reserve(&winner_guid, req, rules.algorithm).await {
            Ok(_committed_score) => {
                num_communications += 1;
                match client.run(&winner_guid, req).await {
                    Ok(()) => {
                        info!(
                            instance_guid = %req.instance_guid,
                            winner = %winner_guid,
                            rounds = num_rounds,
                            "instance placed"
                        );
                        return result(
                            Some(winner_guid),
                            num_rounds,
                            num_communications,
                            bidding_duration,
                            None,
                        );
                    }
                    Err(err) => {
                        warn!(
                            instance_guid = %req.instance_guid,
                            winner = %winner_guid,
                            error = %err,
                            "winner failed to commit, abandoning auction"
                        );
                        num_communications += 1;
                        release_quietly(client, &winner_guid, req).await;
                        return result(
                            None,
                            num_rounds,
                            num_communications,
                            bidding_duration,
                            Some(AuctionError::CommitFailed(err.to_string())),
                        );
                    }
                }
            }
            Err(ClientError::Rep(RepError::InsufficientResources)) => {
                // Filled up since it bid; try the next-best reps.
                debug!(
                    instance_guid = %req.instance_guid,
                    rep = %winner_guid,
                    "winner could no longer admit, re-bidding without it"
                );
                pool.retain(|guid| guid != &winner_guid);
            }
            Err(err) => {
                // The reservation may or may not have landed; release
                // conservatively and treat the rep as absent from here on.
                warn!(
                    instance_guid = %req.instance_guid,
                    rep = %winner_guid,
                    error = %err,
                    "reservation attempt failed, releasing conservatively"
                );
                num_communications += 1;
                release_quietly(client, &winner_guid, req).await;
                pool.retain(|guid| guid != &winner_guid);
            }
        }
    }

    debug!(instance_guid = %req.instance_guid, rounds = num_rounds, "failed placement");
    result(
        None,
        num_rounds,
        num_communications,
        bidding_duration,
        Some(AuctionError::FailedPlacement { rounds: num_rounds }),
    )
}
