//! Stop auction driver.
//!
//! A stop auction reconciles redundant copies of one `(process_guid,
//! index)` pair: every rep running at least one copy bids to keep the
//! survivor; the winner keeps the first copy it reported and everything
//! else is stopped. Reps that never answered are left alone — the next
//! reconciliation pass will see them.

use std::time::Instant;

use bidgrid_core::{
    ClientError, RepError, StopAuctionRequest, StopAuctionResult, StopInstanceRequest,
};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::client::{RepPoolClient, StopBid};

fn select_winner(bids: &[StopBid]) -> Option<&StopBid> {
    bids.iter().min_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.rep_guid.cmp(&b.rep_guid))
    })
}

async fn stop_instance(
    client: &dyn RepPoolClient,
    rep_guid: &str,
    req: &StopAuctionRequest,
    instance_guid: &str,
) {
    let cmd = StopInstanceRequest {
        process_guid: req.process_guid.clone(),
        instance_guid: instance_guid.to_string(),
        index: req.index,
    };
    match client.stop(rep_guid, &cmd).await {
        Ok(()) => {}
        Err(ClientError::Rep(RepError::NoSuchInstance(_))) => {
            // Already gone; someone else reconciled it.
            debug!(rep = %rep_guid, instance_guid = %instance_guid, "instance already stopped");
        }
        Err(err) => {
            warn!(rep = %rep_guid, instance_guid = %instance_guid, error = %err,
                "failed to stop redundant instance");
        }
    }
}

/// Run one stop auction across the whole rep universe.
pub(crate) async fn run_stop_auction(
    client: &dyn RepPoolClient,
    universe: &[String],
    req: &StopAuctionRequest,
) -> StopAuctionResult {
    let auction_started = Instant::now();

    let bids = client.bid_for_stop(universe, req).await;

    let Some(winner) = select_winner(&bids) else {
        // Nobody is running this index; nothing to reconcile.
        debug!(process_guid = %req.process_guid, index = req.index, "stop auction had no bidders");
        return StopAuctionResult {
            process_guid: req.process_guid.clone(),
            index: req.index,
            winner: None,
            duration: auction_started.elapsed(),
            error: None,
        };
    };
    let winner_guid = winner.rep_guid.clone();

    let mut stops = Vec::new();
    for bid in &bids {
        // The winner keeps the first copy it reported; every other copy
        // in the redundant set goes.
        let doomed: &[String] = if bid.rep_guid == winner_guid {
            bid.instance_guids
                .split_first()
                .map(|(_, rest)| rest)
                .unwrap_or(&[])
        } else {
            &bid.instance_guids
        };
        for instance_guid in doomed {
            stops.push(stop_instance(client, &bid.rep_guid, req, instance_guid));
        }
    }

    let num_stopped = stops.len();
    join_all(stops).await;

    info!(
        process_guid = %req.process_guid,
        index = req.index,
        winner = %winner_guid,
        stopped = num_stopped,
        "stop auction reconciled"
    );
    StopAuctionResult {
        process_guid: req.process_guid.clone(),
        index: req.index,
        winner: Some(winner_guid),
        duration: auction_started.elapsed(),
        error: None,
    }
}
