//! The per-rep auction engine.
//!
//! `AuctionRep` wraps a delegate behind one non-reentrant mutex. Every
//! public operation takes the lock for its whole duration, which makes
//! each call atomic with respect to ledger state — the mechanism that
//! keeps resource usage within capacity under concurrent bidders. The
//! private helpers run with the guard already held and never re-acquire.

use std::sync::{Mutex, MutexGuard, PoisonError};

use bidgrid_core::{
    Algorithm, Instance, RepError, RepResult, Resources, StartAuctionRequest,
    StopAuctionRequest, StopInstanceRequest,
};
use tracing::debug;

use crate::delegate::RepDelegate;
use crate::score::{satisfies_constraints, start_bid, stop_bid, ScoreContext};

/// One worker node participating in auctions.
///
/// The scoring algorithm is not rep state: each start solicitation
/// carries the auction's algorithm, so every rep in one auction scores
/// the same way.
pub struct AuctionRep {
    guid: String,
    delegate: Mutex<Box<dyn RepDelegate>>,
}

impl AuctionRep {
    /// Wrap a delegate. Rejects delegates whose total resources are not
    /// strictly positive on every axis, since the bid formula divides by
    /// each total.
    pub fn new(guid: impl Into<String>, delegate: Box<dyn RepDelegate>) -> RepResult<Self> {
        let total = delegate.total_resources()?;
        if !total.is_strictly_positive() {
            return Err(RepError::InvalidTotalResources(total));
        }
        Ok(Self {
            guid: guid.into(),
            delegate: Mutex::new(delegate),
        })
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn az_number(&self) -> u32 {
        self.lock().az_number()
    }

    pub fn total_resources(&self) -> RepResult<Resources> {
        self.lock().total_resources()
    }

    pub fn remaining_resources(&self) -> RepResult<Resources> {
        self.lock().remaining_resources()
    }

    /// Compute a start bid under the given algorithm without mutating
    /// anything.
    pub fn bid_for_start(
        &self,
        req: &StartAuctionRequest,
        algorithm: Algorithm,
    ) -> RepResult<f64> {
        let guard = self.lock();
        let ctx = score_context(guard.as_ref(), &req.process_guid, req.desired_instances)?;
        satisfies_constraints(req, &ctx)?;
        Ok(start_bid(algorithm, &ctx))
    }

    /// Re-score under current state and, still holding the lock, record
    /// the reservation. The returned score is the post-admission
    /// commitment; if either step fails the bid is void and nothing is
    /// recorded.
    pub fn rebid_then_tentatively_reserve(
        &self,
        req: &StartAuctionRequest,
        algorithm: Algorithm,
    ) -> RepResult<f64> {
        let mut guard = self.lock();
        let ctx = score_context(guard.as_ref(), &req.process_guid, req.desired_instances)?;
        satisfies_constraints(req, &ctx)?;
        let bid = start_bid(algorithm, &ctx);

        guard.reserve(req)?;
        debug!(rep = %self.guid, instance_guid = %req.instance_guid, bid, "tentatively reserved");
        Ok(bid)
    }

    pub fn release_reservation(&self, req: &StartAuctionRequest) -> RepResult<()> {
        self.lock().release_reservation(req)
    }

    pub fn run(&self, req: &StartAuctionRequest) -> RepResult<()> {
        self.lock().run(req)
    }

    /// Bid to keep the surviving copy of `(process_guid, index)`, along
    /// with the guids of the copies this rep is running for that pair.
    pub fn bid_for_stop(&self, req: &StopAuctionRequest) -> RepResult<(f64, Vec<String>)> {
        let guard = self.lock();
        let ctx = score_context(guard.as_ref(), &req.process_guid, 1)?;

        let instance_guids =
            guard.instance_guids_for_process_index(&req.process_guid, req.index)?;
        if instance_guids.is_empty() {
            return Err(RepError::NotRunningInstance);
        }

        Ok((stop_bid(&ctx), instance_guids))
    }

    pub fn stop(&self, req: &StopInstanceRequest) -> RepResult<()> {
        self.lock().stop(req)
    }

    /// Clear simulated instances. No-op on delegates without the
    /// simulation capability.
    pub fn reset(&self) {
        let mut guard = self.lock();
        match guard.as_simulation() {
            Some(sim) => sim.set_simulated_instances(Vec::new()),
            None => debug!(rep = %self.guid, "delegate cannot simulate, not resetting"),
        }
    }

    /// Replace simulated instances. No-op on delegates without the
    /// simulation capability.
    pub fn set_simulated_instances(&self, instances: Vec<Instance>) {
        let mut guard = self.lock();
        match guard.as_simulation() {
            Some(sim) => sim.set_simulated_instances(instances),
            None => debug!(rep = %self.guid, "delegate cannot simulate, not setting instances"),
        }
    }

    /// Simulated instances, or empty on delegates without the capability.
    pub fn simulated_instances(&self) -> Vec<Instance> {
        let mut guard = self.lock();
        match guard.as_simulation() {
            Some(sim) => sim.simulated_instances(),
            None => {
                debug!(rep = %self.guid, "delegate cannot simulate, no instances to report");
                Vec::new()
            }
        }
    }

    /// The per-rep serialization point. A poisoned lock is recovered: the
    /// ledger types keep themselves consistent per operation.
    fn lock(&self) -> MutexGuard<'_, Box<dyn RepDelegate>> {
        self.delegate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Capture the rep-local state a bid is computed from. Runs with the rep
/// lock held.
fn score_context(
    delegate: &dyn RepDelegate,
    process_guid: &str,
    num_desired: u32,
) -> RepResult<ScoreContext> {
    Ok(ScoreContext {
        remaining: delegate.remaining_resources()?,
        total: delegate.total_resources()?,
        num_on_rep: delegate.num_instances_for_process(process_guid)?,
        num_desired,
    })
}
