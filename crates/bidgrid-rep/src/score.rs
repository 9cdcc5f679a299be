//! Bid formulas and admission constraints.
//!
//! A bid is a non-negative real; lower is better. Both formulas combine
//! the rep's fractional resource use (mean across containers, disk,
//! memory) with a co-location penalty for copies of the same process
//! already on the rep. The penalty dominates, so copies spread across the
//! fleet; the resource term breaks ties toward the emptiest host.

use bidgrid_core::{Algorithm, RepError, RepResult, Resources, StartAuctionRequest};

/// Rep-local state a bid is computed from, captured under the rep lock.
#[derive(Debug, Clone, Copy)]
pub struct ScoreContext {
    pub remaining: Resources,
    pub total: Resources,
    /// Copies of the process on this rep, reserved or running.
    pub num_on_rep: usize,
    /// Desired instance count carried by the request.
    pub num_desired: u32,
}

fn fraction_used(remaining: Resources, total: Resources) -> f64 {
    let containers = 1.0 - remaining.containers as f64 / total.containers as f64;
    let disk = 1.0 - remaining.disk_mb as f64 / total.disk_mb as f64;
    let memory = 1.0 - remaining.memory_mb as f64 / total.memory_mb as f64;
    (containers + disk + memory) / 3.0
}

/// Start-auction bid.
pub fn start_bid(algorithm: Algorithm, ctx: &ScoreContext) -> f64 {
    let penalty = match algorithm {
        Algorithm::CoLocationCount => ctx.num_on_rep as f64,
        Algorithm::CoLocationFraction => ctx.num_on_rep as f64 / ctx.num_desired.max(1) as f64,
    };
    fraction_used(ctx.remaining, ctx.total) + penalty
}

/// Stop-auction bid. Always penalizes by the raw copy count: the rep with
/// the fewest copies (and the emptiest host among those) keeps the
/// survivor.
pub fn stop_bid(ctx: &ScoreContext) -> f64 {
    fraction_used(ctx.remaining, ctx.total) + ctx.num_on_rep as f64
}

/// Admission check for a start request: enough memory, enough disk, and a
/// free container slot.
pub fn satisfies_constraints(req: &StartAuctionRequest, ctx: &ScoreContext) -> RepResult<()> {
    if ctx.remaining.has_room_for(req.memory_mb, req.disk_mb) {
        Ok(())
    } else {
        Err(RepError::InsufficientResources)
    }
}
