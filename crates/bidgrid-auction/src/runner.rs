//! Batch auction runner.
//!
//! Samples a bidding pool per start request, runs auctions with a bounded
//! number in flight, and returns results in request order. The sampler's
//! RNG is seedable so simulations and tests reproduce exactly; outcome
//! determinism for a given pool comes from the drivers' min-by-score,
//! min-by-guid reduction.

use std::sync::{Arc, Mutex, PoisonError};

use bidgrid_core::{
    AuctionRules, StartAuctionRequest, StartAuctionResult, StopAuctionRequest, StopAuctionResult,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::client::RepPoolClient;
use crate::{start, stop};

const DEFAULT_MAX_IN_FLIGHT: usize = 32;

/// Drives batches of auctions against a rep universe.
pub struct AuctionRunner {
    client: Arc<dyn RepPoolClient>,
    rules: AuctionRules,
    max_in_flight: usize,
    rng: Mutex<StdRng>,
}

impl AuctionRunner {
    pub fn new(client: Arc<dyn RepPoolClient>, rules: AuctionRules) -> Self {
        Self {
            client,
            rules,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Seed the pool sampler for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Cap concurrent auctions in a batch.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn rules(&self) -> &AuctionRules {
        &self.rules
    }

    /// Sample the bidding pool for one start auction: a uniformly random
    /// subset of the universe sized by `max_bidding_pool_fraction`.
    fn sample_bidding_pool(&self, universe: &[String]) -> Vec<String> {
        let size = self.rules.bidding_pool_size(universe.len());
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        universe.choose_multiple(&mut *rng, size).cloned().collect()
    }

    /// Run one start auction.
    pub async fn run_start_auction(
        &self,
        universe: &[String],
        req: &StartAuctionRequest,
    ) -> StartAuctionResult {
        let pool = self.sample_bidding_pool(universe);
        start::run_start_auction(self.client.as_ref(), &self.rules, pool, req).await
    }

    /// Run one stop auction over the whole universe.
    pub async fn run_stop_auction(
        &self,
        universe: &[String],
        req: &StopAuctionRequest,
    ) -> StopAuctionResult {
        stop::run_stop_auction(self.client.as_ref(), universe, req).await
    }

    /// Run a batch of start auctions, at most `max_in_flight` at a time.
    /// Results come back in request order.
    pub async fn run_start_auctions(
        &self,
        universe: &[String],
        requests: Vec<StartAuctionRequest>,
    ) -> Vec<StartAuctionResult> {
        debug!(requests = requests.len(), universe = universe.len(), "running start auction batch");

        let gate = Arc::new(Semaphore::new(self.max_in_flight));
        let mut join_set = JoinSet::new();

        for (position, req) in requests.into_iter().enumerate() {
            // Sample in submission order so a seeded runner is reproducible
            // regardless of how the auctions interleave.
            let pool = self.sample_bidding_pool(universe);
            let client = self.client.clone();
            let rules = self.rules.clone();
            let gate = gate.clone();
            join_set.spawn(async move {
                let _permit = gate.acquire_owned().await.ok();
                let result = start::run_start_auction(client.as_ref(), &rules, pool, &req).await;
                (position, result)
            });
        }

        collect_in_order(join_set).await
    }

    /// Run a batch of stop auctions, at most `max_in_flight` at a time.
    pub async fn run_stop_auctions(
        &self,
        universe: &[String],
        requests: Vec<StopAuctionRequest>,
    ) -> Vec<StopAuctionResult> {
        debug!(requests = requests.len(), universe = universe.len(), "running stop auction batch");

        let gate = Arc::new(Semaphore::new(self.max_in_flight));
        let mut join_set = JoinSet::new();

        for (position, req) in requests.into_iter().enumerate() {
            let universe = universe.to_vec();
            let client = self.client.clone();
            let gate = gate.clone();
            join_set.spawn(async move {
                let _permit = gate.acquire_owned().await.ok();
                let result = stop::run_stop_auction(client.as_ref(), &universe, &req).await;
                (position, result)
            });
        }

        collect_in_order(join_set).await
    }
}

async fn collect_in_order<T: Send + 'static>(mut join_set: JoinSet<(usize, T)>) -> Vec<T> {
    let mut entries: Vec<(usize, T)> = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        if let Ok(entry) = joined {
            entries.push(entry);
        }
    }
    entries.sort_by_key(|(position, _)| *position);
    entries.into_iter().map(|(_, result)| result).collect()
}
