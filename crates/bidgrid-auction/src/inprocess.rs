//! In-process rep-pool client.
//!
//! Routes driver calls to `AuctionRep` engines living in the same
//! process. Rep calls are synchronous and fast, but the client still
//! enforces the transport discipline drivers rely on: every leg runs on
//! the blocking pool under a deadline, and total in-flight legs are
//! bounded by one semaphore.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bidgrid_core::{
    Algorithm, ClientError, ClientResult, PoolTuning, RepResult, StartAuctionRequest,
    StopAuctionRequest, StopInstanceRequest,
};
use bidgrid_rep::AuctionRep;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::client::{RepPoolClient, StartBid, StopBid};

/// Pool client over in-process reps.
pub struct InProcessClient {
    reps: HashMap<String, Arc<AuctionRep>>,
    tuning: PoolTuning,
    in_flight: Arc<Semaphore>,
}

impl InProcessClient {
    pub fn new(reps: Vec<Arc<AuctionRep>>, tuning: PoolTuning) -> Self {
        let in_flight = Arc::new(Semaphore::new(tuning.max_concurrent));
        Self {
            reps: reps
                .into_iter()
                .map(|rep| (rep.guid().to_string(), rep))
                .collect(),
            tuning,
            in_flight,
        }
    }

    /// Look up a rep by guid (used by simulation setup and tests).
    pub fn rep(&self, guid: &str) -> Option<&Arc<AuctionRep>> {
        self.reps.get(guid)
    }

    /// All rep guids, sorted.
    pub fn rep_guids(&self) -> Vec<String> {
        let mut guids: Vec<String> = self.reps.keys().cloned().collect();
        guids.sort();
        guids
    }

    /// One call leg: a permit, then the rep operation on the blocking
    /// pool under a deadline.
    async fn guarded_call<T, F>(
        in_flight: Arc<Semaphore>,
        deadline: Duration,
        rep: Arc<AuctionRep>,
        op: F,
    ) -> ClientResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<AuctionRep>) -> RepResult<T> + Send + 'static,
    {
        let _permit = in_flight
            .acquire_owned()
            .await
            .map_err(|_| ClientError::Transport("client shut down".to_string()))?;

        let handle = tokio::task::spawn_blocking(move || op(rep));
        match tokio::time::timeout(deadline, handle).await {
            Ok(Ok(result)) => result.map_err(ClientError::Rep),
            Ok(Err(join_err)) => Err(ClientError::Transport(join_err.to_string())),
            Err(_) => Err(ClientError::Timeout),
        }
    }

    async fn call<T, F>(&self, rep_guid: &str, deadline: Duration, op: F) -> ClientResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<AuctionRep>) -> RepResult<T> + Send + 'static,
    {
        let rep = self
            .reps
            .get(rep_guid)
            .cloned()
            .ok_or_else(|| ClientError::UnknownRep(rep_guid.to_string()))?;
        Self::guarded_call(self.in_flight.clone(), deadline, rep, op).await
    }

    /// Run `op` against every named rep in parallel, gathering per-rep
    /// outcomes. Unknown guids become `UnknownRep` entries.
    async fn fan_out<T, F>(&self, rep_guids: &[String], op: F) -> Vec<(String, ClientResult<T>)>
    where
        T: Send + 'static,
        F: Fn(Arc<AuctionRep>) -> RepResult<T> + Clone + Send + 'static,
    {
        let mut outcomes = Vec::with_capacity(rep_guids.len());
        let mut join_set = JoinSet::new();

        for guid in rep_guids {
            match self.reps.get(guid) {
                Some(rep) => {
                    let rep = rep.clone();
                    let guid = guid.clone();
                    let op = op.clone();
                    let in_flight = self.in_flight.clone();
                    let deadline = self.tuning.timeout;
                    join_set.spawn(async move {
                        let outcome = Self::guarded_call(in_flight, deadline, rep, op).await;
                        (guid, outcome)
                    });
                }
                None => outcomes.push((guid.clone(), Err(ClientError::UnknownRep(guid.clone())))),
            }
        }

        while let Some(joined) = join_set.join_next().await {
            if let Ok(outcome) = joined {
                outcomes.push(outcome);
            }
        }
        outcomes
    }
}

#[async_trait]
impl RepPoolClient for InProcessClient {
    async fn bid_for_start(
        &self,
        rep_guids: &[String],
        req: &StartAuctionRequest,
        algorithm: Algorithm,
    ) -> Vec<StartBid> {
        let req = req.clone();
        let outcomes = self
            .fan_out(rep_guids, move |rep| rep.bid_for_start(&req, algorithm))
            .await;

        outcomes
            .into_iter()
            .filter_map(|(rep_guid, outcome)| match outcome {
                Ok(score) => Some(StartBid { rep_guid, score }),
                Err(err) => {
                    debug!(rep = %rep_guid, error = %err, "rep declined start bid");
                    None
                }
            })
            .collect()
    }

    async fn bid_for_stop(
        &self,
        rep_guids: &[String],
        req: &StopAuctionRequest,
    ) -> Vec<StopBid> {
        let req = req.clone();
        let outcomes = self
            .fan_out(rep_guids, move |rep| rep.bid_for_stop(&req))
            .await;

        outcomes
            .into_iter()
            .filter_map(|(rep_guid, outcome)| match outcome {
                Ok((score, instance_guids)) => Some(StopBid {
                    rep_guid,
                    score,
                    instance_guids,
                }),
                Err(err) => {
                    debug!(rep = %rep_guid, error = %err, "rep declined stop bid");
                    None
                }
            })
            .collect()
    }

    async fn rebid_then_reserve(
        &self,
        rep_guid: &str,
        req: &StartAuctionRequest,
        algorithm: Algorithm,
    ) -> ClientResult<f64> {
        let req = req.clone();
        self.call(rep_guid, self.tuning.timeout, move |rep| {
            rep.rebid_then_tentatively_reserve(&req, algorithm)
        })
        .await
    }

    async fn release_reservation(
        &self,
        rep_guid: &str,
        req: &StartAuctionRequest,
    ) -> ClientResult<()> {
        let req = req.clone();
        self.call(rep_guid, self.tuning.timeout, move |rep| {
            rep.release_reservation(&req)
        })
        .await
    }

    async fn run(&self, rep_guid: &str, req: &StartAuctionRequest) -> ClientResult<()> {
        let req = req.clone();
        // Commit may do non-trivial work inline; it gets the longer deadline.
        self.call(rep_guid, self.tuning.run_timeout, move |rep| rep.run(&req))
            .await
    }

    async fn stop(&self, rep_guid: &str, req: &StopInstanceRequest) -> ClientResult<()> {
        let req = req.clone();
        self.call(rep_guid, self.tuning.timeout, move |rep| rep.stop(&req))
            .await
    }
}
