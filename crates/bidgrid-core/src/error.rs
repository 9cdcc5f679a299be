//! Error taxonomy for the placement core.
//!
//! Drivers dispatch on these kinds: a rep that bids `InsufficientResources`
//! is dropped for the round, a transport failure makes the rep absent for
//! the round, and `NoSuchInstance` is fatal for `run` but success for
//! `release_reservation`/`stop`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resources::Resources;

/// Errors produced by a rep (or its delegate) for a single operation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RepError {
    /// The rep cannot admit the requested instance.
    #[error("insufficient resources")]
    InsufficientResources,

    /// The rep holds no copy of the requested `(process_guid, index)`.
    #[error("not running any instance of the requested process index")]
    NotRunningInstance,

    /// The instance guid is unknown on this rep.
    #[error("no such instance: {0}")]
    NoSuchInstance(String),

    /// A rep whose total resources are not strictly positive on every
    /// axis cannot be scored and is rejected at construction.
    #[error("total resources must be positive on every axis, got {0:?}")]
    InvalidTotalResources(Resources),

    /// The delegate failed for a reason outside the auction protocol.
    #[error("delegate failure: {0}")]
    Delegate(String),
}

pub type RepResult<T> = Result<T, RepError>;

/// Errors surfaced by a rep-pool client for a single call leg.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The per-call deadline elapsed; the rep is treated as having
    /// declined to bid.
    #[error("rep call timed out")]
    Timeout,

    /// The call never produced a rep-side answer.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The client has no route to the named rep.
    #[error("unknown rep guid: {0}")]
    UnknownRep(String),

    /// The rep answered with a protocol error.
    #[error(transparent)]
    Rep(#[from] RepError),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Terminal outcomes of a whole auction, carried in result records.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum AuctionError {
    /// Admissible bidders or rounds were exhausted; not retried.
    #[error("failed placement after {rounds} round(s)")]
    FailedPlacement { rounds: u32 },

    /// The winner reserved but could not commit; the reservation was
    /// released and the auction abandoned.
    #[error("winner failed to commit: {0}")]
    CommitFailed(String),
}

/// Errors raised while loading or validating auction settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("max_rounds must be at least 1")]
    ZeroRounds,

    #[error("max_bidding_pool_fraction must be in (0, 1], got {0}")]
    FractionOutOfRange(f64),

    #[error("max_concurrent must be at least 1")]
    ZeroConcurrency,

    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("bad duration literal: {0}")]
    BadDuration(String),

    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),
}
