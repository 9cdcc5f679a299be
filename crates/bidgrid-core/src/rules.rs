//! Auction tunables.
//!
//! `AuctionRules` governs a single auction (scoring variant, rounds, pool
//! sizing); `PoolTuning` governs the client side (fan-out bound and call
//! deadlines). Both have sensible defaults, builder-style setters, and can
//! be loaded together from a TOML settings file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Scoring variant used for start bids.
///
/// Both variants share the resource-utilization term; they differ in the
/// co-location penalty. Stop bids always use the raw count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Penalize by the raw number of copies of the process already on the
    /// rep. One whole point per copy, so spreading dominates packing.
    #[default]
    CoLocationCount,
    /// Penalize by copies-on-rep divided by desired instances, so the
    /// penalty of a single copy shrinks as the process scales out.
    CoLocationFraction,
}

impl Algorithm {
    fn from_name(name: &str) -> Result<Self, SettingsError> {
        match name {
            "co_location_count" => Ok(Algorithm::CoLocationCount),
            "co_location_fraction" => Ok(Algorithm::CoLocationFraction),
            other => Err(SettingsError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Per-auction tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct AuctionRules {
    pub algorithm: Algorithm,
    /// Bidding rounds before a start auction gives up.
    pub max_rounds: u32,
    /// Fraction of the rep universe sampled into the bidding pool, in
    /// `(0, 1]`. Pool size is `max(1, ceil(|universe| * fraction))`.
    pub max_bidding_pool_fraction: f64,
}

impl Default for AuctionRules {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            max_rounds: 3,
            max_bidding_pool_fraction: 0.2,
        }
    }
}

impl AuctionRules {
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_max_bidding_pool_fraction(mut self, fraction: f64) -> Self {
        self.max_bidding_pool_fraction = fraction;
        self
    }

    /// Reject out-of-range tunables.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_rounds < 1 {
            return Err(SettingsError::ZeroRounds);
        }
        if !(self.max_bidding_pool_fraction > 0.0 && self.max_bidding_pool_fraction <= 1.0) {
            return Err(SettingsError::FractionOutOfRange(
                self.max_bidding_pool_fraction,
            ));
        }
        Ok(())
    }

    /// Size of the bidding pool for a universe of `universe_len` reps.
    pub fn bidding_pool_size(&self, universe_len: usize) -> usize {
        let target = (universe_len as f64 * self.max_bidding_pool_fraction).ceil() as usize;
        target.max(1).min(universe_len.max(1))
    }
}

/// Client-side tunables: fan-out bound and call deadlines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolTuning {
    /// Cap on in-flight rep calls (and on in-flight auctions in a batch).
    pub max_concurrent: usize,
    /// Per-RPC deadline; a timed-out bid is a declined bid.
    pub timeout: Duration,
    /// Deadline for the commit call, which may do non-trivial work inline.
    pub run_timeout: Duration,
}

impl Default for PoolTuning {
    fn default() -> Self {
        Self {
            max_concurrent: 32,
            timeout: Duration::from_secs(1),
            run_timeout: Duration::from_secs(10),
        }
    }
}

impl PoolTuning {
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_run_timeout(mut self, run_timeout: Duration) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_concurrent < 1 {
            return Err(SettingsError::ZeroConcurrency);
        }
        Ok(())
    }
}

/// Combined settings as loaded from a TOML file.
///
/// ```toml
/// [rules]
/// algorithm = "co_location_count"
/// max_rounds = 3
/// max_bidding_pool_fraction = 0.2
///
/// [pool]
/// max_concurrent = 32
/// timeout = "1s"
/// run_timeout = "10s"
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuctionSettings {
    pub rules: AuctionRules,
    pub pool: PoolTuning,
}

#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    rules: Option<RawRules>,
    pool: Option<RawPool>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRules {
    algorithm: Option<String>,
    max_rounds: Option<u32>,
    max_bidding_pool_fraction: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPool {
    max_concurrent: Option<usize>,
    timeout: Option<String>,
    run_timeout: Option<String>,
}

impl AuctionSettings {
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let raw: RawSettings = toml::from_str(content)?;
        let mut settings = AuctionSettings::default();

        if let Some(rules) = raw.rules {
            if let Some(name) = rules.algorithm {
                settings.rules.algorithm = Algorithm::from_name(&name)?;
            }
            if let Some(rounds) = rules.max_rounds {
                settings.rules.max_rounds = rounds;
            }
            if let Some(fraction) = rules.max_bidding_pool_fraction {
                settings.rules.max_bidding_pool_fraction = fraction;
            }
        }

        if let Some(pool) = raw.pool {
            if let Some(max) = pool.max_concurrent {
                settings.pool.max_concurrent = max;
            }
            if let Some(timeout) = pool.timeout {
                settings.pool.timeout = parse_duration(&timeout)?;
            }
            if let Some(run_timeout) = pool.run_timeout {
                settings.pool.run_timeout = parse_duration(&run_timeout)?;
            }
        }

        settings.rules.validate()?;
        settings.pool.validate()?;
        Ok(settings)
    }
}

/// Parse a duration literal like "10s", "500ms", "1m".
fn parse_duration(s: &str) -> Result<Duration, SettingsError> {
    let s = s.trim();
    let parsed = if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    };
    parsed.ok_or_else(|| SettingsError::BadDuration(s.to_string()))
}
