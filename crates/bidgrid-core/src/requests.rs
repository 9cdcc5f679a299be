//! Auction request records.
//!
//! A start auction places one fresh instance; a stop auction reconciles
//! redundant copies of a `(process_guid, index)` pair down to one.

use serde::{Deserialize, Serialize};

use crate::instance::Instance;

/// Request to place one instance of a process.
///
/// `instance_guid` is the reservation key and must be fresh per placement
/// attempt; reusing one across attempts would let a stale reservation on a
/// losing rep alias a live instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartAuctionRequest {
    pub process_guid: String,
    pub instance_guid: String,
    pub index: u32,
    #[serde(rename = "MemoryMB")]
    pub memory_mb: i64,
    #[serde(rename = "DiskMB")]
    pub disk_mb: i64,
    pub desired_instances: u32,
    #[serde(rename = "NumAZs")]
    pub num_azs: u32,
}

impl StartAuctionRequest {
    /// The instance this request places.
    pub fn instance(&self) -> Instance {
        Instance {
            process_guid: self.process_guid.clone(),
            instance_guid: self.instance_guid.clone(),
            index: self.index,
            memory_mb: self.memory_mb,
            disk_mb: self.disk_mb,
        }
    }
}

/// Request to prune the redundant set of a `(process_guid, index)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StopAuctionRequest {
    pub process_guid: String,
    pub index: u32,
}

/// Command to stop one specific instance on a rep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StopInstanceRequest {
    pub process_guid: String,
    pub instance_guid: String,
    pub index: u32,
}
