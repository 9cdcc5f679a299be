//! Instance ledger — per-rep accounting of capacity, reservations, and
//! running instances.
//!
//! A single map keyed by instance guid holds both reserved and running
//! entries; a reservation deducts resources the moment it lands, so a bid
//! computed after it already sees the reduced remainder.

use std::collections::HashMap;

use bidgrid_core::{Instance, RepError, RepResult, Resources, StartAuctionRequest};

/// Lifecycle state of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Resources deducted, process not yet committed.
    Reserved,
    /// Committed via `run`.
    Running,
}

#[derive(Debug, Clone)]
struct LedgerEntry {
    instance: Instance,
    state: InstanceState,
}

/// Capacity ledger for one rep.
///
/// Remaining resources are always `total - Σ footprints` over every entry,
/// reserved or running.
#[derive(Debug, Clone)]
pub struct InstanceLedger {
    total: Resources,
    entries: HashMap<String, LedgerEntry>,
}

impl InstanceLedger {
    pub fn new(total: Resources) -> Self {
        Self {
            total,
            entries: HashMap::new(),
        }
    }

    pub fn total_resources(&self) -> Resources {
        self.total
    }

    pub fn remaining_resources(&self) -> Resources {
        self.entries
            .values()
            .fold(self.total, |acc, entry| acc - entry.instance.footprint())
    }

    /// Number of copies of `process_guid` on this rep, reserved or running.
    /// Reservations count so that an in-flight copy already repels further
    /// copies of the same process.
    pub fn num_instances_for_process(&self, process_guid: &str) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.instance.process_guid == process_guid)
            .count()
    }

    /// Guids of *running* copies of `(process_guid, index)` — the redundant
    /// set a stop auction prunes. Sorted for deterministic reporting.
    pub fn instance_guids_for_process_index(&self, process_guid: &str, index: u32) -> Vec<String> {
        let mut guids: Vec<String> = self
            .entries
            .values()
            .filter(|entry| {
                entry.state == InstanceState::Running
                    && entry.instance.process_guid == process_guid
                    && entry.instance.index == index
            })
            .map(|entry| entry.instance.instance_guid.clone())
            .collect();
        guids.sort();
        guids
    }

    /// Tentatively reserve resources for the requested instance.
    ///
    /// Admission requires enough memory, enough disk, and at least one
    /// free container slot; otherwise the ledger is untouched.
    pub fn reserve(&mut self, req: &StartAuctionRequest) -> RepResult<()> {
        if !self
            .remaining_resources()
            .has_room_for(req.memory_mb, req.disk_mb)
        {
            return Err(RepError::InsufficientResources);
        }

        self.entries.insert(
            req.instance_guid.clone(),
            LedgerEntry {
                instance: req.instance(),
                state: InstanceState::Reserved,
            },
        );
        Ok(())
    }

    /// Drop a reservation (or a stale entry), returning its resources.
    pub fn release(&mut self, instance_guid: &str) -> RepResult<()> {
        self.entries
            .remove(instance_guid)
            .map(|_| ())
            .ok_or_else(|| RepError::NoSuchInstance(instance_guid.to_string()))
    }

    /// Promote a reservation to running.
    pub fn run(&mut self, instance_guid: &str) -> RepResult<()> {
        let entry = self
            .entries
            .get_mut(instance_guid)
            .ok_or_else(|| RepError::NoSuchInstance(instance_guid.to_string()))?;
        entry.state = InstanceState::Running;
        Ok(())
    }

    /// Remove an instance and free its resources.
    pub fn stop(&mut self, instance_guid: &str) -> RepResult<()> {
        self.entries
            .remove(instance_guid)
            .map(|_| ())
            .ok_or_else(|| RepError::NoSuchInstance(instance_guid.to_string()))
    }

    /// Replace the whole ledger with the given instances, all running.
    pub fn set_instances(&mut self, instances: Vec<Instance>) {
        self.entries = instances
            .into_iter()
            .map(|instance| {
                (
                    instance.instance_guid.clone(),
                    LedgerEntry {
                        instance,
                        state: InstanceState::Running,
                    },
                )
            })
            .collect();
    }

    /// Every instance on the ledger, sorted by guid.
    pub fn instances(&self) -> Vec<Instance> {
        let mut instances: Vec<Instance> = self
            .entries
            .values()
            .map(|entry| entry.instance.clone())
            .collect();
        instances.sort_by(|a, b| a.instance_guid.cmp(&b.instance_guid));
        instances
    }

    pub fn state_of(&self, instance_guid: &str) -> Option<InstanceState> {
        self.entries.get(instance_guid).map(|entry| entry.state)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
