//! In-memory rep delegate backed by the instance ledger.
//!
//! This is the simulation delegate and the test double: it tracks
//! reservations and running instances but launches nothing.

use bidgrid_core::{Instance, RepResult, Resources, StartAuctionRequest, StopInstanceRequest};
use tracing::debug;

use crate::delegate::{RepDelegate, SimulationRepDelegate};
use crate::ledger::InstanceLedger;

/// A `RepDelegate` whose whole workload state is an [`InstanceLedger`].
#[derive(Debug)]
pub struct InMemoryRepDelegate {
    ledger: InstanceLedger,
    az: u32,
}

impl InMemoryRepDelegate {
    pub fn new(total: Resources, az: u32) -> Self {
        Self {
            ledger: InstanceLedger::new(total),
            az,
        }
    }

    pub fn ledger(&self) -> &InstanceLedger {
        &self.ledger
    }
}

impl RepDelegate for InMemoryRepDelegate {
    fn az_number(&self) -> u32 {
        self.az
    }

    fn total_resources(&self) -> RepResult<Resources> {
        Ok(self.ledger.total_resources())
    }

    fn remaining_resources(&self) -> RepResult<Resources> {
        Ok(self.ledger.remaining_resources())
    }

    fn num_instances_for_process(&self, process_guid: &str) -> RepResult<usize> {
        Ok(self.ledger.num_instances_for_process(process_guid))
    }

    fn instance_guids_for_process_index(
        &self,
        process_guid: &str,
        index: u32,
    ) -> RepResult<Vec<String>> {
        Ok(self.ledger.instance_guids_for_process_index(process_guid, index))
    }

    fn reserve(&mut self, req: &StartAuctionRequest) -> RepResult<()> {
        self.ledger.reserve(req)?;
        debug!(instance_guid = %req.instance_guid, "reserved instance");
        Ok(())
    }

    fn release_reservation(&mut self, req: &StartAuctionRequest) -> RepResult<()> {
        self.ledger.release(&req.instance_guid)?;
        debug!(instance_guid = %req.instance_guid, "released reservation");
        Ok(())
    }

    fn run(&mut self, req: &StartAuctionRequest) -> RepResult<()> {
        // A production delegate would launch the workload asynchronously
        // here; the in-memory delegate only flips the ledger state.
        self.ledger.run(&req.instance_guid)?;
        debug!(instance_guid = %req.instance_guid, "instance running");
        Ok(())
    }

    fn stop(&mut self, req: &StopInstanceRequest) -> RepResult<()> {
        self.ledger.stop(&req.instance_guid)?;
        debug!(instance_guid = %req.instance_guid, "instance stopped");
        Ok(())
    }

    fn as_simulation(&mut self) -> Option<&mut dyn SimulationRepDelegate> {
        Some(self)
    }
}

impl SimulationRepDelegate for InMemoryRepDelegate {
    fn set_simulated_instances(&mut self, instances: Vec<Instance>) {
        self.ledger.set_instances(instances);
    }

    fn simulated_instances(&self) -> Vec<Instance> {
        self.ledger.instances()
    }
}
