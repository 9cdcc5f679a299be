//! Delegate seam between the auction engine and the workload manager.
//!
//! The engine depends only on `RepDelegate`; production executors and the
//! in-memory simulation delegate are interchangeable behind it. Simulation
//! controls live on a separate capability trait so the production path
//! never has to implement them: the engine feature-detects the capability
//! through `as_simulation` and silently no-ops when it is absent.
//!
//! Delegate calls run with the rep lock already held and take `&mut self`,
//! so implementations need no locking of their own and must not block.

use bidgrid_core::{
    Instance, RepResult, Resources, StartAuctionRequest, StopInstanceRequest,
};

/// The production surface a rep needs from its workload manager.
pub trait RepDelegate: Send {
    /// Availability zone this rep lives in.
    fn az_number(&self) -> u32;

    fn total_resources(&self) -> RepResult<Resources>;

    fn remaining_resources(&self) -> RepResult<Resources>;

    /// Copies of `process_guid` on this rep, reserved or running.
    fn num_instances_for_process(&self, process_guid: &str) -> RepResult<usize>;

    /// Running copies of `(process_guid, index)`.
    fn instance_guids_for_process_index(
        &self,
        process_guid: &str,
        index: u32,
    ) -> RepResult<Vec<String>>;

    fn reserve(&mut self, req: &StartAuctionRequest) -> RepResult<()>;

    fn release_reservation(&mut self, req: &StartAuctionRequest) -> RepResult<()>;

    /// Commit a reservation. A real delegate launches the workload
    /// asynchronously after returning; nothing may block here.
    fn run(&mut self, req: &StartAuctionRequest) -> RepResult<()>;

    fn stop(&mut self, req: &StopInstanceRequest) -> RepResult<()>;

    /// Downcast to the simulation capability, when present.
    fn as_simulation(&mut self) -> Option<&mut dyn SimulationRepDelegate> {
        None
    }
}

/// Simulation-only controls, kept off the production surface.
pub trait SimulationRepDelegate: RepDelegate {
    /// Replace the rep's instances wholesale, all running.
    fn set_simulated_instances(&mut self, instances: Vec<Instance>);

    fn simulated_instances(&self) -> Vec<Instance>;
}
