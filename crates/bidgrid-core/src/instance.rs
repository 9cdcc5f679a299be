//! A single placed (or reserved) copy of a process on one rep.

use serde::{Deserialize, Serialize};

use crate::resources::Resources;

/// One copy of a process. `instance_guid` is globally unique at any moment;
/// `index` distinguishes the N logical instances of a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Instance {
    pub process_guid: String,
    pub instance_guid: String,
    pub index: u32,
    #[serde(rename = "MemoryMB")]
    pub memory_mb: i64,
    #[serde(rename = "DiskMB")]
    pub disk_mb: i64,
}

impl Instance {
    /// The resources this instance consumes on its rep: its memory and
    /// disk plus one container slot.
    pub fn footprint(&self) -> Resources {
        Resources::new(self.memory_mb, self.disk_mb, 1)
    }
}
