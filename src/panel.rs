use crate::permission::{PermissionDescriptor, PermissionState, PermissionStatus};

pub const REQUEST_TOOLTIP: &str = "Click to request permission";

/// One permission button: owns its descriptor, so no lookup is positional
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionEntry {
    pub descriptor: PermissionDescriptor,
    pub label: String,
    pub state: PermissionState,
}

/// Permission buttons in configuration order
#[derive(Debug, Default)]
pub struct PermissionPanel {
    entries: Vec<PermissionEntry>,
}

impl PermissionPanel {
    /// Build one entry per queried status, initialized with its current state
    pub fn from_statuses(statuses: &[PermissionStatus]) -> Self {
        let entries = statuses
            .iter()
            .map(|status| PermissionEntry {
                descriptor: status.descriptor().clone(),
                label: status.descriptor().display_name(),
                state: status.state(),
            })
            .collect();
        Self { entries }
    }

    /// Record a new state for `descriptor`; false if no button shows it
    pub fn set_state(&mut self, descriptor: &PermissionDescriptor, state: PermissionState) -> bool {
        match self.entries.iter_mut().find(|e| &e.descriptor == descriptor) {
            Some(entry) => {
                entry.state = state;
                true
            }
            None => false,
        }
    }

    pub fn state_of(&self, descriptor: &PermissionDescriptor) -> Option<PermissionState> {
        self.entries
            .iter()
            .find(|e| &e.descriptor == descriptor)
            .map(|e| e.state)
    }

    pub fn entries(&self) -> &[PermissionEntry] {
        &self.entries
    }
}
