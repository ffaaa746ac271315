use serde::{Deserialize, Serialize};

use super::plan::{StepKind, StepRole};

/// Where a deployment stands. Each successful step moves the machine to the
/// state that step reaches; `Halted` and `Done` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployState {
    Pending,
    DbCreated,
    DbUserCreated,
    PrivilegesSet,
    CmsDownloaded,
    ConfigWritten,
    PermissionsSet,
    CmsInstalled,
    ThemeInstalled,
    PluginsInstalled,
    ElementorInstalled,
    ProUploaded,
    ProInstalled,
    KitUploaded,
    KitImported,
    Done,
    Halted,
}

impl DeployState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DeployState::Done | DeployState::Halted)
    }

    /// The single halting rule: a failed mandatory step halts the machine.
    /// Other failures leave the state where it was.
    pub fn after(self, step: StepKind, succeeded: bool) -> DeployState {
        if self.is_terminal() {
            return self;
        }
        if succeeded {
            step.reaches()
        } else if step.role() == StepRole::Mandatory {
            DeployState::Halted
        } else {
            self
        }
    }
}
