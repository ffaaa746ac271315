mod executor;
mod orchestrator;
mod plan;
mod report;
mod state;
mod types;

pub use executor::{StepCall, StepCatalog, KIT_FILE, PRO_PACKAGE_FILE};
pub use orchestrator::{preview, Deployer, DeploymentPreview, RunControl, StepPreview};
pub use plan::{DeploymentPlan, PlannedStep, StepKind, StepRole};
pub use report::{AbortReason, DeploymentReport};
pub use state::DeployState;
pub use types::{DeploySpec, ElementorSpec, Pipeline, SiteSpec};
