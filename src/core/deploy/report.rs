use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::call::CallResult;

use super::plan::StepKind;
use super::state::DeployState;
use super::types::Pipeline;

/// Why a run stopped before its plan was exhausted, other than a failed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum AbortReason {
    Cancelled,
    DeadlineExceeded { deadline_secs: u64 },
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::Cancelled => write!(f, "deployment cancelled"),
            AbortReason::DeadlineExceeded { deadline_secs } => {
                write!(f, "deployment deadline of {}s exceeded", deadline_secs)
            }
        }
    }
}

/// Per-step results plus the aggregate outcome.
///
/// Serialized flat: one key per step (`null` when never attempted) next to
/// `success`, `admin_url` and run metadata.
#[derive(Debug, Clone)]
pub struct DeploymentReport {
    deployment_id: Uuid,
    pipeline: Pipeline,
    steps: Vec<(StepKind, Option<CallResult>)>,
    success: bool,
    admin_url: String,
    state: DeployState,
    aborted: Option<AbortReason>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl DeploymentReport {
    pub(crate) fn start(pipeline: Pipeline, admin_url: String) -> Self {
        Self {
            deployment_id: Uuid::new_v4(),
            pipeline,
            steps: StepKind::catalog(pipeline)
                .into_iter()
                .map(|kind| (kind, None))
                .collect(),
            success: false,
            admin_url,
            state: DeployState::Pending,
            aborted: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub(crate) fn record(&mut self, step: StepKind, result: CallResult) {
        if let Some(slot) = self.steps.iter_mut().find(|(kind, _)| *kind == step) {
            slot.1 = Some(result);
        }
    }

    pub(crate) fn finish(
        mut self,
        success: bool,
        state: DeployState,
        aborted: Option<AbortReason>,
    ) -> Self {
        self.success = success;
        self.state = state;
        self.aborted = aborted;
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn deployment_id(&self) -> Uuid {
        self.deployment_id
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn admin_url(&self) -> &str {
        &self.admin_url
    }

    pub fn state(&self) -> DeployState {
        self.state
    }

    pub fn aborted(&self) -> Option<&AbortReason> {
        self.aborted.as_ref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Result for a step; `None` if it was never attempted.
    pub fn result(&self, step: StepKind) -> Option<&CallResult> {
        self.steps
            .iter()
            .find(|(kind, _)| *kind == step)
            .and_then(|(_, result)| result.as_ref())
    }

    pub fn succeeded(&self, step: StepKind) -> bool {
        self.result(step).map(CallResult::is_success).unwrap_or(false)
    }

    /// Steps attempted, in order.
    pub fn attempted(&self) -> Vec<StepKind> {
        self.steps
            .iter()
            .filter(|(_, result)| result.is_some())
            .map(|(kind, _)| *kind)
            .collect()
    }
}

impl Serialize for DeploymentReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("deployment_id", &self.deployment_id)?;
        map.serialize_entry("pipeline", &self.pipeline)?;
        for (kind, result) in &self.steps {
            map.serialize_entry(kind.report_key(), result)?;
        }
        map.serialize_entry("success", &self.success)?;
        map.serialize_entry("admin_url", &self.admin_url)?;
        map.serialize_entry("state", &self.state)?;
        if let Some(aborted) = &self.aborted {
            map.serialize_entry("aborted", aborted)?;
        }
        map.serialize_entry("started_at", &self.started_at.to_rfc3339())?;
        map.serialize_entry(
            "finished_at",
            &self.finished_at.map(|at| at.to_rfc3339()),
        )?;
        map.end()
    }
}
