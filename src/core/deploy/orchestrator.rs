use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::uapi::RemoteInvoker;

use super::executor::StepCatalog;
use super::plan::{DeploymentPlan, PlannedStep};
use super::report::{AbortReason, DeploymentReport};
use super::state::DeployState;
use super::types::{DeploySpec, Pipeline, SiteSpec};

/// Deadline and cancellation, checked between steps only.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    deadline: Option<Duration>,
    cancel: Arc<AtomicBool>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Setting the returned flag stops the run before its next step.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn check(&self, started: Instant) -> Option<AbortReason> {
        if self.cancel.load(Ordering::SeqCst) {
            return Some(AbortReason::Cancelled);
        }
        match self.deadline {
            Some(limit) if started.elapsed() >= limit => Some(AbortReason::DeadlineExceeded {
                deadline_secs: limit.as_secs(),
            }),
            _ => None,
        }
    }
}

/// One step of a dry run.
#[derive(Debug, Clone, Serialize)]
pub struct StepPreview {
    #[serde(flatten)]
    pub planned: PlannedStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What a run would do, without doing it.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentPreview {
    pub pipeline: Pipeline,
    pub admin_url: String,
    pub steps: Vec<StepPreview>,
}

/// Drives the deployment state machine against a [`RemoteInvoker`].
pub struct Deployer<'a> {
    invoker: &'a dyn RemoteInvoker,
    catalog: StepCatalog<'a>,
    control: RunControl,
}

impl<'a> Deployer<'a> {
    pub fn new(invoker: &'a dyn RemoteInvoker, catalog: StepCatalog<'a>) -> Self {
        Self {
            invoker,
            catalog,
            control: RunControl::default(),
        }
    }

    pub fn with_control(mut self, control: RunControl) -> Self {
        self.control = control;
        self
    }

    /// Base pipeline: database, download, config, permissions, core install,
    /// then optional theme and plugins.
    pub fn deploy_wordpress(&self, site: &SiteSpec) -> DeploymentReport {
        let spec = DeploySpec {
            site: site.clone(),
            ..Default::default()
        };
        self.run(Pipeline::Base, &spec)
    }

    /// Base pipeline followed by the Elementor sub-chain.
    pub fn deploy_wordpress_with_elementor(&self, spec: &DeploySpec) -> DeploymentReport {
        self.run(Pipeline::Extended, spec)
    }

    pub fn run(&self, pipeline: Pipeline, spec: &DeploySpec) -> DeploymentReport {
        let plan = DeploymentPlan::build(pipeline, spec);
        let mut report = DeploymentReport::start(pipeline, spec.site.admin_url());
        let started = Instant::now();
        let mut state = DeployState::Pending;
        let total = plan.steps.len();

        log_status!("deploy", "Deploying {} ({:?} pipeline)", spec.site.domain, pipeline);

        for (idx, planned) in plan.steps.iter().enumerate() {
            if let Some(reason) = self.control.check(started) {
                log_status!("deploy", "Stopping: {}", reason);
                return report.finish(false, DeployState::Halted, Some(reason));
            }

            if let Some(unmet) = planned.requires.iter().find(|req| !report.succeeded(**req)) {
                log_status!(
                    "deploy",
                    "[{}/{}] Skipping {}: {} did not succeed",
                    idx + 1,
                    total,
                    planned.step.report_key(),
                    unmet.report_key()
                );
                continue;
            }

            log_status!("deploy", "[{}/{}] {}", idx + 1, total, planned.step.label());
            let result = self.catalog.run(self.invoker, planned.step, spec);
            let succeeded = result.is_success();
            if !succeeded {
                log_status!(
                    "deploy",
                    "{} failed: {}",
                    planned.step.report_key(),
                    result.first_error().unwrap_or("unknown error")
                );
            }
            report.record(planned.step, result);

            state = state.after(planned.step, succeeded);
            if state == DeployState::Halted {
                return report.finish(false, state, None);
            }
        }

        let success = plan.counted().all(|step| report.succeeded(step));
        log_status!(
            "deploy",
            "{} {}",
            if success { "Deployed" } else { "Finished with failures:" },
            report.admin_url()
        );
        report.finish(success, DeployState::Done, None)
    }
}

/// Build every planned call without running it. Secrets should already be
/// masked in `spec`.
pub fn preview(catalog: &StepCatalog<'_>, pipeline: Pipeline, spec: &DeploySpec) -> DeploymentPreview {
    let plan = DeploymentPlan::build(pipeline, spec);
    let steps = plan
        .steps
        .into_iter()
        .map(|planned| match catalog.prepare(planned.step, spec) {
            Ok(call) => StepPreview {
                planned,
                call: Some(call.preview()),
                error: None,
            },
            Err(err) => StepPreview {
                planned,
                call: None,
                error: Some(err.message),
            },
        })
        .collect();

    DeploymentPreview {
        pipeline,
        admin_url: spec.site.admin_url(),
        steps,
    }
}
