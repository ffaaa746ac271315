use clap::Args;
use serde::Serialize;
use std::time::Duration;

use cpdeploy::defaults;
use cpdeploy::deploy::{
    self, Deployer, DeploySpec, DeploymentPreview, DeploymentReport, Pipeline, RunControl,
    StepCatalog,
};
use cpdeploy::salts::{SaltProvider, SecurityKeys, ServiceSaltProvider};
use cpdeploy::uapi::UapiClient;

use super::{CmdResult, ConnectionArgs};

#[derive(Args)]
pub struct DeployArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Deployment spec: inline JSON, @file, or - for stdin
    #[arg(long, value_name = "SPEC")]
    pub json: Option<String>,

    /// Also install Elementor (and Pro / kit when supplied)
    #[arg(long)]
    pub elementor: bool,

    /// Show the planned calls without contacting cPanel
    #[arg(long)]
    pub dry_run: bool,

    /// Spec overrides as --key value pairs.
    /// When combined with --json, add '--' separator first:
    /// `cpdeploy deploy ... --json @site.json -- --domain example.com`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub extra: Vec<String>,
}

#[derive(Serialize)]
pub struct DeployOutput {
    pub command: String,
    pub pipeline: Pipeline,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<DeploymentReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<DeploymentPreview>,
}

/// Security keys shown in dry runs.
struct MaskedSalts;

impl SaltProvider for MaskedSalts {
    fn security_keys(&self) -> SecurityKeys {
        SecurityKeys::placeholder("********")
    }
}

pub fn run(args: DeployArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<DeployOutput> {
    let raw = super::merge_json_sources(args.json.as_deref(), &args.extra)?;
    let spec: DeploySpec = serde_json::from_value(raw).map_err(|e| {
        cpdeploy::Error::validation_invalid_json(e, Some("parse deployment spec".to_string()), None)
    })?;

    let missing = spec.site.missing_fields();
    if !missing.is_empty() {
        return Err(cpdeploy::Error::validation_missing_argument(missing)
            .with_hint("Pass the fields in --json or as trailing --key value pairs"));
    }

    let pipeline = if args.elementor {
        Pipeline::Extended
    } else {
        Pipeline::Base
    };
    let defaults = defaults::load_defaults();

    if args.dry_run {
        let masked = spec.masked();
        let catalog = StepCatalog::new(&args.connection.account, &defaults, &MaskedSalts);
        return Ok((
            DeployOutput {
                command: "deploy".to_string(),
                pipeline,
                dry_run: true,
                report: None,
                plan: Some(deploy::preview(&catalog, pipeline, &masked)),
            },
            0,
        ));
    }

    let credentials = args.connection.credentials(&defaults)?;
    let client = UapiClient::new(credentials, &defaults.api)?;
    let salts = ServiceSaltProvider::new(
        defaults.salts.clone(),
        Duration::from_secs(defaults.api.timeout_secs),
    );
    let catalog = StepCatalog::new(client.credentials().account(), &defaults, &salts);
    let control =
        RunControl::new().with_deadline(defaults.api.deadline_secs.map(Duration::from_secs));

    let report = Deployer::new(&client, catalog)
        .with_control(control)
        .run(pipeline, &spec);

    let exit_code = if report.success() { 0 } else { 1 };

    Ok((
        DeployOutput {
            command: "deploy".to_string(),
            pipeline,
            dry_run: false,
            report: Some(report),
            plan: None,
        },
        exit_code,
    ))
}
