use clap::Args;
use serde::Serialize;
use std::time::Duration;

use cpdeploy::defaults::{self, SaltMode};
use cpdeploy::salts::{KeySource, LocalSaltProvider, SaltProvider, ServiceSaltProvider};

use super::CmdResult;

#[derive(Args)]
pub struct SaltsArgs {
    /// Generate locally instead of asking the key service
    #[arg(long)]
    pub offline: bool,

    /// Local generation mode: strict (8 distinct values) or faithful (1 value reused)
    #[arg(long)]
    pub mode: Option<String>,
}

#[derive(Serialize)]
pub struct SaltsOutput {
    pub command: String,
    pub source: KeySource,
    pub php: String,
}

fn parse_mode(value: &str) -> cpdeploy::Result<SaltMode> {
    match value {
        "strict" => Ok(SaltMode::Strict),
        "faithful" => Ok(SaltMode::Faithful),
        other => Err(cpdeploy::Error::validation_invalid_argument(
            "mode",
            format!("Unknown salt mode '{}'", other),
            None,
            Some(vec!["strict".to_string(), "faithful".to_string()]),
        )),
    }
}

pub fn run(args: SaltsArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<SaltsOutput> {
    let defaults = defaults::load_defaults();
    let mut config = defaults.salts.clone();
    if let Some(mode) = args.mode.as_deref() {
        config.mode = parse_mode(mode)?;
    }

    let keys = if args.offline {
        LocalSaltProvider {
            mode: config.mode,
            length: config.length,
        }
        .security_keys()
    } else {
        ServiceSaltProvider::new(config, Duration::from_secs(defaults.api.timeout_secs))
            .security_keys()
    };

    let php = keys.to_php();

    Ok((
        SaltsOutput {
            command: "salts".to_string(),
            source: keys.source,
            php,
        },
        0,
    ))
}
