use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::Value;

use cpdeploy::defaults::{self, CpdeployConfig, Defaults};
use cpdeploy::validation;

use super::CmdResult;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Display configuration (merged defaults + file)
    Show {
        /// Show only built-in defaults (ignore cpdeploy.json)
        #[arg(long)]
        builtin: bool,
    },
    /// Set a configuration value at a JSON pointer path
    Set {
        /// JSON pointer path (e.g., /defaults/api/timeout_secs)
        pointer: String,
        /// Value to set (JSON)
        value: String,
    },
    /// Remove a configuration value at a JSON pointer path (reverts it to the built-in)
    Remove {
        /// JSON pointer path (e.g., /defaults/salts/mode)
        pointer: String,
    },
    /// Reset configuration to built-in defaults (deletes cpdeploy.json)
    Reset,
    /// Show the path to cpdeploy.json
    Path,
}

#[derive(Debug, Default, Serialize)]
pub struct ConfigOutput {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<CpdeployConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    defaults: Option<Defaults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pointer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted: Option<bool>,
}

impl ConfigOutput {
    fn new(command: &str) -> Self {
        Self {
            command: format!("config.{}", command),
            ..Default::default()
        }
    }
}

pub fn run(args: ConfigArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ConfigOutput> {
    match args.command {
        ConfigCommand::Show { builtin } => show(builtin),
        ConfigCommand::Set { pointer, value } => set(&pointer, &value),
        ConfigCommand::Remove { pointer } => remove(&pointer),
        ConfigCommand::Reset => reset(),
        ConfigCommand::Path => path(),
    }
}

fn show(builtin: bool) -> CmdResult<ConfigOutput> {
    let mut output = ConfigOutput::new("show");
    if builtin {
        output.defaults = Some(defaults::builtin_defaults());
    } else {
        output.config = Some(defaults::load_config());
    }
    Ok((output, 0))
}

fn set(pointer: &str, value_str: &str) -> CmdResult<ConfigOutput> {
    let value: Value = serde_json::from_str(value_str).map_err(|e| {
        cpdeploy::Error::validation_invalid_json(
            e,
            Some("parse value".to_string()),
            Some(value_str.chars().take(200).collect::<String>()),
        )
    })?;

    let config = edit_config(|json| cpdeploy::config::set_json_pointer(json, pointer, value.clone()))?;

    let mut output = ConfigOutput::new("set");
    output.config = Some(config);
    output.pointer = Some(pointer.to_string());
    output.value = Some(value);
    Ok((output, 0))
}

fn remove(pointer: &str) -> CmdResult<ConfigOutput> {
    let config =
        edit_config(|json| cpdeploy::config::remove_json_pointer(json, pointer).map(|_| ()))?;

    let mut output = ConfigOutput::new("remove");
    output.config = Some(config);
    output.pointer = Some(pointer.to_string());
    Ok((output, 0))
}

/// Load, edit as JSON, re-validate, save.
fn edit_config(
    edit: impl FnOnce(&mut Value) -> cpdeploy::Result<()>,
) -> cpdeploy::Result<CpdeployConfig> {
    let config = defaults::load_config();

    let mut config_json = serde_json::to_value(&config).map_err(|e| {
        cpdeploy::Error::internal_unexpected(format!("Failed to serialize config: {}", e))
    })?;

    edit(&mut config_json)?;

    let config: CpdeployConfig = serde_json::from_value(config_json).map_err(|e| {
        cpdeploy::Error::validation_invalid_json(e, Some("deserialize config".to_string()), None)
    })?;

    let modes = &config.defaults.permissions;
    validation::require_octal_mode(&modes.dir_mode, "permissions.dir_mode")?;
    validation::require_octal_mode(&modes.file_mode, "permissions.file_mode")?;
    validation::require_octal_mode(&modes.config_mode, "permissions.config_mode")?;

    defaults::save_config(&config)?;
    Ok(config)
}

fn reset() -> CmdResult<ConfigOutput> {
    let deleted = defaults::reset_config()?;

    let mut output = ConfigOutput::new("reset");
    output.defaults = Some(defaults::builtin_defaults());
    output.path = Some(defaults::config_path()?);
    output.deleted = Some(deleted);
    Ok((output, 0))
}

fn path() -> CmdResult<ConfigOutput> {
    let mut output = ConfigOutput::new("path");
    output.path = Some(defaults::config_path()?);
    output.exists = Some(defaults::config_exists());
    Ok((output, 0))
}
