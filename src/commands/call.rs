use clap::Args;
use serde::Serialize;

use cpdeploy::call::CallResult;
use cpdeploy::defaults;
use cpdeploy::uapi::{RemoteInvoker, UapiClient};

use super::{CmdResult, ConnectionArgs};

#[derive(Args)]
pub struct CallArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// UAPI module (e.g. Mysql)
    pub module: String,

    /// UAPI function (e.g. list_databases)
    pub function: String,

    /// Parameters: inline JSON, @file, or - for stdin
    #[arg(long, value_name = "JSON")]
    pub json: Option<String>,

    /// Parameters as --key value pairs (after '--')
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub extra: Vec<String>,
}

#[derive(Serialize)]
pub struct CallOutput {
    pub command: String,
    pub module: String,
    pub function: String,
    pub result: CallResult,
}

pub fn run(args: CallArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<CallOutput> {
    let params = super::merge_json_sources(args.json.as_deref(), &args.extra)?;
    let defaults = defaults::load_defaults();
    let client = UapiClient::new(args.connection.credentials(&defaults)?, &defaults.api)?;

    let result = client.invoke(&args.module, &args.function, &params);
    let exit_code = if result.is_success() { 0 } else { 1 };

    Ok((
        CallOutput {
            command: "call".to_string(),
            module: args.module,
            function: args.function,
            result,
        },
        exit_code,
    ))
}
