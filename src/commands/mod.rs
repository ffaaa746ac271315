use clap::Args;
use serde_json::{json, Map, Value};
use std::io::Read;

use cpdeploy::credentials::{AuthMode, Credentials};
use cpdeploy::defaults::Defaults;

pub type CmdResult<T> = cpdeploy::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

/// Connection flags shared by every command that talks to cPanel.
#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// cPanel hostname
    #[arg(long)]
    pub host: String,

    /// cPanel account (also the database name prefix)
    #[arg(long)]
    pub account: String,

    /// Auth mode: password (Basic) or token (cPanel API token)
    #[arg(long, default_value = "password")]
    pub auth: String,

    /// cPanel port (defaults to the configured default_port)
    #[arg(long)]
    pub port: Option<u16>,

    /// Password or API token. Falls back to CPANEL_SECRET.
    #[arg(long)]
    pub secret: Option<String>,
}

impl ConnectionArgs {
    pub fn credentials(&self, defaults: &Defaults) -> cpdeploy::Result<Credentials> {
        let auth = AuthMode::parse(&self.auth)?;
        let secret = self
            .secret
            .clone()
            .or_else(|| std::env::var("CPANEL_SECRET").ok())
            .unwrap_or_default();
        let port = self.port.unwrap_or(defaults.api.default_port);

        Credentials::new(&self.host, &self.account, auth, &secret, port)
    }
}

// ============================================================================
// JSON Input Parsing (CLI layer)
// ============================================================================

/// Parse --key value pairs into a JSON object.
fn parse_kv_flags(extra: &[String]) -> cpdeploy::Result<Value> {
    let mut obj = Map::new();
    let mut iter = extra.iter().peekable();

    while let Some(arg) = iter.next() {
        if let Some(key) = arg.strip_prefix("--") {
            let value = iter.next().ok_or_else(|| {
                cpdeploy::Error::validation_invalid_argument(
                    key,
                    format!("Missing value for flag --{}", key),
                    None,
                    None,
                )
            })?;
            obj.insert(key.to_string(), parse_value(value));
        }
    }

    Ok(Value::Object(obj))
}

/// Parse a string value into appropriate JSON type.
/// Order: JSON literal → bool → number → string
fn parse_value(s: &str) -> Value {
    if let Ok(v) = serde_json::from_str(s) {
        return v;
    }
    if s == "true" {
        return json!(true);
    }
    if s == "false" {
        return json!(false);
    }
    if let Ok(n) = s.parse::<i64>() {
        return json!(n);
    }
    if let Ok(n) = s.parse::<f64>() {
        return json!(n);
    }
    json!(s)
}

/// Read JSON spec from string, file (@path), or stdin (-).
fn read_json_spec_to_string(spec: &str) -> cpdeploy::Result<String> {
    use std::io::IsTerminal;

    if spec.trim() == "-" {
        let mut buf = String::new();
        let mut stdin = std::io::stdin();
        if stdin.is_terminal() {
            return Err(cpdeploy::Error::validation_invalid_argument(
                "json",
                "Cannot read JSON from stdin when stdin is a TTY",
                None,
                None,
            ));
        }
        stdin.read_to_string(&mut buf).map_err(|e| {
            cpdeploy::Error::internal_io(e.to_string(), Some("read stdin".to_string()))
        })?;
        return Ok(buf);
    }

    if let Some(path) = spec.strip_prefix('@') {
        if path.trim().is_empty() {
            return Err(cpdeploy::Error::validation_invalid_argument(
                "json",
                "Invalid JSON spec '@' (missing file path)",
                None,
                None,
            ));
        }
        let path = cpdeploy::io::expand_path(path);
        return cpdeploy::io::read_file(&path, "read JSON spec");
    }

    Ok(spec.to_string())
}

/// Merge JSON spec with --key value flags. Flags override spec values.
pub fn merge_json_sources(spec: Option<&str>, extra: &[String]) -> cpdeploy::Result<Value> {
    let mut base = if let Some(spec) = spec {
        let raw = read_json_spec_to_string(spec)?;
        serde_json::from_str(&raw).map_err(|e| {
            cpdeploy::Error::validation_invalid_json(
                e,
                Some("parse JSON spec".to_string()),
                Some(raw.chars().take(200).collect::<String>()),
            )
        })?
    } else {
        Value::Object(Map::new())
    };

    if !extra.is_empty() {
        let flags = parse_kv_flags(extra)?;
        if let (Value::Object(base_obj), Value::Object(flags_obj)) = (&mut base, flags) {
            for (k, v) in flags_obj {
                base_obj.insert(k, v);
            }
        }
    }

    Ok(base)
}

pub mod call;
pub mod config;
pub mod deploy;
pub mod salts;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (cpdeploy::Result<serde_json::Value>, i32) {
    crate::tty::status("cpdeploy is working...");

    match command {
        crate::Commands::Deploy(args) => dispatch!(args, global, deploy),
        crate::Commands::Call(args) => dispatch!(args, global, call),
        crate::Commands::Salts(args) => dispatch!(args, global, salts),
        crate::Commands::Config(args) => dispatch!(args, global, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_inline_spec() {
        let extra = vec![
            "--domain".to_string(),
            "override.example.com".to_string(),
            "--install_plugins".to_string(),
            r#"["a","b"]"#.to_string(),
        ];
        let merged =
            merge_json_sources(Some(r#"{"domain":"example.com","db_name":"wp"}"#), &extra).unwrap();
        assert_eq!(merged["domain"], "override.example.com");
        assert_eq!(merged["db_name"], "wp");
        assert_eq!(merged["install_plugins"], json!(["a", "b"]));
    }

    #[test]
    fn flag_without_value_errors() {
        let err = merge_json_sources(None, &["--domain".to_string()]).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn invalid_inline_json_errors() {
        let err = merge_json_sources(Some("{oops"), &[]).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_json");
    }

    #[test]
    fn spec_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.json");
        std::fs::write(&path, r#"{"domain":"file.example.com"}"#).unwrap();
        let spec = format!("@{}", path.display());
        let merged = merge_json_sources(Some(&spec), &[]).unwrap();
        assert_eq!(merged["domain"], "file.example.com");
    }

    #[test]
    fn parse_value_types() {
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("astra"), json!("astra"));
    }
}
