//! WordPress security constants (AUTH_KEY ... NONCE_SALT).
//!
//! Fetched from the WordPress secret-key service; any failure falls back to
//! local generation.

use rand::Rng;
use regex::Regex;
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;

use crate::defaults::{SaltMode, SaltsConfig};
use crate::error::{Error, RemoteStatusFailedDetails, RemoteTargetDetails, Result};

pub const SALT_NAMES: [&str; 8] = [
    "AUTH_KEY",
    "SECURE_AUTH_KEY",
    "LOGGED_IN_KEY",
    "NONCE_KEY",
    "AUTH_SALT",
    "SECURE_AUTH_SALT",
    "LOGGED_IN_SALT",
    "NONCE_SALT",
];

/// Letters, digits and ASCII punctuation.
const CHARSET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum KeySource {
    Service,
    Generated { mode: SaltMode },
}

/// The eight constants in `SALT_NAMES` order.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityKeys {
    pub source: KeySource,
    values: Vec<String>,
}

impl SecurityKeys {
    /// Same text for every constant. Used to render previews without real keys.
    pub fn placeholder(text: &str) -> Self {
        Self {
            source: KeySource::Generated {
                mode: SaltMode::Faithful,
            },
            values: vec![text.to_string(); SALT_NAMES.len()],
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        SALT_NAMES
            .iter()
            .position(|candidate| *candidate == name)
            .and_then(|idx| self.values.get(idx))
            .map(String::as_str)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// `define('NAME', 'value');` lines for wp-config.php.
    pub fn to_php(&self) -> String {
        SALT_NAMES
            .iter()
            .zip(&self.values)
            .map(|(name, value)| {
                let name_col = format!("'{}',", name);
                format!("define({:<19} '{}');", name_col, escape_php(value))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Escape for a single-quoted PHP string literal.
pub fn escape_php(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn unescape_php(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next @ ('\\' | '\'')) => out.push(next),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Source of security constants for the wp-config step.
pub trait SaltProvider {
    fn security_keys(&self) -> SecurityKeys;
}

/// Secret-key service with local fallback.
pub struct ServiceSaltProvider {
    config: SaltsConfig,
    timeout: Duration,
}

impl ServiceSaltProvider {
    pub fn new(config: SaltsConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }
}

impl SaltProvider for ServiceSaltProvider {
    fn security_keys(&self) -> SecurityKeys {
        match fetch(&self.config.endpoint, self.timeout).and_then(|body| parse_service_block(&body))
        {
            Ok(keys) => {
                log_status!("salts", "Fetched security keys from {}", self.config.endpoint);
                keys
            }
            Err(err) => {
                log_status!("salts", "Key service unavailable ({}), generating locally", err);
                generate(self.config.mode, self.config.length)
            }
        }
    }
}

/// Local generation only; never touches the network.
pub struct LocalSaltProvider {
    pub mode: SaltMode,
    pub length: usize,
}

impl SaltProvider for LocalSaltProvider {
    fn security_keys(&self) -> SecurityKeys {
        generate(self.mode, self.length)
    }
}

fn fetch(endpoint: &str, timeout: Duration) -> Result<String> {
    let target = RemoteTargetDetails {
        host: endpoint.to_string(),
        module: "secret-key".to_string(),
        function: "salt".to_string(),
    };

    let client = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::internal_unexpected(format!("Failed to build HTTP client: {}", e)))?;

    let response = client
        .get(endpoint)
        .send()
        .map_err(|e| Error::remote_http_failed(&e, target.clone()))?;

    let status = response.status();
    let body = response
        .text()
        .map_err(|e| Error::remote_http_failed(&e, target.clone()))?;

    if !status.is_success() {
        return Err(Error::remote_status_failed(RemoteStatusFailedDetails {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
            target,
        }));
    }

    Ok(body)
}

/// Parse the service's `define(...)` block. All eight constants must be present.
pub fn parse_service_block(body: &str) -> Result<SecurityKeys> {
    let re = Regex::new(r#"define\(\s*'([A-Z_]+)'\s*,\s*'((?:[^'\\]|\\.)*)'\s*\)\s*;"#)
        .map_err(|e| Error::internal_unexpected(e.to_string()))?;

    let mut values: Vec<Option<String>> = vec![None; SALT_NAMES.len()];
    for cap in re.captures_iter(body) {
        if let Some(idx) = SALT_NAMES.iter().position(|name| *name == &cap[1]) {
            values[idx] = Some(unescape_php(&cap[2]));
        }
    }

    let missing: Vec<String> = SALT_NAMES
        .iter()
        .zip(&values)
        .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
        .map(|(name, _)| name.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(Error::remote_invalid_response(
            format!("secret-key block is missing {}", missing.join(", ")),
            Some(body.chars().take(200).collect()),
        ));
    }

    Ok(SecurityKeys {
        source: KeySource::Service,
        values: values.into_iter().flatten().collect(),
    })
}

/// Locally generated constants.
///
/// `Strict` draws eight independent values. `Faithful` draws one and repeats
/// it, matching installs made by earlier tooling.
pub fn generate(mode: SaltMode, length: usize) -> SecurityKeys {
    let values = match mode {
        SaltMode::Strict => (0..SALT_NAMES.len())
            .map(|_| random_string(length))
            .collect(),
        SaltMode::Faithful => vec![random_string(length); SALT_NAMES.len()],
    };

    SecurityKeys {
        source: KeySource::Generated { mode },
        values,
    }
}

fn random_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}
