//! cPanel UAPI client.
//!
//! `POST https://{host}:{port}/execute/{module}/{function}` with a JSON body.
//! Every failure is folded into a [`CallResult`]; `invoke` never errors.

use reqwest::blocking::{Client, Response};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::call::CallResult;
use crate::credentials::Credentials;
use crate::defaults::ApiConfig;
use crate::error::{Error, RemoteStatusFailedDetails, RemoteTargetDetails, Result};

/// Generic remote-procedure invoker.
///
/// The deployment pipeline only talks to the control panel through this
/// trait, so tests can drive it with scripted results.
pub trait RemoteInvoker {
    fn invoke(&self, module: &str, function: &str, params: &Value) -> CallResult;
}

/// Blocking HTTP implementation of [`RemoteInvoker`].
pub struct UapiClient {
    client: Client,
    credentials: Credentials,
}

impl UapiClient {
    pub fn new(credentials: Credentials, api: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .danger_accept_invalid_certs(api.accept_invalid_certs)
            .build()
            .map_err(|e| Error::internal_unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn endpoint(&self, module: &str, function: &str) -> String {
        format!("{}{}/{}", self.credentials.base_url(), module, function)
    }

    fn target(&self, module: &str, function: &str) -> RemoteTargetDetails {
        RemoteTargetDetails {
            host: self.credentials.hostname().to_string(),
            module: module.to_string(),
            function: function.to_string(),
        }
    }

    /// Makes the POST and returns the decoded JSON body.
    pub fn post(&self, module: &str, function: &str, params: &Value) -> Result<Value> {
        let url = self.endpoint(module, function);
        log_status!("uapi", "POST {}/{} on {}", module, function, self.credentials.hostname());

        let body = if params.is_null() {
            Value::Object(Map::new())
        } else {
            params.clone()
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.credentials.authorization_header())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .map_err(|e| Error::remote_http_failed(&e, self.target(module, function)))?;

        parse_json_response(response, self.target(module, function))
    }
}

impl RemoteInvoker for UapiClient {
    fn invoke(&self, module: &str, function: &str, params: &Value) -> CallResult {
        match self.post(module, function, params) {
            Ok(body) => CallResult::from_response(&body),
            Err(err) => CallResult::from_error(&err),
        }
    }
}

fn parse_json_response(response: Response, target: RemoteTargetDetails) -> Result<Value> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|e| Error::remote_http_failed(&e, target.clone()))?;

    if !status.is_success() {
        return Err(Error::remote_status_failed(RemoteStatusFailedDetails {
            status: status.as_u16(),
            body: body.chars().take(500).collect(),
            target,
        }));
    }

    decode_body(&body)
}

/// Decode a 2xx body. cPanel answers login failures with an HTML page, so a
/// non-JSON body is a malformed-payload failure rather than a panic.
pub(crate) fn decode_body(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| {
        Error::remote_invalid_response(e.to_string(), Some(body.chars().take(200).collect()))
    })
}
