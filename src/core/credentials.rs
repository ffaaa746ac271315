//! Control-panel account credentials and the auth header they produce.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Account password, sent as HTTP Basic auth.
    Password,
    /// cPanel API token, sent as `cpanel account:token`.
    Token,
}

impl AuthMode {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "password" | "basic" => Ok(AuthMode::Password),
            "token" | "api_token" => Ok(AuthMode::Token),
            other => Err(Error::validation_invalid_argument(
                "auth",
                format!("Unknown auth mode '{}'", other),
                None,
                Some(vec!["password".to_string(), "token".to_string()]),
            )),
        }
    }
}

/// Immutable connection credentials for one cPanel account.
#[derive(Clone)]
pub struct Credentials {
    hostname: String,
    account: String,
    auth: AuthMode,
    secret: String,
    port: u16,
}

impl Credentials {
    pub fn new(
        hostname: &str,
        account: &str,
        auth: AuthMode,
        secret: &str,
        port: u16,
    ) -> Result<Self> {
        let hostname = validation::require_non_empty(hostname, "host", "Hostname is required")?;
        let account = validation::require_non_empty(account, "account", "Account is required")?;
        if secret.is_empty() {
            return Err(Error::validation_missing_argument(vec!["secret".to_string()])
                .with_hint("Pass --secret or set the CPANEL_SECRET environment variable"));
        }
        if port == 0 {
            return Err(Error::validation_invalid_argument(
                "port",
                "Port must be between 1 and 65535",
                None,
                None,
            ));
        }

        Ok(Self {
            hostname: hostname.to_string(),
            account: account.to_string(),
            auth,
            secret: secret.to_string(),
            port,
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn auth(&self) -> AuthMode {
        self.auth
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `https://{host}:{port}/execute/`
    pub fn base_url(&self) -> String {
        format!("https://{}:{}/execute/", self.hostname, self.port)
    }

    /// Value of the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        match self.auth {
            AuthMode::Password => {
                let encoded = STANDARD.encode(format!("{}:{}", self.account, self.secret));
                format!("Basic {}", encoded)
            }
            AuthMode::Token => format!("cpanel {}:{}", self.account, self.secret),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("hostname", &self.hostname)
            .field("account", &self.account)
            .field("auth", &self.auth)
            .field("secret", &"***")
            .field("port", &self.port)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(auth: AuthMode) -> Credentials {
        Credentials::new("panel.example.com", "acme", auth, "s3cret", 2083).unwrap()
    }

    #[test]
    fn password_mode_uses_basic_auth() {
        // base64("acme:s3cret")
        assert_eq!(
            creds(AuthMode::Password).authorization_header(),
            "Basic YWNtZTpzM2NyZXQ="
        );
    }

    #[test]
    fn token_mode_uses_cpanel_scheme() {
        assert_eq!(
            creds(AuthMode::Token).authorization_header(),
            "cpanel acme:s3cret"
        );
    }

    #[test]
    fn base_url_includes_port() {
        assert_eq!(
            creds(AuthMode::Token).base_url(),
            "https://panel.example.com:2083/execute/"
        );
    }

    #[test]
    fn debug_masks_secret() {
        let rendered = format!("{:?}", creds(AuthMode::Password));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn rejects_empty_secret_and_zero_port() {
        assert!(Credentials::new("h", "a", AuthMode::Token, "", 2083).is_err());
        assert!(Credentials::new("h", "a", AuthMode::Token, "x", 0).is_err());
        assert!(Credentials::new(" ", "a", AuthMode::Token, "x", 2083).is_err());
    }

    #[test]
    fn parses_auth_modes() {
        assert_eq!(AuthMode::parse("Password").unwrap(), AuthMode::Password);
        assert_eq!(AuthMode::parse("token").unwrap(), AuthMode::Token);
        assert!(AuthMode::parse("oauth").is_err());
    }
}
