use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Base cpdeploy config directory (~/.config/cpdeploy/ on Unix, %APPDATA%\cpdeploy on Windows)
pub fn cpdeploy() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected(
                "APPDATA environment variable not set on Windows".to_string(),
            )
        })?;
        Ok(PathBuf::from(appdata).join("cpdeploy"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected(
                "HOME environment variable not set on Unix-like system".to_string(),
            )
        })?;
        Ok(PathBuf::from(home).join(".config").join("cpdeploy"))
    }
}

/// Global cpdeploy.json config file path
pub fn cpdeploy_json() -> Result<PathBuf> {
    Ok(cpdeploy()?.join("cpdeploy.json"))
}
