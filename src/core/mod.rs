// Public modules
pub mod call;
pub mod credentials;
pub mod deploy;
pub mod error;
pub mod salts;
pub mod uapi;
pub mod wp_commands;
pub mod wp_config;

// Internal modules - not part of public API
pub(crate) mod paths;

// Public modules for CLI access
pub mod config;
pub mod defaults;

// Re-export common types for convenience
pub use call::CallResult;
pub use credentials::{AuthMode, Credentials};
pub use error::{Error, ErrorCode, Result};
pub use uapi::{RemoteInvoker, UapiClient};
