use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Value};
use std::io::Cursor;

use crate::call::CallResult;
use crate::defaults::Defaults;
use crate::error::{Error, Result};
use crate::salts::SaltProvider;
use crate::uapi::RemoteInvoker;
use crate::utils::io;
use crate::wp_commands::{self, CoreInstall};
use crate::wp_config::WpConfig;

use super::plan::StepKind;
use super::types::DeploySpec;

pub const PRO_PACKAGE_FILE: &str = "elementor-pro.zip";
pub const KIT_FILE: &str = "elementor-kit.zip";

/// A step rendered into the remote call it will make.
#[derive(Debug, Clone)]
pub enum StepCall {
    /// Structured UAPI call.
    Api {
        module: &'static str,
        function: &'static str,
        params: Value,
    },
    /// Shell command run through `Execute/exec`.
    Command(String),
    /// Local file pushed through `Fileman/save_file_content`.
    Upload {
        local_path: String,
        dir: String,
        file: String,
    },
}

impl StepCall {
    /// JSON description used by dry runs. Uploads are not read.
    pub fn preview(&self) -> Value {
        match self {
            StepCall::Api {
                module,
                function,
                params,
            } => json!({ "module": module, "function": function, "params": params }),
            StepCall::Command(command) => json!({
                "module": "Execute",
                "function": "exec",
                "params": { "command": command }
            }),
            StepCall::Upload {
                local_path,
                dir,
                file,
            } => json!({
                "module": "Fileman",
                "function": "save_file_content",
                "params": { "dir": dir, "file": file },
                "local_path": local_path
            }),
        }
    }

    /// Resolve into `(module, function, params)`. Uploads read, check and
    /// encode the local file here.
    fn into_request(self) -> Result<(&'static str, &'static str, Value)> {
        match self {
            StepCall::Api {
                module,
                function,
                params,
            } => Ok((module, function, params)),
            StepCall::Command(command) => Ok(("Execute", "exec", json!({ "command": command }))),
            StepCall::Upload {
                local_path,
                dir,
                file,
            } => {
                let content = encode_zip(&local_path)?;
                Ok((
                    "Fileman",
                    "save_file_content",
                    json!({ "dir": dir, "file": file, "content": content }),
                ))
            }
        }
    }
}

fn encode_zip(local_path: &str) -> Result<String> {
    let path = io::expand_path(local_path);
    let bytes = io::read_bytes(&path, "read upload").map_err(|e| {
        Error::deploy_upload_failed(local_path, format!("Failed to read local file: {}", e))
    })?;

    zip::ZipArchive::new(Cursor::new(bytes.as_slice())).map_err(|e| {
        Error::deploy_upload_failed(
            local_path,
            format!("{} is not a zip archive: {}", local_path, e),
        )
    })?;

    Ok(STANDARD.encode(&bytes))
}

/// The step catalog: turns a step and the deployment inputs into a
/// [`StepCall`], then runs it through a [`RemoteInvoker`].
pub struct StepCatalog<'a> {
    account: &'a str,
    defaults: &'a Defaults,
    salts: &'a dyn SaltProvider,
}

impl<'a> StepCatalog<'a> {
    pub fn new(account: &'a str, defaults: &'a Defaults, salts: &'a dyn SaltProvider) -> Self {
        Self {
            account,
            defaults,
            salts,
        }
    }

    fn prefixed(&self, name: &str) -> String {
        format!("{}_{}", self.account, name)
    }

    fn uploads_dir(&self, spec: &DeploySpec) -> String {
        wp_commands::remote_join(&spec.site.path, &self.defaults.wordpress.uploads_dir)
    }

    /// Server path of an uploaded file.
    pub fn uploaded_path(&self, spec: &DeploySpec, file: &str) -> String {
        wp_commands::remote_join(&self.uploads_dir(spec), file)
    }

    /// Build the call for `step`. Missing inputs fail here, before any
    /// network traffic.
    pub fn prepare(&self, step: StepKind, spec: &DeploySpec) -> Result<StepCall> {
        let site = &spec.site;
        let wordpress = &self.defaults.wordpress;

        match step {
            StepKind::CreateDatabase => {
                let name = required(&site.db_name, "db_name")?;
                Ok(StepCall::Api {
                    module: "Mysql",
                    function: "create_database",
                    params: json!({ "name": name, "charset": wordpress.db_charset }),
                })
            }
            StepKind::CreateDatabaseUser => {
                let name = required(&site.db_user, "db_user")?;
                let password = required_secret(&site.db_password, "db_password")?;
                Ok(StepCall::Api {
                    module: "Mysql",
                    function: "create_user",
                    params: json!({ "name": name, "password": password }),
                })
            }
            StepKind::GrantPrivileges => {
                let db = required(&site.db_name, "db_name")?;
                let user = required(&site.db_user, "db_user")?;
                Ok(StepCall::Api {
                    module: "Mysql",
                    function: "set_privileges_on_database",
                    params: json!({
                        "database": self.prefixed(db),
                        "user": self.prefixed(user),
                        "privileges": wordpress.privileges,
                    }),
                })
            }
            StepKind::DownloadWordpress => {
                let path = required(&site.path, "path")?;
                Ok(StepCall::Command(wp_commands::download_wordpress(
                    path,
                    &wordpress.download_url,
                )))
            }
            StepKind::WriteConfig => {
                let path = required(&site.path, "path")?;
                let db = required(&site.db_name, "db_name")?;
                let user = required(&site.db_user, "db_user")?;
                let password = required_secret(&site.db_password, "db_password")?;
                let config =
                    WpConfig::new(self.prefixed(db), self.prefixed(user), password, wordpress);
                let keys = self.salts.security_keys();
                Ok(StepCall::Command(wp_commands::write_config(
                    path,
                    &config.render(&keys),
                )))
            }
            StepKind::SetPermissions => {
                let path = required(&site.path, "path")?;
                Ok(StepCall::Command(wp_commands::harden_permissions(
                    path,
                    &self.defaults.permissions,
                )?))
            }
            StepKind::InstallCore => {
                let path = required(&site.path, "path")?;
                let install = CoreInstall {
                    url: required(&site.domain, "domain")?,
                    title: required(&site.site_title, "site_title")?,
                    admin_user: required(&site.admin_user, "admin_user")?,
                    admin_password: required_secret(&site.admin_password, "admin_password")?,
                    admin_email: required(&site.admin_email, "admin_email")?,
                };
                Ok(StepCall::Command(wp_commands::install_core(path, &install)))
            }
            StepKind::InstallTheme => {
                let path = required(&site.path, "path")?;
                let theme = site.theme().ok_or_else(|| {
                    Error::deploy_input_missing("install_theme", "No theme provided")
                })?;
                Ok(StepCall::Command(wp_commands::install_theme(path, theme)))
            }
            StepKind::InstallPlugins => {
                let path = required(&site.path, "path")?;
                let plugins = site.plugins();
                if plugins.is_empty() {
                    return Err(Error::deploy_input_missing(
                        "install_plugins",
                        "No plugins provided",
                    ));
                }
                Ok(StepCall::Command(wp_commands::install_plugins(
                    path, &plugins,
                )))
            }
            StepKind::InstallElementor => {
                let path = required(&site.path, "path")?;
                Ok(StepCall::Command(wp_commands::install_plugin(
                    path,
                    &wordpress.elementor_slug,
                )))
            }
            StepKind::UploadElementorPro => {
                required(&site.path, "path")?;
                let local_path = spec.elementor.pro_package().ok_or_else(|| {
                    Error::deploy_input_missing(
                        "elementor_pro_local_path",
                        "No Elementor Pro zip file path provided",
                    )
                })?;
                Ok(StepCall::Upload {
                    local_path: local_path.to_string(),
                    dir: self.uploads_dir(spec),
                    file: PRO_PACKAGE_FILE.to_string(),
                })
            }
            StepKind::InstallElementorPro => {
                let path = required(&site.path, "path")?;
                let key = spec.elementor.pro_key().ok_or_else(|| {
                    Error::deploy_input_missing(
                        "elementor_pro_key",
                        "No Elementor Pro license key provided",
                    )
                })?;
                if spec.elementor.pro_package().is_none() {
                    return Err(Error::deploy_input_missing(
                        "elementor_pro_local_path",
                        "No Elementor Pro zip file path provided",
                    ));
                }
                Ok(StepCall::Command(wp_commands::install_elementor_pro(
                    path,
                    &self.uploaded_path(spec, PRO_PACKAGE_FILE),
                    key,
                )))
            }
            StepKind::UploadKit => {
                required(&site.path, "path")?;
                let local_path = spec.elementor.kit_file().ok_or_else(|| {
                    Error::deploy_input_missing("kit_local_path", "No kit file provided")
                })?;
                Ok(StepCall::Upload {
                    local_path: local_path.to_string(),
                    dir: self.uploads_dir(spec),
                    file: KIT_FILE.to_string(),
                })
            }
            StepKind::ImportKit => {
                let path = required(&site.path, "path")?;
                let source = match (spec.elementor.kit_url(), spec.elementor.kit_file()) {
                    (Some(url), _) => url.to_string(),
                    (None, Some(_)) => self.uploaded_path(spec, KIT_FILE),
                    (None, None) => {
                        return Err(Error::deploy_input_missing(
                            "kit_url",
                            "No kit URL or file provided",
                        ))
                    }
                };
                Ok(StepCall::Command(wp_commands::import_kit(path, &source)))
            }
        }
    }

    /// Prepare and invoke. Local failures become a failed result without a
    /// remote call.
    pub fn run(&self, invoker: &dyn RemoteInvoker, step: StepKind, spec: &DeploySpec) -> CallResult {
        let request = self
            .prepare(step, spec)
            .and_then(|call| call.into_request());

        match request {
            Ok((module, function, params)) => invoker.invoke(module, function, &params),
            Err(err) => CallResult::from_error(&err),
        }
    }
}

fn required<'s>(value: &'s str, field: &str) -> Result<&'s str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::deploy_input_missing(
            field,
            format!("Missing required input: {}", field),
        ))
    } else {
        Ok(trimmed)
    }
}

/// Like [`required`], but the value is passed on exactly as given.
fn required_secret<'s>(value: &'s str, field: &str) -> Result<&'s str> {
    required(value, field).map(|_| value)
}
