//! Shell commands sent through `Execute/exec`.
//!
//! Every caller-supplied value passes through the quoting builders in
//! [`crate::utils::shell`]; nothing is spliced into a command string raw.

use crate::defaults::PermissionsConfig;
use crate::error::Result;
use crate::utils::shell::{heredoc_write, CommandLine, ShellScript};
use crate::utils::validation;

pub const CONFIG_FILE: &str = "wp-config.php";

/// Join a remote directory and a relative name with exactly one `/`.
pub fn remote_join(base: &str, rel: &str) -> String {
    let base = base.trim_end_matches('/');
    let rel = rel.trim_start_matches('/');
    if base.is_empty() {
        format!("/{}", rel)
    } else {
        format!("{}/{}", base, rel)
    }
}

/// Local file name for the archive at `url`, without query or fragment.
pub fn archive_name(url: &str) -> String {
    let without_query = url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url);
    without_query
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("latest.zip")
        .to_string()
}

/// Fetch the WordPress archive into `path` and flatten it there.
pub fn download_wordpress(path: &str, url: &str) -> String {
    let archive = archive_name(url);
    ShellScript::in_dir(path)
        .then(CommandLine::new("wget").literal("-O").arg(&archive).arg(url))
        .then(CommandLine::new("unzip").arg(&archive))
        .then(CommandLine::new("mv").literal("wordpress/*").literal("."))
        .then(
            CommandLine::new("rm")
                .literal("-rf")
                .literal("wordpress")
                .arg(&archive),
        )
        .render()
}

/// Write the rendered wp-config.php into `path`.
pub fn write_config(path: &str, content: &str) -> String {
    heredoc_write(&remote_join(path, CONFIG_FILE), content)
}

/// Recursive permission hardening: directories, files, then wp-config.php.
pub fn harden_permissions(path: &str, modes: &PermissionsConfig) -> Result<String> {
    let dir_mode = validation::require_octal_mode(&modes.dir_mode, "permissions.dir_mode")?;
    let file_mode = validation::require_octal_mode(&modes.file_mode, "permissions.file_mode")?;
    let config_mode =
        validation::require_octal_mode(&modes.config_mode, "permissions.config_mode")?;

    let chmod_all = |kind: &'static str, mode: &str| {
        CommandLine::new("find")
            .path(path)
            .literal("-type")
            .literal(kind)
            .literal("-exec")
            .literal("chmod")
            .arg(mode)
            .literal("{}")
            .literal("\\;")
    };

    Ok(ShellScript::new()
        .then(chmod_all("d", dir_mode))
        .then(chmod_all("f", file_mode))
        .then(
            CommandLine::new("chmod")
                .arg(config_mode)
                .path(&remote_join(path, CONFIG_FILE)),
        )
        .render())
}

/// Values for `wp core install`.
#[derive(Debug, Clone, Copy)]
pub struct CoreInstall<'a> {
    pub url: &'a str,
    pub title: &'a str,
    pub admin_user: &'a str,
    pub admin_password: &'a str,
    pub admin_email: &'a str,
}

pub fn install_core(path: &str, install: &CoreInstall<'_>) -> String {
    ShellScript::in_dir(path)
        .then(
            CommandLine::new("wp")
                .literal("core")
                .literal("install")
                .option("url", install.url)
                .option("title", install.title)
                .option("admin_user", install.admin_user)
                .option("admin_password", install.admin_password)
                .option("admin_email", install.admin_email)
                .literal("--skip-email"),
        )
        .render()
}

pub fn install_theme(path: &str, theme: &str) -> String {
    ShellScript::in_dir(path)
        .then(
            CommandLine::new("wp")
                .literal("theme")
                .literal("install")
                .arg(theme)
                .literal("--activate"),
        )
        .render()
}

fn plugin_install(source: &str) -> CommandLine {
    CommandLine::new("wp")
        .literal("plugin")
        .literal("install")
        .arg(source)
        .literal("--activate")
}

/// One combined command installing every plugin in order.
pub fn install_plugins(path: &str, plugins: &[String]) -> String {
    plugins
        .iter()
        .fold(ShellScript::in_dir(path), |script, plugin| {
            script.then(plugin_install(plugin))
        })
        .render()
}

/// Install a plugin from the WordPress.org repository by slug.
pub fn install_plugin(path: &str, slug: &str) -> String {
    ShellScript::in_dir(path).then(plugin_install(slug)).render()
}

/// Install the uploaded Pro package and activate its license.
pub fn install_elementor_pro(path: &str, package_path: &str, license_key: &str) -> String {
    ShellScript::in_dir(path)
        .then(plugin_install(package_path))
        .then(
            CommandLine::new("wp")
                .literal("elementor")
                .literal("license")
                .literal("activate")
                .arg(license_key),
        )
        .render()
}

/// Import a kit from a URL or a server-side path.
pub fn import_kit(path: &str, source: &str) -> String {
    ShellScript::in_dir(path)
        .then(
            CommandLine::new("wp")
                .literal("elementor")
                .literal("kit")
                .literal("import")
                .arg(source)
                .literal("--yes"),
        )
        .render()
}
