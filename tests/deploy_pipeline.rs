use std::cell::RefCell;
use std::io::Write;
use std::sync::atomic::Ordering;
use std::time::Duration;

use cpdeploy::call::CallResult;
use cpdeploy::credentials::{AuthMode, Credentials};
use cpdeploy::defaults::{Defaults, SaltMode};
use cpdeploy::deploy::{
    self, AbortReason, DeploySpec, DeployState, Deployer, ElementorSpec, Pipeline, RunControl,
    SiteSpec, StepCatalog, StepKind,
};
use cpdeploy::salts::LocalSaltProvider;
use cpdeploy::uapi::{RemoteInvoker, UapiClient};
use serde_json::Value;

/// Answers every call with success unless its signature contains one of
/// `fail_on`, and keeps a log of what was called.
struct ScriptedPanel {
    fail_on: Vec<&'static str>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedPanel {
    fn new() -> Self {
        Self::failing(&[])
    }

    fn failing(fail_on: &[&'static str]) -> Self {
        Self {
            fail_on: fail_on.to_vec(),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn called(&self, needle: &str) -> bool {
        self.calls.borrow().iter().any(|call| call.contains(needle))
    }
}

impl RemoteInvoker for ScriptedPanel {
    fn invoke(&self, module: &str, function: &str, params: &Value) -> CallResult {
        let signature = format!("{}/{} {}", module, function, params);
        self.calls.borrow_mut().push(signature.clone());

        match self.fail_on.iter().find(|needle| signature.contains(**needle)) {
            Some(needle) => CallResult::failure(vec![format!("scripted failure on {}", needle)]),
            None => CallResult::success(None),
        }
    }
}

fn salts() -> LocalSaltProvider {
    LocalSaltProvider {
        mode: SaltMode::Strict,
        length: 64,
    }
}

fn site() -> SiteSpec {
    SiteSpec {
        domain: "example.com".to_string(),
        path: "/home/acme/public_html".to_string(),
        db_name: "wp".to_string(),
        db_user: "wpuser".to_string(),
        db_password: "db-s3cret".to_string(),
        site_title: "Example".to_string(),
        admin_user: "admin".to_string(),
        admin_password: "admin-s3cret".to_string(),
        admin_email: "admin@example.com".to_string(),
        ..Default::default()
    }
}

fn extended(elementor: ElementorSpec) -> DeploySpec {
    DeploySpec {
        site: site(),
        elementor,
    }
}

fn write_zip(dir: &std::path::Path, name: &str) -> String {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("readme.txt", zip::write::FileOptions::default())
        .unwrap();
    zip.write_all(b"package").unwrap();
    zip.finish().unwrap();
    path.display().to_string()
}

#[test]
fn mandatory_failure_halts_and_leaves_later_steps_unattempted() {
    let panel = ScriptedPanel::failing(&["Mysql/create_user"]);
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);

    let report = Deployer::new(&panel, catalog).deploy_wordpress(&site());

    assert!(!report.success());
    assert_eq!(report.state(), DeployState::Halted);
    assert!(report.succeeded(StepKind::CreateDatabase));
    assert!(!report.succeeded(StepKind::CreateDatabaseUser));
    assert!(report.result(StepKind::GrantPrivileges).is_none());
    assert!(report.result(StepKind::InstallCore).is_none());
    assert_eq!(panel.calls().len(), 2);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["database_user_creation"]["status"], false);
    assert!(json["user_privileges"].is_null());
    assert!(json["installation"].is_null());
    assert_eq!(json["admin_url"], "https://example.com/wp-admin/");
    assert_eq!(json["success"], false);
}

#[test]
fn base_run_without_optionals_succeeds() {
    let panel = ScriptedPanel::new();
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);

    let report = Deployer::new(&panel, catalog).deploy_wordpress(&site());

    assert!(report.success());
    assert_eq!(report.state(), DeployState::Done);
    assert_eq!(panel.calls().len(), 7);
    assert!(report.result(StepKind::InstallTheme).is_none());
    assert!(report.result(StepKind::InstallPlugins).is_none());
    assert!(report.finished_at().is_some());

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["theme_installation"].is_null());
    assert!(json["plugin_installation"].is_null());
    assert!(json.get("elementor_installation").is_none());
    assert_eq!(json["admin_url"], "https://example.com/wp-admin/");
}

#[test]
fn privileges_use_account_prefixed_names() {
    let panel = ScriptedPanel::new();
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);

    Deployer::new(&panel, catalog).deploy_wordpress(&site());

    let grant = panel
        .calls()
        .into_iter()
        .find(|call| call.starts_with("Mysql/set_privileges_on_database"))
        .unwrap();
    assert!(grant.contains("\"database\":\"acme_wp\""));
    assert!(grant.contains("\"user\":\"acme_wpuser\""));
    assert!(panel.called("define('DB_NAME', 'acme_wp');"));
}

#[test]
fn plugins_without_theme_run_as_one_call() {
    let panel = ScriptedPanel::new();
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);
    let mut spec = site();
    spec.install_plugins = vec!["a".to_string(), "b".to_string()];

    let report = Deployer::new(&panel, catalog).deploy_wordpress(&spec);

    assert!(report.success());
    assert!(report.result(StepKind::InstallTheme).is_none());
    assert!(report.succeeded(StepKind::InstallPlugins));

    let plugin_calls: Vec<String> = panel
        .calls()
        .into_iter()
        .filter(|call| call.contains("wp plugin install"))
        .collect();
    assert_eq!(plugin_calls.len(), 1);
    assert!(plugin_calls[0].contains("wp plugin install a --activate"));
    assert!(plugin_calls[0].contains("wp plugin install b --activate"));
}

#[test]
fn optional_failure_is_recorded_but_not_counted() {
    let panel = ScriptedPanel::failing(&["wp theme install"]);
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);
    let mut spec = site();
    spec.install_theme = Some("astra".to_string());
    spec.install_plugins = vec!["seo".to_string()];

    let report = Deployer::new(&panel, catalog).deploy_wordpress(&spec);

    assert!(report.success());
    assert!(!report.succeeded(StepKind::InstallTheme));
    assert!(report.result(StepKind::InstallTheme).is_some());
    assert!(report.succeeded(StepKind::InstallPlugins));
    assert_eq!(report.state(), DeployState::Done);
}

#[test]
fn base_failure_skips_elementor_chain() {
    let panel = ScriptedPanel::failing(&["wget"]);
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);
    let spec = extended(ElementorSpec {
        kit_url: Some("https://kits.example.com/kit.zip".to_string()),
        ..Default::default()
    });

    let report = Deployer::new(&panel, catalog).deploy_wordpress_with_elementor(&spec);

    assert!(!report.success());
    assert_eq!(report.state(), DeployState::Halted);
    for step in StepKind::ELEMENTOR {
        assert!(report.result(step).is_none());
    }
    assert!(!panel.called("elementor"));

    let json = serde_json::to_value(&report).unwrap();
    for step in StepKind::catalog(Pipeline::Extended) {
        assert!(json.get(step.report_key()).is_some(), "missing {}", step.report_key());
    }
    assert!(json["kit_import"].is_null());
}

#[test]
fn failed_pro_upload_skips_pro_install() {
    let panel = ScriptedPanel::new();
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);
    let spec = extended(ElementorSpec {
        elementor_pro_key: Some("KEY-123".to_string()),
        elementor_pro_local_path: Some("/nonexistent/elementor-pro.zip".to_string()),
        ..Default::default()
    });

    let report = Deployer::new(&panel, catalog).deploy_wordpress_with_elementor(&spec);

    assert!(!report.success());
    assert!(report.succeeded(StepKind::InstallElementor));
    let upload = report.result(StepKind::UploadElementorPro).unwrap();
    assert!(!upload.status);
    assert!(upload.errors[0].contains("Failed to read local file"));
    assert!(report.result(StepKind::InstallElementorPro).is_none());
    assert!(!panel.called("license activate"));
    assert!(!panel.called("save_file_content"));
}

#[test]
fn pro_package_is_uploaded_then_installed() {
    let dir = tempfile::tempdir().unwrap();
    let package = write_zip(dir.path(), "pro.zip");
    let panel = ScriptedPanel::new();
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);
    let spec = extended(ElementorSpec {
        elementor_pro_key: Some("KEY-123".to_string()),
        elementor_pro_local_path: Some(package),
        ..Default::default()
    });

    let report = Deployer::new(&panel, catalog).deploy_wordpress_with_elementor(&spec);

    assert!(report.success());
    assert!(report.succeeded(StepKind::UploadElementorPro));
    assert!(report.succeeded(StepKind::InstallElementorPro));
    assert!(report.result(StepKind::ImportKit).is_none());

    let calls = panel.calls();
    let upload = calls
        .iter()
        .position(|call| call.starts_with("Fileman/save_file_content"))
        .unwrap();
    let install = calls
        .iter()
        .position(|call| call.contains("license activate KEY-123"))
        .unwrap();
    assert!(upload < install);
    assert!(calls[upload].contains("\"file\":\"elementor-pro.zip\""));
    assert!(calls[install]
        .contains("wp plugin install /home/acme/public_html/wp-content/uploads/elementor-pro.zip"));
}

#[test]
fn kit_url_imports_without_upload() {
    let panel = ScriptedPanel::new();
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);
    let spec = extended(ElementorSpec {
        kit_url: Some("https://kits.example.com/kit.zip".to_string()),
        ..Default::default()
    });

    let report = Deployer::new(&panel, catalog).deploy_wordpress_with_elementor(&spec);

    assert!(report.success());
    assert!(report.result(StepKind::UploadKit).is_none());
    assert!(report.succeeded(StepKind::ImportKit));
    assert!(panel.called("wp elementor kit import https://kits.example.com/kit.zip --yes"));
    assert!(!panel.called("save_file_content"));
    assert_eq!(report.state(), DeployState::Done);
}

#[test]
fn kit_file_is_uploaded_then_imported_from_server_path() {
    let dir = tempfile::tempdir().unwrap();
    let kit = write_zip(dir.path(), "kit.zip");
    let panel = ScriptedPanel::new();
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);
    let spec = extended(ElementorSpec {
        kit_local_path: Some(kit),
        ..Default::default()
    });

    let report = Deployer::new(&panel, catalog).deploy_wordpress_with_elementor(&spec);

    assert!(report.success());
    assert!(report.succeeded(StepKind::UploadKit));
    assert!(panel.called(
        "wp elementor kit import /home/acme/public_html/wp-content/uploads/elementor-kit.zip"
    ));
}

#[test]
fn kit_import_requires_elementor() {
    let panel = ScriptedPanel::failing(&["wp plugin install elementor --activate"]);
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);
    let spec = extended(ElementorSpec {
        kit_url: Some("https://kits.example.com/kit.zip".to_string()),
        ..Default::default()
    });

    let report = Deployer::new(&panel, catalog).deploy_wordpress_with_elementor(&spec);

    assert!(!report.success());
    assert!(!report.succeeded(StepKind::InstallElementor));
    assert!(report.result(StepKind::ImportKit).is_none());
    assert!(!panel.called("kit import"));
    assert_eq!(report.state(), DeployState::Done);
    assert_eq!(report.admin_url(), "https://example.com/wp-admin/");
}

#[test]
fn failed_kit_upload_skips_file_import() {
    let dir = tempfile::tempdir().unwrap();
    let kit = dir.path().join("kit.zip");
    std::fs::write(&kit, b"not a zip").unwrap();
    let panel = ScriptedPanel::new();
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);
    let spec = extended(ElementorSpec {
        kit_local_path: Some(kit.display().to_string()),
        ..Default::default()
    });

    let report = Deployer::new(&panel, catalog).deploy_wordpress_with_elementor(&spec);

    assert!(!report.success());
    assert!(report.succeeded(StepKind::InstallElementor));
    let upload = report.result(StepKind::UploadKit).unwrap();
    assert!(upload.errors[0].contains("is not a zip archive"));
    assert!(report.result(StepKind::ImportKit).is_none());
    assert!(!panel.called("kit import"));

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["kit_import"].is_null());
}

#[test]
fn failed_kit_upload_still_imports_from_url() {
    let panel = ScriptedPanel::failing(&["elementor-kit.zip"]);
    let dir = tempfile::tempdir().unwrap();
    let kit = write_zip(dir.path(), "kit.zip");
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);
    let spec = extended(ElementorSpec {
        kit_url: Some("https://kits.example.com/kit.zip".to_string()),
        kit_local_path: Some(kit),
        ..Default::default()
    });

    let report = Deployer::new(&panel, catalog).deploy_wordpress_with_elementor(&spec);

    assert!(!report.success());
    assert!(!report.succeeded(StepKind::UploadKit));
    assert!(report.succeeded(StepKind::ImportKit));
    assert!(panel.called("wp elementor kit import https://kits.example.com/kit.zip --yes"));
    assert_eq!(report.state(), DeployState::Done);
}

#[test]
fn failed_pro_install_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let package = write_zip(dir.path(), "pro.zip");
    let panel = ScriptedPanel::failing(&["license activate"]);
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);
    let spec = extended(ElementorSpec {
        elementor_pro_key: Some("KEY-123".to_string()),
        elementor_pro_local_path: Some(package),
        ..Default::default()
    });

    let report = Deployer::new(&panel, catalog).deploy_wordpress_with_elementor(&spec);

    assert!(!report.success());
    assert!(report.succeeded(StepKind::InstallElementor));
    assert!(report.succeeded(StepKind::UploadElementorPro));
    assert!(!report.succeeded(StepKind::InstallElementorPro));
    assert!(report.result(StepKind::InstallElementorPro).is_some());
    assert_eq!(report.state(), DeployState::Done);
}

#[test]
fn padded_passwords_pass_through_unchanged() {
    let panel = ScriptedPanel::new();
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);
    let mut spec = site();
    spec.db_password = "  pad pw  ".to_string();
    spec.admin_password = " adminpw ".to_string();

    let report = Deployer::new(&panel, catalog).deploy_wordpress(&spec);

    assert!(report.success());
    assert!(panel.called("Mysql/create_user {\"name\":\"wpuser\",\"password\":\"  pad pw  \"}"));
    assert!(panel.called("define('DB_PASSWORD', '  pad pw  ');"));
    assert!(panel.called("--admin_password=' adminpw '"));
}

#[test]
fn cancelled_run_stops_before_first_step() {
    let panel = ScriptedPanel::new();
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);
    let control = RunControl::new();
    control.cancel_flag().store(true, Ordering::SeqCst);

    let report = Deployer::new(&panel, catalog)
        .with_control(control)
        .deploy_wordpress(&site());

    assert!(!report.success());
    assert!(panel.calls().is_empty());
    assert_eq!(report.state(), DeployState::Halted);
    assert_eq!(report.aborted(), Some(&AbortReason::Cancelled));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["aborted"]["reason"], "cancelled");
}

#[test]
fn elapsed_deadline_aborts_run() {
    let panel = ScriptedPanel::new();
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);

    let report = Deployer::new(&panel, catalog)
        .with_control(RunControl::new().with_deadline(Some(Duration::ZERO)))
        .deploy_wordpress(&site());

    assert!(!report.success());
    assert!(panel.calls().is_empty());
    assert_eq!(
        report.aborted(),
        Some(&AbortReason::DeadlineExceeded { deadline_secs: 0 })
    );
}

#[test]
fn missing_input_fails_step_without_remote_call() {
    let panel = ScriptedPanel::new();
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);
    let mut spec = site();
    spec.db_password = String::new();

    let report = Deployer::new(&panel, catalog).deploy_wordpress(&spec);

    assert!(!report.success());
    let user = report.result(StepKind::CreateDatabaseUser).unwrap();
    assert!(user.errors[0].contains("db_password"));
    assert_eq!(panel.calls().len(), 1);
}

#[test]
fn unreachable_panel_yields_failed_result() {
    let credentials = Credentials::new("127.0.0.1", "acme", AuthMode::Password, "pw", 1).unwrap();
    let mut defaults = Defaults::default();
    defaults.api.timeout_secs = 5;
    let client = UapiClient::new(credentials, &defaults.api).unwrap();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);

    let report = Deployer::new(&client, catalog).deploy_wordpress(&site());

    assert!(!report.success());
    let result = report.result(StepKind::CreateDatabase).unwrap();
    assert!(!result.status);
    assert_eq!(result.errors.len(), 1);
    assert!(report.result(StepKind::CreateDatabaseUser).is_none());
}

#[test]
fn preview_masks_secrets() {
    let defaults = Defaults::default();
    let salts = salts();
    let catalog = StepCatalog::new("acme", &defaults, &salts);
    let spec = extended(ElementorSpec {
        elementor_pro_key: Some("KEY-SECRET".to_string()),
        elementor_pro_local_path: Some("/nonexistent/pro.zip".to_string()),
        ..Default::default()
    });

    let preview = deploy::preview(&catalog, Pipeline::Extended, &spec.masked());
    let text = serde_json::to_string(&preview).unwrap();

    assert!(!text.contains("db-s3cret"));
    assert!(!text.contains("admin-s3cret"));
    assert!(!text.contains("KEY-SECRET"));
    assert!(text.contains("********"));
    assert!(preview.steps.iter().all(|step| step.error.is_none()));
    assert_eq!(preview.admin_url, "https://example.com/wp-admin/");
}
