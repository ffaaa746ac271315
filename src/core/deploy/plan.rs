use serde::Serialize;

use super::state::DeployState;
use super::types::{DeploySpec, Pipeline};

/// Every step the deployer knows, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    CreateDatabase,
    CreateDatabaseUser,
    GrantPrivileges,
    DownloadWordpress,
    WriteConfig,
    SetPermissions,
    InstallCore,
    InstallTheme,
    InstallPlugins,
    InstallElementor,
    UploadElementorPro,
    InstallElementorPro,
    UploadKit,
    ImportKit,
}

/// How a step's outcome affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRole {
    /// Failure halts; counted in `success`.
    Mandatory,
    /// Recorded only.
    Optional,
    /// Never halts; counted in `success` when planned.
    Counted,
}

impl StepKind {
    pub const BASE: [StepKind; 9] = [
        StepKind::CreateDatabase,
        StepKind::CreateDatabaseUser,
        StepKind::GrantPrivileges,
        StepKind::DownloadWordpress,
        StepKind::WriteConfig,
        StepKind::SetPermissions,
        StepKind::InstallCore,
        StepKind::InstallTheme,
        StepKind::InstallPlugins,
    ];

    pub const ELEMENTOR: [StepKind; 5] = [
        StepKind::InstallElementor,
        StepKind::UploadElementorPro,
        StepKind::InstallElementorPro,
        StepKind::UploadKit,
        StepKind::ImportKit,
    ];

    /// Key under which the step's result appears in the report.
    pub fn report_key(self) -> &'static str {
        match self {
            StepKind::CreateDatabase => "database_creation",
            StepKind::CreateDatabaseUser => "database_user_creation",
            StepKind::GrantPrivileges => "user_privileges",
            StepKind::DownloadWordpress => "wordpress_download",
            StepKind::WriteConfig => "wp_config_creation",
            StepKind::SetPermissions => "permissions",
            StepKind::InstallCore => "installation",
            StepKind::InstallTheme => "theme_installation",
            StepKind::InstallPlugins => "plugin_installation",
            StepKind::InstallElementor => "elementor_installation",
            StepKind::UploadElementorPro => "elementor_pro_upload",
            StepKind::InstallElementorPro => "elementor_pro_installation",
            StepKind::UploadKit => "kit_upload",
            StepKind::ImportKit => "kit_import",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StepKind::CreateDatabase => "Creating database",
            StepKind::CreateDatabaseUser => "Creating database user",
            StepKind::GrantPrivileges => "Granting privileges",
            StepKind::DownloadWordpress => "Downloading WordPress",
            StepKind::WriteConfig => "Writing wp-config.php",
            StepKind::SetPermissions => "Setting file permissions",
            StepKind::InstallCore => "Installing WordPress",
            StepKind::InstallTheme => "Installing theme",
            StepKind::InstallPlugins => "Installing plugins",
            StepKind::InstallElementor => "Installing Elementor",
            StepKind::UploadElementorPro => "Uploading Elementor Pro",
            StepKind::InstallElementorPro => "Installing Elementor Pro",
            StepKind::UploadKit => "Uploading kit",
            StepKind::ImportKit => "Importing kit",
        }
    }

    pub fn role(self) -> StepRole {
        match self {
            StepKind::CreateDatabase
            | StepKind::CreateDatabaseUser
            | StepKind::GrantPrivileges
            | StepKind::DownloadWordpress
            | StepKind::WriteConfig
            | StepKind::SetPermissions
            | StepKind::InstallCore => StepRole::Mandatory,
            StepKind::InstallTheme | StepKind::InstallPlugins => StepRole::Optional,
            StepKind::InstallElementor
            | StepKind::UploadElementorPro
            | StepKind::InstallElementorPro
            | StepKind::UploadKit
            | StepKind::ImportKit => StepRole::Counted,
        }
    }

    /// State reached when the step succeeds.
    pub fn reaches(self) -> DeployState {
        match self {
            StepKind::CreateDatabase => DeployState::DbCreated,
            StepKind::CreateDatabaseUser => DeployState::DbUserCreated,
            StepKind::GrantPrivileges => DeployState::PrivilegesSet,
            StepKind::DownloadWordpress => DeployState::CmsDownloaded,
            StepKind::WriteConfig => DeployState::ConfigWritten,
            StepKind::SetPermissions => DeployState::PermissionsSet,
            StepKind::InstallCore => DeployState::CmsInstalled,
            StepKind::InstallTheme => DeployState::ThemeInstalled,
            StepKind::InstallPlugins => DeployState::PluginsInstalled,
            StepKind::InstallElementor => DeployState::ElementorInstalled,
            StepKind::UploadElementorPro => DeployState::ProUploaded,
            StepKind::InstallElementorPro => DeployState::ProInstalled,
            StepKind::UploadKit => DeployState::KitUploaded,
            StepKind::ImportKit => DeployState::KitImported,
        }
    }

    /// Report keys for a pipeline, in order.
    pub fn catalog(pipeline: Pipeline) -> Vec<StepKind> {
        match pipeline {
            Pipeline::Base => StepKind::BASE.to_vec(),
            Pipeline::Extended => StepKind::BASE
                .iter()
                .chain(StepKind::ELEMENTOR.iter())
                .copied()
                .collect(),
        }
    }
}

impl Serialize for StepKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.report_key())
    }
}

/// One step selected for a run, with the steps that must have succeeded
/// before it may fire.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedStep {
    pub step: StepKind,
    pub role: StepRole,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<StepKind>,
}

impl PlannedStep {
    fn new(step: StepKind, requires: Vec<StepKind>) -> Self {
        Self {
            step,
            role: step.role(),
            requires,
        }
    }
}

/// Ordered steps for one deployment. Steps whose inputs were not supplied
/// are left out and stay null in the report.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentPlan {
    pub pipeline: Pipeline,
    pub steps: Vec<PlannedStep>,
}

impl DeploymentPlan {
    pub fn build(pipeline: Pipeline, spec: &DeploySpec) -> Self {
        let mut steps: Vec<PlannedStep> = StepKind::BASE[..7]
            .iter()
            .map(|kind| PlannedStep::new(*kind, Vec::new()))
            .collect();

        if spec.site.theme().is_some() {
            steps.push(PlannedStep::new(StepKind::InstallTheme, Vec::new()));
        }
        if !spec.site.plugins().is_empty() {
            steps.push(PlannedStep::new(StepKind::InstallPlugins, Vec::new()));
        }

        if pipeline == Pipeline::Extended {
            let elementor = &spec.elementor;
            steps.push(PlannedStep::new(StepKind::InstallElementor, Vec::new()));

            if elementor.pro_requested() {
                steps.push(PlannedStep::new(StepKind::UploadElementorPro, Vec::new()));
                steps.push(PlannedStep::new(
                    StepKind::InstallElementorPro,
                    vec![StepKind::UploadElementorPro],
                ));
            }

            if elementor.kit_file().is_some() {
                steps.push(PlannedStep::new(StepKind::UploadKit, Vec::new()));
            }

            if elementor.kit_requested() {
                // A URL is imported directly; only a file-only kit waits on its upload.
                let requires = if elementor.kit_url().is_some() {
                    vec![StepKind::InstallElementor]
                } else {
                    vec![StepKind::InstallElementor, StepKind::UploadKit]
                };
                steps.push(PlannedStep::new(StepKind::ImportKit, requires));
            }
        }

        Self { pipeline, steps }
    }

    pub fn contains(&self, step: StepKind) -> bool {
        self.steps.iter().any(|planned| planned.step == step)
    }

    /// Steps whose outcome enters the aggregate `success`.
    pub fn counted(&self) -> impl Iterator<Item = StepKind> + '_ {
        self.steps
            .iter()
            .filter(|planned| planned.role != StepRole::Optional)
            .map(|planned| planned.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(plan: &DeploymentPlan) -> Vec<&'static str> {
        plan.steps.iter().map(|s| s.step.report_key()).collect()
    }

    #[test]
    fn base_plan_without_optionals() {
        let plan = DeploymentPlan::build(Pipeline::Base, &DeploySpec::default());
        assert_eq!(plan.steps.len(), 7);
        assert!(plan.steps.iter().all(|s| s.role == StepRole::Mandatory));
        assert_eq!(keys(&plan).last(), Some(&"installation"));
    }

    #[test]
    fn base_plan_ignores_elementor_inputs() {
        let mut spec = DeploySpec::default();
        spec.elementor.kit_url = Some("https://k/kit.zip".to_string());
        let plan = DeploymentPlan::build(Pipeline::Base, &spec);
        assert!(!plan.contains(StepKind::ImportKit));
        assert!(!plan.contains(StepKind::InstallElementor));
    }

    #[test]
    fn extended_plan_with_everything() {
        let mut spec = DeploySpec::default();
        spec.site.install_theme = Some("astra".to_string());
        spec.site.install_plugins = vec!["a".to_string()];
        spec.elementor.elementor_pro_key = Some("KEY".to_string());
        spec.elementor.elementor_pro_local_path = Some("/tmp/pro.zip".to_string());
        spec.elementor.kit_local_path = Some("/tmp/kit.zip".to_string());

        let plan = DeploymentPlan::build(Pipeline::Extended, &spec);
        assert_eq!(
            keys(&plan)[7..],
            [
                "theme_installation",
                "plugin_installation",
                "elementor_installation",
                "elementor_pro_upload",
                "elementor_pro_installation",
                "kit_upload",
                "kit_import"
            ]
        );

        let import = plan.steps.last().unwrap();
        assert_eq!(
            import.requires,
            vec![StepKind::InstallElementor, StepKind::UploadKit]
        );
    }

    #[test]
    fn kit_url_imports_without_upload() {
        let mut spec = DeploySpec::default();
        spec.elementor.kit_url = Some("https://k/kit.zip".to_string());
        let plan = DeploymentPlan::build(Pipeline::Extended, &spec);
        assert!(!plan.contains(StepKind::UploadKit));
        let import = plan.steps.last().unwrap();
        assert_eq!(import.step, StepKind::ImportKit);
        assert_eq!(import.requires, vec![StepKind::InstallElementor]);
    }

    #[test]
    fn optional_steps_are_not_counted() {
        let mut spec = DeploySpec::default();
        spec.site.install_theme = Some("astra".to_string());
        let plan = DeploymentPlan::build(Pipeline::Extended, &spec);
        let counted: Vec<_> = plan.counted().collect();
        assert!(!counted.contains(&StepKind::InstallTheme));
        assert!(counted.contains(&StepKind::InstallElementor));
    }

    #[test]
    fn extended_catalog_has_fourteen_keys() {
        assert_eq!(StepKind::catalog(Pipeline::Extended).len(), 14);
        assert_eq!(StepKind::catalog(Pipeline::Base).len(), 9);
    }
}
