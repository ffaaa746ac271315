use serde::{Deserialize, Serialize};

/// Inputs for the base WordPress install.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteSpec {
    #[serde(default)]
    pub domain: String,
    /// Server directory WordPress is installed into.
    #[serde(default)]
    pub path: String,
    /// Database name without the account prefix.
    #[serde(default)]
    pub db_name: String,
    /// Database user without the account prefix.
    #[serde(default)]
    pub db_user: String,
    #[serde(default)]
    pub db_password: String,
    #[serde(default)]
    pub site_title: String,
    #[serde(default)]
    pub admin_user: String,
    #[serde(default)]
    pub admin_password: String,
    #[serde(default)]
    pub admin_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_theme: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub install_plugins: Vec<String>,
}

impl SiteSpec {
    const REQUIRED: [&'static str; 9] = [
        "domain",
        "path",
        "db_name",
        "db_user",
        "db_password",
        "site_title",
        "admin_user",
        "admin_password",
        "admin_email",
    ];

    fn field(&self, name: &str) -> &str {
        match name {
            "domain" => &self.domain,
            "path" => &self.path,
            "db_name" => &self.db_name,
            "db_user" => &self.db_user,
            "db_password" => &self.db_password,
            "site_title" => &self.site_title,
            "admin_user" => &self.admin_user,
            "admin_password" => &self.admin_password,
            "admin_email" => &self.admin_email,
            _ => "",
        }
    }

    /// Required fields that are empty.
    pub fn missing_fields(&self) -> Vec<String> {
        Self::REQUIRED
            .iter()
            .filter(|name| self.field(name).trim().is_empty())
            .map(|name| name.to_string())
            .collect()
    }

    pub fn theme(&self) -> Option<&str> {
        non_empty(self.install_theme.as_deref())
    }

    pub fn plugins(&self) -> Vec<String> {
        self.install_plugins
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn admin_url(&self) -> String {
        format!("https://{}/wp-admin/", self.domain)
    }
}

/// Optional Elementor layer for the extended pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementorSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elementor_pro_key: Option<String>,
    /// Local path of the Pro plugin zip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elementor_pro_local_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kit_url: Option<String>,
    /// Local path of a kit zip to upload before import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kit_local_path: Option<String>,
}

impl ElementorSpec {
    pub fn pro_key(&self) -> Option<&str> {
        non_empty(self.elementor_pro_key.as_deref())
    }

    pub fn pro_package(&self) -> Option<&str> {
        non_empty(self.elementor_pro_local_path.as_deref())
    }

    pub fn kit_url(&self) -> Option<&str> {
        non_empty(self.kit_url.as_deref())
    }

    pub fn kit_file(&self) -> Option<&str> {
        non_empty(self.kit_local_path.as_deref())
    }

    /// Pro runs only with both a license key and a package.
    pub fn pro_requested(&self) -> bool {
        self.pro_key().is_some() && self.pro_package().is_some()
    }

    pub fn kit_requested(&self) -> bool {
        self.kit_url().is_some() || self.kit_file().is_some()
    }
}

/// Everything one deployment needs. Deserialized from the CLI `--json` input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploySpec {
    #[serde(flatten)]
    pub site: SiteSpec,
    #[serde(flatten)]
    pub elementor: ElementorSpec,
}

impl DeploySpec {
    const MASK: &'static str = "********";

    /// Copy with passwords and the license key replaced, for previews.
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        copy.site.db_password = Self::MASK.to_string();
        copy.site.admin_password = Self::MASK.to_string();
        if copy.elementor.pro_key().is_some() {
            copy.elementor.elementor_pro_key = Some(Self::MASK.to_string());
        }
        copy
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Which pipeline a deployment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pipeline {
    Base,
    Extended,
}
