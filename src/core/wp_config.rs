//! wp-config.php rendering.

use crate::defaults::WordpressConfig;
use crate::salts::{escape_php, SecurityKeys};

/// Database settings written into wp-config.php. Names are already
/// account-prefixed.
#[derive(Debug, Clone)]
pub struct WpConfig {
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub db_host: String,
    pub db_charset: String,
    pub table_prefix: String,
}

impl WpConfig {
    pub fn new(
        db_name: String,
        db_user: String,
        db_password: &str,
        wordpress: &WordpressConfig,
    ) -> Self {
        Self {
            db_name,
            db_user,
            db_password: db_password.to_string(),
            db_host: wordpress.db_host.clone(),
            db_charset: wordpress.db_charset.clone(),
            table_prefix: wordpress.table_prefix.clone(),
        }
    }

    pub fn render(&self, keys: &SecurityKeys) -> String {
        let mut out = String::new();
        out.push_str("<?php\n");
        out.push_str("// ** Database settings ** //\n");
        out.push_str(&define("DB_NAME", &self.db_name));
        out.push_str(&define("DB_USER", &self.db_user));
        out.push_str(&define("DB_PASSWORD", &self.db_password));
        out.push_str(&define("DB_HOST", &self.db_host));
        out.push_str(&define("DB_CHARSET", &self.db_charset));
        out.push_str(&define("DB_COLLATE", ""));
        out.push('\n');
        out.push_str("// ** Authentication unique keys and salts ** //\n");
        out.push_str(&keys.to_php());
        out.push_str("\n\n");
        out.push_str(&format!(
            "$table_prefix = '{}';\n\n",
            escape_php(&self.table_prefix)
        ));
        out.push_str("define('WP_DEBUG', false);\n\n");
        out.push_str("if ( ! defined('ABSPATH') ) {\n");
        out.push_str("\tdefine('ABSPATH', __DIR__ . '/');\n");
        out.push_str("}\n\n");
        out.push_str("require_once ABSPATH . 'wp-settings.php';\n");
        out
    }
}

fn define(name: &str, value: &str) -> String {
    format!("define('{}', '{}');\n", name, escape_php(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::Defaults;

    fn config(password: &str) -> WpConfig {
        WpConfig::new(
            "acme_wp".to_string(),
            "acme_wpuser".to_string(),
            password,
            &Defaults::default().wordpress,
        )
    }

    #[test]
    fn renders_database_block() {
        let php = config("hunter2").render(&SecurityKeys::placeholder("k"));
        assert!(php.starts_with("<?php\n"));
        assert!(php.contains("define('DB_NAME', 'acme_wp');"));
        assert!(php.contains("define('DB_USER', 'acme_wpuser');"));
        assert!(php.contains("define('DB_PASSWORD', 'hunter2');"));
        assert!(php.contains("define('DB_HOST', 'localhost');"));
        assert!(php.contains("define('DB_CHARSET', 'utf8');"));
        assert!(php.contains("$table_prefix = 'wp_';"));
        assert!(php.trim_end().ends_with("require_once ABSPATH . 'wp-settings.php';"));
    }

    #[test]
    fn includes_all_security_keys() {
        let php = config("pw").render(&SecurityKeys::placeholder("xyz"));
        for name in crate::salts::SALT_NAMES {
            assert!(php.contains(&format!("define('{}',", name)), "{}", name);
        }
    }

    #[test]
    fn password_quotes_cannot_break_out() {
        let php = config("a'); system('id'); //").render(&SecurityKeys::placeholder("k"));
        assert!(php.contains("define('DB_PASSWORD', 'a\\'); system(\\'id\\'); //');"));
    }
}
