//! Credentials from the local INI-style property file.

use crate::error::ConfigError;
use core_types::{CoreError, CredentialSet};
use ini::{Ini, ParseOption};
use serde_json::{Map, Value};
use std::path::Path;

/// Reads the credential set from `section` of the property file at `path`.
///
/// Values are taken verbatim: quotes and backslashes are part of the value.
/// A missing file, a missing section, a missing required key and an
/// unparsable port are all configuration errors.
pub fn load_local_credentials(path: &Path, section: &str) -> Result<CredentialSet, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let options = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };
    let file = Ini::load_from_file_opt(path, options)?;

    let properties = file
        .section(Some(section))
        .ok_or_else(|| ConfigError::InvalidFile(format!("No section: '{section}'")))?;

    let raw: Map<String, Value> = properties
        .iter()
        .map(|(key, value)| (key.to_lowercase(), Value::String(value.to_string())))
        .collect();

    CredentialSet::from_map(&raw).map_err(|e| match e {
        CoreError::MissingCredential(key) => {
            ConfigError::InvalidFile(format!("No option '{key}' in section: '{section}'"))
        }
        CoreError::InvalidValue(key, value) => {
            ConfigError::InvalidFile(format!("Invalid value for '{key}' in section '{section}': {value}"))
        }
        other => ConfigError::Credentials(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::SslMode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn properties(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".properties").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_all_fields() {
        let file = properties(
            "[postgresql]\nhost = localhost\nport = 5432\ndatabase = testdb\nusername = testuser\npassword = testpass\nssl_mode = require\n",
        );
        let creds = load_local_credentials(file.path(), "postgresql").unwrap();
        assert_eq!(creds.host, "localhost");
        assert_eq!(creds.port, 5432);
        assert_eq!(creds.database, "testdb");
        assert_eq!(creds.username, "testuser");
        assert_eq!(creds.password, "testpass");
        assert_eq!(creds.ssl_mode, SslMode::Require);
    }

    #[test]
    fn ssl_mode_defaults_to_require() {
        let file = properties(
            "[postgresql]\nhost = db\nport = 6432\ndatabase = app\nusername = app\npassword = secret\n",
        );
        let creds = load_local_credentials(file.path(), "postgresql").unwrap();
        assert_eq!(creds.port, 6432);
        assert_eq!(creds.ssl_mode, SslMode::Require);
    }

    #[test]
    fn missing_file() {
        let err = load_local_credentials(Path::new("nonexistent.properties"), "postgresql").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
        assert!(err.to_string().contains("Configuration file not found"));
    }

    #[test]
    fn missing_section() {
        let file = properties("[invalid]\nhost = localhost\n");
        let err = load_local_credentials(file.path(), "postgresql").unwrap_err();
        assert!(err.to_string().contains("Invalid configuration file"));
    }

    #[test]
    fn values_are_kept_verbatim() {
        let file = properties(
            "[postgresql]\nhost = db\nport = 5432\ndatabase = app\nusername = \"quoted\"\npassword = a\\tb\\\\c\n",
        );
        let creds = load_local_credentials(file.path(), "postgresql").unwrap();
        assert_eq!(creds.username, "\"quoted\"");
        assert_eq!(creds.password, r"a\tb\\c");
    }

    #[test]
    fn keys_and_separators_inside_values() {
        let file = properties(
            "[postgresql]\nhost = db\nport = 5432\ndatabase = app\nusername = Tr1cky=User\npassword = p;ss#word\n",
        );
        let creds = load_local_credentials(file.path(), "postgresql").unwrap();
        assert_eq!(creds.username, "Tr1cky=User");
        assert_eq!(creds.password, "p;ss#word");
    }

    #[test]
    fn missing_key_names_the_option() {
        let file = properties("[postgresql]\nhost = db\nport = 5432\ndatabase = app\nusername = app\n");
        let err = load_local_credentials(file.path(), "postgresql").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFile(ref m) if m.contains("password")));
    }

    #[test]
    fn bad_port() {
        let file = properties(
            "[postgresql]\nhost = db\nport = fivefour\ndatabase = app\nusername = app\npassword = secret\n",
        );
        let err = load_local_credentials(file.path(), "postgresql").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFile(ref m) if m.contains("port")));
    }
}
