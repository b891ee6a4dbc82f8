use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The deployment context that decides where credentials come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Developer machine: credentials are read from a local property file.
    Local,
    /// Deployed service: credentials are fetched from the secrets service.
    #[serde(rename = "prod")]
    Production,
}

impl Environment {
    /// Returns the canonical short tag (`local` or `prod`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "prod",
        }
    }

    /// Maps a designation value onto an environment, ignoring case.
    ///
    /// Returns `None` for anything outside the recognised spellings, which
    /// lets detection fall through to its heuristics.
    pub fn from_designation(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "prod" | "production" => Some(Environment::Production),
            "local" | "dev" | "development" => Some(Environment::Local),
            _ => None,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Environment::from_designation(s).ok_or_else(|| CoreError::UnknownEnvironment(s.to_string()))
    }
}

/// The TLS negotiation policy passed to the database driver.
///
/// Spellings follow libpq's `sslmode` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    Disable,
    Allow,
    Prefer,
    #[default]
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Allow => "allow",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyFull => "verify-full",
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SslMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "allow" => Ok(SslMode::Allow),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            "verify-ca" | "verify_ca" => Ok(SslMode::VerifyCa),
            "verify-full" | "verify_full" => Ok(SslMode::VerifyFull),
            _ => Err(CoreError::InvalidValue("ssl_mode".to_string(), s.to_string())),
        }
    }
}

/// The closed set of failure categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Static misconfiguration: missing files, sections, keys or variables.
    Configuration,
    /// Failure establishing or using the database session.
    Connection,
    /// Live failure of the secrets service (authentication or transport).
    Vault,
    /// A caller passed an argument outside the accepted set.
    InvalidArgument,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Connection => "ConnectionError",
            ErrorKind::Vault => "VaultError",
            ErrorKind::InvalidArgument => "InvalidArgument",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn designation_spellings_are_case_insensitive() {
        for value in ["prod", "PROD", "Production", "production"] {
            assert_eq!(Environment::from_designation(value), Some(Environment::Production));
        }
        for value in ["local", "Local", "dev", "DEV", "development", "Development"] {
            assert_eq!(Environment::from_designation(value), Some(Environment::Local));
        }
        assert_eq!(Environment::from_designation("staging"), None);
        assert_eq!(Environment::from_designation(""), None);
    }

    #[test]
    fn unknown_environment_is_a_configuration_error() {
        let err = "staging".parse::<Environment>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("Unknown environment: staging"));
    }

    #[test]
    fn ssl_mode_parses_libpq_spellings() {
        assert_eq!("require".parse::<SslMode>().unwrap(), SslMode::Require);
        assert_eq!("verify-full".parse::<SslMode>().unwrap(), SslMode::VerifyFull);
        assert_eq!("VERIFY_CA".parse::<SslMode>().unwrap(), SslMode::VerifyCa);
        assert_eq!(SslMode::default(), SslMode::Require);
        assert!("sometimes".parse::<SslMode>().is_err());
    }
}
