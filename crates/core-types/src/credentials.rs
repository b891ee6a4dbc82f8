use crate::enums::SslMode;
use crate::error::CoreError;
use serde_json::{Map, Value};
use std::fmt;

/// Keys every credential source must provide, in the order they are checked.
pub const REQUIRED_KEYS: [&str; 5] = ["host", "port", "database", "username", "password"];

/// The optional key carrying the TLS policy.
pub const SSL_MODE_KEY: &str = "ssl_mode";

/// A complete set of connection parameters for one PostgreSQL database.
///
/// Instances only come out of [`CredentialSet::from_map`], so every required
/// field is present and non-empty. The password is kept out of `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSet {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub ssl_mode: SslMode,
}

impl CredentialSet {
    /// Builds a credential set from a raw key/value mapping.
    ///
    /// The mapping is what every source produces: a section of the local
    /// property file or the data of a Vault secret. `port` may be a number or
    /// a numeric string; `ssl_mode` falls back to `require`.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, CoreError> {
        for key in REQUIRED_KEYS {
            if !map.contains_key(key) {
                return Err(CoreError::MissingCredential(key.to_string()));
            }
        }
        for key in REQUIRED_KEYS {
            if !is_truthy(&map[key]) {
                return Err(CoreError::EmptyCredential(key.to_string()));
            }
        }

        let ssl_mode = match map.get(SSL_MODE_KEY).and_then(as_text) {
            Some(mode) if !mode.is_empty() => mode.parse()?,
            _ => SslMode::default(),
        };

        Ok(Self {
            host: text_field(map, "host")?,
            port: parse_port(&map["port"])?,
            database: text_field(map, "database")?,
            username: text_field(map, "username")?,
            password: text_field(map, "password")?,
            ssl_mode,
        })
    }

    /// The mapping form of this set, password included.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("host".into(), Value::from(self.host.clone()));
        map.insert("port".into(), Value::from(self.port));
        map.insert("database".into(), Value::from(self.database.clone()));
        map.insert("username".into(), Value::from(self.username.clone()));
        map.insert("password".into(), Value::from(self.password.clone()));
        map.insert(SSL_MODE_KEY.into(), Value::from(self.ssl_mode.as_str()));
        map
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Returns `true` iff every required key is present with a non-empty value.
///
/// Pure and source-independent, so callers can re-run it on any mapping.
pub fn validate_credentials(credentials: &Map<String, Value>) -> bool {
    REQUIRED_KEYS
        .iter()
        .all(|key| credentials.get(*key).is_some_and(is_truthy))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_field(map: &Map<String, Value>, key: &str) -> Result<String, CoreError> {
    as_text(&map[key]).ok_or_else(|| CoreError::InvalidValue(key.to_string(), map[key].to_string()))
}

fn parse_port(value: &Value) -> Result<u16, CoreError> {
    let invalid = || CoreError::InvalidValue("port".to_string(), value.to_string());
    let port = match value {
        Value::Number(n) => n.as_u64().ok_or_else(invalid)?,
        Value::String(s) => s.trim().parse::<u64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };
    match u16::try_from(port) {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(invalid()),
    }
}
