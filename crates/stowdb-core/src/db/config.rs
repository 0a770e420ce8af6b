use crate::{
    DEFAULT_INDEX_NAMESPACE,
    db::key::Keyspace,
    error::{Error, ErrorKind, ErrorOrigin},
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config needs a `path` unless `in_memory = true`")]
    MissingPath,
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
    }
}

///
/// StoreConfig
///
/// Everything a store needs at construction time. The index namespace is
/// owned by the store instance rather than being process-wide, so two
/// stores in one process may use different namespaces.
///
/// ```toml
/// path = "data/app.redb"
/// schema = "sparkle"
/// index_namespace = "system.index"   # optional
/// debug = true                       # optional
/// ```
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,

    pub schema: String,

    #[serde(default = "StoreConfig::default_index_namespace")]
    pub index_namespace: String,

    #[serde(default)]
    pub in_memory: bool,

    /// Emit a `debug` tracing event for every store operation.
    #[serde(default)]
    pub debug: bool,
}

impl StoreConfig {
    /// On-disk store at `path`.
    pub fn new(path: impl Into<PathBuf>, schema: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            schema: schema.into(),
            index_namespace: Self::default_index_namespace(),
            in_memory: false,
            debug: false,
        }
    }

    /// Store backed by the engine's in-memory backend.
    pub fn in_memory(schema: impl Into<String>) -> Self {
        Self {
            path: None,
            schema: schema.into(),
            index_namespace: Self::default_index_namespace(),
            in_memory: true,
            debug: false,
        }
    }

    #[must_use]
    pub fn with_index_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.index_namespace = namespace.into();
        self
    }

    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    fn default_index_namespace() -> String {
        DEFAULT_INDEX_NAMESPACE.to_string()
    }

    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(source).map_err(ConfigError::from)?;

        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    /// Leading token of the index namespace that schemas may not start with.
    #[must_use]
    pub fn reserved_token(&self) -> &str {
        self.index_namespace
            .split('.')
            .next()
            .unwrap_or(&self.index_namespace)
    }

    /// Check the config and build the keyspace it describes.
    pub fn validate(&self) -> Result<Keyspace, Error> {
        let token = self.reserved_token();
        if !token.is_empty() && self.schema.starts_with(token) {
            return Err(Error::reserved_word(&self.schema, token));
        }
        if self.path.is_none() && !self.in_memory {
            return Err(ConfigError::MissingPath.into());
        }

        Ok(Keyspace::new(&*self.schema, &*self.index_namespace)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_with_defaults() {
        let config = StoreConfig::from_toml_str(
            r#"
            path = "data/app.redb"
            schema = "sparkle"
            "#,
        )
        .unwrap();

        assert_eq!(config, StoreConfig::new("data/app.redb", "sparkle"));
        assert_eq!(config.index_namespace, DEFAULT_INDEX_NAMESPACE);
        assert!(!config.debug);
    }

    #[test]
    fn toml_overrides() {
        let config = StoreConfig::from_toml_str(
            r#"
            schema = "sparkle"
            index_namespace = "idx.v2"
            in_memory = true
            debug = true
            "#,
        )
        .unwrap();

        assert!(config.in_memory);
        assert!(config.debug);
        assert_eq!(config.reserved_token(), "idx");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_keys_are_config_errors() {
        let err = StoreConfig::from_toml_str("schema = \"a\"\nshards = 4\n").unwrap_err();

        assert_eq!(err.kind, ErrorKind::Config);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = StoreConfig::from_file("/definitely/not/here.toml").unwrap_err();

        assert_eq!(err.kind, ErrorKind::Config);
        assert!(err.message.contains("not/here.toml"));
    }

    #[test]
    fn reserved_schema_is_rejected() {
        for schema in ["system", "system.index", "systematic"] {
            let err = StoreConfig::in_memory(schema).validate().unwrap_err();
            assert_eq!(err.kind, ErrorKind::ReservedWord, "{schema}");
        }
    }

    #[test]
    fn reserved_token_follows_the_namespace() {
        let config = StoreConfig::in_memory("system").with_index_namespace("meta.index");

        assert!(config.validate().is_ok());
        assert!(
            StoreConfig::in_memory("metadata")
                .with_index_namespace("meta.index")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn malformed_schema_and_missing_path() {
        let err = StoreConfig::in_memory("a:b").validate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedKey);

        let err = StoreConfig::in_memory("").validate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedKey);

        let mut config = StoreConfig::in_memory("sparkle");
        config.in_memory = false;
        assert_eq!(config.validate().unwrap_err().kind, ErrorKind::Config);
    }
}
