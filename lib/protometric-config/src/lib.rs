//! Layered configuration for protometric.
//!
//! Configuration is assembled from configuration files and prefixed environment variables, in the order they are added
//! to a [`ConfigurationLoader`]. Later sources override earlier ones, key by key. The result is either deserialized
//! straight into a typed value, or kept around as a [`GenericConfiguration`] that callers query as needed.
#![deny(warnings)]
#![deny(missing_docs)]

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use figment::{
    error::Kind,
    providers::{Env, Serialized},
    Figment, Profile, Provider as _,
};
use serde::Deserialize;
use snafu::Snafu;
use tracing::debug;

mod provider;
pub use self::provider::FileFormat;
use self::provider::FileProvider;

/// Separator for nested keys in environment variable names.
///
/// `PROTOMETRIC_SERIALIZER__PREPEND_LENGTH` sets `serializer.prepend_length`.
const ENV_NESTING_SEPARATOR: &str = "__";

/// A configuration error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ConfigurationError {
    /// Environment variable prefix was empty.
    #[snafu(display("environment variable prefix must not be empty"))]
    EmptyPrefix,

    /// A configuration file could not be read.
    #[snafu(display("failed to read configuration file '{}': {}", path.display(), source))]
    UnreadableFile {
        /// Path of the file.
        path: PathBuf,

        /// Error source.
        source: std::io::Error,
    },

    /// A required key was not set by any source.
    #[snafu(display("missing configuration key '{}' (set it with {})", field, help_text))]
    MissingField {
        /// How the key can be set, listing every spelling the loaded sources would accept.
        help_text: String,

        /// Name of the missing key.
        field: Cow<'static, str>,
    },

    /// A key was set, but its value has the wrong type.
    #[snafu(display("configuration key '{}' should be {}, but found {}", field, expected_ty, actual_ty))]
    InvalidFieldType {
        /// Period-separated path to the key.
        field: String,

        /// Expected data type.
        expected_ty: String,

        /// Actual data type.
        actual_ty: String,
    },

    /// Any other error from parsing or extracting configuration.
    #[snafu(display("invalid configuration: {}", source))]
    Generic {
        /// Error source.
        source: figment::Error,
    },
}

impl From<figment::Error> for ConfigurationError {
    fn from(e: figment::Error) -> Self {
        classify(&[], e)
    }
}

/// A configuration loader that can pull from various sources.
///
/// Sources are merged as they are added: a key set by a later source replaces the same key from an earlier source,
/// while keys set only by the earlier source are kept.
///
/// # Supported sources
///
/// - YAML or JSON files ([`from_file`][Self::from_file])
/// - environment variables with a common prefix ([`from_environment`][Self::from_environment])
pub struct ConfigurationLoader {
    env_prefixes: Vec<String>,
    figment: Figment,
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self {
            env_prefixes: Vec::new(),
            figment: Figment::new(),
        }
    }
}

impl ConfigurationLoader {
    /// Loads the given configuration file.
    ///
    /// The file format is picked from the extension: see [`FileFormat::from_path`].
    ///
    /// # Errors
    ///
    /// If the file cannot be read, or is not valid for its format, an error is returned.
    pub fn from_file<P>(mut self, path: P) -> Result<Self, ConfigurationError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let format = FileFormat::from_path(path);
        let provider = FileProvider::read(path, format)?;

        debug!(file_path = %path.display(), ?format, "Loaded configuration file.");

        self.figment = self.figment.admerge(provider);
        Ok(self)
    }

    /// Loads configuration from environment variables.
    ///
    /// Only variables starting with the given prefix, followed by an underscore, are considered. The prefix is
    /// case-insensitive, and the remainder of the variable name is lowercased to form the key. A double underscore in
    /// the remainder separates nested keys.
    ///
    /// Variables are read once, when this method is called.
    ///
    /// # Errors
    ///
    /// If the prefix is empty, or the variables cannot be parsed, an error is returned.
    pub fn from_environment(mut self, prefix: &str) -> Result<Self, ConfigurationError> {
        let prefix = prefix.trim_end_matches('_');
        if prefix.is_empty() {
            return Err(ConfigurationError::EmptyPrefix);
        }
        let prefix = format!("{}_", prefix.to_uppercase());

        let mut values = Env::prefixed(&prefix).split(ENV_NESTING_SEPARATOR).data()?;
        if let Some(dict) = values.remove(&Profile::Default) {
            debug!(prefix = %prefix, keys = dict.len(), "Loaded configuration from environment.");
            self.figment = self.figment.admerge(Serialized::defaults(dict));
        }

        self.env_prefixes.push(prefix);
        Ok(self)
    }

    /// Consumes the loader, deserializing the merged configuration as `T`.
    ///
    /// # Errors
    ///
    /// If the configuration cannot be deserialized as `T`, an error is returned.
    pub fn into_typed<'a, T>(self) -> Result<T, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        self.into_generic().as_typed()
    }

    /// Consumes the loader, keeping the merged configuration for later queries.
    pub fn into_generic(self) -> GenericConfiguration {
        GenericConfiguration {
            env_prefixes: self.env_prefixes,
            figment: self.figment,
        }
    }
}

/// Merged configuration, queried by key.
///
/// Keys are period-separated paths (`a.b.c`) into nested values.
#[derive(Clone, Debug)]
pub struct GenericConfiguration {
    env_prefixes: Vec<String>,
    figment: Figment,
}

impl GenericConfiguration {
    /// Gets the value of the given key as `T`.
    ///
    /// # Errors
    ///
    /// If the key is not set, or its value cannot be deserialized as `T`, an error is returned.
    pub fn get_typed<'a, T>(&self, key: &str) -> Result<T, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| classify(&self.env_prefixes, e))
    }

    /// Gets the value of the given key as `T`, if the key is set.
    ///
    /// # Errors
    ///
    /// If the key is set, but its value cannot be deserialized as `T`, an error is returned.
    pub fn try_get_typed<'a, T>(&self, key: &str) -> Result<Option<T>, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        match self.get_typed(key) {
            Ok(value) => Ok(Some(value)),
            Err(ConfigurationError::MissingField { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Deserializes the entire configuration as `T`.
    ///
    /// # Errors
    ///
    /// If the configuration cannot be deserialized as `T`, an error is returned.
    pub fn as_typed<'a, T>(&self) -> Result<T, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        self.figment.extract().map_err(|e| classify(&self.env_prefixes, e))
    }
}

fn env_var_name(prefix: &str, key: &str) -> String {
    format!("{}{}", prefix, key.replace('.', ENV_NESTING_SEPARATOR).to_uppercase())
}

fn classify(env_prefixes: &[String], e: figment::Error) -> ConfigurationError {
    match e.kind {
        Kind::MissingField(field) => {
            let full_key = e.path.iter().map(String::as_str).chain([&*field]).collect::<Vec<_>>().join(".");
            let spellings = std::iter::once(format!("`{}`", full_key))
                .chain(env_prefixes.iter().map(|prefix| format!("`{}`", env_var_name(prefix, &full_key))))
                .collect::<Vec<_>>();

            ConfigurationError::MissingField {
                help_text: spellings.join(" or "),
                field,
            }
        }
        Kind::InvalidType(actual_ty, expected_ty) => ConfigurationError::InvalidFieldType {
            field: e.path.join("."),
            expected_ty,
            actual_ty: actual_ty.to_string(),
        },
        _ => ConfigurationError::Generic { source: e },
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use serde::Deserialize;
    use tempfile::{Builder, NamedTempFile};

    use super::{ConfigurationError, ConfigurationLoader};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Settings {
        #[serde(default)]
        prepend_length: bool,
        label: Option<String>,
    }

    fn config_file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn yaml_file() {
        let file = config_file(".yaml", "prepend_length: true\nlabel: edge\n");

        let settings = ConfigurationLoader::default()
            .from_file(file.path())
            .unwrap()
            .into_typed::<Settings>()
            .unwrap();

        assert_eq!(
            settings,
            Settings {
                prepend_length: true,
                label: Some("edge".to_string()),
            }
        );
    }

    #[test]
    fn later_sources_take_precedence() {
        let yaml = config_file(".yaml", "prepend_length: true\nlabel: edge\n");
        let json = config_file(".json", r#"{"prepend_length": false}"#);

        let config = ConfigurationLoader::default()
            .from_file(yaml.path())
            .unwrap()
            .from_file(json.path())
            .unwrap()
            .into_generic();

        assert!(!config.get_typed::<bool>("prepend_length").unwrap());
        assert_eq!(config.get_typed::<String>("label").unwrap(), "edge");
    }

    #[test]
    fn json_syntax_is_checked_as_json() {
        // Valid YAML, but not valid JSON.
        let file = config_file(".json", "prepend_length: true\n");

        let result = ConfigurationLoader::default().from_file(file.path());
        assert!(matches!(result, Err(ConfigurationError::Generic { .. })));
    }

    #[test]
    fn missing_file() {
        let result = ConfigurationLoader::default().from_file("/nonexistent/protometric.yaml");
        assert!(matches!(result, Err(ConfigurationError::UnreadableFile { .. })));
    }

    #[test]
    fn invalid_field_type() {
        let file = config_file(".yaml", "prepend_length: [1, 2]\n");
        let config = ConfigurationLoader::default().from_file(file.path()).unwrap().into_generic();

        assert!(matches!(
            config.get_typed::<bool>("prepend_length"),
            Err(ConfigurationError::InvalidFieldType { .. })
        ));
        assert!(config.try_get_typed::<bool>("prepend_length").is_err());
    }

    #[test]
    fn absent_key() {
        let config = ConfigurationLoader::default().into_generic();
        assert_eq!(config.try_get_typed::<bool>("prepend_length").unwrap(), None);
    }

    #[test]
    fn missing_field_help_text() {
        let config = ConfigurationLoader::default()
            .from_environment("protometric_missing_test")
            .unwrap()
            .into_generic();

        match config.get_typed::<String>("serializer.label") {
            Err(ConfigurationError::MissingField { help_text, .. }) => {
                assert_eq!(
                    help_text,
                    "`serializer.label` or `PROTOMETRIC_MISSING_TEST_SERIALIZER__LABEL`"
                );
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn environment() {
        std::env::set_var("PROTOMETRIC_ENV_TEST_PREPEND_LENGTH", "true");
        std::env::set_var("PROTOMETRIC_ENV_TEST_LABEL", "edge");
        std::env::set_var("PROTOMETRIC_ENV_TEST_NESTED__LABEL", "inner");

        let config = ConfigurationLoader::default()
            .from_environment("PROTOMETRIC_ENV_TEST_")
            .unwrap()
            .into_generic();

        assert_eq!(
            config.as_typed::<Settings>().unwrap(),
            Settings {
                prepend_length: true,
                label: Some("edge".to_string()),
            }
        );
        assert_eq!(config.get_typed::<String>("nested.label").unwrap(), "inner");
    }

    #[test]
    fn environment_overrides_file() {
        std::env::set_var("PROTOMETRIC_OVERRIDE_TEST_PREPEND_LENGTH", "false");
        let file = config_file(".yaml", "prepend_length: true\nlabel: edge\n");

        let settings = ConfigurationLoader::default()
            .from_file(file.path())
            .unwrap()
            .from_environment("PROTOMETRIC_OVERRIDE_TEST")
            .unwrap()
            .into_typed::<Settings>()
            .unwrap();

        assert!(!settings.prepend_length);
        assert_eq!(settings.label.as_deref(), Some("edge"));
    }

    #[test]
    fn empty_prefix() {
        for prefix in ["", "_"] {
            assert!(matches!(
                ConfigurationLoader::default().from_environment(prefix),
                Err(ConfigurationError::EmptyPrefix)
            ));
        }
    }
}
