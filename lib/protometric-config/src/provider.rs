use std::path::{Path, PathBuf};

use figment::{
    providers::{Data, Format, Json, Yaml},
    value::{Dict, Map},
    Metadata, Profile, Provider,
};
use snafu::ResultExt as _;

use crate::{ConfigurationError, UnreadableFile};

/// Format of a configuration file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileFormat {
    /// YAML.
    Yaml,

    /// JSON.
    Json,
}

impl FileFormat {
    /// Picks the format for the given path based on its extension.
    ///
    /// Files ending in `.json` (in any case) are JSON. Everything else is YAML, which is a superset of JSON anyway.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }

    fn parse(self, contents: &str) -> Result<Map<Profile, Dict>, figment::Error> {
        match self {
            Self::Yaml => Data::<Yaml>::string(contents).data(),
            Self::Json => Data::<Json>::string(contents).data(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Yaml => Yaml::NAME,
            Self::Json => Json::NAME,
        }
    }
}

/// A configuration file, read and parsed up front.
///
/// Errors from a missing or unparseable file surface when the file is added to the loader, not on the first lookup.
pub(crate) struct FileProvider {
    path: PathBuf,
    format: FileFormat,
    data: Map<Profile, Dict>,
}

impl FileProvider {
    pub(crate) fn read(path: &Path, format: FileFormat) -> Result<Self, ConfigurationError> {
        let contents = std::fs::read_to_string(path).context(UnreadableFile { path })?;
        let data = format.parse(&contents)?;

        Ok(Self {
            path: path.to_path_buf(),
            format,
            data,
        })
    }
}

impl Provider for FileProvider {
    fn metadata(&self) -> Metadata {
        Metadata::from(format!("{} file", self.format.name()), self.path.as_path())
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Ok(self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::FileFormat;

    #[test]
    fn format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("protometric.json")), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("/etc/PROTOMETRIC.JSON")), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("protometric.yaml")), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path(Path::new("protometric.yml")), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path(Path::new("protometric")), FileFormat::Yaml);
    }
}
