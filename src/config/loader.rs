use crate::config::schema::{UpdateConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where the text of an update plan came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOrigin {
    Inline,
    File(PathBuf),
}

impl fmt::Display for PlanOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanOrigin::Inline => f.write_str("<inline>"),
            PlanOrigin::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read update plan {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse update plan {origin}: {source}")]
    Toml {
        origin: PlanOrigin,
        source: toml_edit::de::Error,
    },

    #[error("invalid update plan {origin}: {source}")]
    Validation {
        origin: PlanOrigin,
        source: ValidationError,
    },
}

fn parse(input: &str, origin: PlanOrigin) -> Result<UpdateConfig, ConfigError> {
    let config: UpdateConfig = toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml {
        origin: origin.clone(),
        source,
    })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { origin, source })?;
    Ok(config)
}

/// Parse and validate an update plan. `meta.root` is kept as written.
pub fn load_from_str(input: &str) -> Result<UpdateConfig, ConfigError> {
    parse(input, PlanOrigin::Inline)
}

/// Read, parse and validate an update plan, resolving a relative
/// `meta.root` against the directory holding the plan.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<UpdateConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config = parse(&contents, PlanOrigin::File(path.to_path_buf()))?;

    if let (Some(root), Some(plan_dir)) = (config.meta.root.as_mut(), path.parent()) {
        if root.is_relative() {
            *root = plan_dir.join(&*root);
        }
    }
    Ok(config)
}
