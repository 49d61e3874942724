use crate::model::MissingModulePolicy;
use crate::version::{parse_version_spec, VersionError, VersionSpec};
use crate::xml::query::is_valid_name;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct UpdateConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub updates: Vec<UpdateDefinition>,
}

impl UpdateConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.updates.is_empty() {
            issues.push(ValidationIssue::EmptyUpdateList);
        }

        let mut seen = HashSet::new();
        for update in &self.updates {
            let id = update.id.trim();
            if id.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    update_id: None,
                    field: "id",
                });
            } else if !seen.insert(id) {
                issues.push(ValidationIssue::DuplicateId { id: id.to_string() });
            }

            if let Target::Property { name } = &update.target {
                if name.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        update_id: Some(update.id.clone()),
                        field: "target.name",
                    });
                } else if !is_valid_name(name) {
                    issues.push(ValidationIssue::InvalidCombo {
                        update_id: Some(update.id.clone()),
                        message: format!("'{name}' is not a valid property name"),
                    });
                }
            }

            if update.value.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    update_id: Some(update.id.clone()),
                    field: "value",
                });
            }

            if let Some(range) = &update.only_if {
                if let Err(source) = parse_version_spec(range) {
                    issues.push(ValidationIssue::InvalidRange {
                        update_id: update.id.clone(),
                        source,
                    });
                }
            }

            if update.module.as_deref().is_some_and(|m| m.trim().is_empty()) {
                issues.push(ValidationIssue::MissingField {
                    update_id: Some(update.id.clone()),
                    field: "module",
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub missing_modules: MissingModulePolicy,
    /// Hierarchy root, relative to the plan file when loaded from a path
    #[serde(default)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpdateDefinition {
    pub id: String,
    pub target: Target,
    pub value: String,
    /// Apply only when the current value overlaps this version range.
    #[serde(default)]
    pub only_if: Option<String>,
    /// Artifact id of the module resolution starts from; the root when absent.
    #[serde(default)]
    pub module: Option<String>,
}

impl UpdateDefinition {
    /// Parsed `only_if` guard; `None` when unguarded.
    pub fn guard(&self) -> Result<Option<VersionSpec>, VersionError> {
        self.only_if.as_deref().map(parse_version_spec).transpose()
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Target {
    /// A `<properties>` entry, edited where it is defined.
    Property { name: String },
    /// `/project/version` of the module.
    ProjectVersion,
    /// `/project/parent/version` of the module.
    ParentVersion,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Property { name } => write!(f, "property '{name}'"),
            Target::ProjectVersion => write!(f, "project version"),
            Target::ParentVersion => write!(f, "parent version"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyUpdateList,
    MissingField {
        update_id: Option<String>,
        field: &'static str,
    },
    DuplicateId {
        id: String,
    },
    InvalidRange {
        update_id: String,
        source: VersionError,
    },
    InvalidCombo {
        update_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyUpdateList => write!(f, "update config contains no updates"),
            ValidationIssue::MissingField { update_id, field } => match update_id {
                Some(id) => write!(f, "update '{id}' missing required field '{field}'"),
                None => write!(f, "update missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId { id } => write!(f, "update id '{id}' is used twice"),
            ValidationIssue::InvalidRange { update_id, source } => {
                write!(f, "update '{update_id}' has an invalid guard: {source}")
            }
            ValidationIssue::InvalidCombo { update_id, message } => match update_id {
                Some(id) => write!(f, "update '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid update configuration: {message}"),
            },
        }
    }
}
