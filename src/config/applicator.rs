//! Update applicator - applies update plans over a descriptor tree
//!
//! For every update this module:
//! - Resolves the node that owns the target (property definitions are
//!   followed up the parent chain)
//! - Checks the optional `only_if` range against the current value
//! - Edits the owning document in place, preserving its formatting; values
//!   are plain text and are escaped on the way in
//! - Reports a result per update, then writes changed descriptors once

use crate::config::schema::{Target, UpdateConfig, UpdateDefinition};
use crate::log::LogSink;
use crate::model::{ModelTree, NodeId};
use crate::version::{is_overlap, parse_version_spec, VersionError};
use crate::xml::XmlError;
use quick_xml::escape::escape;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Result of applying a single update
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "UpdateResult should be checked for success/failure"]
pub enum UpdateResult {
    /// Target was rewritten
    Applied { file: PathBuf },
    /// Target already holds the requested value
    AlreadySet { file: PathBuf },
    /// Guard did not match the current value
    Skipped { reason: String },
    /// Target location does not exist in the owning descriptor
    Failed { file: PathBuf, reason: String },
}

impl fmt::Display for UpdateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateResult::Applied { file } => write!(f, "Applied update to {}", file.display()),
            UpdateResult::AlreadySet { file } => write!(f, "Already set in {}", file.display()),
            UpdateResult::Skipped { reason } => write!(f, "Skipped: {}", reason),
            UpdateResult::Failed { file, reason } => {
                write!(f, "Failed on {}: {}", file.display(), reason)
            }
        }
    }
}

/// Errors during update application
#[derive(Debug)]
pub enum ApplicationError {
    /// Guard or current value is not a valid version range
    Version(VersionError),
    /// Edit produced or met malformed markup
    Xml { file: PathBuf, source: XmlError },
    /// No module with the requested artifact id
    UnknownModule { artifact_id: String },
    /// Property is not defined anywhere up the parent chain
    UnknownProperty {
        name: String,
        suggestion: Option<String>,
    },
    /// Writing the changed descriptor failed
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::Version(e) => write!(f, "version error: {}", e),
            ApplicationError::Xml { file, source } => {
                write!(f, "edit failed on {}: {}", file.display(), source)
            }
            ApplicationError::UnknownModule { artifact_id } => {
                write!(f, "no module with artifactId '{}'", artifact_id)
            }
            ApplicationError::UnknownProperty { name, suggestion } => match suggestion {
                Some(hint) => write!(f, "property '{}' is not defined (did you mean '{}'?)", name, hint),
                None => write!(f, "property '{}' is not defined", name),
            },
            ApplicationError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ApplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplicationError::Version(e) => Some(e),
            ApplicationError::Xml { source, .. } => Some(source),
            ApplicationError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<VersionError> for ApplicationError {
    fn from(e: VersionError) -> Self {
        ApplicationError::Version(e)
    }
}

pub type UpdateOutcome = (String, Result<UpdateResult, ApplicationError>);

/// Apply an update plan to `tree` and write every changed descriptor.
///
/// Updates run in plan order, so a later update sees the edits of earlier
/// ones. Each changed file is written once, atomically; a failed write is
/// reported on every update that touched that file.
pub fn apply_updates(
    config: &UpdateConfig,
    tree: &mut ModelTree,
    log: &dyn LogSink,
) -> Vec<UpdateOutcome> {
    let (mut results, touched) = run_updates(config, tree, log);

    for id in touched.iter().map(|(_, owner)| *owner).collect::<BTreeSet<_>>() {
        let node = tree.node(id);
        let Err(err) = node.document().write_to(node.path()) else {
            log.info(&format!("wrote {}", node.path().display()));
            continue;
        };

        let message = err.to_string();
        for (idx, _) in touched.iter().filter(|(_, owner)| *owner == id) {
            results[*idx].1 = Err(ApplicationError::Io {
                path: node.path().to_path_buf(),
                source: std::io::Error::other(message.clone()),
            });
        }
    }

    results
}

/// Evaluate an update plan without touching the filesystem.
///
/// Result semantics match [`apply_updates`] (`Applied` means "would apply");
/// the edits run against a copy of `tree`.
pub fn check_updates(config: &UpdateConfig, tree: &ModelTree, log: &dyn LogSink) -> Vec<UpdateOutcome> {
    let mut scratch = tree.clone();
    plan_updates(config, &mut scratch, log)
}

/// Apply an update plan to the in-memory documents of `tree` only.
pub fn plan_updates(config: &UpdateConfig, tree: &mut ModelTree, log: &dyn LogSink) -> Vec<UpdateOutcome> {
    run_updates(config, tree, log).0
}

/// Results plus `(result index, node)` for each update that changed a document.
fn run_updates(
    config: &UpdateConfig,
    tree: &mut ModelTree,
    log: &dyn LogSink,
) -> (Vec<UpdateOutcome>, Vec<(usize, NodeId)>) {
    let mut results = Vec::with_capacity(config.updates.len());
    let mut touched = Vec::new();

    for (idx, update) in config.updates.iter().enumerate() {
        let outcome = apply_update(update, tree, log).map(|(result, node)| {
            if matches!(result, UpdateResult::Applied { .. }) {
                touched.push((idx, node));
            }
            result
        });
        if let Err(err) = &outcome {
            log.warn(&format!("update '{}' failed: {}", update.id, err));
        }
        results.push((update.id.clone(), outcome));
    }

    (results, touched)
}

fn apply_update(
    update: &UpdateDefinition,
    tree: &mut ModelTree,
    log: &dyn LogSink,
) -> Result<(UpdateResult, NodeId), ApplicationError> {
    let start = match &update.module {
        Some(artifact_id) => {
            tree.find_by_artifact_id(artifact_id)
                .ok_or_else(|| ApplicationError::UnknownModule {
                    artifact_id: artifact_id.clone(),
                })?
        }
        None => tree.root(),
    };

    let owner = match &update.target {
        Target::Property { name } => {
            tree.find_property(name, start)
                .ok_or_else(|| ApplicationError::UnknownProperty {
                    name: name.clone(),
                    suggestion: tree.suggest_property(name, start),
                })?
        }
        Target::ProjectVersion | Target::ParentVersion => start,
    };

    let node = tree.node_mut(owner);
    let file = node.path().to_path_buf();
    let document = node.document_mut();

    let current = match &update.target {
        Target::Property { name } => document.property(name),
        Target::ProjectVersion => document.project_version(),
        Target::ParentVersion => document.parent_version(),
    };

    if let Some(guard) = update.guard()? {
        let Some(current) = current.as_deref() else {
            return Ok((
                UpdateResult::Skipped {
                    reason: format!("{} has no current value to check against {}", update.target, guard),
                },
                owner,
            ));
        };
        if !is_overlap(&parse_version_spec(current)?, &guard) {
            return Ok((
                UpdateResult::Skipped {
                    reason: format!("{} is {}, outside {}", update.target, current, guard),
                },
                owner,
            ));
        }
    }

    if current.as_deref() == Some(update.value.as_str()) {
        return Ok((UpdateResult::AlreadySet { file }, owner));
    }

    let escaped = escape(update.value.as_str());
    let changed = match &update.target {
        Target::Property { name } => document.set_property(name, &escaped),
        Target::ProjectVersion => document.set_project_version(&escaped),
        Target::ParentVersion => document.set_parent_version(&escaped),
    }
    .map_err(|source| ApplicationError::Xml {
        file: file.clone(),
        source,
    })?;

    if !changed {
        return Ok((
            UpdateResult::Failed {
                file,
                reason: format!("{} has no place to be written", update.target),
            },
            owner,
        ));
    }

    log.info(&format!(
        "{}: {} {} -> {} in {}",
        update.id,
        update.target,
        current.as_deref().unwrap_or("(unset)"),
        update.value,
        file.display()
    ));
    Ok((UpdateResult::Applied { file }, owner))
}
