use crate::log::LogSink;
use crate::model::tree::ModelNode;
use crate::xml::{PomDocument, XmlError};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up when a module names a directory.
pub const DESCRIPTOR_FILE: &str = "pom.xml";

/// Filesystem access used during discovery.
pub trait DescriptorSource {
    fn read(&self, path: &Path) -> io::Result<String>;
    fn is_dir(&self, path: &Path) -> bool;
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl DescriptorSource for FsSource {
    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        path.canonicalize()
    }
}

/// What to do with a declared module whose descriptor cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingModulePolicy {
    /// Log a warning and skip the branch.
    #[default]
    Warn,
    /// Abort the whole discovery.
    Fail,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryOptions {
    pub missing_modules: MissingModulePolicy,
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("root descriptor {path} cannot be read: {source}")]
    MissingRoot { path: PathBuf, source: io::Error },

    #[error("module '{module}' declared in {declared_in} cannot be read at {path}: {source}")]
    MissingModule {
        module: String,
        declared_in: PathBuf,
        path: PathBuf,
        source: io::Error,
    },

    #[error("descriptor {path} is malformed: {source}")]
    Xml { path: PathBuf, source: XmlError },
}

/// Where a module declaration points: `<dir>/pom.xml` for directories,
/// the file itself otherwise.
pub fn resolve_module_path(source: &dyn DescriptorSource, base_dir: &Path, module: &str) -> PathBuf {
    let candidate = base_dir.join(module.trim());
    if source.is_dir(&candidate) {
        candidate.join(DESCRIPTOR_FILE)
    } else {
        candidate
    }
}

/// Canonical location of the root descriptor; a directory resolves to its `pom.xml`.
pub(crate) fn resolve_root(source: &dyn DescriptorSource, root: &Path) -> Result<PathBuf, DiscoveryError> {
    let candidate = if source.is_dir(root) {
        root.join(DESCRIPTOR_FILE)
    } else {
        root.to_path_buf()
    };
    source
        .canonicalize(&candidate)
        .map_err(|source| DiscoveryError::MissingRoot {
            path: candidate.clone(),
            source,
        })
}

pub(crate) fn load_root(source: &dyn DescriptorSource, path: &Path) -> Result<ModelNode, DiscoveryError> {
    let content = source.read(path).map_err(|err| DiscoveryError::MissingRoot {
        path: path.to_path_buf(),
        source: err,
    })?;
    parse_node(path, &content)
}

fn parse_node(path: &Path, content: &str) -> Result<ModelNode, DiscoveryError> {
    let document = PomDocument::from_path(path, content).map_err(|source| DiscoveryError::Xml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ModelNode::new(path, document))
}

/// A module declaration resolved to a canonical descriptor path.
#[derive(Debug, Clone)]
pub(crate) struct ModuleRef {
    pub(crate) name: String,
    pub(crate) declared_in: PathBuf,
    pub(crate) path: PathBuf,
}

fn missing_module(
    module: &ModuleRef,
    err: io::Error,
    options: &DiscoveryOptions,
    log: &dyn LogSink,
) -> Result<(), DiscoveryError> {
    match options.missing_modules {
        MissingModulePolicy::Warn => {
            log.warn(&format!(
                "skipping module '{}' declared in {}: cannot read {}: {}",
                module.name,
                module.declared_in.display(),
                module.path.display(),
                err
            ));
            Ok(())
        }
        MissingModulePolicy::Fail => Err(DiscoveryError::MissingModule {
            module: module.name.clone(),
            declared_in: module.declared_in.clone(),
            path: module.path.clone(),
            source: err,
        }),
    }
}

/// Resolve each module declared by `node` without applying any policy.
///
/// A module whose path cannot be canonicalized comes back as an error
/// carrying the uncanonicalized candidate path.
pub(crate) fn resolve_modules<'a>(
    node: &'a ModelNode,
    source: &'a dyn DescriptorSource,
) -> impl Iterator<Item = Result<ModuleRef, (ModuleRef, io::Error)>> + 'a {
    let base_dir = node.path().parent().unwrap_or_else(|| Path::new("."));
    node.model().modules.iter().map(move |name| {
        let candidate = resolve_module_path(source, base_dir, name);
        let mut module = ModuleRef {
            name: name.clone(),
            declared_in: node.path().to_path_buf(),
            path: candidate,
        };
        match source.canonicalize(&module.path) {
            Ok(path) => {
                module.path = path;
                Ok(module)
            }
            Err(err) => Err((module, err)),
        }
    })
}

/// Resolve the modules declared by `node`, in declaration order, applying
/// the missing-module policy to the ones that cannot be resolved.
pub(crate) fn declared_modules(
    node: &ModelNode,
    options: &DiscoveryOptions,
    source: &dyn DescriptorSource,
    log: &dyn LogSink,
) -> Result<Vec<ModuleRef>, DiscoveryError> {
    let mut modules = Vec::with_capacity(node.model().modules.len());
    for resolved in resolve_modules(node, source) {
        match resolved {
            Ok(module) => modules.push(module),
            Err((module, err)) => missing_module(&module, err, options, log)?,
        }
    }
    Ok(modules)
}

/// Read and scan a module. `Ok(None)` when it was skipped.
pub(crate) fn load_module(
    module: &ModuleRef,
    options: &DiscoveryOptions,
    source: &dyn DescriptorSource,
    log: &dyn LogSink,
) -> Result<Option<ModelNode>, DiscoveryError> {
    match source.read(&module.path) {
        Ok(content) => parse_node(&module.path, &content).map(Some),
        Err(err) => {
            missing_module(module, err, options, log)?;
            Ok(None)
        }
    }
}

/// Discover the root descriptor and every descriptor reachable through
/// module declarations.
///
/// Keys are canonical paths; iteration order is parent-first in declaration
/// order. Each descriptor is read once, however many times it is declared.
pub fn get_child_models(
    root: &Path,
    options: &DiscoveryOptions,
    source: &dyn DescriptorSource,
    log: &dyn LogSink,
) -> Result<IndexMap<PathBuf, ModelNode>, DiscoveryError> {
    let root_path = resolve_root(source, root)?;
    let root_node = load_root(source, &root_path)?;

    // Reversed so the first declared module is popped next
    let mut pending: Vec<ModuleRef> = declared_modules(&root_node, options, source, log)?;
    pending.reverse();

    let mut models: IndexMap<PathBuf, ModelNode> = IndexMap::new();
    models.insert(root_path, root_node);

    while let Some(module) = pending.pop() {
        if models.contains_key(&module.path) {
            log.debug(&format!(
                "module '{}' in {} already visited",
                module.name,
                module.declared_in.display()
            ));
            continue;
        }

        let Some(node) = load_module(&module, options, source, log)? else {
            continue;
        };
        let children = declared_modules(&node, options, source, log)?;
        log.debug(&format!(
            "discovered {} ({} modules)",
            module.path.display(),
            children.len()
        ));
        pending.extend(children.into_iter().rev());
        models.insert(module.path, node);
    }

    Ok(models)
}
