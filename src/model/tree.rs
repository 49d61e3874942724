use crate::log::LogSink;
use crate::model::discovery::{
    declared_modules, get_child_models, load_module, resolve_modules, DescriptorSource,
    DiscoveryError, DiscoveryOptions, ModuleRef,
};
use crate::model::pom::PomModel;
use crate::xml::PomDocument;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Position of a node inside its [`ModelTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One parsed descriptor and its place in the hierarchy.
#[derive(Debug, Clone)]
pub struct ModelNode {
    path: PathBuf,
    model: PomModel,
    document: PomDocument,
    parent: Option<NodeId>,
}

impl ModelNode {
    pub fn new(path: impl Into<PathBuf>, document: PomDocument) -> Self {
        Self {
            path: path.into(),
            model: PomModel::from_document(&document),
            document,
            parent: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Logical fields as read at discovery time; document edits do not refresh them.
    pub fn model(&self) -> &PomModel {
        &self.model
    }

    pub fn document(&self) -> &PomDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut PomDocument {
        &mut self.document
    }

    /// The node whose module list declared this one.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn attach(&mut self, parent: NodeId) {
        debug_assert!(self.parent.is_none(), "parent is assigned once");
        self.parent = Some(parent);
    }
}

/// Arena of descriptors in parent-first, depth-first, declaration order.
///
/// The root is always at index 0 and every node's parent precedes it.
#[derive(Debug, Clone)]
pub struct ModelTree {
    nodes: Vec<ModelNode>,
}

impl ModelTree {
    /// Discover every descriptor under `root` and assemble the tree.
    pub fn load(
        root: &Path,
        options: &DiscoveryOptions,
        source: &dyn DescriptorSource,
        log: &dyn LogSink,
    ) -> Result<Self, DiscoveryError> {
        let mut known = get_child_models(root, options, source, log)?;
        let (_, root_node) = known
            .shift_remove_index(0)
            .ok_or_else(|| DiscoveryError::MissingRoot {
                path: root.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no descriptor discovered"),
            })?;
        assemble(root_node, known, Unknown::Skip, options, source, log)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &ModelNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut ModelNode {
        &mut self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ModelNode)> {
        self.nodes.iter().enumerate().map(|(idx, node)| (NodeId(idx), node))
    }

    /// `start` followed by each ancestor up to the root.
    pub fn ancestors(&self, start: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(start), move |id| self.parent(*id))
    }

    /// Number of parent links between `id` and the root.
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count() - 1
    }

    pub fn find_by_artifact_id(&self, artifact_id: &str) -> Option<NodeId> {
        self.iter()
            .find(|(_, node)| node.model().artifact_id.as_deref() == Some(artifact_id))
            .map(|(id, _)| id)
    }

    /// The nearest node, starting at `start` and walking up, that declares `name`.
    pub fn find_property(&self, name: &str, start: NodeId) -> Option<NodeId> {
        self.ancestors(start)
            .find(|id| self.node(*id).model().properties.contains_key(name))
    }

    pub fn property_value(&self, name: &str, start: NodeId) -> Option<&str> {
        let owner = self.find_property(name, start)?;
        self.node(owner).model().properties.get(name).map(String::as_str)
    }

    /// Closest property name visible from `start`, for "did you mean" hints.
    pub fn suggest_property(&self, name: &str, start: NodeId) -> Option<String> {
        let threshold = (name.len() / 3).max(2);
        self.ancestors(start)
            .flat_map(|id| self.node(id).model().properties.keys())
            .map(|candidate| (strsim::levenshtein(name, candidate), candidate))
            .filter(|(distance, _)| *distance <= threshold)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, candidate)| candidate.clone())
    }
}

/// What to do with a declared module that `known` does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unknown {
    /// Read it through the source, applying the missing-module policy
    Read,
    /// Leave it out; discovery has already reported it
    Skip,
}

/// Assemble a tree from `root`, reusing the descriptors already in `known`.
///
/// Traversal is depth-first with modules visited in declaration order, so a
/// root declaring `[a, b]` where `a` declares `[g]` yields `root, a, g, b`.
/// Descriptors missing from `known` are read through `source`; entries of
/// `known` that are not reachable from `root` are dropped.
pub fn get_raw_model_tree(
    root: ModelNode,
    known: IndexMap<PathBuf, ModelNode>,
    options: &DiscoveryOptions,
    source: &dyn DescriptorSource,
    log: &dyn LogSink,
) -> Result<ModelTree, DiscoveryError> {
    assemble(root, known, Unknown::Read, options, source, log)
}

fn children_of(
    node: &ModelNode,
    unknown: Unknown,
    options: &DiscoveryOptions,
    source: &dyn DescriptorSource,
    log: &dyn LogSink,
) -> Result<Vec<ModuleRef>, DiscoveryError> {
    match unknown {
        Unknown::Read => declared_modules(node, options, source, log),
        Unknown::Skip => Ok(resolve_modules(node, source).filter_map(Result::ok).collect()),
    }
}

fn assemble(
    root: ModelNode,
    mut known: IndexMap<PathBuf, ModelNode>,
    unknown: Unknown,
    options: &DiscoveryOptions,
    source: &dyn DescriptorSource,
    log: &dyn LogSink,
) -> Result<ModelTree, DiscoveryError> {
    let root_key = source
        .canonicalize(root.path())
        .unwrap_or_else(|_| root.path().to_path_buf());
    known.shift_remove(&root_key);

    let mut visited: HashSet<PathBuf> = HashSet::new();
    visited.insert(root_key);

    let mut pending: Vec<_> = children_of(&root, unknown, options, source, log)?
        .into_iter()
        .rev()
        .map(|module| (module, NodeId(0)))
        .collect();
    let mut nodes = vec![root];

    while let Some((module, parent)) = pending.pop() {
        if !visited.insert(module.path.clone()) {
            log.debug(&format!(
                "module '{}' in {} already in tree",
                module.name,
                module.declared_in.display()
            ));
            continue;
        }

        let mut node = match (known.shift_remove(&module.path), unknown) {
            (Some(node), _) => node,
            (None, Unknown::Read) => match load_module(&module, options, source, log)? {
                Some(node) => node,
                None => continue,
            },
            (None, Unknown::Skip) => {
                log.debug(&format!(
                    "module '{}' in {} was not discovered",
                    module.name,
                    module.declared_in.display()
                ));
                continue;
            }
        };

        let id = NodeId(nodes.len());
        node.attach(parent);
        pending.extend(
            children_of(&node, unknown, options, source, log)?
                .into_iter()
                .rev()
                .map(|module| (module, id)),
        );
        nodes.push(node);
    }

    log.debug(&format!("assembled tree of {} descriptors", nodes.len()));
    Ok(ModelTree { nodes })
}
