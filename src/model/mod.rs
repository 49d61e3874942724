//! Descriptor hierarchy: per-file models, discovery of declared modules and
//! the parent-linked tree used for property resolution.

pub mod discovery;
pub mod pom;
pub mod tree;

pub use discovery::{
    get_child_models, resolve_module_path, DescriptorSource, DiscoveryError, DiscoveryOptions,
    FsSource, MissingModulePolicy, DESCRIPTOR_FILE,
};
pub use pom::{ParentRef, PomModel};
pub use tree::{get_raw_model_tree, ModelNode, ModelTree, NodeId};
