//! Pom Patcher: location-preserving edits over multi-module pom.xml trees
//!
//! Descriptors are scanned into an event stream with exact byte spans and
//! edited in place, so comments, attribute order and whitespace survive every
//! change. On top of that sit hierarchy discovery through `<modules>`,
//! property resolution along parent links, a version-range overlap
//! evaluator, and TOML update plans that tie them together.
//!
//! # Architecture
//!
//! All document mutations compile down to a single primitive: [`Edit`], a
//! verified byte-span replacement. After each edit the document is rescanned;
//! an edit that would leave malformed markup is rejected and the document
//! stays as it was.
//!
//! # Example
//!
//! ```
//! use pom_patcher::{ElementPath, PomDocument};
//!
//! let mut doc = PomDocument::parse(
//!     "<project>\n  <!-- pinned -->\n  <properties><foo.version>1.0</foo.version></properties>\n</project>",
//! )
//! .unwrap();
//! let properties = ElementPath::parse("/project/properties").unwrap();
//! assert!(doc.set_element_value(&properties, "foo.version", "1.1").unwrap());
//! assert!(doc.text().contains("<!-- pinned -->"));
//! assert_eq!(doc.property("foo.version").as_deref(), Some("1.1"));
//! ```

pub mod config;
pub mod edit;
pub mod log;
pub mod model;
pub mod version;
pub mod xml;

// Re-exports
pub use config::{
    apply_updates, check_updates, load_from_path, load_from_str, ApplicationError, ConfigError,
    UpdateConfig, UpdateResult,
};
pub use edit::{atomic_write, Edit, EditError, EditVerification};
pub use log::{LogSink, NoopLog, RecordingLog, Severity, TracingLog};
pub use model::{
    get_child_models, get_raw_model_tree, DiscoveryError, DiscoveryOptions, FsSource,
    MissingModulePolicy, ModelNode, ModelTree, NodeId, PomModel,
};
pub use version::{compare_versions, is_overlap, is_version_overlap, parse_version_spec, VersionError, VersionSpec};
pub use xml::{ElementPath, PomDocument, XmlError};
