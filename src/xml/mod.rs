pub mod document;
pub mod editor;
pub mod errors;
pub mod query;

pub use document::{PomDocument, XmlEvent, XmlEventKind};
pub use errors::XmlError;
pub use query::ElementPath;
