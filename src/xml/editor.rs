use crate::edit::{Edit, EditVerification};
use crate::xml::document::PomDocument;
use crate::xml::errors::XmlError;
use crate::xml::query::{is_valid_name, static_path, ElementPath};

const PROJECT: &str = "project";
const PROPERTIES: &str = "properties";
const PARENT: &str = "parent";
const VERSION: &str = "version";

impl PomDocument {
    /// Set the text of `child` under the first element at `path`.
    ///
    /// - an existing child has its content replaced verbatim;
    /// - an empty or self-closing child receives `value` as content;
    /// - a missing child is appended right before the closing tag of `path`.
    ///
    /// Returns `Ok(false)` when `path` does not exist or the child already
    /// holds exactly `value`. `value` is written as-is, so callers must pass
    /// escaped text.
    pub fn set_element_value(
        &mut self,
        path: &ElementPath,
        child: &str,
        value: &str,
    ) -> Result<bool, XmlError> {
        if !is_valid_name(child) {
            return Err(XmlError::InvalidElementPath {
                input: format!("{path}/{child}"),
                message: format!("invalid element name '{child}'"),
            });
        }

        let Some(parent_idx) = self.find_element(path) else {
            return Ok(false);
        };

        let edit = match self.find_child(parent_idx, child) {
            Some(child_idx) => {
                let info = self.element(child_idx);
                match &info.end_tag {
                    Some(_) => {
                        let content = info.content();
                        let current = self.slice(content.clone());
                        if current == value {
                            return Ok(false);
                        }
                        Edit::with_verification(
                            content.start,
                            content.end,
                            value,
                            EditVerification::from_text(current),
                        )
                    }
                    None => {
                        let tag = info.start_tag.clone();
                        let current = self.slice(tag.clone());
                        Edit::new(
                            tag.start,
                            tag.end,
                            expand_empty_tag(current, &info.name, value),
                            current,
                        )
                    }
                }
            }
            None => {
                let parent = self.element(parent_idx);
                let element = format!("<{child}>{value}</{child}>");
                match &parent.end_tag {
                    Some(end) => Edit::insert(end.start, element),
                    None => {
                        let tag = parent.start_tag.clone();
                        let current = self.slice(tag.clone());
                        Edit::new(
                            tag.start,
                            tag.end,
                            expand_empty_tag(current, &parent.name, &element),
                            current,
                        )
                    }
                }
            }
        };

        self.commit(edit)?;
        Ok(true)
    }

    /// The project's own `/project/version`, if declared.
    pub fn project_version(&self) -> Option<String> {
        self.element_value(&project_path(), VERSION)
    }

    /// Rewrite (or add) `/project/version`.
    pub fn set_project_version(&mut self, version: &str) -> Result<bool, XmlError> {
        self.set_element_value(&project_path(), VERSION, version)
    }

    pub fn parent_version(&self) -> Option<String> {
        self.element_value(&project_path().child(PARENT), VERSION)
    }

    /// Rewrite `/project/parent/version`. Returns `Ok(false)` without a parent block.
    pub fn set_parent_version(&mut self, version: &str) -> Result<bool, XmlError> {
        self.set_element_value(&project_path().child(PARENT), VERSION, version)
    }

    /// Rewrite (or add) a property inside `/project/properties`.
    pub fn set_property(&mut self, name: &str, value: &str) -> Result<bool, XmlError> {
        self.set_element_value(&project_path().child(PROPERTIES), name, value)
    }

    pub fn property(&self, name: &str) -> Option<String> {
        self.element_value(&project_path().child(PROPERTIES), name)
    }
}

fn project_path() -> ElementPath {
    static_path(&[PROJECT])
}

/// `<name attrs/>` becomes `<name attrs>content</name>`.
fn expand_empty_tag(tag: &str, name: &str, content: &str) -> String {
    let open = tag.strip_suffix("/>").unwrap_or(tag);
    format!("{open}>{content}</{name}>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(input: &str, path: &str, child: &str, value: &str) -> (bool, String) {
        let mut doc = PomDocument::parse(input).unwrap();
        let changed = doc
            .set_element_value(&ElementPath::parse(path).unwrap(), child, value)
            .unwrap();
        (changed, doc.into_text())
    }

    #[test]
    fn replaces_existing_value() {
        let (changed, text) = set(
            "<super-parent><parent><child>test</child></parent></super-parent>",
            "/super-parent/parent",
            "child",
            "value",
        );
        assert!(changed);
        assert_eq!(
            text,
            "<super-parent><parent><child>value</child></parent></super-parent>"
        );
    }

    #[test]
    fn fills_empty_child() {
        let (changed, text) = set(
            "<super-parent><parent><child/></parent></super-parent>",
            "/super-parent/parent",
            "child",
            "value",
        );
        assert!(changed);
        assert_eq!(
            text,
            "<super-parent><parent><child>value</child></parent></super-parent>"
        );
    }

    #[test]
    fn fills_open_close_empty_child() {
        let (changed, text) = set(
            "<a><b><c></c></b></a>",
            "/a/b",
            "c",
            "v",
        );
        assert!(changed);
        assert_eq!(text, "<a><b><c>v</c></b></a>");
    }

    #[test]
    fn adds_child_to_empty_parent() {
        let (changed, text) = set(
            "<super-parent><parent/></super-parent>",
            "/super-parent/parent",
            "child",
            "value",
        );
        assert!(changed);
        assert_eq!(
            text,
            "<super-parent><parent><child>value</child></parent></super-parent>"
        );
    }

    #[test]
    fn appends_child_after_existing_siblings() {
        let (changed, text) = set(
            "<super-parent><parent><child2/></parent></super-parent>",
            "/super-parent/parent",
            "child",
            "value",
        );
        assert!(changed);
        assert_eq!(
            text,
            "<super-parent><parent><child2/><child>value</child></parent></super-parent>"
        );
    }

    #[test]
    fn missing_path_is_not_applicable() {
        let input = "<super-parent><parent/></super-parent>";
        let (changed, text) = set(input, "/super-parent/other", "child", "value");
        assert!(!changed);
        assert_eq!(text, input);
    }

    #[test]
    fn same_value_is_not_a_change() {
        let input = "<a><b>1</b></a>";
        let (changed, text) = set(input, "/a", "b", "1");
        assert!(!changed);
        assert_eq!(text, input);
    }

    #[test]
    fn preserves_comments_attributes_and_spacing() {
        let input = "<project>\n  <!-- keep me -->\n  <properties  b=\"2\" a=\"1\">\n    <foo.version>1.0</foo.version>   <!-- trailing -->\n    <bar attr='x' />\n  </properties>\n</project>\n";
        let mut doc = PomDocument::parse(input).unwrap();
        let properties = ElementPath::parse("/project/properties").unwrap();
        assert!(doc.set_element_value(&properties, "foo.version", "1.10").unwrap());
        assert!(doc.set_element_value(&properties, "bar", "y").unwrap());
        assert_eq!(
            doc.text(),
            "<project>\n  <!-- keep me -->\n  <properties  b=\"2\" a=\"1\">\n    <foo.version>1.10</foo.version>   <!-- trailing -->\n    <bar attr='x' >y</bar>\n  </properties>\n</project>\n"
        );
    }

    #[test]
    fn sequential_edits_stay_consistent() {
        let mut doc =
            PomDocument::parse("<project><version>1</version><properties><a>x</a></properties></project>")
                .unwrap();
        assert!(doc.set_project_version("1.0.0-SNAPSHOT").unwrap());
        assert!(doc.set_property("a", "much longer value").unwrap());
        assert!(doc.set_property("b", "new").unwrap());
        assert!(doc.set_project_version("2").unwrap());
        assert_eq!(
            doc.text(),
            "<project><version>2</version><properties><a>much longer value</a><b>new</b></properties></project>"
        );
        assert_eq!(doc.property("b").as_deref(), Some("new"));
    }

    #[test]
    fn parent_version_requires_parent_block() {
        let mut doc = PomDocument::parse("<project><version>1</version></project>").unwrap();
        assert!(!doc.set_parent_version("2").unwrap());

        let mut doc = PomDocument::parse(
            "<project><parent><version>1</version></parent><version>1</version></project>",
        )
        .unwrap();
        assert_eq!(doc.parent_version().as_deref(), Some("1"));
        assert!(doc.set_parent_version("2").unwrap());
        assert_eq!(
            doc.text(),
            "<project><parent><version>2</version></parent><version>1</version></project>"
        );
    }

    #[test]
    fn edit_producing_malformed_markup_leaves_document_untouched() {
        let input = "<a><b>1</b></a>";
        let mut doc = PomDocument::parse(input).unwrap();
        let result = doc.set_element_value(&ElementPath::parse("/a").unwrap(), "b", "</a>");
        assert!(matches!(result, Err(XmlError::Malformed { .. })));
        assert_eq!(doc.text(), input);
    }

    #[test]
    fn invalid_child_name_is_rejected() {
        let mut doc = PomDocument::parse("<a/>").unwrap();
        let result = doc.set_element_value(&ElementPath::parse("/a").unwrap(), "b c", "1");
        assert!(matches!(result, Err(XmlError::InvalidElementPath { .. })));
    }
}
