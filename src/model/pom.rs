use crate::xml::query::static_path as path;
use crate::xml::PomDocument;
use indexmap::IndexMap;

const DEFAULT_PACKAGING: &str = "jar";

/// Reference to the parent project declared in `<parent>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentRef {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub relative_path: Option<String>,
}

/// The logical fields of one descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomModel {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<ParentRef>,
    pub properties: IndexMap<String, String>,
    /// Declared module directories, including those of profiles, without duplicates.
    pub modules: Vec<String>,
}

impl PomModel {
    pub fn from_document(document: &PomDocument) -> Self {
        let project = path(&["project"]);
        let value = |child: &str| non_empty(document.element_value(&project, child));

        let parent_path = project.child("parent");
        let parent = document.has_element(&parent_path).then(|| {
            let parent_value = |child: &str| non_empty(document.element_value(&parent_path, child));
            ParentRef {
                group_id: parent_value("groupId"),
                artifact_id: parent_value("artifactId"),
                version: parent_value("version"),
                relative_path: parent_value("relativePath"),
            }
        });

        let properties = document
            .child_texts(&project.child("properties"))
            .into_iter()
            .collect();

        let mut modules: Vec<String> = Vec::new();
        let declared = document
            .all_child_values(&path(&["project", "modules"]), "module")
            .into_iter()
            .chain(
                document.all_child_values(&path(&["project", "profiles", "profile", "modules"]), "module"),
            );
        for module in declared {
            if !module.is_empty() && !modules.contains(&module) {
                modules.push(module);
            }
        }

        Self {
            group_id: value("groupId"),
            artifact_id: value("artifactId"),
            version: value("version"),
            packaging: value("packaging"),
            parent,
            properties,
            modules,
        }
    }

    /// The declared group id, or the parent's when omitted.
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or_else(|| self.parent.as_ref()?.group_id.as_deref())
    }

    /// The declared version, or the parent's when omitted.
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.parent.as_ref()?.version.as_deref())
    }

    pub fn packaging(&self) -> &str {
        self.packaging.as_deref().unwrap_or(DEFAULT_PACKAGING)
    }

    /// `groupId:artifactId:version` with `?` for unknown parts.
    pub fn coordinates(&self) -> String {
        format!(
            "{}:{}:{}",
            self.effective_group_id().unwrap_or("?"),
            self.artifact_id.as_deref().unwrap_or("?"),
            self.effective_version().unwrap_or("?")
        )
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHILD: &str = r#"<project>
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>org.myorg</groupId>
    <artifactId>parent</artifactId>
    <version>1.2</version>
    <relativePath>../pom.xml</relativePath>
  </parent>
  <artifactId>child</artifactId>
  <packaging>pom</packaging>
  <properties>
    <a>1</a>
    <b/>
  </properties>
  <modules>
    <module>one</module>
    <module>two</module>
  </modules>
  <profiles>
    <profile>
      <id>extra</id>
      <modules>
        <module>two</module>
        <module>three</module>
      </modules>
    </profile>
  </profiles>
  <dependencies>
    <dependency>
      <groupId>junit</groupId>
      <version>4.13</version>
    </dependency>
  </dependencies>
</project>
"#;

    #[test]
    fn group_id_and_version_fall_back_to_parent() {
        let model = PomModel::from_document(&PomDocument::parse(CHILD).unwrap());
        assert_eq!(model.group_id, None);
        assert_eq!(model.effective_group_id(), Some("org.myorg"));
        assert_eq!(model.effective_version(), Some("1.2"));
        assert_eq!(model.coordinates(), "org.myorg:child:1.2");
    }

    #[test]
    fn reads_parent_properties_and_modules() {
        let model = PomModel::from_document(&PomDocument::parse(CHILD).unwrap());
        let parent = model.parent.as_ref().unwrap();
        assert_eq!(parent.artifact_id.as_deref(), Some("parent"));
        assert_eq!(parent.relative_path.as_deref(), Some("../pom.xml"));
        assert_eq!(model.packaging(), "pom");
        assert_eq!(model.properties.get("a").map(String::as_str), Some("1"));
        assert_eq!(model.properties.get("b").map(String::as_str), Some(""));
        assert_eq!(model.modules, vec!["one", "two", "three"]);
    }

    #[test]
    fn defaults_for_minimal_project() {
        let model = PomModel::from_document(&PomDocument::parse("<project/>").unwrap());
        assert_eq!(model.packaging(), "jar");
        assert!(model.parent.is_none());
        assert!(model.modules.is_empty());
        assert_eq!(model.coordinates(), "?:?:?");
    }
}
