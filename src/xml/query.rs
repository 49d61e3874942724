use crate::xml::errors::XmlError;
use std::fmt;

/// Element names from the document root down to a scope, e.g. `/project/parent`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementPath {
    parts: Vec<String>,
}

impl ElementPath {
    pub fn new(parts: Vec<String>) -> Result<Self, XmlError> {
        if parts.is_empty() {
            return Err(XmlError::InvalidElementPath {
                input: String::new(),
                message: "empty element path".to_string(),
            });
        }
        if let Some(bad) = parts.iter().find(|part| !is_valid_name(part)) {
            return Err(XmlError::InvalidElementPath {
                input: parts.join("/"),
                message: format!("invalid element name '{bad}'"),
            });
        }
        Ok(Self { parts })
    }

    /// Parse a slash separated path. The leading slash is optional.
    pub fn parse(input: &str) -> Result<Self, XmlError> {
        let trimmed = input.trim();
        let body = trimmed.strip_prefix('/').unwrap_or(trimmed);
        if body.is_empty() {
            return Err(XmlError::InvalidElementPath {
                input: input.to_string(),
                message: "empty element path".to_string(),
            });
        }

        let mut parts = Vec::new();
        for segment in body.split('/') {
            if segment.is_empty() {
                return Err(XmlError::InvalidElementPath {
                    input: input.to_string(),
                    message: "empty path segment".to_string(),
                });
            }
            if !is_valid_name(segment) {
                return Err(XmlError::InvalidElementPath {
                    input: input.to_string(),
                    message: format!("invalid element name '{segment}'"),
                });
            }
            parts.push(segment.to_string());
        }
        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Path of a direct child of this scope.
    pub fn child(&self, name: &str) -> Self {
        let mut parts = self.parts.clone();
        parts.push(name.to_string());
        Self { parts }
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.parts.join("/"))
    }
}

/// Build a path from names known to be valid.
pub(crate) fn static_path(parts: &[&str]) -> ElementPath {
    ElementPath {
        parts: parts.iter().map(|part| part.to_string()).collect(),
    }
}

pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|ch| ch.is_whitespace() || matches!(ch, '<' | '>' | '/' | '&' | '"' | '\'' | '='))
}
