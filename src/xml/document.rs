use crate::edit::{atomic_write, Edit};
use crate::xml::errors::XmlError;
use crate::xml::query::ElementPath;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEventKind {
    Declaration,
    StartTag,
    EndTag,
    EmptyTag,
    Text,
    CData,
    Comment,
    DocType,
    ProcessingInstruction,
}

/// One structural event of the scanned buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlEvent {
    pub kind: XmlEventKind,
    /// Byte span in the current buffer
    pub span: Range<usize>,
    /// Number of open elements enclosing the event
    pub depth: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct ElementInfo {
    pub(crate) name: String,
    pub(crate) path: Vec<String>,
    pub(crate) parent: Option<usize>,
    pub(crate) start_tag: Range<usize>,
    /// `None` for self-closing elements
    pub(crate) end_tag: Option<Range<usize>>,
}

impl ElementInfo {
    pub(crate) fn content(&self) -> Range<usize> {
        match &self.end_tag {
            Some(end) => self.start_tag.end..end.start,
            None => self.start_tag.end..self.start_tag.end,
        }
    }
}

/// A descriptor buffer plus the event stream scanned from it.
///
/// Byte spans always refer to the current buffer: every committed edit is
/// followed by a rescan, so lookups and further edits stay valid.
#[derive(Debug, Clone)]
pub struct PomDocument {
    file: PathBuf,
    content: String,
    events: Vec<XmlEvent>,
    elements: Vec<ElementInfo>,
}

impl PomDocument {
    pub fn parse(content: &str) -> Result<Self, XmlError> {
        Self::from_path("<pom-buffer>", content)
    }

    pub fn from_path(path: impl Into<PathBuf>, content: &str) -> Result<Self, XmlError> {
        let (events, elements) = scan(content)?;
        Ok(Self {
            file: path.into(),
            content: content.to_string(),
            events,
            elements,
        })
    }

    /// Read and scan a descriptor from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, XmlError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| XmlError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_path(path, &content)
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    pub fn into_text(self) -> String {
        self.content
    }

    pub fn events(&self) -> &[XmlEvent] {
        &self.events
    }

    /// Write the current buffer back to `path` atomically.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), XmlError> {
        atomic_write(path.as_ref(), self.content.as_bytes())?;
        Ok(())
    }

    pub fn has_element(&self, path: &ElementPath) -> bool {
        self.find_element(path).is_some()
    }

    /// Trimmed text of `child` under the first element at `path`.
    pub fn element_value(&self, path: &ElementPath, child: &str) -> Option<String> {
        let parent = self.find_element(path)?;
        let child = self.find_child(parent, child)?;
        Some(self.text_content(child))
    }

    /// `(name, text)` of every direct child of the first element at `path`.
    pub fn child_texts(&self, path: &ElementPath) -> Vec<(String, String)> {
        match self.find_element(path) {
            Some(parent) => self
                .children(parent)
                .map(|idx| (self.elements[idx].name.clone(), self.text_content(idx)))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Texts of children named `child` under every element at `path`, in
    /// document order.
    pub fn all_child_values(&self, path: &ElementPath, child: &str) -> Vec<String> {
        self.elements_at(path)
            .flat_map(|parent| {
                self.children(parent)
                    .filter(|idx| self.elements[*idx].name == child)
                    .collect::<Vec<_>>()
            })
            .map(|idx| self.text_content(idx))
            .collect()
    }

    pub(crate) fn element(&self, idx: usize) -> &ElementInfo {
        &self.elements[idx]
    }

    pub(crate) fn find_element(&self, path: &ElementPath) -> Option<usize> {
        self.elements_at(path).next()
    }

    fn elements_at<'a>(&'a self, path: &'a ElementPath) -> impl Iterator<Item = usize> + 'a {
        self.elements
            .iter()
            .enumerate()
            .filter(move |(_, info)| info.path == path.parts())
            .map(|(idx, _)| idx)
    }

    pub(crate) fn children(&self, parent: usize) -> impl Iterator<Item = usize> + '_ {
        (parent + 1..self.elements.len()).filter(move |idx| self.elements[*idx].parent == Some(parent))
    }

    pub(crate) fn find_child(&self, parent: usize, name: &str) -> Option<usize> {
        self.children(parent)
            .find(|idx| self.elements[*idx].name == name)
    }

    pub(crate) fn slice(&self, span: Range<usize>) -> &str {
        &self.content[span]
    }

    /// Direct text and CDATA content of an element, unescaped and trimmed.
    fn text_content(&self, idx: usize) -> String {
        let info = &self.elements[idx];
        let content = info.content();
        let depth = info.path.len();
        let mut text = String::new();
        for event in &self.events {
            if event.span.start < content.start || event.span.end > content.end {
                continue;
            }
            if event.depth != depth {
                continue;
            }
            let raw = &self.content[event.span.clone()];
            match event.kind {
                XmlEventKind::Text => match quick_xml::escape::unescape(raw) {
                    Ok(unescaped) => text.push_str(&unescaped),
                    Err(_) => text.push_str(raw),
                },
                XmlEventKind::CData => {
                    let inner = raw
                        .strip_prefix("<![CDATA[")
                        .and_then(|rest| rest.strip_suffix("]]>"))
                        .unwrap_or(raw);
                    text.push_str(inner);
                }
                _ => {}
            }
        }
        text.trim().to_string()
    }

    /// Apply a verified edit, then rescan.
    ///
    /// The buffer is only replaced when the edited text scans cleanly, so a
    /// failed edit leaves the document untouched.
    pub(crate) fn commit(&mut self, edit: Edit) -> Result<(), XmlError> {
        let updated = edit.splice(&self.content)?;
        let (events, elements) = scan(&updated)?;
        self.content = updated;
        self.events = events;
        self.elements = elements;
        Ok(())
    }
}

fn scan(content: &str) -> Result<(Vec<XmlEvent>, Vec<ElementInfo>), XmlError> {
    let mut reader = Reader::from_str(content);
    let mut events = Vec::new();
    let mut elements: Vec<ElementInfo> = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|err| XmlError::Malformed {
            position: reader.error_position() as usize,
            message: err.to_string(),
        })?;
        let end = reader.buffer_position() as usize;
        let depth = open.len();

        let (kind, depth) = match event {
            Event::Start(ref tag) => {
                let idx = open_element(&mut elements, &open, tag.name().as_ref(), start..end)?;
                open.push(idx);
                (XmlEventKind::StartTag, depth)
            }
            Event::Empty(ref tag) => {
                open_element(&mut elements, &open, tag.name().as_ref(), start..end)?;
                (XmlEventKind::EmptyTag, depth)
            }
            Event::End(_) => {
                let idx = open.pop().ok_or_else(|| XmlError::Malformed {
                    position: start,
                    message: "closing tag without matching start".to_string(),
                })?;
                elements[idx].end_tag = Some(start..end);
                (XmlEventKind::EndTag, open.len())
            }
            Event::Text(_) => (XmlEventKind::Text, depth),
            Event::CData(_) => (XmlEventKind::CData, depth),
            Event::Comment(_) => (XmlEventKind::Comment, depth),
            Event::Decl(_) => (XmlEventKind::Declaration, depth),
            Event::PI(_) => (XmlEventKind::ProcessingInstruction, depth),
            Event::DocType(_) => (XmlEventKind::DocType, depth),
            Event::Eof => break,
        };

        events.push(XmlEvent {
            kind,
            span: start..end,
            depth,
        });
    }

    if let Some(&idx) = open.last() {
        return Err(XmlError::Malformed {
            position: content.len(),
            message: format!("unclosed element <{}>", elements[idx].name),
        });
    }

    Ok((events, elements))
}

fn open_element(
    elements: &mut Vec<ElementInfo>,
    open: &[usize],
    raw_name: &[u8],
    start_tag: Range<usize>,
) -> Result<usize, XmlError> {
    let name = std::str::from_utf8(raw_name)
        .map_err(|err| XmlError::Malformed {
            position: start_tag.start,
            message: format!("invalid tag name: {err}"),
        })?
        .to_string();

    let parent = open.last().copied();
    let mut path = parent
        .map(|idx| elements[idx].path.clone())
        .unwrap_or_default();
    path.push(name.clone());

    elements.push(ElementInfo {
        name,
        path,
        parent,
        start_tag,
        end_tag: None,
    });
    Ok(elements.len() - 1)
}
