//! Layout-independent description of a rendered page. Both the HTML preview
//! and the PDF exporter draw from this.

use serde::Serialize;

use crate::render::templates::{TemplateId, TemplateStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Contact,
    Profile,
    Experience,
    Education,
    Skills,
    Languages,
    Letter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryBlock {
    pub heading: String,
    pub subheading: String,
    pub period: String,
    pub location: String,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelItem {
    pub name: String,
    pub label: String,
    pub percent: u8,
}

impl LevelItem {
    /// Star rating out of five.
    pub fn stars(&self) -> u8 {
        match self.percent {
            100 => 5,
            80 => 4,
            60 => 3,
            _ => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Item {
    Paragraph { text: String },
    Entry(EntryBlock),
    Level(LevelItem),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub title: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentHeader {
    pub full_name: String,
    pub headline: String,
    pub initials: String,
    pub contacts: Vec<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDocument {
    /// `None` for letters.
    pub template: Option<TemplateId>,
    #[serde(skip)]
    pub style: TemplateStyle,
    pub header: Option<DocumentHeader>,
    pub sidebar: Vec<Section>,
    pub main: Vec<Section>,
}

impl RenderedDocument {
    /// Sections in reading order, sidebar first.
    pub fn visible_sections(&self) -> Vec<SectionKind> {
        self.sidebar
            .iter()
            .chain(self.main.iter())
            .map(|s| s.kind)
            .collect()
    }

    pub fn is_blank(&self) -> bool {
        let header_blank = self
            .header
            .as_ref()
            .map_or(true, |h| h.full_name.is_empty() && h.contacts.is_empty());
        header_blank && self.sidebar.is_empty() && self.main.is_empty()
    }
}
