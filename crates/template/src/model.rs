use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{Seconds, TemplateError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TemplateId(pub Uuid);

impl TemplateId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TemplateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SectionId(pub Uuid);

impl SectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ElementId(pub Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Intro,
    Hook,
    Body,
    #[serde(alias = "callToAction")]
    CallToAction,
}

impl SectionKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Intro => "Intro",
            Self::Hook => "Hook",
            Self::Body => "Body",
            Self::CallToAction => "Call to action",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Position in unscaled template units. `z` orders overlapping elements.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: i32,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: i32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<(), TemplateError> {
        let ok = |v: f64| v.is_finite() && v >= 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(())
        } else {
            Err(TemplateError::InvalidOp(format!(
                "element size must be non-negative, got {}x{}",
                self.width, self.height
            )))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Text { text: String },
    Image { src: String },
    Video { src: String },
    Sticker { name: String },
    Audio { src: String },
}

impl ElementKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Video { .. } => "video",
            Self::Sticker { .. } => "sticker",
            Self::Audio { .. } => "audio",
        }
    }

    /// Placeholder content for a freshly dropped element of `type_name`.
    pub fn placeholder(type_name: &str) -> Result<Self, TemplateError> {
        match type_name {
            "text" => Ok(Self::Text {
                text: "Add text".to_string(),
            }),
            "image" => Ok(Self::Image { src: String::new() }),
            "video" => Ok(Self::Video { src: String::new() }),
            "sticker" => Ok(Self::Sticker {
                name: String::new(),
            }),
            "audio" => Ok(Self::Audio { src: String::new() }),
            other => Err(TemplateError::UnknownElementType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Element {
    pub id: ElementId,
    #[serde(flatten)]
    pub kind: ElementKind,
    pub position: Position,
    pub size: Size,
    #[serde(default)]
    pub style: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_from: Option<Seconds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_to: Option<Seconds>,
}

impl Element {
    pub fn new(kind: ElementKind, position: Position, size: Size) -> Self {
        Self {
            id: ElementId::new(),
            kind,
            position,
            size,
            style: serde_json::Value::Null,
            visible_from: None,
            visible_to: None,
        }
    }

    pub fn validate(&self) -> Result<(), TemplateError> {
        self.size.validate()?;
        validate_visibility(self.visible_from, self.visible_to)
    }

    /// Whether the element shows at `t` seconds into its section.
    pub fn is_visible_at(&self, t: Seconds) -> bool {
        self.visible_from.map_or(true, |from| t >= from)
            && self.visible_to.map_or(true, |to| t <= to)
    }
}

pub(crate) fn validate_visibility(
    from: Option<Seconds>,
    to: Option<Seconds>,
) -> Result<(), TemplateError> {
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(TemplateError::InvalidOp(format!(
                "visible_from {} is after visible_to {}",
                from, to
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub id: SectionId,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub start_time: Seconds,
    pub duration: Seconds,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Section {
    pub fn new(kind: SectionKind, duration: Seconds) -> Self {
        Self {
            id: SectionId::new(),
            kind,
            label: None,
            start_time: 0.0,
            duration,
            elements: Vec::new(),
        }
    }

    pub fn end_time(&self) -> Seconds {
        self.start_time + self.duration
    }

    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or_else(|| self.kind.label())
    }
}

pub fn validate_duration(duration: Seconds) -> Result<(), TemplateError> {
    if duration.is_finite() && duration > 0.0 {
        Ok(())
    } else {
        Err(TemplateError::InvalidDuration(duration))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Default for Template {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: TemplateId::new(),
            name: name.into(),
            sections: Vec::new(),
            created_at: now,
            updated_at: now,
            metadata: serde_json::Value::Null,
        }
    }

    /// Starter layout offered when a user creates a blank template.
    pub fn with_default_sections(name: impl Into<String>) -> Self {
        let mut template = Self::new(name);
        template.sections = vec![
            Section::new(SectionKind::Intro, 2.0),
            Section::new(SectionKind::Hook, 3.0),
            Section::new(SectionKind::Body, 10.0),
            Section::new(SectionKind::CallToAction, 5.0),
        ];
        template.reflow();
        template
    }

    pub fn total_duration(&self) -> Seconds {
        crate::total_duration(&self.sections)
    }

    /// Check the invariants commands maintain, for templates that arrive from
    /// outside (files, the network). Start times are not checked; call
    /// [`Template::reflow`] after loading.
    pub fn validate(&self) -> Result<(), TemplateError> {
        let mut element_ids = std::collections::HashSet::new();
        for (idx, section) in self.sections.iter().enumerate() {
            if self.sections[..idx].iter().any(|s| s.id == section.id) {
                return Err(TemplateError::SectionExists(section.id));
            }
            validate_duration(section.duration)?;
            for element in &section.elements {
                element.validate()?;
                if !element_ids.insert(element.id) {
                    return Err(TemplateError::ElementExists(element.id));
                }
            }
        }
        Ok(())
    }

    /// Re-derive contiguous start times from section order and durations.
    pub fn reflow(&mut self) {
        let mut cursor = 0.0;
        for section in &mut self.sections {
            section.start_time = cursor;
            cursor += section.duration;
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn section_index(&self, id: SectionId) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn section_mut(&mut self, id: SectionId) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    pub fn find_element(&self, id: ElementId) -> Option<(&Section, &Element)> {
        self.sections.iter().find_map(|section| {
            section
                .elements
                .iter()
                .find(|e| e.id == id)
                .map(|element| (section, element))
        })
    }

    pub fn find_element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.sections
            .iter_mut()
            .flat_map(|s| s.elements.iter_mut())
            .find(|e| e.id == id)
    }

    pub fn element_count(&self) -> usize {
        self.sections.iter().map(|s| s.elements.len()).sum()
    }
}
