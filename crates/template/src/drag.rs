//! Drag sources offered by the editor palette and the payload they attach to a drag gesture.

use serde::{Deserialize, Serialize};

use crate::{ElementKind, Size, TemplateError};

/// Data attached to a platform drag event. Ephemeral, never stored in a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DragPayload {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: String,
}

impl DragPayload {
    pub fn new(id: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            element_type: element_type.into(),
        }
    }

    pub fn encode(&self) -> String {
        // Two string fields; serialisation cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(raw: &str) -> Result<Self, TemplateError> {
        serde_json::from_str(raw).map_err(|e| TemplateError::MalformedPayload(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaletteItem {
    pub id: String,
    pub element_type: String,
    pub category: String,
    pub label: String,
    pub default_size: Size,
}

impl PaletteItem {
    pub fn new(
        id: impl Into<String>,
        element_type: impl Into<String>,
        category: impl Into<String>,
        label: impl Into<String>,
        default_size: Size,
    ) -> Self {
        Self {
            id: id.into(),
            element_type: element_type.into(),
            category: category.into(),
            label: label.into(),
            default_size,
        }
    }

    pub fn payload(&self) -> DragPayload {
        DragPayload::new(self.id.clone(), self.element_type.clone())
    }

    pub fn placeholder_kind(&self) -> Result<ElementKind, TemplateError> {
        ElementKind::placeholder(&self.element_type)
    }
}

/// Draggable element definitions, kept in registration order.
#[derive(Debug, Clone, Default)]
pub struct DragSourceRegistry {
    items: Vec<PaletteItem>,
}

impl DragSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The palette shipped with the editor.
    pub fn stock() -> Self {
        let mut registry = Self::new();
        let stock = [
            PaletteItem::new("heading", "text", "text", "Heading", Size::new(320.0, 64.0)),
            PaletteItem::new("caption", "text", "text", "Caption", Size::new(280.0, 40.0)),
            PaletteItem::new("image", "image", "media", "Image", Size::new(240.0, 240.0)),
            PaletteItem::new("video", "video", "media", "Video", Size::new(360.0, 640.0)),
            PaletteItem::new("emoji", "sticker", "stickers", "Emoji", Size::new(96.0, 96.0)),
            PaletteItem::new("badge", "sticker", "stickers", "Badge", Size::new(128.0, 48.0)),
            PaletteItem::new("sound", "audio", "audio", "Sound", Size::new(0.0, 0.0)),
        ];
        for item in stock {
            let registered = registry.register(item);
            debug_assert!(registered.is_ok(), "stock palette entry rejected: {registered:?}");
        }
        registry
    }

    pub fn register(&mut self, item: PaletteItem) -> Result<(), TemplateError> {
        if self.items.iter().any(|i| i.id == item.id) {
            return Err(TemplateError::DuplicatePaletteItem(item.id));
        }
        ElementKind::placeholder(&item.element_type)?;
        self.items.push(item);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&PaletteItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn items(&self) -> &[PaletteItem] {
        &self.items
    }

    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a PaletteItem> {
        self.items.iter().filter(move |i| i.category == category)
    }

    /// Categories in the order they were first registered.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for item in &self.items {
            if !seen.contains(&item.category.as_str()) {
                seen.push(&item.category);
            }
        }
        seen
    }

    pub fn payload_for(&self, id: &str) -> Option<DragPayload> {
        self.get(id).map(PaletteItem::payload)
    }

    /// Match a decoded payload back to its palette entry. Falls back to the
    /// first item of the same element type when the id is unknown.
    pub fn lookup(&self, payload: &DragPayload) -> Result<&PaletteItem, TemplateError> {
        self.get(&payload.id)
            .filter(|i| i.element_type == payload.element_type)
            .or_else(|| {
                self.items
                    .iter()
                    .find(|i| i.element_type == payload.element_type)
            })
            .ok_or_else(|| TemplateError::UnknownElementType(payload.element_type.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_encode_decode() {
        let payload = DragPayload::new("heading", "text");
        let raw = payload.encode();
        assert_eq!(raw, r#"{"id":"heading","type":"text"}"#);
        assert_eq!(DragPayload::decode(&raw).unwrap(), payload);
    }

    #[test]
    fn test_malformed_payload() {
        for raw in ["", "not json", r#"{"id":"x"}"#, r#"{"id":1,"type":"text"}"#] {
            assert!(matches!(
                DragPayload::decode(raw),
                Err(TemplateError::MalformedPayload(_))
            ));
        }
    }

    #[test]
    fn test_stock_categories_in_order() {
        let registry = DragSourceRegistry::stock();
        assert_eq!(registry.items().len(), 7);
        assert_eq!(
            registry.categories(),
            vec!["text", "media", "stickers", "audio"]
        );
        let stickers: Vec<_> = registry.by_category("stickers").map(|i| i.id.as_str()).collect();
        assert_eq!(stickers, vec!["emoji", "badge"]);
    }

    #[test]
    fn test_register_rejects_duplicates_and_unknown_types() {
        let mut registry = DragSourceRegistry::stock();
        let dup = PaletteItem::new("image", "image", "media", "Again", Size::new(1.0, 1.0));
        assert_eq!(
            registry.register(dup),
            Err(TemplateError::DuplicatePaletteItem("image".to_string()))
        );
        let bogus = PaletteItem::new("chart", "chart", "data", "Chart", Size::new(1.0, 1.0));
        assert!(matches!(
            registry.register(bogus),
            Err(TemplateError::UnknownElementType(_))
        ));
    }

    #[test]
    fn test_lookup_falls_back_to_type() {
        let registry = DragSourceRegistry::stock();
        let exact = registry.lookup(&DragPayload::new("caption", "text")).unwrap();
        assert_eq!(exact.id, "caption");

        let fallback = registry
            .lookup(&DragPayload::new("legacy-text", "text"))
            .unwrap();
        assert_eq!(fallback.id, "heading");

        assert!(registry.lookup(&DragPayload::new("x", "chart")).is_err());
        assert_eq!(
            registry.payload_for("emoji"),
            Some(DragPayload::new("emoji", "sticker"))
        );
    }
}
