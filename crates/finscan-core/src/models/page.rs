//! OCR page structures consumed by the pipeline.
//!
//! The OCR collaborator writes one JSON object per document, keyed by page id:
//!
//! ```json
//! { "page_1": [ { "text": "...", "confidence": 0.98, "position": [[0,0],[1,0],[1,1],[0,1]] } ] }
//! ```

use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;

/// Four-point polygon (x, y) around a text fragment, clockwise from top-left.
pub type BoundingBox = [[f32; 2]; 4];

/// A recognized text fragment, usually one visual line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    /// Recognized text content.
    pub text: String,

    /// Recognition confidence (0.0 - 1.0).
    #[serde(default)]
    pub confidence: f32,

    /// Position of the fragment on the page. Carried through but not used by
    /// the current heuristics.
    #[serde(default, alias = "position", skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

impl TextItem {
    /// Create a fragment with full confidence and no position.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: 1.0,
            bounding_box: None,
        }
    }

    /// Whitespace-separated tokens of the fragment.
    pub fn tokens(&self) -> Vec<&str> {
        self.text.split_whitespace().collect()
    }
}

/// All text fragments of one page, in OCR output order.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrPage {
    /// Page identifier (e.g. `page_1`).
    pub id: String,
    /// Fragments in reading order.
    pub items: Vec<TextItem>,
}

impl OcrPage {
    pub fn new(id: impl Into<String>, items: Vec<TextItem>) -> Self {
        Self {
            id: id.into(),
            items,
        }
    }

    /// Build a page from plain lines of text.
    pub fn from_lines<I, S>(id: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(id, lines.into_iter().map(TextItem::new).collect())
    }

    /// Normalized page text: fragments joined by single spaces, lowercased.
    pub fn text(&self) -> String {
        self.items
            .iter()
            .map(|item| item.text.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Raw fragment texts in order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.text.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.items.iter().all(|item| item.text.trim().is_empty())
    }
}

/// A whole document: pages in the order they appear in the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrDocument {
    pub pages: Vec<OcrPage>,
}

impl OcrDocument {
    /// Parse OCR JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load OCR JSON from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn page(&self, id: &str) -> Option<&OcrPage> {
        self.pages.iter().find(|p| p.id == id)
    }
}

impl Serialize for OcrDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pages.len()))?;
        for page in &self.pages {
            map.serialize_entry(&page.id, &page.items)?;
        }
        map.end()
    }
}

// Hand-written so page order follows the JSON object, not a sorted map.
impl<'de> Deserialize<'de> for OcrDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PagesVisitor;

        impl<'de> Visitor<'de> for PagesVisitor {
            type Value = OcrDocument;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of page id to a list of OCR text items")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut pages = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((id, items)) = access.next_entry::<String, Vec<TextItem>>()? {
                    pages.push(OcrPage { id, items });
                }
                Ok(OcrDocument { pages })
            }
        }

        deserializer.deserialize_map(PagesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_page_order_is_preserved() {
        let json = r#"{
            "page_2": [{"text": "second", "confidence": 0.9, "position": [[0,0],[1,0],[1,1],[0,1]]}],
            "page_10": [{"text": "tenth", "confidence": 0.8}],
            "page_1": [{"text": "first", "confidence": 0.7}]
        }"#;

        let doc = OcrDocument::from_json(json).unwrap();
        let ids: Vec<&str> = doc.pages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["page_2", "page_10", "page_1"]);
        assert_eq!(doc.pages[0].items[0].bounding_box.unwrap()[2], [1.0, 1.0]);
        assert!(doc.pages[1].items[0].bounding_box.is_none());
    }

    #[test]
    fn test_normalized_text() {
        let page = OcrPage::from_lines("page_1", ["Account Number", "12345  ABC"]);
        assert_eq!(page.text(), "account number 12345  abc");
        assert_eq!(page.items[1].tokens(), vec!["12345", "ABC"]);
    }

    #[test]
    fn test_rejects_non_map_input() {
        assert!(OcrDocument::from_json(r#"[{"text": "x"}]"#).is_err());
    }

    #[test]
    fn test_serialize_roundtrip_keeps_order() {
        let doc = OcrDocument {
            pages: vec![
                OcrPage::from_lines("b", ["x"]),
                OcrPage::from_lines("a", ["y"]),
            ],
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.find("\"b\"").unwrap() < json.find("\"a\"").unwrap());
    }
}
