//! Documents as ordered sequences of OCR'd lines.
//!
//! The input file maps a document id to `{ doc_name, data: [line, ...] }`:
//!
//! ```json
//! { "0": { "doc_name": "doc1.pdf",
//!          "data": [ { "img_name": "doc1_0.jpeg", "line_uid": "0",
//!                      "bbox": { "left": 0, "top": 0, "width": 10, "height": 4 } } ] } }
//! ```
//!
//! Line order is reading order, not comparison order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ordered::OrderedMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

/// Pre-existing ground-truth level of a line, e.g. a heading depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Category {
    Number(f64),
    Text(String),
}

impl Category {
    /// Numeric level, if the category is a number or a numeric string.
    pub fn level(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n).filter(|n| n.is_finite()),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    #[serde(rename = "line_uid", alias = "uid")]
    pub uid: String,
    pub img_name: String,
    pub bbox: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_num: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_num: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub doc_name: String,
    #[serde(default)]
    pub data: Vec<Line>,
}

impl Document {
    pub fn new(doc_name: impl Into<String>, data: Vec<Line>) -> Self {
        Self {
            doc_name: doc_name.into(),
            data,
        }
    }

    /// Documents with fewer than two lines have nothing to compare.
    pub fn is_eligible(&self) -> bool {
        self.data.len() >= 2
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reading-order index of the line with `uid`.
    pub fn position(&self, uid: &str) -> Option<usize> {
        self.data.iter().position(|line| line.uid == uid)
    }

    pub fn line(&self, uid: &str) -> Option<&Line> {
        self.data.iter().find(|line| line.uid == uid)
    }
}

/// All documents of a labelling job, in input file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSet {
    entries: Vec<(String, Document)>,
}

impl DocumentSet {
    pub fn new(entries: Vec<(String, Document)>) -> Self {
        Self { entries }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let map: OrderedMap<Document> = serde_json::from_str(json)?;
        Ok(Self::new(map.into_inner()))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let map = OrderedMap(self.entries.clone());
        serde_json::to_string_pretty(&map)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(document id, document)` pairs in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Document)> {
        self.entries.iter().map(|(id, doc)| (id.as_str(), doc))
    }

    /// Documents that can take part in comparisons, in input order.
    pub fn eligible(&self) -> impl Iterator<Item = (&str, &Document)> {
        self.iter().filter(|(id, doc)| {
            let ok = doc.is_eligible();
            if !ok {
                debug!(doc_id = *id, doc_name = %doc.doc_name, lines = doc.len(), "skipping document");
            }
            ok
        })
    }

    pub fn by_name(&self, doc_name: &str) -> Option<&Document> {
        self.entries
            .iter()
            .map(|(_, doc)| doc)
            .find(|doc| doc.doc_name == doc_name)
    }

    /// Line lookup across all documents, keyed by document name and uid.
    pub fn line(&self, doc_name: &str, uid: &str) -> Option<&Line> {
        self.by_name(doc_name).and_then(|doc| doc.line(uid))
    }
}

/// Small hand-built documents for tests in this and dependent crates.
#[cfg(any(test, feature = "test-util"))]
pub mod fixtures {
    use super::*;

    /// Lines `uids[i]` on page image `<doc>_0.jpeg`, stacked vertically.
    pub fn document(doc_name: &str, uids: &[&str]) -> Document {
        let data = uids
            .iter()
            .enumerate()
            .map(|(i, uid)| Line {
                uid: uid.to_string(),
                img_name: format!("{doc_name}_0.jpeg"),
                bbox: BoundingBox {
                    left: 10,
                    top: 20 * i as i64,
                    width: 300,
                    height: 16,
                },
                line_num: Some(i as u32),
                page_num: Some(0),
                text: None,
                category: None,
            })
            .collect();
        Document::new(doc_name, data)
    }

    /// One [`document`] per `(name, uids)` pair, keyed `"0"`, `"1"`, ...
    pub fn document_set(docs: &[(&str, &[&str])]) -> DocumentSet {
        DocumentSet::new(
            docs.iter()
                .enumerate()
                .map(|(i, (name, uids))| (i.to_string(), document(name, uids)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = r#"{
        "1": {"doc_name": "doc2.pdf",
              "data": [{"img_name": "doc2_0.jpeg", "line_num": 0, "line_uid": "0", "text": "Title",
                        "bbox": {"left": 0, "top": 0, "width": 100, "height": 20}, "page_num": 0, "category": 1},
                       {"img_name": "doc2_1.jpeg", "line_num": 1, "line_uid": "1", "text": "",
                        "bbox": {"left": 1, "top": 1, "width": 1, "height": 1}, "page_num": 1, "category": "2"}]},
        "0": {"doc_name": "doc1.pdf",
              "data": [{"img_name": "doc1_0.jpeg", "uid": "7",
                        "bbox": {"left": 0, "top": 0, "width": 0, "height": 0}}]}
    }"#;

    #[test]
    fn parses_input_in_file_order() {
        let set = DocumentSet::from_json(INPUT).unwrap();
        let ids: Vec<&str> = set.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["1", "0"]);

        let doc = set.by_name("doc2.pdf").unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.data[0].text.as_deref(), Some("Title"));
        assert_eq!(doc.data[1].bbox.width, 1);
    }

    #[test]
    fn uid_alias_is_accepted() {
        let set = DocumentSet::from_json(INPUT).unwrap();
        assert_eq!(set.by_name("doc1.pdf").unwrap().data[0].uid, "7");
    }

    #[test]
    fn eligible_skips_single_line_documents() {
        let set = DocumentSet::from_json(INPUT).unwrap();
        let eligible: Vec<&str> = set.eligible().map(|(_, d)| d.doc_name.as_str()).collect();
        assert_eq!(eligible, vec!["doc2.pdf"]);
    }

    #[test]
    fn category_levels() {
        assert_eq!(Category::Number(2.0).level(), Some(2.0));
        assert_eq!(Category::Text(" 3 ".into()).level(), Some(3.0));
        assert_eq!(Category::Text("heading".into()).level(), None);
        assert_eq!(Category::Number(f64::NAN).level(), None);
    }

    #[test]
    fn mixed_category_types_parse() {
        let set = DocumentSet::from_json(INPUT).unwrap();
        let doc = set.by_name("doc2.pdf").unwrap();
        assert_eq!(doc.data[0].category, Some(Category::Number(1.0)));
        assert_eq!(doc.data[1].category, Some(Category::Text("2".into())));
    }

    #[test]
    fn position_and_line_lookup() {
        let doc = fixtures::document("doc", &["a", "b", "c"]);
        assert_eq!(doc.position("c"), Some(2));
        assert_eq!(doc.position("z"), None);
        let set = DocumentSet::new(vec![("0".into(), doc)]);
        assert_eq!(set.line("doc", "b").unwrap().bbox.top, 20);
        assert!(set.line("other", "b").is_none());
    }

    #[test]
    fn json_output_keeps_order() {
        let set = DocumentSet::from_json(INPUT).unwrap();
        let reparsed = DocumentSet::from_json(&set.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, set);
    }
}
