//! # provenance
//! ## Aim
//! Provenance container for computed entries: who produced a record, under
//! which project, with which literature references and through which chain of
//! processing steps. Meant for JSON exchange with the databank, so every limit
//! the service enforces is checked at construction and again on deserialize.
//!
//! ## Main Data Structures
//! - `Author` - name + email, parsed from `"Name <email>"` strings
//! - `HistoryNode` - one breadcrumb in the processing chain
//! - `AnnotatedEntry` - a `PhaseEntry` plus the full provenance block
//!
//! ## Interesting Features
//! - a single validation pass in `assemble`; there is no way to construct or
//!   deserialize an instance that skips it

use crate::PhaseEq::entries::PhaseEntry;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// maximum number of history nodes per record
pub const MAX_HISTORY_NODES: usize = 100;
/// maximum serialized size (bytes) of one history node
pub const MAX_HISTORY_NODE_BYTES: usize = 64_000;
/// maximum serialized size (bytes) of the free-form data block
pub const MAX_DATA_BYTES: usize = 256_000;
/// maximum number of characters for the BibTeX reference block
pub const MAX_BIBTEX_CHARS: usize = 20_000;

#[derive(Debug, Error)]
pub enum ProvenanceError {
    #[error("Invalid author format! {0}")]
    BadAuthor(String),
    #[error("At least one author is required")]
    NoAuthors,
    #[error("References do not look like BibTeX, expected them to start with '@'")]
    BadBibTex,
    #[error("The BibTeX string must be fewer than 20000 chars, you have {0}")]
    BibTexTooLong(usize),
    #[error("The data block exceeds the maximum size limit of 256000 bytes (you have {0})")]
    DataTooLarge(usize),
    #[error("Data keys must be namespaced with a leading underscore, the key {0} is not")]
    BadDataKey(String),
    #[error("A maximum of 100 history nodes are supported, you have {0}")]
    TooManyHistoryNodes(usize),
    #[error("History node {0} exceeds the maximum size limit of 64000 bytes")]
    HistoryNodeTooLarge(String),
    #[error("Invalid timestamp {0}, expected RFC 3339 like 2026-08-21T12:00:00Z")]
    BadTimestamp(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Author {
    pub fn new(name: &str, email: &str) -> Self {
        Author {
            name: name.to_string(),
            email: email.to_string(),
        }
    }
}

impl FromStr for Author {
    type Err = ProvenanceError;

    /// Parses `"Name <email@domain>"`, whitespace-tolerant on both ends.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let re = Regex::new(r"^\s*(.*?)\s*<(.*?@.*?)>\s*$").unwrap();
        let caps = re
            .captures(s)
            .ok_or_else(|| ProvenanceError::BadAuthor(s.to_string()))?;
        Ok(Author::new(&caps[1], &caps[2]))
    }
}

impl From<(String, String)> for Author {
    fn from((name, email): (String, String)) -> Self {
        Author { name, email }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// One breadcrumb in the chain of events that produced an entry: pulling it
/// from an external database, a code applying a transformation and so on.
/// `description` is free-form JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryNode {
    pub name: String,
    pub url: String,
    pub description: Value,
}

impl HistoryNode {
    pub fn new(name: &str, url: &str, description: Value) -> Self {
        HistoryNode {
            name: name.to_string(),
            url: url.to_string(),
            description,
        }
    }

    fn serialized_len(&self) -> Result<usize, serde_json::Error> {
        Ok(serde_json::to_string(self)?.len())
    }
}

impl From<(String, String, Value)> for HistoryNode {
    fn from((name, url, description): (String, String, Value)) -> Self {
        HistoryNode {
            name,
            url,
            description,
        }
    }
}

/// A `PhaseEntry` wrapped with provenance: authors, projects, a BibTeX
/// reference block, remarks, namespaced free-form data and the processing
/// history. Built through `assemble` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAnnotatedEntry", into = "RawAnnotatedEntry")]
pub struct AnnotatedEntry {
    pub entry: PhaseEntry,
    pub authors: Vec<Author>,
    pub projects: Vec<String>,
    pub references: String,
    pub remarks: Vec<String>,
    pub data: Map<String, Value>,
    pub history: Vec<HistoryNode>,
    pub created_at: String,
}

impl AnnotatedEntry {
    /// The whole validation pass in one place: at least one author, BibTeX
    /// shape and length, '_'-namespaced data keys and data size, history node
    /// count and per-node size, RFC 3339 timestamp.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        entry: PhaseEntry,
        authors: Vec<Author>,
        projects: Vec<String>,
        references: &str,
        remarks: Vec<String>,
        data: Map<String, Value>,
        history: Vec<HistoryNode>,
        created_at: &str,
    ) -> Result<Self, ProvenanceError> {
        if authors.is_empty() {
            return Err(ProvenanceError::NoAuthors);
        }
        if !references.is_empty() && !references.trim_start().starts_with('@') {
            return Err(ProvenanceError::BadBibTex);
        }
        if references.chars().count() > MAX_BIBTEX_CHARS {
            return Err(ProvenanceError::BibTexTooLong(references.chars().count()));
        }
        for key in data.keys() {
            if !key.starts_with('_') {
                return Err(ProvenanceError::BadDataKey(key.clone()));
            }
        }
        let data_len = serde_json::to_string(&data)?.len();
        if data_len >= MAX_DATA_BYTES {
            return Err(ProvenanceError::DataTooLarge(data_len));
        }
        if history.len() > MAX_HISTORY_NODES {
            return Err(ProvenanceError::TooManyHistoryNodes(history.len()));
        }
        for node in &history {
            if node.serialized_len()? >= MAX_HISTORY_NODE_BYTES {
                return Err(ProvenanceError::HistoryNodeTooLarge(node.name.clone()));
            }
        }
        let stamp_re =
            Regex::new(r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$")
                .unwrap();
        if !stamp_re.is_match(created_at) {
            return Err(ProvenanceError::BadTimestamp(created_at.to_string()));
        }
        Ok(AnnotatedEntry {
            entry,
            authors,
            projects,
            references: references.to_string(),
            remarks,
            data,
            history,
            created_at: created_at.to_string(),
        })
    }
}

impl fmt::Display for AnnotatedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let authors: Vec<String> = self.authors.iter().map(Author::to_string).collect();
        write!(
            f,
            "AnnotatedEntry {} by {} at {}, {} history node(s)",
            self.entry.reduced_formula(),
            authors.join(", "),
            self.created_at,
            self.history.len()
        )
    }
}

/// Wire mirror of `AnnotatedEntry`; deserialization funnels through
/// `assemble` so stored records obey the same limits as fresh ones.
#[derive(Serialize, Deserialize)]
struct RawAnnotatedEntry {
    entry: PhaseEntry,
    authors: Vec<Author>,
    projects: Vec<String>,
    references: String,
    remarks: Vec<String>,
    data: Map<String, Value>,
    history: Vec<HistoryNode>,
    created_at: String,
}

impl TryFrom<RawAnnotatedEntry> for AnnotatedEntry {
    type Error = ProvenanceError;

    fn try_from(raw: RawAnnotatedEntry) -> Result<Self, Self::Error> {
        AnnotatedEntry::assemble(
            raw.entry,
            raw.authors,
            raw.projects,
            &raw.references,
            raw.remarks,
            raw.data,
            raw.history,
            &raw.created_at,
        )
    }
}

impl From<AnnotatedEntry> for RawAnnotatedEntry {
    fn from(a: AnnotatedEntry) -> Self {
        RawAnnotatedEntry {
            entry: a.entry,
            authors: a.authors,
            projects: a.projects,
            references: a.references,
            remarks: a.remarks,
            data: a.data,
            history: a.history,
            created_at: a.created_at,
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// TESTS
//////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chemistry::composition::Composition;

    fn fe_entry() -> PhaseEntry {
        PhaseEntry::new(Composition::from_formula("Fe").unwrap(), -5.0, 8.0)
    }

    fn one_author() -> Vec<Author> {
        vec![Author::new("John Doe", "jdoe@example.org")]
    }

    #[test]
    fn test_author_parsing() {
        let a: Author = " John Doe <jdoe@example.org> ".parse().unwrap();
        assert_eq!(a.name, "John Doe");
        assert_eq!(a.email, "jdoe@example.org");
        assert_eq!(a.to_string(), "John Doe <jdoe@example.org>");

        assert!("John Doe".parse::<Author>().is_err());
        assert!("John Doe <no-at-sign>".parse::<Author>().is_err());
    }

    #[test]
    fn test_assemble_happy_path() {
        let node = HistoryNode::new(
            "icsd",
            "https://icsd.example.org",
            serde_json::json!({"icsd_id": 41140}),
        );
        let mut data = Map::new();
        data.insert("_lab".to_string(), serde_json::json!({"sample": 3}));
        let annotated = AnnotatedEntry::assemble(
            fe_entry(),
            one_author(),
            vec!["conversion screening".to_string()],
            "@article{doe2026, title={Iron fluorides}}",
            vec!["rock salt".to_string()],
            data,
            vec![node],
            "2026-08-21T12:00:00Z",
        )
        .unwrap();
        assert_eq!(annotated.history.len(), 1);
        println!("{}", annotated);
    }

    #[test]
    fn test_at_least_one_author() {
        let err = AnnotatedEntry::assemble(
            fe_entry(),
            vec![],
            vec![],
            "",
            vec![],
            Map::new(),
            vec![],
            "2026-08-21T12:00:00Z",
        )
        .unwrap_err();
        assert!(matches!(err, ProvenanceError::NoAuthors));
    }

    #[test]
    fn test_reference_limits() {
        let err = AnnotatedEntry::assemble(
            fe_entry(),
            one_author(),
            vec![],
            "not bibtex at all",
            vec![],
            Map::new(),
            vec![],
            "2026-08-21T12:00:00Z",
        )
        .unwrap_err();
        assert!(matches!(err, ProvenanceError::BadBibTex));

        let huge = format!("@misc{{x, note={{{}}}}}", "a".repeat(MAX_BIBTEX_CHARS + 1));
        let err = AnnotatedEntry::assemble(
            fe_entry(),
            one_author(),
            vec![],
            &huge,
            vec![],
            Map::new(),
            vec![],
            "2026-08-21T12:00:00Z",
        )
        .unwrap_err();
        assert!(matches!(err, ProvenanceError::BibTexTooLong(_)));
    }

    #[test]
    fn test_data_namespacing() {
        let mut data = Map::new();
        data.insert("lab".to_string(), serde_json::json!(1));
        let err = AnnotatedEntry::assemble(
            fe_entry(),
            one_author(),
            vec![],
            "",
            vec![],
            data,
            vec![],
            "2026-08-21T12:00:00Z",
        )
        .unwrap_err();
        assert!(matches!(err, ProvenanceError::BadDataKey(_)));
    }

    #[test]
    fn test_history_limits() {
        let node = HistoryNode::new("step", "https://x.org", Value::Null);
        let many = vec![node.clone(); MAX_HISTORY_NODES + 1];
        let err = AnnotatedEntry::assemble(
            fe_entry(),
            one_author(),
            vec![],
            "",
            vec![],
            Map::new(),
            many,
            "2026-08-21T12:00:00Z",
        )
        .unwrap_err();
        assert!(matches!(err, ProvenanceError::TooManyHistoryNodes(_)));

        let fat = HistoryNode::new(
            "fat",
            "https://x.org",
            serde_json::json!("b".repeat(MAX_HISTORY_NODE_BYTES)),
        );
        let err = AnnotatedEntry::assemble(
            fe_entry(),
            one_author(),
            vec![],
            "",
            vec![],
            Map::new(),
            vec![fat],
            "2026-08-21T12:00:00Z",
        )
        .unwrap_err();
        assert!(matches!(err, ProvenanceError::HistoryNodeTooLarge(_)));
    }

    #[test]
    fn test_timestamp_format() {
        let err = AnnotatedEntry::assemble(
            fe_entry(),
            one_author(),
            vec![],
            "",
            vec![],
            Map::new(),
            vec![],
            "yesterday",
        )
        .unwrap_err();
        assert!(matches!(err, ProvenanceError::BadTimestamp(_)));

        // space separator and offsets are fine
        assert!(AnnotatedEntry::assemble(
            fe_entry(),
            one_author(),
            vec![],
            "",
            vec![],
            Map::new(),
            vec![],
            "2026-08-21 12:00:00+02:00",
        )
        .is_ok());
    }

    #[test]
    fn test_serde_revalidates() {
        let annotated = AnnotatedEntry::assemble(
            fe_entry(),
            one_author(),
            vec![],
            "",
            vec![],
            Map::new(),
            vec![],
            "2026-08-21T12:00:00Z",
        )
        .unwrap();
        let json = serde_json::to_string(&annotated).unwrap();
        let back: AnnotatedEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, annotated);

        // a tampered record with an unnamespaced data key must not load
        let tampered = json.replace("\"data\":{}", "\"data\":{\"lab\":1}");
        assert!(serde_json::from_str::<AnnotatedEntry>(&tampered).is_err());
    }
}
