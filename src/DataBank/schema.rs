//! # schema
//! ## Aim
//! Versioned tagged-document serialization for everything the databank stores
//! or ships: a document says what it is (type tag) and which schema version
//! wrote it, so readers reject what they cannot understand instead of
//! misreading it.
//!
//! ## Main Data Structures
//! - `TypeTag` - the closed set of storable types
//! - `TaggedDocument` - version + tag + raw payload, the wire form
//! - `DecodedDocument` - the typed form, one variant per storable type

use crate::DataBank::provenance::AnnotatedEntry;
use crate::PhaseEq::diagram::StoredDiagram;
use crate::PhaseEq::entries::PhaseEntry;
use crate::PhaseEq::profile::{EquilibriumStep, InsertionProfile};
use enum_dispatch::enum_dispatch;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{Read, Write};
use thiserror::Error;

/// Bumped on any breaking layout change of a stored type.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Unsupported schema version {found}, this build reads version 1")]
    Version { found: u32 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decoding error: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    PhaseEntry,
    EquilibriumStep,
    InsertionProfile,
    StoredDiagram,
    AnnotatedEntry,
}

/// The wire form: what it is, which schema wrote it, and the payload itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedDocument {
    pub schema: u32,
    pub tag: TypeTag,
    pub payload: Value,
}

#[enum_dispatch]
pub trait Document {
    fn type_tag(&self) -> TypeTag;
}

impl Document for PhaseEntry {
    fn type_tag(&self) -> TypeTag {
        TypeTag::PhaseEntry
    }
}
impl Document for EquilibriumStep {
    fn type_tag(&self) -> TypeTag {
        TypeTag::EquilibriumStep
    }
}
impl Document for InsertionProfile {
    fn type_tag(&self) -> TypeTag {
        TypeTag::InsertionProfile
    }
}
impl Document for StoredDiagram {
    fn type_tag(&self) -> TypeTag {
        TypeTag::StoredDiagram
    }
}
impl Document for AnnotatedEntry {
    fn type_tag(&self) -> TypeTag {
        TypeTag::AnnotatedEntry
    }
}

#[derive(Debug, Clone)]
#[enum_dispatch(Document)]
pub enum DecodedDocument {
    Entry(PhaseEntry),
    Step(EquilibriumStep),
    Profile(InsertionProfile),
    Diagram(StoredDiagram),
    Provenance(AnnotatedEntry),
}

pub fn encode(doc: &DecodedDocument) -> Result<TaggedDocument, SchemaError> {
    let payload = match doc {
        DecodedDocument::Entry(e) => serde_json::to_value(e)?,
        DecodedDocument::Step(s) => serde_json::to_value(s)?,
        DecodedDocument::Profile(p) => serde_json::to_value(p)?,
        DecodedDocument::Diagram(d) => serde_json::to_value(d)?,
        DecodedDocument::Provenance(a) => serde_json::to_value(a)?,
    };
    Ok(TaggedDocument {
        schema: SCHEMA_VERSION,
        tag: doc.type_tag(),
        payload,
    })
}

/// Version gate first, then the payload decodes against the type its tag
/// names. Payload validation (composition amounts, reaction balance,
/// provenance limits) happens inside the serde mirrors of those types.
pub fn decode(tagged: TaggedDocument) -> Result<DecodedDocument, SchemaError> {
    if tagged.schema != SCHEMA_VERSION {
        return Err(SchemaError::Version {
            found: tagged.schema,
        });
    }
    let doc = match tagged.tag {
        TypeTag::PhaseEntry => DecodedDocument::Entry(serde_json::from_value(tagged.payload)?),
        TypeTag::EquilibriumStep => DecodedDocument::Step(serde_json::from_value(tagged.payload)?),
        TypeTag::InsertionProfile => {
            DecodedDocument::Profile(serde_json::from_value(tagged.payload)?)
        }
        TypeTag::StoredDiagram => DecodedDocument::Diagram(serde_json::from_value(tagged.payload)?),
        TypeTag::AnnotatedEntry => {
            DecodedDocument::Provenance(serde_json::from_value(tagged.payload)?)
        }
    };
    Ok(doc)
}

///////////////////INPUT/OUTPUT/////////////////////////////////////////////////

pub fn save_document(doc: &DecodedDocument, filename: &str) -> Result<(), SchemaError> {
    let tagged = encode(doc)?;
    let json = serde_json::to_string(&tagged)?;
    let mut file = File::create(filename)?;
    file.write_all(json.as_bytes())?;
    info!("saved {:?} document to {}", tagged.tag, filename);
    Ok(())
}

pub fn load_document(filename: &str) -> Result<DecodedDocument, SchemaError> {
    let mut file = File::open(filename)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    let tagged: TaggedDocument = serde_json::from_str(&contents)?;
    info!("loading {:?} document from {}", tagged.tag, filename);
    decode(tagged)
}
