/// provenance container for computed entries: authors, projects, references,
/// history chain, validated once at construction
pub mod provenance;
/// client for the databank REST interface: entries, chemical systems, stored
/// insertion profiles, advanced queries
pub mod rest_client;
/// versioned tagged-document serialization for stored and shipped objects
pub mod schema;
