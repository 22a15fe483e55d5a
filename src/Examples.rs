/// numbered demo tasks for electrode assembly, sub-electrodes, document
/// round-trips, provenance and live databank fetches
pub mod conversion_examples;
