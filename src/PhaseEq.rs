/// the phase-diagram boundary: analyzer interface and stored diagrams
pub mod diagram;
/// thermodynamic reference entries
pub mod entries;
/// element-evolution profiles produced by chemical-potential scans
pub mod profile;
