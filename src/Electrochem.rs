/// electrode-level aggregate over an element-evolution profile: voltage pairs,
/// capacities, energies, sub-electrodes and signature comparison
pub mod conversion_electrode;
/// one voltage step between two adjacent equilibrium states: voltage, capacity,
/// masses, volumes, ion fractions and the balanced step reaction
pub mod conversion_voltage_pair;
/// tests
pub mod conversion_tests;
