//! Thermodynamic reference entries: a composition with its computed total
//! energy and structural volume, the currency of phase-equilibrium data.

use crate::Chemistry::composition::Composition;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseEntry {
    pub composition: Composition,
    /// total energy of the composition unit, eV
    pub energy: f64,
    /// structural volume of the composition unit, A^3
    pub volume: f64,
    pub entry_id: Option<String>,
}

impl PhaseEntry {
    pub fn new(composition: Composition, energy: f64, volume: f64) -> Self {
        PhaseEntry {
            composition,
            energy,
            volume,
            entry_id: None,
        }
    }

    pub fn with_id(composition: Composition, energy: f64, volume: f64, id: &str) -> Self {
        PhaseEntry {
            composition,
            energy,
            volume,
            entry_id: Some(id.to_string()),
        }
    }

    pub fn energy_per_atom(&self) -> f64 {
        self.energy / self.composition.num_atoms()
    }

    pub fn is_element(&self) -> bool {
        self.composition.is_element()
    }

    pub fn reduced_formula(&self) -> String {
        self.composition.reduced_formula()
    }
}

impl fmt::Display for PhaseEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PhaseEntry {} : E = {:.4} eV, V = {:.4} A^3",
            self.composition, self.energy, self.volume
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn energy_per_atom() {
        let comp = Composition::from_formula("FeF3").unwrap();
        let entry = PhaseEntry::new(comp, -20.0, 30.0);
        assert_relative_eq!(entry.energy_per_atom(), -5.0, epsilon = 1e-12);
        assert!(!entry.is_element());
        assert_eq!(entry.reduced_formula(), "FeF3");
    }

    #[test]
    fn elemental_entry() {
        let li = PhaseEntry::with_id(Composition::from_formula("Li").unwrap(), 0.0, 20.0, "mp-135");
        assert!(li.is_element());
        assert_eq!(li.entry_id.as_deref(), Some("mp-135"));
    }
}
