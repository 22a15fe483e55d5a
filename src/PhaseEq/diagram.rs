//! The boundary to phase-diagram analysis. Hull construction itself happens
//! upstream; this module defines the interface the electrochemistry layer
//! consumes and a concrete diagram type carrying precomputed analyzer output.

use super::entries::PhaseEntry;
use super::profile::{EquilibriumStep, InsertionProfile};
use crate::Chemistry::composition::Composition;
use crate::Chemistry::periodic_table::Element;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DiagramError {
    #[error("no stored insertion profile for ion {ion} on {formula}")]
    ProfileNotFound { ion: String, formula: String },
}

pub trait PhaseDiagram {
    /// The stable set: one entry per reduced formula.
    fn stable_entries(&self) -> &[PhaseEntry];

    /// Evolution steps for scanning `element` against `composition`, in
    /// analyzer order (most reduced state first).
    fn element_profile(
        &self,
        element: Element,
        composition: &Composition,
    ) -> Result<Vec<EquilibriumStep>, DiagramError>;
}

/// Phase diagram assembled from upstream-computed results: raw entries are
/// screened to the lowest energy per atom for each reduced formula, and
/// insertion profiles are served by (ion, target formula) lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDiagram {
    stable_entries: Vec<PhaseEntry>,
    profiles: Vec<InsertionProfile>,
}

impl StoredDiagram {
    pub fn from_entries(entries: Vec<PhaseEntry>, profiles: Vec<InsertionProfile>) -> Self {
        let total = entries.len();
        let mut stable: Vec<PhaseEntry> = Vec::new();
        for entry in entries {
            match stable
                .iter_mut()
                .find(|s| s.reduced_formula() == entry.reduced_formula())
            {
                Some(existing) => {
                    if entry.energy_per_atom() < existing.energy_per_atom() {
                        *existing = entry;
                    }
                }
                None => stable.push(entry),
            }
        }
        info!(
            "stored diagram: {} stable entries out of {}, {} insertion profiles",
            stable.len(),
            total,
            profiles.len()
        );
        StoredDiagram {
            stable_entries: stable,
            profiles,
        }
    }

    pub fn profiles(&self) -> &[InsertionProfile] {
        &self.profiles
    }
}

impl PhaseDiagram for StoredDiagram {
    fn stable_entries(&self) -> &[PhaseEntry] {
        &self.stable_entries
    }

    fn element_profile(
        &self,
        element: Element,
        composition: &Composition,
    ) -> Result<Vec<EquilibriumStep>, DiagramError> {
        let formula = composition.reduced_formula();
        self.profiles
            .iter()
            .find(|p| p.working_ion == element.symbol() && p.target_formula == formula)
            .map(|p| p.steps.clone())
            .ok_or_else(|| DiagramError::ProfileNotFound {
                ion: element.symbol().to_string(),
                formula,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn comp(f: &str) -> Composition {
        Composition::from_formula(f).unwrap()
    }

    #[test]
    fn stable_screen_keeps_lowest_energy_per_atom() {
        let entries = vec![
            PhaseEntry::new(comp("FeF3"), -16.0, 30.0),
            PhaseEntry::new(comp("Fe2F6"), -42.0, 61.0),
            PhaseEntry::new(comp("Li"), 0.0, 20.0),
        ];
        let pd = StoredDiagram::from_entries(entries, vec![]);
        assert_eq!(pd.stable_entries().len(), 2);
        let fef3 = pd
            .stable_entries()
            .iter()
            .find(|e| e.reduced_formula() == "FeF3")
            .unwrap();
        assert_relative_eq!(fef3.energy_per_atom(), -42.0 / 8.0, epsilon = 1e-12);
    }

    #[test]
    fn missing_profile_is_an_error() {
        let pd = StoredDiagram::from_entries(vec![], vec![]);
        let li = Element::from_symbol("Li").unwrap();
        let err = pd.element_profile(li, &comp("FeF3")).unwrap_err();
        assert_eq!(
            err,
            DiagramError::ProfileNotFound {
                ion: "Li".to_string(),
                formula: "FeF3".to_string()
            }
        );
    }
}
