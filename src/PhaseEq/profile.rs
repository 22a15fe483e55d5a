//! Element-evolution profiles: the per-step output of a phase-diagram
//! analyzer scanning the chemical potential of one element.

use super::entries::PhaseEntry;
use crate::Chemistry::reaction::BalancedReaction;
use serde::{Deserialize, Serialize};

/// One vertex of the scan: the chemical potential at which the stable phase
/// assemblage changes, the cumulative amount of the scanned element consumed,
/// the elemental reference entry for that element, the reaction realizing the
/// step and the entries of the stable assemblage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquilibriumStep {
    pub chempot: f64,
    pub evolution: f64,
    pub element_reference: PhaseEntry,
    pub reaction: BalancedReaction,
    pub entries: Vec<PhaseEntry>,
}

impl EquilibriumStep {
    pub fn new(
        chempot: f64,
        evolution: f64,
        element_reference: PhaseEntry,
        reaction: BalancedReaction,
        entries: Vec<PhaseEntry>,
    ) -> Self {
        EquilibriumStep {
            chempot,
            evolution,
            element_reference,
            reaction,
            entries,
        }
    }
}

/// A stored analyzer result for one (working ion, target composition) pair.
/// Steps are kept in analyzer order, from the most reduced state to the most
/// oxidized one; consumers that need charged -> discharged order reverse it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertionProfile {
    pub working_ion: String,
    pub target_formula: String,
    pub steps: Vec<EquilibriumStep>,
}

impl InsertionProfile {
    pub fn new(working_ion: &str, target_formula: &str, steps: Vec<EquilibriumStep>) -> Self {
        InsertionProfile {
            working_ion: working_ion.to_string(),
            target_formula: target_formula.to_string(),
            steps,
        }
    }
}
