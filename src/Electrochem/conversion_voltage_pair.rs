//! # ConversionVoltagePair
//! ## Aim
//! One step of a conversion-electrode voltage profile: everything the
//! electrochemistry of two adjacent equilibrium steps determines - voltage,
//! capacity, masses, volumes, working-ion fractions and the balanced reaction
//! connecting the charged assemblage to the discharged one.
//!
//! ## Main Data Structures
//! - `ConversionVoltagePair` - the immutable record, built by `new` from two
//!   adjacent `EquilibriumStep`s ordered charged -> discharged
//! - `ElectrodeError` - the error taxonomy of the electrochemistry layer
//!
//! ## Key Methods
//! - `ConversionVoltagePair::new` - the whole computation
//! - `reaction_signature` - reduced formulas of the participating phases,
//!   used for electrode equivalence tests
//!
//! ## Interesting Features
//! - the pair reaction is assembled from the two step reactions' product
//!   sides, then renormalized to the first bulk element present in it

use crate::Chemistry::composition::Composition;
use crate::Chemistry::periodic_table::Element;
use crate::Chemistry::reaction::{BalancedReaction, ReactionError, BALANCE_TOL};
use crate::PhaseEq::diagram::DiagramError;
use crate::PhaseEq::entries::PhaseEntry;
use crate::PhaseEq::profile::EquilibriumStep;
use log::debug;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Faraday constant as ampere-hours per mole of electrons.
pub const ELECTRON_TO_AMPERE_HOURS: f64 = 96_485.332_12 / 3600.0;

/// Avogadro constant, 1/mol.
pub const AVOGADRO: f64 = 6.022_140_76e23;

/// Coefficients at or below this magnitude do not count towards a reaction
/// signature.
pub const SIGNIFICANT_COEFF: f64 = 1e-5;

#[derive(Debug, Error)]
pub enum ElectrodeError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    ReactionBalance(#[from] ReactionError),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl From<DiagramError> for ElectrodeError {
    fn from(e: DiagramError) -> Self {
        ElectrodeError::NotFound(e.to_string())
    }
}

#[derive(Debug, Clone)]
#[allow(non_snake_case)]
pub struct ConversionVoltagePair {
    working_ion: Element,
    entry_ion: PhaseEntry,
    voltage: f64,
    mAh: f64,
    mass_charge: f64,
    mass_discharge: f64,
    vol_charge: f64,
    vol_discharge: f64,
    frac_charge: f64,
    frac_discharge: f64,
    rxn: BalancedReaction,
    entries_charge: Vec<PhaseEntry>,
    entries_discharge: Vec<PhaseEntry>,
}

impl ConversionVoltagePair {
    /// Builds the voltage pair between two adjacent equilibrium steps ordered
    /// charged -> discharged. `normalization_els` is the ordered
    /// element -> amount list taken from the bulk composition with the working
    /// ion removed; the pair reaction is renormalized to the first of them
    /// actually present in it.
    pub fn new(
        step1: &EquilibriumStep,
        step2: &EquilibriumStep,
        normalization_els: &[(Element, f64)],
    ) -> Result<Self, ElectrodeError> {
        let entry_ion = step1.element_reference.clone();
        if !entry_ion.is_element() {
            return Err(ElectrodeError::Configuration(format!(
                "ion reference entry {} is not elemental",
                entry_ion.composition
            )));
        }
        let working_ion = entry_ion.composition.elements()[0];
        let ion_formula = working_ion.symbol();

        let voltage = -step1.chempot + entry_ion.energy_per_atom();
        let delta_evolution = step2.evolution - step1.evolution;
        let m_ah = delta_evolution * ELECTRON_TO_AMPERE_HOURS * 1000.0;
        if m_ah < 0.0 {
            return Err(ElectrodeError::InvariantViolation(format!(
                "negative capacity: ion evolution goes from {} to {}",
                step1.evolution, step2.evolution
            )));
        }

        let charge_comps = non_ion_products(&step1.reaction, ion_formula);
        let discharge_comps = non_ion_products(&step2.reaction, ion_formula);

        let mut reactants = charge_comps.clone();
        reactants.push((Composition::of_element(working_ion), delta_evolution));
        let mut rxn = BalancedReaction::new(reactants, discharge_comps.clone())?;

        for (el, amt) in normalization_els {
            if rxn.element_amount(*el) > BALANCE_TOL {
                rxn.normalize_to_element(*el, *amt)?;
                break;
            }
        }

        let mass_charge = half_reaction_mass(&step1.reaction);
        let mass_discharge = half_reaction_mass(&step2.reaction);
        let vol_charge = assemblage_volume(&step1.reaction, &step1.entries, ion_formula)?;
        let vol_discharge = assemblage_volume(&step2.reaction, &step2.entries, ion_formula)?;

        let frac_charge = ion_fraction(&charge_comps, working_ion);
        let frac_discharge = ion_fraction(&discharge_comps, working_ion);

        debug!("voltage pair {:.4} V / {:.2} mAh: {}", voltage, m_ah, rxn);

        Ok(ConversionVoltagePair {
            working_ion,
            entry_ion,
            voltage,
            mAh: m_ah,
            mass_charge,
            mass_discharge,
            vol_charge,
            vol_discharge,
            frac_charge,
            frac_discharge,
            rxn,
            entries_charge: step2.entries.clone(),
            entries_discharge: step1.entries.clone(),
        })
    }

    pub fn working_ion(&self) -> Element {
        self.working_ion
    }

    pub fn working_ion_symbol(&self) -> &'static str {
        self.working_ion.symbol()
    }

    pub fn entry_ion(&self) -> &PhaseEntry {
        &self.entry_ion
    }

    pub fn voltage(&self) -> f64 {
        self.voltage
    }

    /// Capacity of the step, mAh per mole of the normalized reaction.
    #[allow(non_snake_case)]
    pub fn mAh(&self) -> f64 {
        self.mAh
    }

    pub fn mass_charge(&self) -> f64 {
        self.mass_charge
    }

    pub fn mass_discharge(&self) -> f64 {
        self.mass_discharge
    }

    pub fn vol_charge(&self) -> f64 {
        self.vol_charge
    }

    pub fn vol_discharge(&self) -> f64 {
        self.vol_discharge
    }

    pub fn frac_charge(&self) -> f64 {
        self.frac_charge
    }

    pub fn frac_discharge(&self) -> f64 {
        self.frac_discharge
    }

    pub fn reaction(&self) -> &BalancedReaction {
        &self.rxn
    }

    pub fn entries_charge(&self) -> &[PhaseEntry] {
        &self.entries_charge
    }

    pub fn entries_discharge(&self) -> &[PhaseEntry] {
        &self.entries_discharge
    }

    /// Reduced formulas of every phase taking part in the pair reaction with
    /// a coefficient above `SIGNIFICANT_COEFF`.
    pub fn reaction_signature(&self) -> BTreeSet<String> {
        self.rxn
            .all_compositions()
            .iter()
            .zip(self.rxn.all_coefficients())
            .filter(|(_, c)| c.abs() > SIGNIFICANT_COEFF)
            .map(|(comp, _)| comp.reduced_formula())
            .collect()
    }
}

impl fmt::Display for ConversionVoltagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conversion voltage pair with working ion {}",
            self.working_ion
        )?;
        writeln!(f, "V = {:.4}, mAh = {:.4}", self.voltage, self.mAh)?;
        writeln!(
            f,
            "mass_charge = {:.4}, mass_discharge = {:.4}",
            self.mass_charge, self.mass_discharge
        )?;
        writeln!(
            f,
            "vol_charge = {:.4}, vol_discharge = {:.4}",
            self.vol_charge, self.vol_discharge
        )?;
        writeln!(
            f,
            "frac_charge = {:.4}, frac_discharge = {:.4}",
            self.frac_charge, self.frac_discharge
        )?;
        write!(f, "reaction: {}", self.rxn)
    }
}

/// Product side of a step reaction with the working-ion phase removed,
/// coefficients taken by absolute value.
fn non_ion_products(rxn: &BalancedReaction, ion_formula: &str) -> Vec<(Composition, f64)> {
    rxn.products()
        .into_iter()
        .filter(|(comp, _)| comp.reduced_formula() != ion_formula)
        .map(|(comp, coeff)| (comp.clone(), coeff.abs()))
        .collect()
}

/// Half of the summed molar mass over both sides of a step reaction; the two
/// sides double-count the same matter.
fn half_reaction_mass(rxn: &BalancedReaction) -> f64 {
    let total: f64 = rxn
        .all_compositions()
        .iter()
        .zip(rxn.all_coefficients())
        .map(|(comp, c)| comp.weight() * c.abs())
        .sum();
    total / 2.0
}

/// Volume of one step's stable assemblage: entry volumes weighted by the
/// step-reaction coefficients, elemental working-ion entries excluded.
fn assemblage_volume(
    rxn: &BalancedReaction,
    entries: &[PhaseEntry],
    ion_formula: &str,
) -> Result<f64, ElectrodeError> {
    let mut vol = 0.0;
    for entry in entries {
        if entry.reduced_formula() == ion_formula {
            continue;
        }
        vol += rxn.coefficient(&entry.composition)?.abs() * entry.volume;
    }
    Ok(vol)
}

/// Atomic fraction of the working ion in a coefficient-weighted sum of
/// compositions.
fn ion_fraction(comps: &[(Composition, f64)], ion: Element) -> f64 {
    let total = comps
        .iter()
        .fold(Composition::empty(), |acc, (comp, coeff)| {
            acc + &(comp.clone() * *coeff)
        });
    total.atomic_fraction(ion)
}
