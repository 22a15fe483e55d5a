//! # ConversionElectrode
//! ## Aim
//! The electrode-level aggregate over an element-evolution profile: builds
//! the ordered sequence of `ConversionVoltagePair`s, answers aggregate
//! electrochemical queries (average voltage, gravimetric and volumetric
//! capacity, energy figures), decomposes into sub-electrodes over contiguous
//! step ranges and compares electrodes by their reaction signatures.
//!
//! ## Main Data Structures
//! - `ConversionElectrode` - bulk composition + ion reference entry + voltage
//!   pairs + the profile slice they came from
//!
//! ## Key Methods
//! - `new` - assemble from a profile ordered charged -> discharged
//! - `from_composition_and_pd` / `from_composition_and_entries` - derive the
//!   profile from a phase diagram; fewer than two steps means "no electrode
//!   possible" and returns None
//! - `sub_electrodes` - adjacent pairs or all contiguous slices
//! - `is_same_electrode` / `is_super_electrode` - signature matching

use super::conversion_voltage_pair::{ConversionVoltagePair, ElectrodeError, AVOGADRO};
use crate::Chemistry::composition::{Composition, AMOUNT_TOL};
use crate::Chemistry::periodic_table::Element;
use crate::PhaseEq::diagram::{PhaseDiagram, StoredDiagram};
use crate::PhaseEq::entries::PhaseEntry;
use crate::PhaseEq::profile::{EquilibriumStep, InsertionProfile};
use log::info;
use std::fmt;

#[derive(Debug, Clone)]
pub struct ConversionElectrode {
    composition: Composition,
    entry_ion: PhaseEntry,
    vpairs: Vec<ConversionVoltagePair>,
    el_profile: Vec<EquilibriumStep>,
}

impl ConversionElectrode {
    /// Assembles an electrode from a profile ordered charged -> discharged.
    /// The bulk composition supplies the normalization elements: everything in
    /// it except the working ion, in composition order, mapped to its bulk
    /// amount.
    pub fn new(
        profile: Vec<EquilibriumStep>,
        entry_ion: PhaseEntry,
        bulk_comp: Composition,
    ) -> Result<Self, ElectrodeError> {
        if !entry_ion.is_element() {
            return Err(ElectrodeError::Configuration(format!(
                "ion reference entry {} is not elemental",
                entry_ion.composition
            )));
        }
        if profile.len() < 2 {
            return Err(ElectrodeError::Configuration(format!(
                "an electrode needs at least two equilibrium steps, got {}",
                profile.len()
            )));
        }
        let working_ion = entry_ion.composition.elements()[0];
        let normalization_els: Vec<(Element, f64)> = bulk_comp
            .items()
            .iter()
            .filter(|(el, amt)| *el != working_ion && *amt > AMOUNT_TOL)
            .map(|(el, amt)| (*el, *amt))
            .collect();

        let mut vpairs = Vec::with_capacity(profile.len() - 1);
        for window in profile.windows(2) {
            vpairs.push(ConversionVoltagePair::new(
                &window[0],
                &window[1],
                &normalization_els,
            )?);
        }
        info!(
            "assembled conversion electrode {} / {} with {} voltage pairs",
            bulk_comp.reduced_formula(),
            working_ion.symbol(),
            vpairs.len()
        );
        Ok(ConversionElectrode {
            composition: bulk_comp,
            entry_ion,
            vpairs,
            el_profile: profile,
        })
    }

    /// Derives the element profile from a phase diagram. The target
    /// composition must have a stable entry and the diagram must hold an
    /// elemental entry for the working ion. The analyzer's step order is
    /// reversed here; a profile shorter than two steps cannot form a voltage
    /// pair, which is reported as `Ok(None)`.
    pub fn from_composition_and_pd<D: PhaseDiagram>(
        comp: &Composition,
        pd: &D,
        working_ion_symbol: &str,
    ) -> Result<Option<Self>, ElectrodeError> {
        let target = comp.reduced_formula();
        let mut target_entry: Option<&PhaseEntry> = None;
        let mut ion_entry: Option<&PhaseEntry> = None;
        for entry in pd.stable_entries() {
            if entry.reduced_formula() == target {
                target_entry = Some(entry);
            }
            if entry.is_element() && entry.reduced_formula() == working_ion_symbol {
                ion_entry = Some(entry);
            }
        }
        if target_entry.is_none() {
            return Err(ElectrodeError::NotFound(format!(
                "no stable entry in the phase diagram matches {}",
                target
            )));
        }
        let entry_ion = ion_entry
            .ok_or_else(|| {
                ElectrodeError::NotFound(format!(
                    "no stable elemental entry for working ion {}",
                    working_ion_symbol
                ))
            })?
            .clone();
        let ion = Element::from_symbol(working_ion_symbol)
            .map_err(|e| ElectrodeError::Configuration(e.to_string()))?;

        let mut profile = pd.element_profile(ion, comp)?;
        profile.reverse();
        if profile.len() < 2 {
            info!(
                "profile for {} / {} has {} step(s), no electrode possible",
                target,
                working_ion_symbol,
                profile.len()
            );
            return Ok(None);
        }
        Self::new(profile, entry_ion, comp.clone()).map(Some)
    }

    /// Like `from_composition_and_pd`, with the diagram assembled on the spot
    /// from raw entries and stored insertion profiles.
    pub fn from_composition_and_entries(
        comp: &Composition,
        entries: Vec<PhaseEntry>,
        profiles: Vec<InsertionProfile>,
        working_ion_symbol: &str,
    ) -> Result<Option<Self>, ElectrodeError> {
        let pd = StoredDiagram::from_entries(entries, profiles);
        Self::from_composition_and_pd(comp, &pd, working_ion_symbol)
    }

    /// Electrodes over contiguous step ranges of this electrode's profile.
    /// With `adjacent_only` each adjacent step pair becomes a single-pair
    /// electrode (n-1 results); otherwise every contiguous range of length
    /// >= 2 is built (n choose 2 results). `include_self` is accepted for
    /// call compatibility and does not change the output.
    pub fn sub_electrodes(
        &self,
        adjacent_only: bool,
        _include_self: bool,
    ) -> Result<Vec<ConversionElectrode>, ElectrodeError> {
        let n = self.el_profile.len();
        let mut out = Vec::new();
        if adjacent_only {
            for i in 0..n - 1 {
                out.push(Self::new(
                    self.el_profile[i..i + 2].to_vec(),
                    self.entry_ion.clone(),
                    self.composition.clone(),
                )?);
            }
        } else {
            for i in 0..n - 1 {
                for j in i + 1..n {
                    out.push(Self::new(
                        self.el_profile[i..=j].to_vec(),
                        self.entry_ion.clone(),
                        self.composition.clone(),
                    )?);
                }
            }
        }
        Ok(out)
    }

    pub fn voltage_pairs(&self) -> &[ConversionVoltagePair] {
        &self.vpairs
    }

    /// Number of voltage steps, one less than the profile length.
    pub fn num_steps(&self) -> usize {
        self.vpairs.len()
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn entry_ion(&self) -> &PhaseEntry {
        &self.entry_ion
    }

    pub fn working_ion(&self) -> Element {
        self.entry_ion.composition.elements()[0]
    }

    pub fn working_ion_symbol(&self) -> &'static str {
        self.working_ion().symbol()
    }

    fn total_capacity(&self) -> f64 {
        self.vpairs.iter().map(|p| p.mAh()).sum()
    }

    /// Capacity-weighted mean voltage, V.
    pub fn average_voltage(&self) -> f64 {
        let total = self.total_capacity();
        if total <= 0.0 {
            return 0.0;
        }
        let weighted: f64 = self.vpairs.iter().map(|p| p.voltage() * p.mAh()).sum();
        weighted / total
    }

    pub fn min_voltage(&self) -> f64 {
        self.vpairs
            .iter()
            .map(ConversionVoltagePair::voltage)
            .fold(f64::INFINITY, f64::min)
    }

    pub fn max_voltage(&self) -> f64 {
        self.vpairs
            .iter()
            .map(ConversionVoltagePair::voltage)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Gravimetric capacity, mAh/g, on the charged mass of the first pair.
    pub fn capacity_grav(&self) -> f64 {
        self.total_capacity() / self.vpairs[0].mass_charge()
    }

    /// Volumetric capacity, Ah/l, on the charged volume of the first pair.
    pub fn capacity_vol(&self) -> f64 {
        self.total_capacity() / self.vpairs[0].vol_charge() * 1.0e24 / AVOGADRO
    }

    /// Wh/kg.
    pub fn specific_energy(&self) -> f64 {
        self.average_voltage() * self.capacity_grav()
    }

    /// Wh/l.
    pub fn energy_density(&self) -> f64 {
        self.average_voltage() * self.capacity_vol()
    }

    /// True when both electrodes have the same number of voltage pairs and
    /// every reaction signature of `other` occurs in this electrode. Matching
    /// is not one-to-one: several pairs of `other` may match the same pair
    /// here.
    pub fn is_same_electrode(&self, other: &ConversionElectrode) -> bool {
        if self.vpairs.len() != other.vpairs.len() {
            return false;
        }
        self.contains_signatures(other)
    }

    /// Containment on reaction-signature sets regardless of length: every
    /// signature of `other` occurs somewhere in this electrode.
    pub fn is_super_electrode(&self, other: &ConversionElectrode) -> bool {
        self.contains_signatures(other)
    }

    fn contains_signatures(&self, other: &ConversionElectrode) -> bool {
        other.vpairs.iter().all(|pair| {
            let sig = pair.reaction_signature();
            self.vpairs.iter().any(|own| own.reaction_signature() == sig)
        })
    }

    /// Table of the voltage profile on stdout.
    pub fn pretty_print(&self) {
        use prettytable::{row, Table};
        let mut table = Table::new();
        table.add_row(row![
            "step",
            "voltage, V",
            "capacity, mAh",
            "mass chg, g/mol",
            "mass dis, g/mol",
            "reaction"
        ]);
        for (i, pair) in self.vpairs.iter().enumerate() {
            table.add_row(row![
                format!("{}", i + 1),
                format!("{:.4}", pair.voltage()),
                format!("{:.2}", pair.mAh()),
                format!("{:.3}", pair.mass_charge()),
                format!("{:.3}", pair.mass_discharge()),
                format!("{}", pair.reaction())
            ]);
        }
        table.printstd();
    }
}

impl fmt::Display for ConversionElectrode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ConversionElectrode with formula {} and ion {}",
            self.composition.reduced_formula(),
            self.working_ion_symbol()
        )?;
        writeln!(
            f,
            "avg voltage = {:.4} V, min = {:.4} V, max = {:.4} V",
            self.average_voltage(),
            self.min_voltage(),
            self.max_voltage()
        )?;
        write!(
            f,
            "grav capacity = {:.2} mAh/g, vol capacity = {:.2} Ah/l, {} voltage pair(s)",
            self.capacity_grav(),
            self.capacity_vol(),
            self.vpairs.len()
        )
    }
}
