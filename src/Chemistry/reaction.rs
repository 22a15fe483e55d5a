//! # BalancedReaction
//! Stoichiometric reactions over `Composition`s. Reactants carry negative
//! coefficients, products positive, in construction order. Balance is checked
//! at construction (and again when deserializing); `balance` computes unknown
//! coefficients from the nullspace of the element-composition matrix.
//!
//! ## Key Methods
//! - `new` - verify caller-supplied coefficients
//! - `balance` - solve for coefficients by SVD nullspace
//! - `coefficient`, `element_amount`, `normalize_to_element` - the queries the
//!   electrochemistry layer is built on

use super::composition::{format_amount, Composition};
use super::periodic_table::Element;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Per-element residual allowed in a balanced reaction.
pub const BALANCE_TOL: f64 = 1e-6;

#[derive(Debug, Error, PartialEq)]
pub enum ReactionError {
    #[error("reaction does not balance for {element}: residual {residual:.3e}")]
    Unbalanced { element: String, residual: f64 },
    #[error("composition {0} does not take part in the reaction")]
    CompositionNotInReaction(String),
    #[error("cannot normalize: element {0} has no amount in the reaction")]
    ZeroElementAmount(String),
    #[error("no unique set of coefficients balances these compositions")]
    CannotBalance,
    #[error("a reaction needs at least one reactant and one product")]
    Empty,
    #[error("compositions and coefficients differ in length")]
    LengthMismatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawReaction", into = "RawReaction")]
pub struct BalancedReaction {
    all_comp: Vec<Composition>,
    coeffs: Vec<f64>,
}

impl BalancedReaction {
    /// Reactant and product amounts are given positive; reactants are stored
    /// with negated coefficients. Fails if any element does not balance.
    pub fn new(
        reactants: Vec<(Composition, f64)>,
        products: Vec<(Composition, f64)>,
    ) -> Result<Self, ReactionError> {
        if reactants.is_empty() || products.is_empty() {
            return Err(ReactionError::Empty);
        }
        let mut all_comp = Vec::with_capacity(reactants.len() + products.len());
        let mut coeffs = Vec::with_capacity(reactants.len() + products.len());
        for (comp, amt) in reactants {
            all_comp.push(comp);
            coeffs.push(-amt);
        }
        for (comp, amt) in products {
            all_comp.push(comp);
            coeffs.push(amt);
        }
        Self::from_parts(all_comp, coeffs)
    }

    /// Builds from a raw coefficient vector (negative = reactant), verifying
    /// elemental balance.
    pub fn from_parts(all_comp: Vec<Composition>, coeffs: Vec<f64>) -> Result<Self, ReactionError> {
        if all_comp.len() != coeffs.len() {
            return Err(ReactionError::LengthMismatch);
        }
        if all_comp.is_empty() {
            return Err(ReactionError::Empty);
        }
        let rxn = BalancedReaction { all_comp, coeffs };
        rxn.verify()?;
        Ok(rxn)
    }

    /// Solves for the reaction coefficients: the element-composition matrix
    /// must have a one-dimensional nullspace, otherwise the reactant/product
    /// sets do not define a unique reaction. The first reactant is given
    /// coefficient -1.
    pub fn balance(
        reactants: &[Composition],
        products: &[Composition],
    ) -> Result<Self, ReactionError> {
        if reactants.is_empty() || products.is_empty() {
            return Err(ReactionError::Empty);
        }
        let mut all_comp: Vec<Composition> = reactants.to_vec();
        all_comp.extend_from_slice(products);
        let (matrix, _els) = element_matrix(&all_comp);
        let n = all_comp.len();
        let rows = matrix.nrows();
        // square up with zero rows so the SVD exposes the full nullspace
        let padded = if rows < n {
            let mut p = DMatrix::zeros(n, n);
            p.view_mut((0, 0), (rows, n)).copy_from(&matrix);
            p
        } else {
            matrix
        };
        let svd = padded.svd(false, true);
        let v_t = svd.v_t.ok_or(ReactionError::CannotBalance)?;
        let max_sv = svd.singular_values.max().max(1.0);
        let null_rows: Vec<usize> = svd
            .singular_values
            .iter()
            .enumerate()
            .filter(|(_, sv)| **sv < 1e-10 * max_sv)
            .map(|(i, _)| i)
            .collect();
        if null_rows.len() != 1 {
            return Err(ReactionError::CannotBalance);
        }
        let v = v_t.row(null_rows[0]);
        let first = (0..reactants.len())
            .find(|i| v[*i].abs() > 1e-8)
            .ok_or(ReactionError::CannotBalance)?;
        let scale = -1.0 / v[first];
        let coeffs: Vec<f64> = v.iter().map(|c| c * scale).collect();
        Self::from_parts(all_comp, coeffs)
    }

    fn verify(&self) -> Result<(), ReactionError> {
        let (matrix, els) = element_matrix(&self.all_comp);
        let residuals = &matrix * DVector::from_vec(self.coeffs.clone());
        for (i, el) in els.iter().enumerate() {
            if residuals[i].abs() > BALANCE_TOL {
                return Err(ReactionError::Unbalanced {
                    element: el.symbol().to_string(),
                    residual: residuals[i],
                });
            }
        }
        Ok(())
    }

    pub fn all_compositions(&self) -> &[Composition] {
        &self.all_comp
    }

    pub fn all_coefficients(&self) -> &[f64] {
        &self.coeffs
    }

    /// Coefficient of the first composition equal to `comp` (negative for a
    /// reactant).
    pub fn coefficient(&self, comp: &Composition) -> Result<f64, ReactionError> {
        self.all_comp
            .iter()
            .position(|c| c == comp)
            .map(|i| self.coeffs[i])
            .ok_or_else(|| ReactionError::CompositionNotInReaction(comp.reduced_formula()))
    }

    /// Total amount of an element taking part, halved to count one side of
    /// the reaction.
    pub fn element_amount(&self, el: Element) -> f64 {
        let total: f64 = self
            .all_comp
            .iter()
            .zip(&self.coeffs)
            .map(|(comp, coeff)| comp.amount(el) * coeff.abs())
            .sum();
        total / 2.0
    }

    /// Rescales all coefficients so `element_amount(el)` equals `amount`.
    pub fn normalize_to_element(&mut self, el: Element, amount: f64) -> Result<(), ReactionError> {
        let current = self.element_amount(el);
        if current.abs() < BALANCE_TOL {
            return Err(ReactionError::ZeroElementAmount(el.symbol().to_string()));
        }
        let scale = amount / current;
        for c in &mut self.coeffs {
            *c *= scale;
        }
        Ok(())
    }

    pub fn reactants(&self) -> Vec<(&Composition, f64)> {
        self.all_comp
            .iter()
            .zip(&self.coeffs)
            .filter(|(_, c)| **c < -BALANCE_TOL)
            .map(|(comp, c)| (comp, *c))
            .collect()
    }

    pub fn products(&self) -> Vec<(&Composition, f64)> {
        self.all_comp
            .iter()
            .zip(&self.coeffs)
            .filter(|(_, c)| **c > BALANCE_TOL)
            .map(|(comp, c)| (comp, *c))
            .collect()
    }
}

/// Element rows (first-appearance order) by composition columns; entry (i, j)
/// is the amount of element i in composition j.
pub fn element_matrix(comps: &[Composition]) -> (DMatrix<f64>, Vec<Element>) {
    let mut els: Vec<Element> = Vec::new();
    for comp in comps {
        for el in comp.elements() {
            if !els.contains(&el) {
                els.push(el);
            }
        }
    }
    let matrix = DMatrix::from_fn(els.len(), comps.len(), |i, j| comps[j].amount(els[i]));
    (matrix, els)
}

fn side_to_string(side: &[(&Composition, f64)]) -> String {
    side.iter()
        .map(|(comp, c)| {
            let amt = c.abs();
            if (amt - 1.0).abs() < 1e-8 {
                comp.formula()
            } else {
                format!("{} {}", format_amount(amt), comp.formula())
            }
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

impl fmt::Display for BalancedReaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            side_to_string(&self.reactants()),
            side_to_string(&self.products())
        )
    }
}

#[derive(Serialize, Deserialize)]
struct RawReaction {
    compositions: Vec<Composition>,
    coefficients: Vec<f64>,
}

impl TryFrom<RawReaction> for BalancedReaction {
    type Error = ReactionError;

    fn try_from(raw: RawReaction) -> Result<Self, Self::Error> {
        BalancedReaction::from_parts(raw.compositions, raw.coefficients)
    }
}

impl From<BalancedReaction> for RawReaction {
    fn from(rxn: BalancedReaction) -> Self {
        RawReaction {
            compositions: rxn.all_comp,
            coefficients: rxn.coeffs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn comp(f: &str) -> Composition {
        Composition::from_formula(f).unwrap()
    }

    fn elem(s: &str) -> Element {
        Element::from_symbol(s).unwrap()
    }

    #[test]
    fn balance_conversion_reaction() {
        let rxn = BalancedReaction::balance(
            &[comp("FeF3"), comp("Li")],
            &[comp("LiF"), comp("Fe")],
        )
        .unwrap();
        assert_relative_eq!(rxn.coefficient(&comp("FeF3")).unwrap(), -1.0, epsilon = 1e-8);
        assert_relative_eq!(rxn.coefficient(&comp("Li")).unwrap(), -3.0, epsilon = 1e-8);
        assert_relative_eq!(rxn.coefficient(&comp("LiF")).unwrap(), 3.0, epsilon = 1e-8);
        assert_relative_eq!(rxn.coefficient(&comp("Fe")).unwrap(), 1.0, epsilon = 1e-8);
        assert_eq!(rxn.to_string(), "FeF3 + 3 Li -> 3 LiF + Fe");
    }

    #[test]
    fn balance_rejects_impossible_sets() {
        let err = BalancedReaction::balance(&[comp("FeF3")], &[comp("LiF")]).unwrap_err();
        assert_eq!(err, ReactionError::CannotBalance);
    }

    #[test]
    fn new_verifies_element_balance() {
        let ok = BalancedReaction::new(
            vec![(comp("FeF3"), 1.0), (comp("Li"), 3.0)],
            vec![(comp("LiF"), 3.0), (comp("Fe"), 1.0)],
        );
        assert!(ok.is_ok());

        let err = BalancedReaction::new(
            vec![(comp("FeF3"), 1.0)],
            vec![(comp("LiF"), 1.0)],
        )
        .unwrap_err();
        match err {
            ReactionError::Unbalanced { .. } => {}
            other => panic!("expected Unbalanced, got {other:?}"),
        }
    }

    #[test]
    fn trivial_reaction_is_balanced() {
        let rxn = BalancedReaction::new(
            vec![(comp("FeF3"), 1.0)],
            vec![(comp("FeF3"), 1.0)],
        )
        .unwrap();
        assert_eq!(rxn.products().len(), 1);
        assert_eq!(rxn.to_string(), "FeF3 -> FeF3");
    }

    #[test]
    fn element_amount_counts_one_side() {
        let rxn = BalancedReaction::new(
            vec![(comp("FeF3"), 1.0), (comp("Li"), 3.0)],
            vec![(comp("LiF"), 3.0), (comp("Fe"), 1.0)],
        )
        .unwrap();
        assert_relative_eq!(rxn.element_amount(elem("F")), 3.0, epsilon = 1e-9);
        assert_relative_eq!(rxn.element_amount(elem("Li")), 3.0, epsilon = 1e-9);
        assert_relative_eq!(rxn.element_amount(elem("Fe")), 1.0, epsilon = 1e-9);
        assert_relative_eq!(rxn.element_amount(elem("O")), 0.0);
    }

    #[test]
    fn normalize_rescales_coefficients() {
        let mut rxn = BalancedReaction::new(
            vec![(comp("FeF3"), 1.0), (comp("Li"), 3.0)],
            vec![(comp("LiF"), 3.0), (comp("Fe"), 1.0)],
        )
        .unwrap();
        rxn.normalize_to_element(elem("F"), 6.0).unwrap();
        assert_relative_eq!(rxn.coefficient(&comp("FeF3")).unwrap(), -2.0, epsilon = 1e-9);
        assert_relative_eq!(rxn.element_amount(elem("F")), 6.0, epsilon = 1e-9);

        let err = rxn.normalize_to_element(elem("O"), 1.0).unwrap_err();
        assert_eq!(err, ReactionError::ZeroElementAmount("O".to_string()));
    }

    #[test]
    fn coefficient_lookup_misses() {
        let rxn = BalancedReaction::new(
            vec![(comp("FeF3"), 1.0)],
            vec![(comp("FeF3"), 1.0)],
        )
        .unwrap();
        let err = rxn.coefficient(&comp("LiF")).unwrap_err();
        assert_eq!(err, ReactionError::CompositionNotInReaction("LiF".to_string()));
    }

    #[test]
    fn serde_round_trip_revalidates() {
        let rxn = BalancedReaction::new(
            vec![(comp("FeF3"), 1.0), (comp("Li"), 3.0)],
            vec![(comp("LiF"), 3.0), (comp("Fe"), 1.0)],
        )
        .unwrap();
        let json = serde_json::to_string(&rxn).unwrap();
        let back: BalancedReaction = serde_json::from_str(&json).unwrap();
        assert_relative_eq!(back.coefficient(&comp("Fe")).unwrap(), 1.0, epsilon = 1e-9);

        let tampered = json.replace("-3.0", "-2.0");
        assert!(serde_json::from_str::<BalancedReaction>(&tampered).is_err());
    }
}
