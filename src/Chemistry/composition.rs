//! # Composition
//! Element->amount map with insertion order preserved. Construction merges
//! duplicate elements and rejects negative amounts; iteration order is part of
//! the contract because normalization-element lists are derived from it.
//!
//! ## Key Methods
//! - `from_formula` - parses "FeF3", "Li0.5TiO2", "Ca(NO3)2"
//! - `reduced_formula` - gcd-reduced, electronegativity-ordered formula
//! - `weight`, `num_atoms`, `atomic_fraction` - bookkeeping queries
//! - `Add`/`Mul` - weighted accumulation of product sets

use super::periodic_table::{ChemistryError, Element};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul};

/// Amounts at or below this are treated as absent.
pub const AMOUNT_TOL: f64 = 1e-8;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<(Element, f64)>", into = "Vec<(Element, f64)>")]
pub struct Composition {
    items: Vec<(Element, f64)>,
}

impl Composition {
    /// Merges duplicates, drops near-zero amounts, rejects negative ones.
    pub fn new(items: Vec<(Element, f64)>) -> Result<Self, ChemistryError> {
        let mut merged: Vec<(Element, f64)> = Vec::with_capacity(items.len());
        for (el, amt) in items {
            if amt < 0.0 {
                return Err(ChemistryError::NegativeAmount {
                    symbol: el.symbol().to_string(),
                    amount: amt,
                });
            }
            match merged.iter_mut().find(|(e, _)| *e == el) {
                Some((_, existing)) => *existing += amt,
                None => merged.push((el, amt)),
            }
        }
        merged.retain(|(_, amt)| *amt > AMOUNT_TOL);
        Ok(Composition { items: merged })
    }

    pub fn empty() -> Self {
        Composition { items: Vec::new() }
    }

    /// Single atom of one element.
    pub fn of_element(el: Element) -> Self {
        Composition {
            items: vec![(el, 1.0)],
        }
    }

    /// Parses a chemical formula. One level of parenthesized groups with an
    /// optional multiplier is supported, amounts may be fractional.
    pub fn from_formula(formula: &str) -> Result<Self, ChemistryError> {
        let parse_err = |reason: &str| ChemistryError::FormulaParse {
            formula: formula.to_string(),
            reason: reason.to_string(),
        };
        if formula.trim().is_empty() {
            return Err(parse_err("empty formula"));
        }
        let token_re = Regex::new(r"[A-Z][a-z]*|\(|\)|\d+(?:\.\d*)?|\.\d+").unwrap();
        let mut tokens: Vec<&str> = Vec::new();
        let mut last_end = 0usize;
        for m in token_re.find_iter(formula) {
            if !formula[last_end..m.start()].trim().is_empty() {
                return Err(parse_err("unexpected characters"));
            }
            tokens.push(m.as_str());
            last_end = m.end();
        }
        if !formula[last_end..].trim().is_empty() {
            return Err(parse_err("unexpected characters"));
        }

        let mut stack: Vec<Vec<(Element, f64)>> = vec![Vec::new()];
        let mut iter = tokens.iter().peekable();
        while let Some(tok) = iter.next() {
            match *tok {
                "(" => stack.push(Vec::new()),
                ")" => {
                    if stack.len() < 2 {
                        return Err(parse_err("unmatched ')'"));
                    }
                    let mult = take_number(&mut iter).unwrap_or(Ok(1.0)).map_err(|_| {
                        parse_err("bad group multiplier")
                    })?;
                    let group = stack.pop().unwrap_or_default();
                    let frame = stack.last_mut().ok_or_else(|| parse_err("unmatched ')'"))?;
                    for (el, amt) in group {
                        frame.push((el, amt * mult));
                    }
                }
                t if t.starts_with(|c: char| c.is_ascii_digit() || c == '.') => {
                    return Err(parse_err("number without a preceding element"));
                }
                sym => {
                    let el = Element::from_symbol(sym)?;
                    let amt = take_number(&mut iter)
                        .unwrap_or(Ok(1.0))
                        .map_err(|_| parse_err("bad amount"))?;
                    let frame = stack.last_mut().ok_or_else(|| parse_err("unmatched ')'"))?;
                    frame.push((el, amt));
                }
            }
        }
        if stack.len() != 1 {
            return Err(parse_err("unclosed '('"));
        }
        Composition::new(stack.swap_remove(0))
    }

    /// All items in insertion order, near-zero amounts already dropped
    /// at construction time.
    pub fn items(&self) -> &[(Element, f64)] {
        &self.items
    }

    pub fn elements(&self) -> Vec<Element> {
        self.items.iter().map(|(el, _)| *el).collect()
    }

    pub fn amount(&self, el: Element) -> f64 {
        self.items
            .iter()
            .find(|(e, _)| *e == el)
            .map(|(_, amt)| *amt)
            .unwrap_or(0.0)
    }

    pub fn contains(&self, el: Element) -> bool {
        self.amount(el) > AMOUNT_TOL
    }

    pub fn num_atoms(&self) -> f64 {
        self.items.iter().map(|(_, amt)| amt).sum()
    }

    /// Molar mass, g/mol.
    pub fn weight(&self) -> f64 {
        self.items
            .iter()
            .map(|(el, amt)| el.atomic_mass() * amt)
            .sum()
    }

    pub fn atomic_fraction(&self, el: Element) -> f64 {
        let total = self.num_atoms();
        if total <= AMOUNT_TOL {
            return 0.0;
        }
        self.amount(el) / total
    }

    pub fn is_element(&self) -> bool {
        self.items.len() == 1
    }

    /// Formula with the stored amounts in insertion order, e.g. "Fe2O3".
    pub fn formula(&self) -> String {
        let mut out = String::new();
        for (el, amt) in &self.items {
            out.push_str(el.symbol());
            if (*amt - 1.0).abs() > AMOUNT_TOL {
                out.push_str(&format_amount(*amt));
            }
        }
        out
    }

    /// Formula reduced by the common amount factor, elements ordered by rising
    /// electronegativity: Fe2F6 -> "FeF3", Li0.5TiO2 -> "LiTi2O4".
    pub fn reduced_formula(&self) -> String {
        let mut items = self.items.clone();
        items.sort_by(|(a, _), (b, _)| {
            a.formula_order_key()
                .partial_cmp(&b.formula_order_key())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let gcd = amounts_gcd(&items);
        let mut out = String::new();
        for (el, amt) in &items {
            let reduced = amt / gcd;
            out.push_str(el.symbol());
            if (reduced - 1.0).abs() > 1e-8 {
                out.push_str(&format_amount(reduced));
            }
        }
        out
    }

    pub fn almost_equals(&self, other: &Composition, tol: f64) -> bool {
        let mut els = self.elements();
        for el in other.elements() {
            if !els.contains(&el) {
                els.push(el);
            }
        }
        els.iter()
            .all(|el| (self.amount(*el) - other.amount(*el)).abs() <= tol)
    }
}

fn take_number<'a, I>(iter: &mut std::iter::Peekable<I>) -> Option<Result<f64, std::num::ParseFloatError>>
where
    I: Iterator<Item = &'a &'a str>,
{
    let looks_numeric = iter
        .peek()
        .map(|t| t.starts_with(|c: char| c.is_ascii_digit() || c == '.'))
        .unwrap_or(false);
    if looks_numeric {
        let tok = iter.next().unwrap_or(&"");
        Some(tok.parse::<f64>())
    } else {
        None
    }
}

/// Common factor of a positive amount list; incommensurate amounts are left
/// unreduced (factor 1).
fn amounts_gcd(items: &[(Element, f64)]) -> f64 {
    let mut g = 0.0f64;
    for (_, amt) in items {
        g = float_gcd(*amt, g);
    }
    if g < 1e-5 { 1.0 } else { g }
}

fn float_gcd(mut a: f64, mut b: f64) -> f64 {
    if a == 0.0 {
        return b;
    }
    if b == 0.0 {
        return a;
    }
    while b > 1e-6 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Trimmed numeric formatting for formulas and reaction strings: integers
/// plain, fractions to four decimals with trailing zeros removed.
pub(crate) fn format_amount(amt: f64) -> String {
    let rounded = amt.round();
    if (amt - rounded).abs() < 1e-8 {
        format!("{}", rounded as i64)
    } else {
        let mut s = format!("{:.4}", amt);
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
        s
    }
}

impl PartialEq for Composition {
    fn eq(&self, other: &Self) -> bool {
        self.almost_equals(other, AMOUNT_TOL)
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formula())
    }
}

impl Add<&Composition> for Composition {
    type Output = Composition;

    fn add(mut self, rhs: &Composition) -> Composition {
        for (el, amt) in &rhs.items {
            match self.items.iter_mut().find(|(e, _)| e == el) {
                Some((_, existing)) => *existing += amt,
                None => self.items.push((*el, *amt)),
            }
        }
        self.items.retain(|(_, amt)| *amt > AMOUNT_TOL);
        self
    }
}

/// Scales every amount; meaningful for nonnegative scalars only.
impl Mul<f64> for Composition {
    type Output = Composition;

    fn mul(mut self, rhs: f64) -> Composition {
        for (_, amt) in &mut self.items {
            *amt *= rhs;
        }
        self.items.retain(|(_, amt)| *amt > AMOUNT_TOL);
        self
    }
}

impl TryFrom<Vec<(Element, f64)>> for Composition {
    type Error = ChemistryError;

    fn try_from(items: Vec<(Element, f64)>) -> Result<Self, Self::Error> {
        Composition::new(items)
    }
}

impl From<Composition> for Vec<(Element, f64)> {
    fn from(c: Composition) -> Self {
        c.items
    }
}
