//! Static periodic table: standard atomic weights and Pauling
//! electronegativities for H..Pu, plus the `Element` handle used as the key
//! type in compositions and reactions.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ChemistryError {
    #[error("unknown element symbol: '{0}'")]
    UnknownElement(String),
    #[error("cannot parse formula '{formula}': {reason}")]
    FormulaParse { formula: String, reason: String },
    #[error("negative amount {amount} for element {symbol}")]
    NegativeAmount { symbol: String, amount: f64 },
}

struct ElementData {
    symbol: &'static str,
    atomic_mass: f64,
    electronegativity: f64,
}

const fn el(symbol: &'static str, atomic_mass: f64, electronegativity: f64) -> ElementData {
    ElementData {
        symbol,
        atomic_mass,
        electronegativity,
    }
}

// Electronegativity 0.0 marks elements without a tabulated Pauling value
// (He, Ne, Ar); those sort after every tabulated element in formula ordering.
static PERIODIC_TABLE: &[ElementData] = &[
    el("H", 1.008, 2.20),
    el("He", 4.002602, 0.0),
    el("Li", 6.94, 0.98),
    el("Be", 9.0121831, 1.57),
    el("B", 10.81, 2.04),
    el("C", 12.011, 2.55),
    el("N", 14.007, 3.04),
    el("O", 15.999, 3.44),
    el("F", 18.998403163, 3.98),
    el("Ne", 20.1797, 0.0),
    el("Na", 22.98976928, 0.93),
    el("Mg", 24.305, 1.31),
    el("Al", 26.9815385, 1.61),
    el("Si", 28.085, 1.90),
    el("P", 30.973761998, 2.19),
    el("S", 32.06, 2.58),
    el("Cl", 35.45, 3.16),
    el("Ar", 39.948, 0.0),
    el("K", 39.0983, 0.82),
    el("Ca", 40.078, 1.00),
    el("Sc", 44.955908, 1.36),
    el("Ti", 47.867, 1.54),
    el("V", 50.9415, 1.63),
    el("Cr", 51.9961, 1.66),
    el("Mn", 54.938044, 1.55),
    el("Fe", 55.845, 1.83),
    el("Co", 58.933194, 1.88),
    el("Ni", 58.6934, 1.91),
    el("Cu", 63.546, 1.90),
    el("Zn", 65.38, 1.65),
    el("Ga", 69.723, 1.81),
    el("Ge", 72.63, 2.01),
    el("As", 74.921595, 2.18),
    el("Se", 78.971, 2.55),
    el("Br", 79.904, 2.96),
    el("Kr", 83.798, 3.00),
    el("Rb", 85.4678, 0.82),
    el("Sr", 87.62, 0.95),
    el("Y", 88.90584, 1.22),
    el("Zr", 91.224, 1.33),
    el("Nb", 92.90637, 1.60),
    el("Mo", 95.95, 2.16),
    el("Tc", 98.0, 1.90),
    el("Ru", 101.07, 2.20),
    el("Rh", 102.9055, 2.28),
    el("Pd", 106.42, 2.20),
    el("Ag", 107.8682, 1.93),
    el("Cd", 112.414, 1.69),
    el("In", 114.818, 1.78),
    el("Sn", 118.71, 1.96),
    el("Sb", 121.76, 2.05),
    el("Te", 127.6, 2.10),
    el("I", 126.90447, 2.66),
    el("Xe", 131.293, 2.60),
    el("Cs", 132.90545196, 0.79),
    el("Ba", 137.327, 0.89),
    el("La", 138.90547, 1.10),
    el("Ce", 140.116, 1.12),
    el("Pr", 140.90766, 1.13),
    el("Nd", 144.242, 1.14),
    el("Pm", 145.0, 1.13),
    el("Sm", 150.36, 1.17),
    el("Eu", 151.964, 1.20),
    el("Gd", 157.25, 1.20),
    el("Tb", 158.92535, 1.22),
    el("Dy", 162.5, 1.22),
    el("Ho", 164.93033, 1.23),
    el("Er", 167.259, 1.24),
    el("Tm", 168.93422, 1.25),
    el("Yb", 173.045, 1.10),
    el("Lu", 174.9668, 1.27),
    el("Hf", 178.49, 1.30),
    el("Ta", 180.94788, 1.50),
    el("W", 183.84, 2.36),
    el("Re", 186.207, 1.90),
    el("Os", 190.23, 2.20),
    el("Ir", 192.217, 2.20),
    el("Pt", 195.084, 2.28),
    el("Au", 196.966569, 2.54),
    el("Hg", 200.592, 2.00),
    el("Tl", 204.38, 1.62),
    el("Pb", 207.2, 2.33),
    el("Bi", 208.9804, 2.02),
    el("Po", 209.0, 2.00),
    el("At", 210.0, 2.20),
    el("Rn", 222.0, 2.20),
    el("Fr", 223.0, 0.70),
    el("Ra", 226.0, 0.90),
    el("Ac", 227.0, 1.10),
    el("Th", 232.0377, 1.30),
    el("Pa", 231.03588, 1.50),
    el("U", 238.02891, 1.38),
    el("Np", 237.0, 1.36),
    el("Pu", 244.0, 1.28),
];

/// Chemical element identified by atomic number. Copy and cheap to pass
/// around; all data lookups go through the static table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Element(u8);

impl Element {
    pub fn from_symbol(symbol: &str) -> Result<Self, ChemistryError> {
        PERIODIC_TABLE
            .iter()
            .position(|row| row.symbol == symbol)
            .map(|i| Element((i + 1) as u8))
            .ok_or_else(|| ChemistryError::UnknownElement(symbol.to_string()))
    }

    pub fn atomic_number(&self) -> u8 {
        self.0
    }

    fn data(&self) -> &'static ElementData {
        &PERIODIC_TABLE[(self.0 - 1) as usize]
    }

    pub fn symbol(&self) -> &'static str {
        self.data().symbol
    }

    /// Standard atomic weight, g/mol.
    pub fn atomic_mass(&self) -> f64 {
        self.data().atomic_mass
    }

    /// Pauling electronegativity, 0.0 where no value is tabulated.
    pub fn electronegativity(&self) -> f64 {
        self.data().electronegativity
    }

    /// Key for conventional formula ordering: electropositive elements first,
    /// untabulated ones last, ties broken by symbol.
    pub(crate) fn formula_order_key(&self) -> (f64, &'static str) {
        let x = self.electronegativity();
        let x = if x == 0.0 { 99.0 } else { x };
        (x, self.symbol())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl TryFrom<String> for Element {
    type Error = ChemistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Element::from_symbol(&value)
    }
}

impl From<Element> for String {
    fn from(el: Element) -> String {
        el.symbol().to_string()
    }
}
