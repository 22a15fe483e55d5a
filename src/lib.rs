#[allow(non_snake_case)]
pub mod Chemistry;
#[allow(non_snake_case)]
pub mod DataBank;
#[allow(non_snake_case)]
pub mod Electrochem;
#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod PhaseEq;
#[allow(non_snake_case)]
pub mod Utils;
