/// ordered element-amount maps, formula parsing and reduction
pub mod composition;
/// static periodic table data and the Element handle type
pub mod periodic_table;
/// balanced stoichiometric reactions and coefficient algebra
pub mod reaction;
