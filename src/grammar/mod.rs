pub mod declarations;
pub mod driver;
pub mod grammar;
pub mod grammar_table;
pub mod lr_dfa;
pub mod nullable_first_follow;
pub mod parse;
pub mod rules;
pub mod sections;
pub mod semantic_action;
pub mod slr_table;
pub use grammar::Grammar;

/// Synthetic start symbol of the augmenting rule `$accept : start ;`.
pub const ACCEPT: &str = "$accept";
/// End-of-input marker.
pub const END_MARK: &str = "$end";
/// Fictitious token used by generated parsers for error recovery.
pub const ERROR: &str = "error";
/// Display form of the empty marker in FIRST sets.
pub const EPSILON: &str = "ϵ";
