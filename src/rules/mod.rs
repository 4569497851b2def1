//! Rule engine
//!
//! Rules decide, for every link found on a page, whether the crawler recurses
//! into it (follow/skip) and whether it is recorded as a result (match).
//! Evaluation is pure and synchronous.

mod rule;
mod set;

pub use rule::{LinkContext, PatternRule, Predicate, Rule};
pub use set::RuleSet;
