//! An LL(1) grammar compiler.
//!
//! A grammar is authored with [`Grammar::define`], normalized (left recursion
//! removal, then left factoring), checked for LL(1) conflicts and compiled
//! into a [`ParseTable`] that drives the predictive parser of
//! [`llsql_runtime`].

pub mod cfg;
pub mod grammar;
pub mod normalize;
pub mod sets;
pub mod sql;
pub mod table;
pub mod types;
pub mod util;

pub use crate::{
    grammar::{n, t, Grammar, GrammarError},
    table::ParseTable,
};
pub use llsql_runtime as runtime;

use crate::sets::Sets;
use llsql_runtime::Parser;
use std::sync::Arc;

/// Compile the grammar into a parse table.
#[tracing::instrument(skip_all)]
pub fn compile(grammar: Grammar) -> Result<ParseTable, GrammarError> {
    let normalized = grammar.normalize();
    let rules = normalized.resolve()?;
    let sets = Sets::new(&rules);
    sets.check_ll1(&rules)?;
    ParseTable::generate(rules, sets)
}

/// Compile the grammar and create a parser reading from `source`.
///
/// The parse table can be shared with other parsers through
/// [`Parser::definition`].
pub fn construct<I>(grammar: Grammar, source: I) -> Result<Parser<Arc<ParseTable>, I>, GrammarError>
where
    I: Iterator<Item = char>,
{
    let table = compile(grammar)?;
    Ok(Parser::new(Arc::new(table), source))
}
