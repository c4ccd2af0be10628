//! Grammar types.

use crate::{
    types::{Map, TokenSet},
    util::write_sequence,
};
use llsql_runtime::{definition::AlternativeID, TokenKind};
use std::fmt;

/// A symbol in an authored grammar, referring to nonterminals by name.
///
/// Terminals sort before nonterminals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamedSymbol {
    T(TokenKind),
    N(String),
}

impl fmt::Display for NamedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::T(kind) => write!(f, "{}", kind),
            Self::N(name) => f.write_str(name),
        }
    }
}

/// Shortcut for a terminal symbol.
pub fn t(kind: TokenKind) -> NamedSymbol {
    NamedSymbol::T(kind)
}

/// Shortcut for a nonterminal symbol.
pub fn n(name: &str) -> NamedSymbol {
    NamedSymbol::N(name.to_owned())
}

/// A sequence of symbols. An empty alternative derives the empty string.
pub type Alternative = Vec<NamedSymbol>;

/// The grammar definition used to derive the parse table.
///
/// Nonterminals keep the order in which they were declared, and the
/// alternatives of each nonterminal are kept sorted and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    pub(crate) productions: Map<String, Vec<Alternative>>,
    pub(crate) start: String,
}

impl Grammar {
    /// Define a grammar using the specified function.
    ///
    /// ```
    /// # use llsql::grammar::{Grammar, n, t};
    /// # use llsql_runtime::TokenKind;
    /// let grammar = Grammar::define(|g| {
    ///     g.rule("list", [t(TokenKind::Identifier), n("list_rest")])?;
    ///     g.rule("list_rest", [t(TokenKind::Comma), n("list")])?;
    ///     g.rule("list_rest", [])?;
    ///     Ok(())
    /// })
    /// .unwrap();
    /// assert_eq!(grammar.start_symbol(), "list");
    /// ```
    pub fn define<F>(f: F) -> Result<Self, GrammarError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarError>,
    {
        let mut def = GrammarDef {
            productions: Map::default(),
            start: None,
        };
        f(&mut def)?;
        def.end()
    }

    pub fn start_symbol(&self) -> &str {
        &self.start
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &str> + '_ {
        self.productions.keys().map(String::as_str)
    }

    pub fn alternatives(&self, name: &str) -> Option<&[Alternative]> {
        self.productions.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    /// Sort and deduplicate the alternatives of every nonterminal.
    pub(crate) fn canonicalize(&mut self) {
        for (name, alternatives) in &mut self.productions {
            canonicalize_alternatives(name, alternatives);
        }
    }
}

pub(crate) fn canonicalize_alternatives(name: &str, alternatives: &mut Vec<Alternative>) {
    alternatives.sort();
    let len = alternatives.len();
    alternatives.dedup();
    if alternatives.len() != len {
        tracing::warn!("duplicate alternatives of `{}' have been removed", name);
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## start: {}", self.start)?;
        writeln!(f, "## rules:")?;
        for (name, alternatives) in &self.productions {
            for (i, alternative) in alternatives.iter().enumerate() {
                if i == 0 {
                    write!(f, "{} := ", name)?;
                } else {
                    write!(f, "{:width$} | ", "", width = name.len())?;
                }
                write_sequence(f, alternative)?;
                writeln!(f)?;
            }
            if alternatives.is_empty() {
                writeln!(f, "{} := <nothing>", name)?;
            }
        }
        Ok(())
    }
}

/// The contextual values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef {
    productions: Map<String, Vec<Alternative>>,
    start: Option<String>,
}

impl GrammarDef {
    /// Declare a nonterminal symbol used in this grammar.
    ///
    /// Nonterminals are otherwise declared implicitly by the first `rule`
    /// mentioning them on the left-hand side. Declaring them up front fixes
    /// their order.
    pub fn nonterminal(&mut self, name: &str) -> Result<(), GrammarError> {
        verify_name(name)?;
        if self.productions.contains_key(name) {
            return Err(GrammarError::DuplicateNonterminal(name.to_owned()));
        }
        self.productions.insert(name.to_owned(), vec![]);
        Ok(())
    }

    /// Add an alternative to the nonterminal `name`.
    pub fn rule<I>(&mut self, name: &str, symbols: I) -> Result<(), GrammarError>
    where
        I: IntoIterator<Item = NamedSymbol>,
    {
        verify_name(name)?;
        let alternative: Alternative = symbols.into_iter().collect();
        for symbol in &alternative {
            match symbol {
                NamedSymbol::N(referenced) => verify_name(referenced)?,
                NamedSymbol::T(TokenKind::None) => return Err(GrammarError::ReservedTerminal),
                NamedSymbol::T(..) => (),
            }
        }
        self.productions
            .entry(name.to_owned())
            .or_default()
            .push(alternative);
        Ok(())
    }

    /// Specify the start symbol for this grammar.
    pub fn start_symbol(&mut self, name: &str) -> Result<(), GrammarError> {
        verify_name(name)?;
        self.start.replace(name.to_owned());
        Ok(())
    }

    fn end(self) -> Result<Grammar, GrammarError> {
        // use the first declared nonterminal if not specified.
        let start = match self.start {
            Some(start) if self.productions.contains_key(&start) => start,
            Some(start) => return Err(GrammarError::UnknownStartSymbol(start)),
            None => self
                .productions
                .keys()
                .next()
                .cloned()
                .ok_or(GrammarError::Empty)?,
        };

        for (name, alternatives) in &self.productions {
            if alternatives.is_empty() {
                tracing::warn!("the nonterminal `{}' has no alternatives", name);
            }
        }

        let mut grammar = Grammar {
            productions: self.productions,
            start,
        };
        grammar.canonicalize();
        Ok(grammar)
    }
}

fn verify_name(name: &str) -> Result<(), GrammarError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first == '_' || unicode_ident::is_xid_start(first))
                && chars.all(unicode_ident::is_xid_continue)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(GrammarError::InvalidName(name.to_owned()))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// Two alternatives share a lookahead.
    FirstFirst(AlternativeID, AlternativeID),
    /// A nullable nonterminal can start with a token that may follow it.
    FirstFollow,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstFirst(a, b) => write!(
                f,
                "FIRST/FIRST conflict between alternatives {} and {}",
                a.index(),
                b.index()
            ),
            Self::FirstFollow => f.write_str("FIRST/FOLLOW conflict"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("invalid nonterminal name: `{}'", _0)]
    InvalidName(String),

    #[error("the nonterminal `{}' has already been declared", _0)]
    DuplicateNonterminal(String),

    #[error("the NONE marker cannot be used as a terminal; use an empty alternative instead")]
    ReservedTerminal,

    #[error("undefined nonterminal `{}' referenced from `{}'", name, referrer)]
    UndefinedNonterminal { name: String, referrer: String },

    #[error("unknown start symbol: `{}'", _0)]
    UnknownStartSymbol(String),

    #[error("empty grammar")]
    Empty,

    #[error("too many nonterminal symbols")]
    TooManyNonterminals,

    #[error("too many alternatives of the nonterminal `{}'", _0)]
    TooManyAlternatives(String),

    #[error("the grammar is not LL(1): {} at `{}' on {}", kind, nonterminal, terminals)]
    Conflict {
        nonterminal: String,
        terminals: TokenSet,
        kind: ConflictKind,
    },

    #[error(
        "conflicting table entry at (`{}', {}): alternatives {} and {}",
        nonterminal,
        terminal,
        existing.index(),
        new.index()
    )]
    TableConflict {
        nonterminal: String,
        terminal: TokenKind,
        existing: AlternativeID,
        new: AlternativeID,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_sorts_and_dedups() {
        let grammar = Grammar::define(|g| {
            g.rule("s", [n("a"), t(TokenKind::Comma)])?;
            g.rule("s", [t(TokenKind::Select)])?;
            g.rule("s", [])?;
            g.rule("s", [t(TokenKind::Select)])?;
            g.rule("a", [t(TokenKind::Identifier)])?;
            Ok(())
        })
        .unwrap();

        assert_eq!(grammar.start_symbol(), "s");
        assert_eq!(grammar.nonterminals().collect::<Vec<_>>(), ["s", "a"]);
        assert_eq!(
            grammar.alternatives("s").unwrap(),
            [vec![], vec![t(TokenKind::Select)], vec![n("a"), t(TokenKind::Comma)]]
        );
    }

    #[test]
    fn explicit_start_symbol() {
        let grammar = Grammar::define(|g| {
            g.nonterminal("a")?;
            g.rule("s", [n("a")])?;
            g.rule("a", [t(TokenKind::Star)])?;
            g.start_symbol("s")?;
            Ok(())
        })
        .unwrap();
        assert_eq!(grammar.start_symbol(), "s");
        assert_eq!(grammar.nonterminals().collect::<Vec<_>>(), ["a", "s"]);
    }

    #[test]
    fn definition_errors() {
        assert!(matches!(
            Grammar::define(|_| Ok(())),
            Err(GrammarError::Empty)
        ));
        assert!(matches!(
            Grammar::define(|g| g.rule("1abc", [])),
            Err(GrammarError::InvalidName(name)) if name == "1abc"
        ));
        assert!(matches!(
            Grammar::define(|g| g.rule("s", [n("")])),
            Err(GrammarError::InvalidName(..))
        ));
        assert!(matches!(
            Grammar::define(|g| {
                g.rule("s", [])?;
                g.nonterminal("s")
            }),
            Err(GrammarError::DuplicateNonterminal(..))
        ));
        assert!(matches!(
            Grammar::define(|g| {
                g.rule("s", [])?;
                g.start_symbol("x")
            }),
            Err(GrammarError::UnknownStartSymbol(name)) if name == "x"
        ));
        assert!(matches!(
            Grammar::define(|g| g.rule("s", [t(TokenKind::None)])),
            Err(GrammarError::ReservedTerminal)
        ));
    }

    #[test]
    fn display() {
        let grammar = Grammar::define(|g| {
            g.rule("s", [t(TokenKind::Select), n("s")])?;
            g.rule("s", [])?;
            Ok(())
        })
        .unwrap();
        assert_eq!(
            grammar.to_string(),
            "## start: s\n## rules:\ns := ε\n  | SELECT s\n"
        );
    }
}
