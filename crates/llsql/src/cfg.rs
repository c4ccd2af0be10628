//! Index-keyed production rules.

use crate::{
    grammar::{Grammar, GrammarError, NamedSymbol},
    normalize::Normalized,
    util::{display_fn, write_sequence},
};
use llsql_runtime::definition::{AlternativeID, NonterminalID, Symbol};
use std::fmt;

/// The normalized grammar with nonterminals resolved into indices.
///
/// The index of a nonterminal is its position in declaration order, and the
/// alternatives of each nonterminal are sorted by symbol. Both kinds of
/// index fit in `u16`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rules {
    names: Vec<String>,
    alternatives: Vec<Vec<Vec<Symbol>>>,
    start: NonterminalID,
}

impl Normalized {
    /// Resolve nonterminal names into indices.
    pub fn resolve(&self) -> Result<Rules, GrammarError> {
        Rules::from_grammar(self.grammar())
    }
}

impl Rules {
    fn from_grammar(grammar: &Grammar) -> Result<Self, GrammarError> {
        let id_of = |name: &str| {
            grammar
                .productions
                .get_index_of(name)
                .and_then(|index| u16::try_from(index).ok())
                .map(NonterminalID::from_raw)
        };

        if u16::try_from(grammar.len()).is_err() {
            return Err(GrammarError::TooManyNonterminals);
        }

        let mut names = Vec::with_capacity(grammar.len());
        let mut alternatives = Vec::with_capacity(grammar.len());
        for (name, named_alternatives) in &grammar.productions {
            if u16::try_from(named_alternatives.len()).is_err() {
                return Err(GrammarError::TooManyAlternatives(name.clone()));
            }
            let mut resolved = Vec::with_capacity(named_alternatives.len());
            for named in named_alternatives {
                let alternative = named
                    .iter()
                    .map(|symbol| match symbol {
                        NamedSymbol::T(kind) => Ok(Symbol::T(*kind)),
                        NamedSymbol::N(referenced) => id_of(referenced.as_str()).map(Symbol::N).ok_or_else(
                            || GrammarError::UndefinedNonterminal {
                                name: referenced.clone(),
                                referrer: name.clone(),
                            },
                        ),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                resolved.push(alternative);
            }
            resolved.sort();
            names.push(name.clone());
            alternatives.push(resolved);
        }

        let start = id_of(grammar.start_symbol())
            .ok_or_else(|| GrammarError::UnknownStartSymbol(grammar.start_symbol().to_owned()))?;

        tracing::debug!(
            "resolved {} nonterminals, {} alternatives",
            names.len(),
            alternatives.iter().map(Vec::len).sum::<usize>()
        );

        Ok(Rules {
            names,
            alternatives,
            start,
        })
    }

    pub fn start_symbol(&self) -> NonterminalID {
        self.start
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = NonterminalID> + '_ {
        (0..self.names.len()).map(|index| NonterminalID::from_raw(index as u16))
    }

    pub fn name(&self, id: NonterminalID) -> &str {
        self.names.get(id.index()).map_or("<unknown>", String::as_str)
    }

    pub fn id(&self, name: &str) -> Option<NonterminalID> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|index| NonterminalID::from_raw(index as u16))
    }

    pub fn alternatives(&self, id: NonterminalID) -> &[Vec<Symbol>] {
        self.alternatives.get(id.index()).map_or(&[][..], Vec::as_slice)
    }

    pub fn alternative(&self, id: NonterminalID, alternative: AlternativeID) -> &[Symbol] {
        self.alternatives(id)
            .get(alternative.index())
            .map_or(&[][..], Vec::as_slice)
    }

    /// Iterate over the alternatives of a nonterminal with their IDs.
    pub fn alternatives_with_id(
        &self,
        id: NonterminalID,
    ) -> impl Iterator<Item = (AlternativeID, &[Symbol])> + '_ {
        self.alternatives(id)
            .iter()
            .enumerate()
            .map(|(index, symbols)| (AlternativeID::from_raw(index as u16), symbols.as_slice()))
    }

    pub fn display_symbol(&self, symbol: Symbol) -> impl fmt::Display + '_ {
        display_fn(move |f| match symbol {
            Symbol::T(kind) => write!(f, "{}", kind),
            Symbol::N(id) => f.write_str(self.name(id)),
        })
    }

    /// `"LHS := R1 R2 R3"`
    pub fn display_alternative<'r>(
        &'r self,
        id: NonterminalID,
        symbols: &'r [Symbol],
    ) -> impl fmt::Display + 'r {
        display_fn(move |f| {
            write!(f, "{} := ", self.name(id))?;
            let symbols: Vec<_> = symbols.iter().map(|s| self.display_symbol(*s)).collect();
            write_sequence(f, &symbols)
        })
    }
}

impl fmt::Display for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## start: {}", self.name(self.start))?;
        writeln!(f, "## rules:")?;
        for id in self.nonterminals() {
            for (alt, symbols) in self.alternatives_with_id(id) {
                writeln!(f, "[{:>2}] {}", alt.index(), self.display_alternative(id, symbols))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{n, t, Grammar};
    use llsql_runtime::TokenKind;

    #[test]
    fn resolve_indices() {
        let grammar = Grammar::define(|g| {
            g.rule("b", [t(TokenKind::Star)])?;
            g.rule("a", [t(TokenKind::Comma), n("b")])?;
            g.rule("a", [t(TokenKind::Semicolon)])?;
            g.start_symbol("a")?;
            Ok(())
        })
        .unwrap();
        let rules = grammar.normalize().resolve().unwrap();

        let a = rules.id("a").unwrap();
        let b = rules.id("b").unwrap();
        assert_eq!(a.index(), 1);
        assert_eq!(b.index(), 0);
        assert_eq!(rules.start_symbol(), a);
        assert_eq!(rules.name(a), "a");
        assert_eq!(
            rules.alternatives(a),
            [
                vec![Symbol::T(TokenKind::Comma), Symbol::N(b)],
                vec![Symbol::T(TokenKind::Semicolon)],
            ]
        );
        assert_eq!(rules.alternatives(b), [vec![Symbol::T(TokenKind::Star)]]);
    }

    #[test]
    fn undefined_nonterminal() {
        let grammar = Grammar::define(|g| g.rule("a", [n("missing")])).unwrap();
        let err = grammar.normalize().resolve().unwrap_err();
        assert!(matches!(
            err,
            GrammarError::UndefinedNonterminal { ref name, ref referrer }
                if name == "missing" && referrer == "a"
        ));
    }

    #[test]
    fn too_many_alternatives() {
        let kinds: Vec<TokenKind> = TokenKind::terminals().take(16).collect();
        let alternatives = (0..=u16::MAX as usize)
            .map(|i| {
                (0..4)
                    .map(|digit| NamedSymbol::T(kinds[(i >> (4 * digit)) & 0xf]))
                    .collect()
            })
            .collect();
        let mut productions = crate::types::Map::default();
        productions.insert("s".to_owned(), alternatives);
        let grammar = Grammar {
            productions,
            start: "s".to_owned(),
        };

        let err = Rules::from_grammar(&grammar).unwrap_err();
        assert!(matches!(err, GrammarError::TooManyAlternatives(ref name) if name == "s"));
    }

    #[test]
    fn display() {
        let grammar = Grammar::define(|g| {
            g.rule("s", [t(TokenKind::Select), n("s")])?;
            g.rule("s", [])?;
            Ok(())
        })
        .unwrap();
        let rules = grammar.normalize().resolve().unwrap();
        assert_eq!(
            rules.to_string(),
            "## start: s\n## rules:\n[ 0] s := ε\n[ 1] s := SELECT s\n"
        );
    }
}
