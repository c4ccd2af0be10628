//! Calculation of FIRST and FOLLOW sets.

use crate::{
    cfg::Rules,
    grammar::{ConflictKind, GrammarError},
    types::TokenSet,
    util::display_fn,
};
use llsql_runtime::{
    definition::{AlternativeID, NonterminalID, Symbol},
    TokenKind,
};
use std::fmt;

/// The FIRST and FOLLOW sets of every nonterminal.
///
/// `NONE` in a FIRST set means that the nonterminal derives the empty string.
#[derive(Debug, Clone)]
pub struct Sets {
    first: Vec<TokenSet>,
    follow: Vec<TokenSet>,
}

impl Sets {
    #[tracing::instrument(skip_all)]
    pub fn new(rules: &Rules) -> Self {
        let first = first_sets(rules);
        let follow = follow_sets(rules, &first);
        Self { first, follow }
    }

    pub fn first(&self, id: NonterminalID) -> &TokenSet {
        &self.first[id.index()]
    }

    pub fn follow(&self, id: NonterminalID) -> &TokenSet {
        &self.follow[id.index()]
    }

    pub fn is_nullable(&self, id: NonterminalID) -> bool {
        self.first(id).contains(TokenKind::None)
    }

    /// `First(X1 X2 ... Xn)`
    pub fn composite_first(&self, symbols: &[Symbol]) -> TokenSet {
        composite_first(&self.first, symbols)
    }

    /// Verify that the grammar can be parsed with a single token lookahead.
    #[tracing::instrument(skip_all)]
    pub fn check_ll1(&self, rules: &Rules) -> Result<(), GrammarError> {
        for id in rules.nonterminals() {
            let firsts: Vec<TokenSet> = rules
                .alternatives(id)
                .iter()
                .map(|alternative| self.composite_first(alternative))
                .collect();
            for (i, a) in firsts.iter().enumerate() {
                for (j, b) in firsts.iter().enumerate().skip(i + 1) {
                    let clash = a.intersection(b);
                    if !clash.is_empty() {
                        return Err(GrammarError::Conflict {
                            nonterminal: rules.name(id).to_owned(),
                            terminals: clash,
                            kind: ConflictKind::FirstFirst(
                                AlternativeID::from_raw(i as u16),
                                AlternativeID::from_raw(j as u16),
                            ),
                        });
                    }
                }
            }

            if self.is_nullable(id) {
                let clash = self.first(id).intersection(self.follow(id));
                if !clash.is_empty() {
                    return Err(GrammarError::Conflict {
                        nonterminal: rules.name(id).to_owned(),
                        terminals: clash,
                        kind: ConflictKind::FirstFollow,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn display<'a>(&'a self, rules: &'a Rules) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            for id in rules.nonterminals() {
                writeln!(f, "{}", rules.name(id))?;
                writeln!(f, "  FIRST  = {}", self.first(id))?;
                writeln!(f, "  FOLLOW = {}", self.follow(id))?;
            }
            Ok(())
        })
    }
}

fn composite_first(first: &[TokenSet], symbols: &[Symbol]) -> TokenSet {
    let mut result = TokenSet::new();
    for symbol in symbols {
        match symbol {
            Symbol::T(TokenKind::None) => continue,
            Symbol::T(kind) => {
                result.insert(*kind);
                return result;
            }
            Symbol::N(id) => {
                let mut added = first[id.index()].clone();
                let nullable = added.remove(TokenKind::None);
                result.union_with(&added);
                if !nullable {
                    return result;
                }
            }
        }
    }
    result.insert(TokenKind::None);
    result
}

fn first_sets(rules: &Rules) -> Vec<TokenSet> {
    let mut first = vec![TokenSet::new(); rules.len()];

    // repeat until no set is updated.
    let mut rounds = 0;
    let mut changed = true;
    while changed {
        changed = false;
        rounds += 1;
        for id in rules.nonterminals() {
            for alternative in rules.alternatives(id) {
                let added = composite_first(&first, alternative);
                changed |= first[id.index()].union_with(&added);
            }
        }
    }

    tracing::debug!("FIRST sets converged after {} rounds", rounds);
    first
}

fn follow_sets(rules: &Rules, first: &[TokenSet]) -> Vec<TokenSet> {
    let mut follow = vec![TokenSet::new(); rules.len()];
    follow[rules.start_symbol().index()].insert(TokenKind::Eoi);

    // For `A -> α B β`:
    //  1. Follow(B) ⊇ First(β) \ {ε}
    //  2. Follow(B) ⊇ Follow(A) if β derives ε
    let mut rounds = 0;
    let mut changed = true;
    while changed {
        changed = false;
        rounds += 1;
        for id in rules.nonterminals() {
            for alternative in rules.alternatives(id) {
                for (pos, symbol) in alternative.iter().enumerate() {
                    let Symbol::N(target) = symbol else {
                        continue;
                    };
                    let mut added = composite_first(first, &alternative[pos + 1..]);
                    if added.remove(TokenKind::None) {
                        let inherited = follow[id.index()].clone();
                        added.union_with(&inherited);
                    }
                    changed |= follow[target.index()].union_with(&added);
                }
            }
        }
    }

    tracing::debug!("FOLLOW sets converged after {} rounds", rounds);
    follow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{n, t, Grammar};
    use llsql_runtime::TokenKind::{
        And, CharConstant, Eoi, Identifier, IntConstant, Or, ParenClose, ParenOpen,
    };

    fn set<const N: usize>(kinds: [TokenKind; N]) -> TokenSet {
        kinds.into_iter().collect()
    }

    fn rules(grammar: Grammar) -> Rules {
        grammar.normalize().resolve().unwrap()
    }

    fn expression() -> Rules {
        rules(
            Grammar::define(|g| {
                g.rule("expr", [n("expr"), t(Or), n("term")])?;
                g.rule("expr", [n("term")])?;
                g.rule("term", [n("term"), t(And), n("factor")])?;
                g.rule("term", [n("factor")])?;
                g.rule("factor", [t(ParenOpen), n("expr"), t(ParenClose)])?;
                g.rule("factor", [t(Identifier)])?;
                Ok(())
            })
            .unwrap(),
        )
    }

    #[test]
    fn expression_sets() {
        let rules = expression();
        let sets = Sets::new(&rules);
        let id = |name| rules.id(name).unwrap();

        assert_eq!(*sets.first(id("expr")), set([ParenOpen, Identifier]));
        assert_eq!(*sets.first(id("term")), set([ParenOpen, Identifier]));
        assert_eq!(*sets.first(id("factor")), set([ParenOpen, Identifier]));
        assert_eq!(*sets.first(id("expr_tail1")), set([TokenKind::None, Or]));
        assert_eq!(*sets.first(id("term_tail1")), set([TokenKind::None, And]));

        assert_eq!(*sets.follow(id("expr")), set([ParenClose, Eoi]));
        assert_eq!(*sets.follow(id("expr_tail1")), set([ParenClose, Eoi]));
        assert_eq!(*sets.follow(id("term")), set([Or, ParenClose, Eoi]));
        assert_eq!(*sets.follow(id("term_tail1")), set([Or, ParenClose, Eoi]));
        assert_eq!(*sets.follow(id("factor")), set([And, Or, ParenClose, Eoi]));

        assert!(sets.is_nullable(id("expr_tail1")));
        assert!(!sets.is_nullable(id("expr")));
        assert!(sets.check_ll1(&rules).is_ok());
    }

    #[test]
    fn composite_first_of_sequences() {
        let rules = expression();
        let sets = Sets::new(&rules);
        let expr_tail = Symbol::N(rules.id("expr_tail1").unwrap());
        let term_tail = Symbol::N(rules.id("term_tail1").unwrap());

        assert_eq!(sets.composite_first(&[]), set([TokenKind::None]));
        assert_eq!(
            sets.composite_first(&[term_tail, expr_tail]),
            set([TokenKind::None, And, Or])
        );
        assert_eq!(
            sets.composite_first(&[term_tail, Symbol::T(ParenClose), expr_tail]),
            set([And, ParenClose])
        );
    }

    #[test]
    fn first_first_conflict() {
        let rules = rules(
            Grammar::define(|g| {
                g.rule("s", [n("a")])?;
                g.rule("s", [n("b")])?;
                g.rule("a", [t(Identifier)])?;
                g.rule("b", [t(Identifier), t(IntConstant)])?;
                Ok(())
            })
            .unwrap(),
        );
        let err = Sets::new(&rules).check_ll1(&rules).unwrap_err();
        match err {
            GrammarError::Conflict {
                nonterminal,
                terminals,
                kind,
            } => {
                assert_eq!(nonterminal, "s");
                assert_eq!(terminals, set([Identifier]));
                assert!(matches!(kind, ConflictKind::FirstFirst(..)));
            }
            err => panic!("unexpected error: {}", err),
        }
    }

    #[test]
    fn first_follow_conflict() {
        let rules = rules(
            Grammar::define(|g| {
                g.rule("s", [n("a"), t(Identifier)])?;
                g.rule("a", [t(Identifier)])?;
                g.rule("a", [])?;
                Ok(())
            })
            .unwrap(),
        );
        let err = Sets::new(&rules).check_ll1(&rules).unwrap_err();
        assert!(matches!(
            err,
            GrammarError::Conflict {
                ref nonterminal,
                kind: ConflictKind::FirstFollow,
                ..
            } if nonterminal == "a"
        ));
    }

    #[test]
    fn two_nullable_alternatives_conflict() {
        let rules = rules(
            Grammar::define(|g| {
                g.rule("s", [n("a")])?;
                g.rule("s", [n("b")])?;
                g.rule("a", [t(Identifier)])?;
                g.rule("a", [])?;
                g.rule("b", [t(CharConstant)])?;
                g.rule("b", [])?;
                Ok(())
            })
            .unwrap(),
        );
        let err = Sets::new(&rules).check_ll1(&rules).unwrap_err();
        assert!(matches!(
            err,
            GrammarError::Conflict { ref terminals, .. } if terminals.contains(TokenKind::None)
        ));
    }
}
