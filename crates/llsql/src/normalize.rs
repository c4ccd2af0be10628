//! Rewriting grammars into a form suitable for predictive parsing.
//!
//! Normalization runs in two phases: left recursion is removed first, and
//! the result is then left-factored. Each phase consumes the output of the
//! previous one, so a phase cannot be applied twice to the same value.

use crate::{
    grammar::{canonicalize_alternatives, Alternative, Grammar, NamedSymbol},
    types::Set,
};

/// A grammar without left recursion.
#[derive(Debug, Clone)]
pub struct LeftRecursionFree {
    grammar: Grammar,
}

impl LeftRecursionFree {
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn into_inner(self) -> Grammar {
        self.grammar
    }

    /// Factor out the longest common prefixes of alternatives until no two
    /// alternatives of a nonterminal start with the same symbol.
    #[tracing::instrument(skip_all)]
    pub fn left_factor(self) -> Normalized {
        let mut grammar = self.grammar;
        let mut passes = 0;
        loop {
            passes += 1;
            let mut changed = false;
            // nonterminals added during this pass are visited as well.
            let mut index = 0;
            while index < grammar.productions.len() {
                changed |= factor_nonterminal(&mut grammar, index);
                index += 1;
            }
            if !changed {
                break;
            }
        }
        tracing::debug!(
            "left factoring finished after {} passes ({} nonterminals)",
            passes,
            grammar.len()
        );
        Normalized { grammar }
    }
}

/// A grammar without left recursion or common prefixes.
#[derive(Debug, Clone)]
pub struct Normalized {
    grammar: Grammar,
}

impl Normalized {
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn into_inner(self) -> Grammar {
        self.grammar
    }
}

impl Grammar {
    /// Remove both direct and indirect left recursion.
    ///
    /// Nonterminals are processed in declaration order. Any alternative of the
    /// current nonterminal `A` starting with an already processed nonterminal
    /// `B` has `B` replaced by each of its alternatives; the remaining
    /// immediate recursion
    /// `A -> A α | β` is then rewritten into `A -> β A'` and
    /// `A' -> α A' | ε`.
    ///
    /// The grammar must not contain cycles such as `A -> A`.
    #[tracing::instrument(skip_all)]
    pub fn remove_left_recursion(self) -> LeftRecursionFree {
        let mut grammar = self;
        let originals: Vec<String> = grammar.productions.keys().cloned().collect();
        let mut processed: Set<String> = Set::default();

        for name in originals {
            substitute_leading(&mut grammar, &name, &processed);
            let tail = remove_immediate_recursion(&mut grammar, &name);
            processed.insert(name);
            processed.extend(tail);
        }

        grammar.canonicalize();
        LeftRecursionFree { grammar }
    }

    /// Apply both normalization phases.
    pub fn normalize(self) -> Normalized {
        self.remove_left_recursion().left_factor()
    }
}

fn leading_nonterminal(alternative: &[NamedSymbol]) -> Option<&str> {
    match alternative.first() {
        Some(NamedSymbol::N(name)) => Some(name.as_str()),
        _ => None,
    }
}

fn substitute_leading(grammar: &mut Grammar, name: &str, processed: &Set<String>) {
    loop {
        let Some(alternatives) = grammar.productions.get(name) else {
            return;
        };

        let found = alternatives.iter().position(|alternative| {
            matches!(
                leading_nonterminal(alternative),
                Some(leading) if leading != name && processed.contains(leading)
            )
        });
        let Some(position) = found else {
            return;
        };

        let mut alternatives = grammar.productions.get(name).cloned().unwrap_or_default();
        let alternative = alternatives.remove(position);
        let (leading, rest) = match alternative.split_first() {
            Some((NamedSymbol::N(leading), rest)) => (leading.clone(), rest.to_vec()),
            _ => return,
        };
        let replacements = grammar
            .productions
            .get(&leading)
            .cloned()
            .unwrap_or_default();
        tracing::trace!(
            "substitute `{}' in {} alternatives of `{}'",
            leading,
            replacements.len(),
            name
        );
        for replacement in replacements {
            let mut substituted = replacement;
            substituted.extend(rest.iter().cloned());
            alternatives.push(substituted);
        }
        grammar.productions.insert(name.to_owned(), alternatives);
    }
}

/// Rewrite `A -> A α | β` into `A -> β A'` and `A' -> α A' | ε`.
///
/// Returns the name of the introduced nonterminal, if any.
fn remove_immediate_recursion(grammar: &mut Grammar, name: &str) -> Option<String> {
    let alternatives = grammar.productions.get(name)?;
    let (recursive, others): (Vec<&Alternative>, Vec<&Alternative>) = alternatives
        .iter()
        .partition(|alternative| leading_nonterminal(alternative) == Some(name));
    if recursive.is_empty() {
        return None;
    }

    let tail = fresh_name(grammar, name, "tail");
    tracing::trace!(
        "remove left recursion of `{}' by introducing `{}'",
        name,
        tail
    );
    if others.is_empty() {
        tracing::warn!("the nonterminal `{}' derives no finite string", name);
    }

    let mut tail_alternatives: Vec<Alternative> = recursive
        .into_iter()
        .map(|alternative| {
            let mut alpha = alternative[1..].to_vec();
            alpha.push(NamedSymbol::N(tail.clone()));
            alpha
        })
        .collect();
    tail_alternatives.push(vec![]);
    let new_alternatives: Vec<Alternative> = others
        .into_iter()
        .map(|beta| {
            let mut beta = beta.clone();
            beta.push(NamedSymbol::N(tail.clone()));
            beta
        })
        .collect();

    insert_after(grammar, name, tail.clone(), tail_alternatives);
    grammar.productions.insert(name.to_owned(), new_alternatives);
    Some(tail)
}

/// Factor the longest common prefix out of the alternatives of the
/// `index`-th nonterminal.
fn factor_nonterminal(grammar: &mut Grammar, index: usize) -> bool {
    let Some((name, alternatives)) = grammar.productions.get_index(index) else {
        return false;
    };

    // the longest prefix shared by two alternatives, the first found on ties.
    let mut prefix: &[NamedSymbol] = &[];
    for (i, a) in alternatives.iter().enumerate() {
        for b in &alternatives[i + 1..] {
            let len = a.iter().zip(b).take_while(|(x, y)| x == y).count();
            if len > prefix.len() {
                prefix = &a[..len];
            }
        }
    }
    if prefix.is_empty() {
        return false;
    }

    let name = name.clone();
    let prefix = prefix.to_vec();
    let rest = fresh_name(grammar, &name, "rest");
    tracing::trace!(
        "factor out `{}' from `{}' into `{}'",
        display_prefix(&prefix),
        name,
        rest
    );

    let alternatives = grammar
        .productions
        .get(&name)
        .cloned()
        .unwrap_or_default();
    let (shared, mut kept): (Vec<Alternative>, Vec<Alternative>) = alternatives
        .into_iter()
        .partition(|alternative| alternative.starts_with(&prefix));
    let mut suffixes: Vec<Alternative> = shared
        .into_iter()
        .map(|alternative| alternative[prefix.len()..].to_vec())
        .collect();
    let mut factored = prefix;
    factored.push(NamedSymbol::N(rest.clone()));
    kept.push(factored);

    canonicalize_alternatives(&name, &mut kept);
    canonicalize_alternatives(&rest, &mut suffixes);
    insert_after(grammar, &name, rest, suffixes);
    grammar.productions.insert(name, kept);
    true
}

fn display_prefix(prefix: &[NamedSymbol]) -> impl std::fmt::Display + '_ {
    crate::util::display_fn(move |f| crate::util::write_sequence(f, prefix))
}

/// Return `<base>_<kind><k>` with the smallest `k >= 1` neither defined nor
/// referenced yet.
fn fresh_name(grammar: &Grammar, base: &str, kind: &str) -> String {
    let referenced: Set<&str> = grammar
        .productions
        .values()
        .flatten()
        .flatten()
        .filter_map(|symbol| match symbol {
            NamedSymbol::N(name) => Some(name.as_str()),
            NamedSymbol::T(..) => None,
        })
        .collect();
    (1..)
        .map(|k| format!("{}_{}{}", base, kind, k))
        .find(|candidate| {
            !grammar.productions.contains_key(candidate)
                && !referenced.contains(candidate.as_str())
        })
        .unwrap_or_default()
}

/// Add a nonterminal directly after `parent`, or at the end if it is absent.
fn insert_after(grammar: &mut Grammar, parent: &str, name: String, alternatives: Vec<Alternative>) {
    let index = match grammar.productions.get_index_of(parent) {
        Some(index) => index + 1,
        None => grammar.productions.len(),
    };
    grammar.productions.shift_insert(index, name, alternatives);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{n, t};
    use llsql_runtime::TokenKind::{
        And, CharConstant, Comma, Equal, Identifier, Insert, IntConstant, Or, ParenClose,
        ParenOpen, Select, Semicolon, Star,
    };

    fn alternatives(grammar: &Grammar, name: &str) -> Vec<Alternative> {
        grammar.alternatives(name).unwrap().to_vec()
    }

    /// `expr -> expr OR term | term`, `term -> term AND factor | factor`,
    /// `factor -> ( expr ) | IDENTIFIER`
    fn expression() -> Grammar {
        Grammar::define(|g| {
            g.rule("expr", [n("expr"), t(Or), n("term")])?;
            g.rule("expr", [n("term")])?;
            g.rule("term", [n("term"), t(And), n("factor")])?;
            g.rule("term", [n("factor")])?;
            g.rule("factor", [t(ParenOpen), n("expr"), t(ParenClose)])?;
            g.rule("factor", [t(Identifier)])?;
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn immediate_left_recursion() {
        let grammar = expression().remove_left_recursion().into_inner();
        assert_eq!(
            grammar.nonterminals().collect::<Vec<_>>(),
            ["expr", "expr_tail1", "term", "term_tail1", "factor"]
        );
        assert_eq!(
            alternatives(&grammar, "expr"),
            [vec![n("term"), n("expr_tail1")]]
        );
        assert_eq!(
            alternatives(&grammar, "expr_tail1"),
            [vec![], vec![t(Or), n("term"), n("expr_tail1")]]
        );
        assert_eq!(
            alternatives(&grammar, "term_tail1"),
            [vec![], vec![t(And), n("factor"), n("term_tail1")]]
        );
        assert_eq!(
            alternatives(&grammar, "factor"),
            alternatives(&expression(), "factor")
        );
    }

    #[test]
    fn indirect_left_recursion() {
        // a -> b x | y, b -> a z | w
        let grammar = Grammar::define(|g| {
            g.rule("a", [n("b"), t(Comma)])?;
            g.rule("a", [t(Star)])?;
            g.rule("b", [n("a"), t(Semicolon)])?;
            g.rule("b", [t(Equal)])?;
            Ok(())
        })
        .unwrap();
        let grammar = grammar.remove_left_recursion().into_inner();

        assert_eq!(
            grammar.nonterminals().collect::<Vec<_>>(),
            ["a", "b", "b_tail1"]
        );
        // b -> b x z | y z | w
        assert_eq!(
            alternatives(&grammar, "b"),
            [
                vec![t(Star), t(Semicolon), n("b_tail1")],
                vec![t(Equal), n("b_tail1")],
            ]
        );
        assert_eq!(
            alternatives(&grammar, "b_tail1"),
            [vec![], vec![t(Comma), t(Semicolon), n("b_tail1")]]
        );
        assert_eq!(
            alternatives(&grammar, "a"),
            [vec![t(Star)], vec![n("b"), t(Comma)]]
        );
    }

    #[test]
    fn processed_nonterminals_are_substituted() {
        let grammar = Grammar::define(|g| {
            g.rule("item", [t(Identifier)])?;
            g.rule("list", [n("item"), t(Comma), n("list")])?;
            g.rule("list", [n("item")])?;
            g.rule("pair", [t(ParenOpen), n("list"), t(ParenClose)])?;
            Ok(())
        })
        .unwrap();
        let removed = grammar.clone().remove_left_recursion().into_inner();

        assert_eq!(
            alternatives(&removed, "list"),
            [
                vec![t(Identifier)],
                vec![t(Identifier), t(Comma), n("list")],
            ]
        );
        assert_eq!(alternatives(&removed, "item"), alternatives(&grammar, "item"));
        assert_eq!(alternatives(&removed, "pair"), alternatives(&grammar, "pair"));
    }

    #[test]
    fn substitution_exposes_common_prefixes() {
        // a -> IDENTIFIER , ; s -> a | IDENTIFIER
        let grammar = Grammar::define(|g| {
            g.rule("a", [t(Identifier), t(Comma)])?;
            g.rule("s", [n("a")])?;
            g.rule("s", [t(Identifier)])?;
            g.start_symbol("s")?;
            Ok(())
        })
        .unwrap();

        let removed = grammar.remove_left_recursion();
        assert_eq!(
            alternatives(removed.grammar(), "s"),
            [vec![t(Identifier)], vec![t(Identifier), t(Comma)]]
        );

        let grammar = removed.left_factor().into_inner();
        assert_eq!(
            grammar.nonterminals().collect::<Vec<_>>(),
            ["a", "s", "s_rest1"]
        );
        assert_eq!(
            alternatives(&grammar, "s"),
            [vec![t(Identifier), n("s_rest1")]]
        );
        assert_eq!(
            alternatives(&grammar, "s_rest1"),
            [vec![], vec![t(Comma)]]
        );
    }

    #[test]
    fn fresh_names_do_not_collide() {
        let grammar = Grammar::define(|g| {
            g.rule("e", [n("e"), t(Star)])?;
            g.rule("e", [n("e_tail1")])?;
            g.rule("e_tail1", [t(Identifier)])?;
            Ok(())
        })
        .unwrap();
        let grammar = grammar.remove_left_recursion().into_inner();
        assert_eq!(
            grammar.nonterminals().collect::<Vec<_>>(),
            ["e", "e_tail2", "e_tail1"]
        );
        assert_eq!(
            alternatives(&grammar, "e"),
            [vec![n("e_tail1"), n("e_tail2")]]
        );
    }

    #[test]
    fn fresh_names_skip_undefined_references() {
        let grammar = Grammar::define(|g| {
            g.rule("e", [n("e"), t(Star)])?;
            g.rule("e", [n("e_tail1")])?;
            Ok(())
        })
        .unwrap();
        let normalized = grammar.normalize();
        assert_eq!(
            normalized.grammar().nonterminals().collect::<Vec<_>>(),
            ["e", "e_tail2"]
        );
        assert!(matches!(
            normalized.resolve(),
            Err(crate::grammar::GrammarError::UndefinedNonterminal { ref name, .. })
                if name == "e_tail1"
        ));
    }

    #[test]
    fn left_factoring() {
        // s -> SELECT a , b | SELECT a , c | SELECT a | INSERT
        let grammar = Grammar::define(|g| {
            g.rule("s", [t(Select), n("a"), t(Comma), n("b")])?;
            g.rule("s", [t(Select), n("a"), t(Comma), n("c")])?;
            g.rule("s", [t(Select), n("a")])?;
            g.rule("s", [t(Insert)])?;
            g.rule("a", [t(Identifier)])?;
            g.rule("b", [t(IntConstant)])?;
            g.rule("c", [t(CharConstant)])?;
            Ok(())
        })
        .unwrap();
        let grammar = grammar.normalize().into_inner();

        assert_eq!(
            grammar.nonterminals().collect::<Vec<_>>(),
            ["s", "s_rest2", "s_rest1", "a", "b", "c"]
        );
        assert_eq!(
            alternatives(&grammar, "s"),
            [vec![t(Select), n("a"), n("s_rest2")], vec![t(Insert)]]
        );
        assert_eq!(
            alternatives(&grammar, "s_rest2"),
            [vec![], vec![t(Comma), n("s_rest1")]]
        );
        assert_eq!(
            alternatives(&grammar, "s_rest1"),
            [vec![n("b")], vec![n("c")]]
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = expression().normalize().into_inner();
        let twice = once.clone().normalize().into_inner();
        assert_eq!(once, twice);
        assert_eq!(once.to_string(), twice.to_string());

        let removed = expression().remove_left_recursion().into_inner();
        let removed_twice = removed.clone().remove_left_recursion().into_inner();
        assert_eq!(removed.to_string(), removed_twice.to_string());
    }

    #[test]
    fn start_symbol_is_preserved() {
        let grammar = expression().normalize().into_inner();
        assert_eq!(grammar.start_symbol(), "expr");
    }
}
