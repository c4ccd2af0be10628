//! LL(1) parse table.

use crate::{cfg::Rules, grammar::GrammarError, sets::Sets};
use llsql_runtime::{
    definition::{AlternativeID, NonterminalID, ParseAction, ParserDef, Recovery, Symbol},
    TokenKind,
};
use std::fmt;

/// The dense `nonterminal × token kind` table driving the parser.
#[derive(Debug, Clone)]
pub struct ParseTable {
    rules: Rules,
    sets: Sets,
    cells: Vec<ParseAction>,
}

impl ParseTable {
    /// Build the table from resolved rules and their FIRST/FOLLOW sets.
    ///
    /// A cell that would receive two different alternatives is reported as
    /// an error rather than resolved.
    #[tracing::instrument(skip_all)]
    pub fn generate(rules: Rules, sets: Sets) -> Result<Self, GrammarError> {
        let mut cells = Vec::with_capacity(rules.len() * TokenKind::COUNT);
        for id in rules.nonterminals() {
            let follow = sets.follow(id);
            cells.extend(TokenKind::ALL.iter().map(|kind| {
                if *kind == TokenKind::Eoi || follow.contains(*kind) {
                    ParseAction::Recover(Recovery::Pop)
                } else {
                    ParseAction::Recover(Recovery::Scan)
                }
            }));
        }

        let mut table = Self { rules, sets, cells };
        let mut num_expands = 0;
        let ids: Vec<NonterminalID> = table.rules.nonterminals().collect();
        for id in ids {
            for alternative in 0..table.rules.alternatives(id).len() {
                let alternative = AlternativeID::from_raw(alternative as u16);
                let mut lookaheads = table
                    .sets
                    .composite_first(table.rules.alternative(id, alternative));
                if lookaheads.remove(TokenKind::None) {
                    lookaheads.union_with(table.sets.follow(id));
                }
                for kind in lookaheads.iter() {
                    table.expand(id, kind, alternative)?;
                    num_expands += 1;
                }
            }
        }

        tracing::debug!(
            "generated a parse table with {} rows ({} expansions)",
            table.rules.len(),
            num_expands
        );
        Ok(table)
    }

    fn expand(
        &mut self,
        id: NonterminalID,
        kind: TokenKind,
        alternative: AlternativeID,
    ) -> Result<(), GrammarError> {
        let index = id.index() * TokenKind::COUNT + kind.index();
        let current = self.cells[index];
        match current {
            ParseAction::Expand(existing) if existing != alternative => {
                tracing::error!(
                    "conflicting parse table entry at ({}, {}): {} and {}",
                    self.rules.name(id),
                    kind,
                    self.rules
                        .display_alternative(id, self.rules.alternative(id, existing)),
                    self.rules
                        .display_alternative(id, self.rules.alternative(id, alternative)),
                );
                Err(GrammarError::TableConflict {
                    nonterminal: self.rules.name(id).to_owned(),
                    terminal: kind,
                    existing,
                    new: alternative,
                })
            }
            _ => {
                self.cells[index] = ParseAction::Expand(alternative);
                Ok(())
            }
        }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn sets(&self) -> &Sets {
        &self.sets
    }

    /// The action for `id` on the lookahead `kind`.
    ///
    /// Panics if `id` is not a nonterminal of this table.
    pub fn get(&self, id: NonterminalID, kind: TokenKind) -> ParseAction {
        assert!(
            id.index() < self.rules.len(),
            "nonterminal {:?} is out of range ({} rows)",
            id,
            self.rules.len()
        );
        self.cells[id.index() * TokenKind::COUNT + kind.index()]
    }
}

impl ParserDef for ParseTable {
    fn start_symbol(&self) -> NonterminalID {
        self.rules.start_symbol()
    }

    fn action(&self, nonterminal: NonterminalID, lookahead: TokenKind) -> ParseAction {
        self.get(nonterminal, lookahead)
    }

    fn alternative(&self, nonterminal: NonterminalID, alternative: AlternativeID) -> &[Symbol] {
        self.rules.alternative(nonterminal, alternative)
    }

    fn nonterminal_name(&self, nonterminal: NonterminalID) -> &str {
        self.rules.name(nonterminal)
    }
}

/// Lists the expansions and pop recoveries of every nonterminal.
/// Cells not listed recover by scanning.
impl fmt::Display for ParseTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in self.rules.nonterminals() {
            writeln!(f, "{}", self.rules.name(id))?;
            for kind in TokenKind::terminals() {
                match self.get(id, kind) {
                    ParseAction::Expand(alternative) => writeln!(
                        f,
                        "  {:<16} => {}",
                        kind.name(),
                        self.rules
                            .display_alternative(id, self.rules.alternative(id, alternative))
                    )?,
                    ParseAction::Recover(Recovery::Pop) => {
                        writeln!(f, "  {:<16} => (pop)", kind.name())?
                    }
                    ParseAction::Recover(Recovery::Scan) => (),
                }
            }
        }
        Ok(())
    }
}
