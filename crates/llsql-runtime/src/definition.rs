//! Parser definition.

use crate::token::TokenKind;
use std::fmt;

/// The index of a nonterminal symbol in a compiled grammar.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NonterminalID {
    raw: u16,
}

impl NonterminalID {
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.raw as usize
    }
}

impl fmt::Debug for NonterminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N#{:03}", self.raw)
    }
}

/// The index of an alternative among those of one nonterminal.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct AlternativeID {
    raw: u16,
}

impl AlternativeID {
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.raw as usize
    }
}

impl fmt::Debug for AlternativeID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A#{:03}", self.raw)
    }
}

/// A grammar symbol.
///
/// Terminals sort before nonterminals, terminals by token kind and
/// nonterminals by index.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    T(TokenKind),
    N(NonterminalID),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Recovery {
    /// Drop the nonterminal on top of the stack.
    Pop,
    /// Drop the lookahead token.
    Scan,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ParseAction {
    Expand(AlternativeID),
    Recover(Recovery),
}

/// The trait for abstracting the generated LL(1) parse table.
pub trait ParserDef {
    /// Return the nonterminal the parse starts from.
    fn start_symbol(&self) -> NonterminalID;

    /// Return the action for the specified nonterminal on top of the stack
    /// and lookahead token kind.
    ///
    /// This function must be total over every nonterminal of the definition.
    fn action(&self, nonterminal: NonterminalID, lookahead: TokenKind) -> ParseAction;

    /// Return the symbols of an alternative, in order.
    fn alternative(&self, nonterminal: NonterminalID, alternative: AlternativeID) -> &[Symbol];

    /// Return the name of the nonterminal, used in diagnostics.
    fn nonterminal_name(&self, nonterminal: NonterminalID) -> &str;
}

impl<T: ?Sized> ParserDef for &T
where
    T: ParserDef,
{
    fn start_symbol(&self) -> NonterminalID {
        (**self).start_symbol()
    }

    fn action(&self, nonterminal: NonterminalID, lookahead: TokenKind) -> ParseAction {
        (**self).action(nonterminal, lookahead)
    }

    fn alternative(&self, nonterminal: NonterminalID, alternative: AlternativeID) -> &[Symbol] {
        (**self).alternative(nonterminal, alternative)
    }

    fn nonterminal_name(&self, nonterminal: NonterminalID) -> &str {
        (**self).nonterminal_name(nonterminal)
    }
}

impl<T: ?Sized> ParserDef for std::rc::Rc<T>
where
    T: ParserDef,
{
    fn start_symbol(&self) -> NonterminalID {
        (**self).start_symbol()
    }

    fn action(&self, nonterminal: NonterminalID, lookahead: TokenKind) -> ParseAction {
        (**self).action(nonterminal, lookahead)
    }

    fn alternative(&self, nonterminal: NonterminalID, alternative: AlternativeID) -> &[Symbol] {
        (**self).alternative(nonterminal, alternative)
    }

    fn nonterminal_name(&self, nonterminal: NonterminalID) -> &str {
        (**self).nonterminal_name(nonterminal)
    }
}

impl<T: ?Sized> ParserDef for std::sync::Arc<T>
where
    T: ParserDef,
{
    fn start_symbol(&self) -> NonterminalID {
        (**self).start_symbol()
    }

    fn action(&self, nonterminal: NonterminalID, lookahead: TokenKind) -> ParseAction {
        (**self).action(nonterminal, lookahead)
    }

    fn alternative(&self, nonterminal: NonterminalID, alternative: AlternativeID) -> &[Symbol] {
        (**self).alternative(nonterminal, alternative)
    }

    fn nonterminal_name(&self, nonterminal: NonterminalID) -> &str {
        (**self).nonterminal_name(nonterminal)
    }
}
