//! Finite automata driven by the lexer.
//!
//! Each lexical category is recognized by one deterministic automaton. The
//! lexer feeds every automaton the same characters in lockstep, so an
//! automaton only has to answer two questions after each character: whether
//! it is in an accepting state, and whether it has failed for good.

use crate::token::TokenKind;
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct StateID {
    raw: u16,
}

impl StateID {
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:02}", self.raw)
    }
}

/// The definition of a deterministic finite automaton.
pub trait Dfa: fmt::Debug {
    fn initial_state(&self) -> StateID;

    /// Return whether the character may appear anywhere in an accepted string.
    ///
    /// Characters outside of the alphabet fail the automaton immediately.
    fn is_alphabet(&self, ch: char) -> bool;

    /// Return the next state, or `None` if the automaton can never accept
    /// after reading `ch` in the `current` state.
    fn transition(&self, current: StateID, ch: char) -> Option<StateID>;

    fn accept_states(&self) -> &[StateID];
}

/// A running instance of a [`Dfa`], tagged with the token kind it recognizes.
#[derive(Debug)]
pub struct Automaton {
    kind: TokenKind,
    dfa: Box<dyn Dfa + Send + Sync>,
    current: StateID,
    failed: bool,
}

impl Automaton {
    pub fn new<D>(kind: TokenKind, dfa: D) -> Self
    where
        D: Dfa + Send + Sync + 'static,
    {
        let current = dfa.initial_state();
        Self {
            kind,
            dfa: Box::new(dfa),
            current,
            failed: false,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn reset(&mut self) {
        self.current = self.dfa.initial_state();
        self.failed = false;
    }

    /// Advance the automaton by one character.
    ///
    /// Once failed, the automaton ignores any further input until reset.
    pub fn feed(&mut self, ch: char) {
        if self.failed {
            return;
        }
        if !self.dfa.is_alphabet(ch) {
            self.failed = true;
            return;
        }
        match self.dfa.transition(self.current, ch) {
            Some(next) => self.current = next,
            None => self.failed = true,
        }
    }

    pub fn is_accepting(&self) -> bool {
        !self.failed && self.dfa.accept_states().contains(&self.current)
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }
}

/// Matches a fixed word, ignoring ASCII case.
///
/// The state number is the length of the matched prefix.
#[derive(Debug)]
pub struct Keyword {
    word: &'static str,
    accept: [StateID; 1],
}

impl Keyword {
    pub fn new(word: &'static str) -> Self {
        debug_assert!(!word.is_empty() && word.is_ascii());
        Self {
            word,
            accept: [StateID::from_raw(word.len() as u16)],
        }
    }
}

impl Dfa for Keyword {
    fn initial_state(&self) -> StateID {
        StateID::from_raw(0)
    }

    fn is_alphabet(&self, ch: char) -> bool {
        self.word.chars().any(|c| c.eq_ignore_ascii_case(&ch))
    }

    fn transition(&self, current: StateID, ch: char) -> Option<StateID> {
        let pos = current.into_raw() as usize;
        let expected = *self.word.as_bytes().get(pos)?;
        (char::from(expected).eq_ignore_ascii_case(&ch)).then(|| StateID::from_raw(pos as u16 + 1))
    }

    fn accept_states(&self) -> &[StateID] {
        &self.accept
    }
}

const START: StateID = StateID::from_raw(0);

/// `alpha (alpha | digit)*`
#[derive(Debug)]
pub struct Identifier;

impl Identifier {
    const BODY: StateID = StateID::from_raw(1);
}

impl Dfa for Identifier {
    fn initial_state(&self) -> StateID {
        START
    }

    fn is_alphabet(&self, ch: char) -> bool {
        ch.is_ascii_alphanumeric()
    }

    fn transition(&self, current: StateID, ch: char) -> Option<StateID> {
        match current {
            START if ch.is_ascii_alphabetic() => Some(Self::BODY),
            Self::BODY => Some(Self::BODY),
            _ => None,
        }
    }

    fn accept_states(&self) -> &[StateID] {
        &[Self::BODY]
    }
}

/// `(+|-)? digit+`
#[derive(Debug)]
pub struct IntConstant;

impl IntConstant {
    const SIGN: StateID = StateID::from_raw(1);
    const DIGITS: StateID = StateID::from_raw(2);
}

impl Dfa for IntConstant {
    fn initial_state(&self) -> StateID {
        START
    }

    fn is_alphabet(&self, ch: char) -> bool {
        ch.is_ascii_digit() || ch == '+' || ch == '-'
    }

    fn transition(&self, current: StateID, ch: char) -> Option<StateID> {
        match current {
            START if ch == '+' || ch == '-' => Some(Self::SIGN),
            START | Self::SIGN | Self::DIGITS if ch.is_ascii_digit() => Some(Self::DIGITS),
            _ => None,
        }
    }

    fn accept_states(&self) -> &[StateID] {
        &[Self::DIGITS]
    }
}

/// `(+|-)? digit+ ('.' digit+)? ((e|E) (+|-)? digit+)?`
///
/// Plain integers are accepted too; the lexer registers [`IntConstant`]
/// first so that they are reported as integers.
#[derive(Debug)]
pub struct NumberConstant;

impl NumberConstant {
    const SIGN: StateID = StateID::from_raw(1);
    const INTEGRAL: StateID = StateID::from_raw(2);
    const POINT: StateID = StateID::from_raw(3);
    const FRACTION: StateID = StateID::from_raw(4);
    const EXP_MARK: StateID = StateID::from_raw(5);
    const EXP_SIGN: StateID = StateID::from_raw(6);
    const EXPONENT: StateID = StateID::from_raw(7);
}

impl Dfa for NumberConstant {
    fn initial_state(&self) -> StateID {
        START
    }

    fn is_alphabet(&self, ch: char) -> bool {
        matches!(ch, '0'..='9' | '+' | '-' | '.' | 'e' | 'E')
    }

    fn transition(&self, current: StateID, ch: char) -> Option<StateID> {
        let digit = ch.is_ascii_digit();
        let sign = ch == '+' || ch == '-';
        match current {
            START if sign => Some(Self::SIGN),
            START | Self::SIGN | Self::INTEGRAL if digit => Some(Self::INTEGRAL),
            Self::INTEGRAL if ch == '.' => Some(Self::POINT),
            Self::POINT | Self::FRACTION if digit => Some(Self::FRACTION),
            Self::INTEGRAL | Self::FRACTION if ch == 'e' || ch == 'E' => Some(Self::EXP_MARK),
            Self::EXP_MARK if sign => Some(Self::EXP_SIGN),
            Self::EXP_MARK | Self::EXP_SIGN | Self::EXPONENT if digit => Some(Self::EXPONENT),
            _ => None,
        }
    }

    fn accept_states(&self) -> &[StateID] {
        &[Self::INTEGRAL, Self::FRACTION, Self::EXPONENT]
    }
}

/// A run of characters enclosed in `'` or `"`.
///
/// The opening quote decides the closing one; the other quote character may
/// appear unescaped inside.
#[derive(Debug)]
pub struct CharConstant;

impl CharConstant {
    const IN_SINGLE: StateID = StateID::from_raw(1);
    const IN_DOUBLE: StateID = StateID::from_raw(2);
    const CLOSED: StateID = StateID::from_raw(3);
}

impl Dfa for CharConstant {
    fn initial_state(&self) -> StateID {
        START
    }

    fn is_alphabet(&self, _: char) -> bool {
        true
    }

    fn transition(&self, current: StateID, ch: char) -> Option<StateID> {
        match (current, ch) {
            (START, '\'') => Some(Self::IN_SINGLE),
            (START, '"') => Some(Self::IN_DOUBLE),
            (Self::IN_SINGLE, '\'') | (Self::IN_DOUBLE, '"') => Some(Self::CLOSED),
            (Self::IN_SINGLE, _) => Some(Self::IN_SINGLE),
            (Self::IN_DOUBLE, _) => Some(Self::IN_DOUBLE),
            _ => None,
        }
    }

    fn accept_states(&self) -> &[StateID] {
        &[Self::CLOSED]
    }
}
