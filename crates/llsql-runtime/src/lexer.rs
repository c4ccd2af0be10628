//! Longest-match tokenizer running several automata in lockstep.

use crate::{
    automaton::{Automaton, CharConstant, Identifier, IntConstant, Keyword, NumberConstant},
    token::{Location, Token, TokenKind},
};
use std::collections::VecDeque;

/// The automata recognizing the SQL subset, in priority order.
///
/// When several automata accept a lexeme of the same length, the one
/// registered first wins.
pub fn sql_automata() -> Vec<Automaton> {
    let keywords = {
        use TokenKind::*;
        [
            (Create, "CREATE"),
            (Table, "TABLE"),
            (Select, "SELECT"),
            (Insert, "INSERT"),
            (Values, "VALUES"),
            (Into, "INTO"),
            (Primary, "PRIMARY"),
            (Key, "KEY"),
            (From, "FROM"),
            (Where, "WHERE"),
            (Between, "BETWEEN"),
            (Like, "LIKE"),
            (In, "IN"),
            (And, "AND"),
            (Or, "OR"),
            (Not, "NOT"),
            (Star, "*"),
            (Equal, "="),
            (Greater, ">"),
            (Less, "<"),
            (ParenOpen, "("),
            (ParenClose, ")"),
            (Comma, ","),
            (Semicolon, ";"),
            (Int, "INT"),
            (Int, "INTEGER"),
            (Char, "CHAR"),
            (Char, "VARCHAR"),
            (Number, "NUMBER"),
            (Number, "NUMERIC"),
            (Number, "FLOAT"),
            (Number, "DOUBLE"),
        ]
    };

    let mut automata: Vec<Automaton> = keywords
        .into_iter()
        .map(|(kind, word)| Automaton::new(kind, Keyword::new(word)))
        .collect();
    automata.extend([
        Automaton::new(TokenKind::IntConstant, IntConstant),
        Automaton::new(TokenKind::CharConstant, CharConstant),
        Automaton::new(TokenKind::NumberConstant, NumberConstant),
        Automaton::new(TokenKind::Identifier, Identifier),
    ]);
    automata
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} at {location}")]
pub struct LexError {
    pub location: Location,
    pub message: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Position {
    line: usize,
    column: usize,
}

impl Position {
    const START: Self = Self { line: 1, column: 1 };
}

/// A tokenizer over a character source.
#[derive(Debug)]
pub struct Lexer<I> {
    source: I,
    automata: Vec<Automaton>,
    pushback: VecDeque<(char, Position)>,
    cursor: Position,
}

impl<I> Lexer<I>
where
    I: Iterator<Item = char>,
{
    /// Create a lexer recognizing the SQL subset.
    pub fn new(source: I) -> Self {
        Self::with_automata(sql_automata(), source)
    }

    pub fn with_automata(automata: Vec<Automaton>, source: I) -> Self {
        Self {
            source,
            automata,
            pushback: VecDeque::new(),
            cursor: Position::START,
        }
    }

    /// Restart tokenizing on a new source.
    pub fn reopen(&mut self, source: I) {
        self.source = source;
        self.pushback.clear();
        self.cursor = Position::START;
        for automaton in &mut self.automata {
            automaton.reset();
        }
    }

    fn next_char(&mut self) -> Option<(char, Position)> {
        if let Some(c) = self.pushback.pop_front() {
            return Some(c);
        }
        let ch = self.source.next()?;
        let pos = self.cursor;
        if ch == '\n' {
            self.cursor.line += 1;
            self.cursor.column = 1;
        } else {
            self.cursor.column += 1;
        }
        Some((ch, pos))
    }

    fn feed(&mut self, ch: char) {
        for automaton in &mut self.automata {
            automaton.feed(ch);
        }
    }

    /// Return the next token.
    ///
    /// Once the source is exhausted, every call returns an `EOI` token.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let first = loop {
            match self.next_char() {
                Some((ch, _)) if ch.is_whitespace() || ch == '\0' => continue,
                Some(c) => break c,
                None => {
                    let pos = self.cursor;
                    return Ok(Token::eoi(Location {
                        line: pos.line,
                        start_column: pos.column,
                        end_column: pos.column,
                    }));
                }
            }
        };

        for automaton in &mut self.automata {
            automaton.reset();
        }

        let mut scanned = vec![first];
        let mut candidate: Option<(TokenKind, usize)> = None;
        self.feed(first.0);
        loop {
            if let Some(accepted) = self.automata.iter().find(|a| a.is_accepting()) {
                candidate = Some((accepted.kind(), scanned.len()));
            }
            if self.automata.iter().all(|a| a.is_failed()) {
                break;
            }
            match self.next_char() {
                Some(c) => {
                    scanned.push(c);
                    self.feed(c.0);
                }
                None => break,
            }
        }

        let Some((kind, len)) = candidate else {
            let text: String = scanned.iter().map(|(ch, _)| ch).collect();
            let location = span(&scanned);
            for c in scanned.drain(1..).rev() {
                self.pushback.push_front(c);
            }
            return Err(LexError {
                location,
                message: format!("unrecognized character sequence {:?}", text),
            });
        };

        for c in scanned.drain(len..).rev() {
            self.pushback.push_front(c);
        }
        let token = Token {
            kind,
            lexeme: scanned.iter().map(|(ch, _)| ch).collect(),
            location: span(&scanned),
        };
        tracing::trace!("token: {} at {}", token, token.location);
        Ok(token)
    }
}

fn span(scanned: &[(char, Position)]) -> Location {
    let (start, end) = match (scanned.first(), scanned.last()) {
        (Some((_, start)), Some((_, end))) => (*start, *end),
        _ => return Location::default(),
    };
    Location {
        line: start.line,
        start_column: start.column,
        end_column: if end.line == start.line {
            end.column
        } else {
            start.column
        },
    }
}
