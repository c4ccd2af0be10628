//! Runtime implementation for the `llsql` grammar compiler.
//!
//! This crate contains everything needed to recognize input once a parse
//! table has been compiled: the token model, the multi-automaton lexer and
//! the predictive parser.

pub mod automaton;
pub mod definition;
pub mod lexer;
pub mod parser;
pub mod token;

pub use crate::{
    definition::{ParseAction, ParserDef},
    lexer::{LexError, Lexer},
    parser::{ParseError, Parser, SyntaxError},
    token::{Location, Token, TokenKind},
};
