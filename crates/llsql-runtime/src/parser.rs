//! Parser.

use crate::{
    definition::{ParseAction, ParserDef, Recovery, Symbol},
    lexer::{LexError, Lexer},
    token::{Location, Token, TokenKind},
};

/// The predictive parser driven based on the generated parse table.
#[derive(Debug)]
pub struct Parser<TDef, I> {
    definition: TDef,
    lexer: Lexer<I>,
    stack: Vec<Symbol>,
    lookahead: Option<Token>,
    unrecoverable: bool,
}

impl<TDef, I> Parser<TDef, I>
where
    TDef: ParserDef,
    I: Iterator<Item = char>,
{
    /// Create an instance of `Parser` recognizing the SQL tokens of `source`.
    pub fn new(definition: TDef, source: I) -> Self {
        Self::with_lexer(definition, Lexer::new(source))
    }

    pub fn with_lexer(definition: TDef, lexer: Lexer<I>) -> Self {
        let stack = initial_stack(&definition);
        Self {
            definition,
            lexer,
            stack,
            lookahead: None,
            unrecoverable: false,
        }
    }

    pub fn definition(&self) -> &TDef {
        &self.definition
    }

    /// Start over on a new source, keeping the parse table.
    pub fn reopen(&mut self, source: I) {
        self.lexer.reopen(source);
        self.stack = initial_stack(&self.definition);
        self.lookahead = None;
        self.unrecoverable = false;
    }

    /// Whether the last error cannot be recovered from.
    ///
    /// Once set, the parser refuses to continue until [`reopen`](Self::reopen)
    /// is called.
    pub fn is_unrecoverable(&self) -> bool {
        self.unrecoverable
    }

    /// Whether the whole input has been recognized.
    pub fn is_accepted(&self) -> bool {
        self.stack.is_empty()
    }

    fn fetch(&mut self) -> Result<Token, ParseError> {
        if let Some(token) = self.lookahead.take() {
            return Ok(token);
        }
        self.lexer.next_token().map_err(|err| {
            self.unrecoverable = true;
            ParseError::Lex(err)
        })
    }

    /// Drive the parser until the input is recognized or an error occurs.
    ///
    /// After a recoverable error, the recovery has already been applied and
    /// calling this method again resumes the parse.
    pub fn continue_parse(&mut self) -> Result<(), ParseError> {
        if self.unrecoverable {
            return Err(ParseError::Aborted);
        }

        while let Some(top) = self.stack.last().copied() {
            let token = self.fetch()?;

            match top {
                Symbol::T(expected) if expected == token.kind => {
                    tracing::trace!("match {}", token);
                    self.stack.pop();
                }

                Symbol::T(expected) => {
                    let err = SyntaxError {
                        location: token.location,
                        message: format!("expected {}, found {}", expected, token),
                    };
                    if token.kind == TokenKind::Eoi {
                        self.unrecoverable = true;
                        self.lookahead = Some(token);
                    }
                    return Err(err.into());
                }

                Symbol::N(nonterminal) => match self.definition.action(nonterminal, token.kind) {
                    ParseAction::Expand(alternative) => {
                        let symbols = self.definition.alternative(nonterminal, alternative);
                        tracing::trace!(
                            "expand {} with {:?} on {}",
                            self.definition.nonterminal_name(nonterminal),
                            alternative,
                            token.kind
                        );
                        self.stack.pop();
                        self.stack.extend(symbols.iter().rev().copied());
                        self.lookahead = Some(token);
                    }

                    ParseAction::Recover(recovery) => {
                        let err = SyntaxError {
                            location: token.location,
                            message: format!(
                                "unexpected {} while parsing {}",
                                token,
                                self.definition.nonterminal_name(nonterminal)
                            ),
                        };
                        tracing::trace!("recover by {:?}: {}", recovery, err);
                        match recovery {
                            Recovery::Pop => {
                                self.stack.pop();
                                self.lookahead = Some(token);
                            }
                            Recovery::Scan => {}
                        }
                        return Err(err.into());
                    }
                },
            }
        }

        Ok(())
    }
}

fn initial_stack<TDef: ParserDef>(definition: &TDef) -> Vec<Symbol> {
    vec![
        Symbol::T(TokenKind::Eoi),
        Symbol::N(definition.start_symbol()),
    ]
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} at {location}")]
pub struct SyntaxError {
    pub location: Location,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("lexical error: {}", _0)]
    Lex(#[from] LexError),

    #[error("syntax error: {}", _0)]
    Syntax(#[from] SyntaxError),

    #[error("parsing has been aborted by an unrecoverable error")]
    Aborted,
}
