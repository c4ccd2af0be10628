//! Token kinds and source locations.

use std::fmt;

/// The lexical categories recognized by the lexer.
///
/// The declaration order is significant: it is the canonical order used when
/// grammar alternatives are sorted, and `NONE`/`EOI` are reserved sentinels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TokenKind {
    /// The epsilon marker. Never produced by the lexer.
    None,

    // keywords
    Create,
    Table,
    Select,
    Insert,
    Values,
    Into,
    Primary,
    Key,
    From,
    Where,
    Between,
    Like,
    In,
    And,
    Or,
    Not,

    // punctuations
    Star,
    Equal,
    Greater,
    Less,
    ParenOpen,
    ParenClose,
    Comma,
    Semicolon,

    // type keywords
    Int,
    Char,
    Number,

    // literals
    IntConstant,
    CharConstant,
    NumberConstant,

    Identifier,

    /// The end of input.
    Eoi,
}

impl TokenKind {
    /// The number of token kinds, sentinels included.
    pub const COUNT: usize = Self::Eoi as usize + 1;

    /// All token kinds in declaration order.
    pub const ALL: [TokenKind; Self::COUNT] = {
        use TokenKind::*;
        [
            None,
            Create,
            Table,
            Select,
            Insert,
            Values,
            Into,
            Primary,
            Key,
            From,
            Where,
            Between,
            Like,
            In,
            And,
            Or,
            Not,
            Star,
            Equal,
            Greater,
            Less,
            ParenOpen,
            ParenClose,
            Comma,
            Semicolon,
            Int,
            Char,
            Number,
            IntConstant,
            CharConstant,
            NumberConstant,
            Identifier,
            Eoi,
        ]
    };

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Iterate over the kinds that can appear as a lookahead, i.e. all of them
    /// except the epsilon marker.
    pub fn terminals() -> impl Iterator<Item = TokenKind> {
        Self::ALL.into_iter().filter(|kind| *kind != TokenKind::None)
    }

    pub const fn name(self) -> &'static str {
        use TokenKind::*;
        match self {
            None => "NONE",
            Create => "CREATE",
            Table => "TABLE",
            Select => "SELECT",
            Insert => "INSERT",
            Values => "VALUES",
            Into => "INTO",
            Primary => "PRIMARY",
            Key => "KEY",
            From => "FROM",
            Where => "WHERE",
            Between => "BETWEEN",
            Like => "LIKE",
            In => "IN",
            And => "AND",
            Or => "OR",
            Not => "NOT",
            Star => "`*`",
            Equal => "`=`",
            Greater => "`>`",
            Less => "`<`",
            ParenOpen => "`(`",
            ParenClose => "`)`",
            Comma => "`,`",
            Semicolon => "`;`",
            Int => "INT",
            Char => "CHAR",
            Number => "NUMBER",
            IntConstant => "INT_CONSTANT",
            CharConstant => "CHAR_CONSTANT",
            NumberConstant => "NUMBER_CONSTANT",
            Identifier => "IDENTIFIER",
            Eoi => "EOI",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The position of a lexeme in the source.
///
/// Lines and columns are 1-based. A column of zero means that it is unknown.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Location {
    pub line: usize,
    pub start_column: usize,
    pub end_column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}", self.line)?;
        match (self.start_column, self.end_column) {
            (0, _) => Ok(()),
            (start, end) if end > start => write!(f, ", columns {}-{}", start, end),
            (start, _) => write!(f, ", column {}", start),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub location: Location,
}

impl Token {
    pub(crate) fn eoi(location: Location) -> Self {
        Self {
            kind: TokenKind::Eoi,
            lexeme: String::new(),
            location,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eoi => f.write_str("end of input"),
            kind => write!(f, "{} {:?}", kind, self.lexeme),
        }
    }
}
