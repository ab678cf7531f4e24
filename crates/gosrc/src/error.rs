use std::fmt;
use std::path::PathBuf;

/// Position in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub offset: usize, // Byte offset
    pub line: usize,   // Line number (1-based)
    pub column: usize, // Column number (1-based)
}

impl Position {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self { offset, line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Lexer errors
#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected character '{ch}' at {pos}")]
    UnexpectedChar { ch: char, pos: Position },

    #[error("Unterminated string at {pos}")]
    UnterminatedString { pos: Position },

    #[error("Unterminated raw string at {pos}")]
    UnterminatedRawString { pos: Position },

    #[error("Unterminated block comment at {pos}")]
    UnterminatedComment { pos: Position },

    #[error("Invalid escape sequence '\\{ch}' at {pos}")]
    InvalidEscape { ch: char, pos: Position },

    #[error("Invalid rune literal at {pos}")]
    InvalidRune { pos: Position },

    #[error("Invalid number literal '{lexeme}' at {pos}")]
    InvalidNumber { lexeme: String, pos: Position },
}

/// Parser errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Unexpected token {token:?} at {pos}")]
    UnexpectedToken { token: String, pos: Position },

    #[error("Expected {expected}, found {found} at {pos}")]
    Expected { expected: String, found: String, pos: Position },

    #[error("Unterminated declaration starting at {pos}")]
    UnterminatedDecl { pos: Position },

    #[error("Unsupported constant expression {what} at {pos}")]
    UnsupportedExpr { what: String, pos: Position },

    #[error("Lexer error: {0}")]
    LexError(#[from] LexError),
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// What went wrong while resolving a constant or type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckErrorKind {
    #[error("undefined: {0}")]
    Undefined(String),

    #[error("{0} is not a constant")]
    NotAConstant(String),

    #[error("{0} is not a type")]
    NotAType(String),

    #[error("{0} is not exported by package {1}")]
    Unexported(String, String),

    #[error("package {0} is not loaded")]
    PackageNotLoaded(String),

    #[error("initialization cycle through {0}")]
    Cycle(String),

    #[error("missing init expression for {0}")]
    MissingValue(String),

    #[error("extra init expression in constant declaration")]
    ExtraValue,

    #[error("division by zero")]
    DivisionByZero,

    #[error("constant overflow")]
    Overflow,

    #[error("invalid shift count {0}")]
    InvalidShift(String),

    #[error("invalid operation: {op} on {operand}")]
    InvalidOperation { op: String, operand: String },

    #[error("mismatched types {0} and {1}")]
    MismatchedTypes(String, String),

    #[error("cannot use {value} (type {from}) as {to} value")]
    NotAssignable { value: String, from: String, to: String },

    #[error("cannot convert {value} (type {from}) to {to}")]
    InvalidConversion { value: String, from: String, to: String },

    #[error("{0} truncated to integer")]
    Truncated(String),

    #[error("invalid literal {0}")]
    InvalidLiteral(String),

    #[error("unsupported constant expression: {0}")]
    Unsupported(String),
}

/// A resolution failure located in a specific file
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}:{}:{}: {kind}", file.display(), pos.line, pos.column)]
pub struct CheckError {
    pub file: PathBuf,
    pub pos: Position,
    pub kind: CheckErrorKind,
}

/// Errors raised while locating, reading or checking packages
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid package pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("No Go packages match '{pattern}'")]
    NoPackages { pattern: String },

    #[error("No Go source files in {}", dir.display())]
    NoGoFiles { dir: PathBuf },

    #[error("Found packages {first} and {second} in {}", dir.display())]
    MixedPackages { dir: PathBuf, first: String, second: String },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}
