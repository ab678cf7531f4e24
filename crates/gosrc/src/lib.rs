pub mod ast;
pub mod check;
pub mod constant;
pub mod error;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod types;

// Re-export commonly used items
pub use ast::File;
pub use check::{Const, ConstFailure, TypesInfo};
pub use constant::Value;
pub use error::{CheckError, CheckErrorKind, LexError, LoadError, ParseError, Position, Result};
pub use lexer::Lexer;
pub use loader::{load, Loader, Package, Program, SourceFile, Unit};
pub use parser::Parser;
pub use types::{BasicKind, Named, PackageRef, Type};
