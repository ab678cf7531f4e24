//! Syntax tree for the parts of a Go file that matter to constant discovery

use crate::error::Position;
use std::fmt;

/// An identifier occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub pos: Position,
}

impl Ident {
    pub fn new(name: impl Into<String>, pos: Position) -> Self {
        Self { name: name.into(), pos }
    }

    /// The blank identifier `_`
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }

    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(char::is_uppercase)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One parsed source file
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub package: Ident,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
}

impl File {
    /// Top-level constant declarations, in source order
    pub fn const_decls(&self) -> impl Iterator<Item = &ConstDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Const(c) => Some(c),
            _ => None,
        })
    }

    /// Top-level type declarations, in source order
    pub fn type_decls(&self) -> impl Iterator<Item = &TypeDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Type(t) => Some(t),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    /// Explicit local name, including `.` and `_`
    pub name: Option<Ident>,
    pub path: String,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Const(ConstDecl),
    Type(TypeDecl),
    /// A `var` or `func` declaration, skipped without being parsed
    Skipped { keyword: String, pos: Position },
}

/// `const X = ...` or `const ( ... )`
#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    pub pos: Position,
    pub grouped: bool,
    pub specs: Vec<ConstSpec>,
}

/// `IdentList [Type] [= ExprList]`
#[derive(Debug, Clone, PartialEq)]
pub struct ConstSpec {
    pub names: Vec<Ident>,
    pub typ: Option<TypeName>,
    pub values: Vec<Expr>,
}

/// A possibly package-qualified type name such as `Color` or `colors.Color`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    pub qualifier: Option<Ident>,
    pub name: Ident,
}

impl TypeName {
    pub fn pos(&self) -> Position {
        self.qualifier.as_ref().map_or(self.name.pos, |q| q.pos)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}.{}", q, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub pos: Position,
    pub specs: Vec<TypeSpec>,
}

/// `Name [=] Type`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: Ident,
    pub alias: bool,
    pub typ: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Name(TypeName),
    /// Composite, generic or otherwise structural type that is not tracked
    Other(Position),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Rune,
    String,
}

/// A literal; `value` is the source text for numbers and the decoded text for
/// runes and strings
#[derive(Debug, Clone, PartialEq)]
pub struct BasicLit {
    pub kind: LitKind,
    pub value: String,
    pub pos: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
    Complement,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Complement => "^",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    LogOr,
    LogAnd,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Or,
    Xor,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    And,
    AndNot,
}

impl BinaryOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "||" => BinaryOp::LogOr,
            "&&" => BinaryOp::LogAnd,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "|" => BinaryOp::Or,
            "^" => BinaryOp::Xor,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            "&" => BinaryOp::And,
            "&^" => BinaryOp::AndNot,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::LogOr => "||",
            BinaryOp::LogAnd => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::And => "&",
            BinaryOp::AndNot => "&^",
        }
    }

    /// Go operator precedence, 5 binds tightest
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::LogOr => 1,
            BinaryOp::LogAnd => 2,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 3,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Or | BinaryOp::Xor => 4,
            BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Rem
            | BinaryOp::Shl
            | BinaryOp::Shr
            | BinaryOp::And
            | BinaryOp::AndNot => 5,
        }
    }

    pub fn is_comparison(&self) -> bool {
        self.precedence() == 3
    }
}

/// Constant expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(Ident),
    Selector { qualifier: Ident, name: Ident },
    Lit(BasicLit),
    Unary { op: UnaryOp, operand: Box<Expr>, pos: Position },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr>, pos: Position },
    Paren(Box<Expr>),
    Call { func: Box<Expr>, args: Vec<Expr>, pos: Position },
}

impl Expr {
    pub fn pos(&self) -> Position {
        match self {
            Expr::Ident(ident) => ident.pos,
            Expr::Selector { qualifier, .. } => qualifier.pos,
            Expr::Lit(lit) => lit.pos,
            Expr::Unary { pos, .. } | Expr::Binary { pos, .. } | Expr::Call { pos, .. } => *pos,
            Expr::Paren(inner) => inner.pos(),
        }
    }

    /// Interpret the expression as a type name, as in the callee of a conversion
    pub fn as_type_name(&self) -> Option<TypeName> {
        match self {
            Expr::Ident(name) => Some(TypeName { qualifier: None, name: name.clone() }),
            Expr::Selector { qualifier, name } => {
                Some(TypeName { qualifier: Some(qualifier.clone()), name: name.clone() })
            }
            Expr::Paren(inner) => inner.as_type_name(),
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(ident) => write!(f, "{}", ident),
            Expr::Selector { qualifier, name } => write!(f, "{}.{}", qualifier, name),
            Expr::Lit(lit) => match lit.kind {
                LitKind::String => write!(f, "{:?}", lit.value),
                LitKind::Rune => write!(f, "'{}'", lit.value.escape_default()),
                _ => f.write_str(&lit.value),
            },
            Expr::Unary { op, operand, .. } => write!(f, "{}{}", op.symbol(), operand),
            Expr::Binary { op, lhs, rhs, .. } => write!(f, "{} {} {}", lhs, op.symbol(), rhs),
            Expr::Paren(inner) => write!(f, "({})", inner),
            Expr::Call { func, args, .. } => {
                write!(f, "{}(", func)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}
