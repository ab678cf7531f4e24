use crate::ast::*;
use crate::error::{ParseError, Position, Result};
use crate::lexer::{Lexer, Token, TokenType};

/// Parser for the declaration-level structure of a Go file.
///
/// Package clause, imports, `const` and `type` declarations are parsed;
/// `var` and `func` declarations are skipped by delimiter balancing.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse_str(input: &str) -> Result<File> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize()?;
        let mut parser = Parser::new(tokens);
        parser.parse_file()
    }

    /// Parse a single constant expression
    pub fn parse_expr_str(input: &str) -> Result<Expr> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize()?;
        let mut parser = Parser::new(tokens);
        let expr = parser.parse_expr()?;
        parser.skip_semicolons();
        if !parser.is_at_end() {
            return Err(parser.unexpected());
        }
        Ok(expr)
    }

    pub fn parse_file(&mut self) -> Result<File> {
        self.skip_semicolons();
        self.expect_keyword("package")?;
        let package = self.expect_ident()?;
        self.expect_semi()?;

        let mut imports = Vec::new();
        while self.current_token()?.is_keyword("import") {
            self.parse_import_decl(&mut imports)?;
        }

        let mut decls = Vec::new();
        loop {
            self.skip_semicolons();
            if self.is_at_end() {
                break;
            }

            let token = self.current_token()?.clone();
            if token.is_keyword("const") {
                decls.push(Decl::Const(self.parse_const_decl()?));
            } else if token.is_keyword("type") {
                decls.push(Decl::Type(self.parse_type_decl()?));
            } else if token.is_keyword("var") || token.is_keyword("func") {
                self.skip_decl()?;
                decls.push(Decl::Skipped { keyword: token.lexeme, pos: token.pos });
            } else {
                return Err(ParseError::Expected {
                    expected: "declaration".to_string(),
                    found: describe(&token),
                    pos: token.pos,
                });
            }
        }

        Ok(File { package, imports, decls })
    }

    fn parse_import_decl(&mut self, imports: &mut Vec<ImportSpec>) -> Result<()> {
        self.advance(); // Skip 'import'

        if self.check(&TokenType::LParen) {
            self.advance();
            loop {
                self.skip_semicolons();
                if self.check(&TokenType::RParen) {
                    self.advance();
                    break;
                }
                imports.push(self.parse_import_spec()?);
                self.expect_semi()?;
            }
        } else {
            imports.push(self.parse_import_spec()?);
        }

        self.expect_semi()
    }

    fn parse_import_spec(&mut self) -> Result<ImportSpec> {
        let token = self.current_token()?.clone();
        let name = match token.typ {
            TokenType::Ident => {
                self.advance();
                Some(Ident::new(token.lexeme, token.pos))
            }
            TokenType::Dot => {
                self.advance();
                Some(Ident::new(".", token.pos))
            }
            _ => None,
        };

        let path_token = self.current_token()?.clone();
        if path_token.typ != TokenType::String {
            return Err(ParseError::Expected {
                expected: "import path".to_string(),
                found: describe(&path_token),
                pos: path_token.pos,
            });
        }
        self.advance();

        Ok(ImportSpec { name, path: path_token.lexeme, pos: token.pos })
    }

    fn parse_const_decl(&mut self) -> Result<ConstDecl> {
        let pos = self.current_token()?.pos;
        self.advance(); // Skip 'const'

        let mut specs = Vec::new();
        let grouped = self.check(&TokenType::LParen);

        if grouped {
            self.advance();
            loop {
                self.skip_semicolons();
                if self.check(&TokenType::RParen) {
                    self.advance();
                    break;
                }
                if self.is_at_end() {
                    return Err(ParseError::UnterminatedDecl { pos });
                }
                specs.push(self.parse_const_spec()?);
                self.expect_semi()?;
            }
        } else {
            specs.push(self.parse_const_spec()?);
        }

        self.expect_semi()?;
        Ok(ConstDecl { pos, grouped, specs })
    }

    fn parse_const_spec(&mut self) -> Result<ConstSpec> {
        let mut names = vec![self.expect_ident()?];
        while self.check(&TokenType::Comma) {
            self.advance();
            names.push(self.expect_ident()?);
        }

        let typ = if self.check(&TokenType::Ident) { Some(self.parse_type_name()?) } else { None };

        let mut values = Vec::new();
        if self.current_token()?.is_operator("=") {
            self.advance();
            values.push(self.parse_expr()?);
            while self.check(&TokenType::Comma) {
                self.advance();
                values.push(self.parse_expr()?);
            }
        } else if !self.check(&TokenType::Semicolon) && !self.check(&TokenType::RParen) {
            let token = self.current_token()?;
            return Err(ParseError::Expected {
                expected: "constant type or '='".to_string(),
                found: describe(token),
                pos: token.pos,
            });
        }

        Ok(ConstSpec { names, typ, values })
    }

    fn parse_type_name(&mut self) -> Result<TypeName> {
        let first = self.expect_ident()?;
        if self.check(&TokenType::Dot) {
            self.advance();
            let name = self.expect_ident()?;
            Ok(TypeName { qualifier: Some(first), name })
        } else {
            Ok(TypeName { qualifier: None, name: first })
        }
    }

    fn parse_type_decl(&mut self) -> Result<TypeDecl> {
        let pos = self.current_token()?.pos;
        self.advance(); // Skip 'type'

        let mut specs = Vec::new();

        if self.check(&TokenType::LParen) {
            self.advance();
            loop {
                self.skip_semicolons();
                if self.check(&TokenType::RParen) {
                    self.advance();
                    break;
                }
                if self.is_at_end() {
                    return Err(ParseError::UnterminatedDecl { pos });
                }
                specs.push(self.parse_type_spec()?);
            }
            self.expect_semi()?;
        } else {
            specs.push(self.parse_type_spec()?);
        }

        Ok(TypeDecl { pos, specs })
    }

    /// Parses one type spec including its terminating semicolon, if any
    fn parse_type_spec(&mut self) -> Result<TypeSpec> {
        let name = self.expect_ident()?;

        let alias = self.current_token()?.is_operator("=");
        if alias {
            self.advance();
        }

        // Only plain and qualified names are kept; anything else is skipped
        let start = self.current;
        let type_pos = self.current_token()?.pos;
        if self.check(&TokenType::Ident) {
            let type_name = self.parse_type_name()?;
            if self.at_spec_end() {
                self.skip_semicolons();
                return Ok(TypeSpec { name, alias, typ: TypeExpr::Name(type_name) });
            }
            self.current = start;
        }

        self.skip_balanced(type_pos)?;
        Ok(TypeSpec { name, alias, typ: TypeExpr::Other(type_pos) })
    }

    fn at_spec_end(&self) -> bool {
        self.check(&TokenType::Semicolon) || self.check(&TokenType::RParen) || self.is_at_end()
    }

    /// Skip a `var` or `func` declaration
    fn skip_decl(&mut self) -> Result<()> {
        let pos = self.current_token()?.pos;
        self.advance(); // Skip keyword
        self.skip_balanced(pos)
    }

    /// Skip tokens up to a semicolon at nesting depth zero, consuming it.
    /// A closing parenthesis at depth zero ends an enclosing group and is left
    /// in place.
    fn skip_balanced(&mut self, start: Position) -> Result<()> {
        let mut depth = 0usize;

        loop {
            let token = self.current_token()?;
            match token.typ {
                TokenType::LParen | TokenType::LBrack | TokenType::LBrace => depth += 1,
                TokenType::RParen if depth == 0 => return Ok(()),
                TokenType::RParen | TokenType::RBrack | TokenType::RBrace => {
                    if depth == 0 {
                        return Err(ParseError::UnexpectedToken {
                            token: token.lexeme.clone(),
                            pos: token.pos,
                        });
                    }
                    depth -= 1;
                }
                TokenType::Semicolon if depth == 0 => {
                    self.advance();
                    return Ok(());
                }
                TokenType::Eof => {
                    return if depth == 0 {
                        Ok(())
                    } else {
                        Err(ParseError::UnterminatedDecl { pos: start })
                    };
                }
                _ => {}
            }
            self.advance();
        }
    }

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_binary(1)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;

        loop {
            let token = self.current_token()?;
            if token.typ != TokenType::Operator {
                break;
            }
            let Some(op) = BinaryOp::from_symbol(&token.lexeme) else {
                break;
            };
            if op.precedence() < min_prec {
                break;
            }
            let pos = token.pos;
            self.advance();
            let rhs = self.parse_binary(op.precedence() + 1)?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), pos };
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let token = self.current_token()?.clone();

        if token.typ == TokenType::Operator {
            let op = match token.lexeme.as_str() {
                "+" => UnaryOp::Plus,
                "-" => UnaryOp::Neg,
                "!" => UnaryOp::Not,
                "^" => UnaryOp::Complement,
                other => {
                    return Err(ParseError::UnsupportedExpr {
                        what: format!("unary '{}'", other),
                        pos: token.pos,
                    });
                }
            };
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary { op, operand: Box::new(operand), pos: token.pos });
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let mut expr = self.parse_operand()?;

        loop {
            let token = self.current_token()?.clone();
            match token.typ {
                TokenType::Dot => {
                    self.advance();
                    let name = self.expect_ident()?;
                    expr = match expr {
                        Expr::Ident(qualifier) => Expr::Selector { qualifier, name },
                        _ => {
                            return Err(ParseError::UnsupportedExpr {
                                what: "field selector".to_string(),
                                pos: token.pos,
                            });
                        }
                    };
                }
                TokenType::LParen => {
                    self.advance();
                    let args = self.parse_call_args()?;
                    expr = Expr::Call { func: Box::new(expr), args, pos: token.pos };
                }
                TokenType::LBrack | TokenType::LBrace => {
                    return Err(ParseError::UnsupportedExpr {
                        what: format!("'{}'", token.lexeme),
                        pos: token.pos,
                    });
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();

        loop {
            if self.check(&TokenType::RParen) {
                self.advance();
                break;
            }
            args.push(self.parse_expr()?);
            if self.check(&TokenType::Comma) {
                self.advance();
            } else {
                self.expect(&TokenType::RParen, "')'")?;
                break;
            }
        }

        Ok(args)
    }

    fn parse_operand(&mut self) -> Result<Expr> {
        let token = self.current_token()?.clone();

        let lit_kind = match token.typ {
            TokenType::Int => Some(LitKind::Int),
            TokenType::Float => Some(LitKind::Float),
            TokenType::Imag => Some(LitKind::Imag),
            TokenType::Rune => Some(LitKind::Rune),
            TokenType::String => Some(LitKind::String),
            _ => None,
        };
        if let Some(kind) = lit_kind {
            self.advance();
            return Ok(Expr::Lit(BasicLit { kind, value: token.lexeme, pos: token.pos }));
        }

        match token.typ {
            TokenType::Ident => {
                self.advance();
                Ok(Expr::Ident(Ident::new(token.lexeme, token.pos)))
            }
            TokenType::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenType::RParen, "')'")?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            TokenType::Keyword => Err(ParseError::UnsupportedExpr {
                what: format!("'{}'", token.lexeme),
                pos: token.pos,
            }),
            _ => Err(ParseError::Expected {
                expected: "expression".to_string(),
                found: describe(&token),
                pos: token.pos,
            }),
        }
    }

    fn expect(&mut self, typ: &TokenType, expected: &str) -> Result<()> {
        let token = self.current_token()?;
        if &token.typ == typ {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::Expected {
                expected: expected.to_string(),
                found: describe(token),
                pos: token.pos,
            })
        }
    }

    fn expect_keyword(&mut self, word: &str) -> Result<()> {
        let token = self.current_token()?;
        if token.is_keyword(word) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::Expected {
                expected: format!("'{}'", word),
                found: describe(token),
                pos: token.pos,
            })
        }
    }

    fn expect_ident(&mut self) -> Result<Ident> {
        let token = self.current_token()?;
        if token.typ == TokenType::Ident {
            let ident = Ident::new(token.lexeme.clone(), token.pos);
            self.advance();
            Ok(ident)
        } else {
            Err(ParseError::Expected {
                expected: "identifier".to_string(),
                found: describe(token),
                pos: token.pos,
            })
        }
    }

    /// A semicolon may be omitted before a closing parenthesis or at the end
    fn expect_semi(&mut self) -> Result<()> {
        if self.check(&TokenType::Semicolon) {
            self.advance();
            return Ok(());
        }
        if self.check(&TokenType::RParen) || self.is_at_end() {
            return Ok(());
        }
        let token = self.current_token()?;
        Err(ParseError::Expected {
            expected: "';' or newline".to_string(),
            found: describe(token),
            pos: token.pos,
        })
    }

    fn skip_semicolons(&mut self) {
        while self.check(&TokenType::Semicolon) {
            self.advance();
        }
    }

    fn unexpected(&self) -> ParseError {
        match self.current_token() {
            Ok(token) => ParseError::UnexpectedToken { token: token.lexeme.clone(), pos: token.pos },
            Err(e) => e,
        }
    }

    fn current_token(&self) -> Result<&Token> {
        self.tokens.get(self.current).or(self.tokens.last()).ok_or_else(|| ParseError::Expected {
            expected: "'package'".to_string(),
            found: "end of input".to_string(),
            pos: Position::new(0, 1, 1),
        })
    }

    fn check(&self, typ: &TokenType) -> bool {
        if let Ok(token) = self.current_token() {
            &token.typ == typ
        } else {
            false
        }
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_token(), Ok(token) if token.typ == TokenType::Eof)
            || self.current >= self.tokens.len()
    }
}

fn describe(token: &Token) -> String {
    match token.typ {
        TokenType::Eof => "end of input".to_string(),
        TokenType::Semicolon if token.lexeme == "\n" => "newline".to_string(),
        TokenType::String => format!("{:?}", token.lexeme),
        _ => format!("'{}'", token.lexeme),
    }
}
