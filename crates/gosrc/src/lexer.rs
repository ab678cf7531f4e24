use crate::error::{LexError, Position};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    Ident,
    Keyword,
    Int,
    Float,
    Imag,
    Rune,
    String,
    Operator,
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semicolon,
    Eof,
}

/// A lexed token.
///
/// For `String` and `Rune` tokens the lexeme holds the decoded value, not the
/// source text. Automatically inserted semicolons carry the lexeme `"\n"`.
#[derive(Debug, Clone)]
pub struct Token {
    pub typ: TokenType,
    pub lexeme: String,
    pub pos: Position,
}

impl Token {
    pub fn is_keyword(&self, word: &str) -> bool {
        self.typ == TokenType::Keyword && self.lexeme == word
    }

    pub fn is_operator(&self, op: &str) -> bool {
        self.typ == TokenType::Operator && self.lexeme == op
    }

    /// Whether a newline directly after this token terminates the statement
    fn ends_statement(&self) -> bool {
        match self.typ {
            TokenType::Ident
            | TokenType::Int
            | TokenType::Float
            | TokenType::Imag
            | TokenType::Rune
            | TokenType::String
            | TokenType::RParen
            | TokenType::RBrack
            | TokenType::RBrace => true,
            TokenType::Keyword => {
                matches!(self.lexeme.as_str(), "break" | "continue" | "fallthrough" | "return")
            }
            TokenType::Operator => matches!(self.lexeme.as_str(), "++" | "--"),
            _ => false,
        }
    }
}

const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

// Longest first within each length class.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "<<",
    ">>", "&^", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "+", "-", "*", "/", "%", "&", "|",
    "^", "<", ">", "=", "!", ":", "~",
];

/// Result of decoding one escape sequence
enum Escaped {
    Char(char),
    Byte(u8),
}

pub struct Lexer {
    input: Vec<char>,
    current: usize,
    offset: usize,
    line: usize,
    column: usize,
    insert_semi: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            current: 0,
            offset: 0,
            line: 1,
            column: 1,
            insert_semi: false,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            if let Some(semi) = self.skip_whitespace_and_comments()? {
                tokens.push(semi);
                self.insert_semi = false;
                continue;
            }

            if self.is_at_end() {
                let pos = self.current_position();
                if self.insert_semi {
                    tokens.push(Token { typ: TokenType::Semicolon, lexeme: "\n".to_string(), pos });
                }
                tokens.push(Token { typ: TokenType::Eof, lexeme: String::new(), pos });
                break;
            }

            let token = self.next_token()?;
            self.insert_semi = token.ends_statement();
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        let pos = self.current_position();
        let Some(ch) = self.current_char() else {
            return Ok(Token { typ: TokenType::Eof, lexeme: String::new(), pos });
        };

        let single = |typ: TokenType| Token { typ, lexeme: ch.to_string(), pos };

        match ch {
            '(' => {
                self.advance();
                Ok(single(TokenType::LParen))
            }
            ')' => {
                self.advance();
                Ok(single(TokenType::RParen))
            }
            '[' => {
                self.advance();
                Ok(single(TokenType::LBrack))
            }
            ']' => {
                self.advance();
                Ok(single(TokenType::RBrack))
            }
            '{' => {
                self.advance();
                Ok(single(TokenType::LBrace))
            }
            '}' => {
                self.advance();
                Ok(single(TokenType::RBrace))
            }
            ',' => {
                self.advance();
                Ok(single(TokenType::Comma))
            }
            ';' => {
                self.advance();
                Ok(single(TokenType::Semicolon))
            }
            '"' => self.read_string(),
            '`' => self.read_raw_string(),
            '\'' => self.read_rune(),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number(),
            '.' if self.peek() == Some('.') && self.peek_at(2) == Some('.') => self.read_operator(),
            '.' => {
                self.advance();
                Ok(single(TokenType::Dot))
            }
            _ if ch.is_ascii_digit() => self.read_number(),
            _ if is_letter(ch) => Ok(self.read_identifier()),
            _ => self.read_operator(),
        }
    }

    fn read_identifier(&mut self) -> Token {
        let pos = self.current_position();
        let start = self.current;

        while let Some(ch) = self.current_char() {
            if is_letter(ch) || ch.is_ascii_digit() || (ch.is_numeric() && !ch.is_ascii()) {
                self.advance();
            } else {
                break;
            }
        }

        let lexeme: String = self.input[start..self.current].iter().collect();
        let typ =
            if KEYWORDS.contains(&lexeme.as_str()) { TokenType::Keyword } else { TokenType::Ident };

        Token { typ, lexeme, pos }
    }

    fn read_operator(&mut self) -> Result<Token, LexError> {
        let pos = self.current_position();

        for op in OPERATORS {
            let len = op.chars().count();
            if self.current + len > self.input.len() {
                continue;
            }
            if op.chars().zip(&self.input[self.current..]).all(|(a, b)| a == *b) {
                for _ in 0..len {
                    self.advance();
                }
                return Ok(Token { typ: TokenType::Operator, lexeme: op.to_string(), pos });
            }
        }

        let ch = self.current_char().unwrap_or('\0');
        Err(LexError::UnexpectedChar { ch, pos })
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let pos = self.current_position();
        let start = self.current;
        let mut typ = TokenType::Int;

        let prefixed = self.current_char() == Some('0')
            && matches!(self.peek(), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B'));

        if prefixed {
            self.advance(); // '0'
            self.advance(); // base letter
            while let Some(ch) = self.current_char() {
                if ch.is_ascii_hexdigit() || ch == '_' {
                    self.advance();
                } else {
                    break;
                }
            }
            if matches!(self.current_char(), Some('.' | 'p' | 'P')) {
                // Hexadecimal floats are not supported
                self.advance();
                let lexeme: String = self.input[start..self.current].iter().collect();
                return Err(LexError::InvalidNumber { lexeme, pos });
            }
        } else {
            self.skip_decimal_digits();

            if self.current_char() == Some('.') {
                typ = TokenType::Float;
                self.advance();
                self.skip_decimal_digits();
            }

            if matches!(self.current_char(), Some('e' | 'E')) {
                typ = TokenType::Float;
                self.advance();
                if matches!(self.current_char(), Some('+' | '-')) {
                    self.advance();
                }
                if !self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                    let lexeme: String = self.input[start..self.current].iter().collect();
                    return Err(LexError::InvalidNumber { lexeme, pos });
                }
                self.skip_decimal_digits();
            }
        }

        if self.current_char() == Some('i') {
            typ = TokenType::Imag;
            self.advance();
        }

        let lexeme: String = self.input[start..self.current].iter().collect();

        if self.current_char().is_some_and(|c| is_letter(c) || c.is_ascii_digit()) {
            return Err(LexError::InvalidNumber { lexeme, pos });
        }

        Ok(Token { typ, lexeme, pos })
    }

    fn skip_decimal_digits(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_string(&mut self) -> Result<Token, LexError> {
        let pos = self.current_position();
        self.advance(); // Skip opening '"'

        let mut bytes = Vec::new();

        loop {
            match self.current_char() {
                None | Some('\n') => return Err(LexError::UnterminatedString { pos }),
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => match self.read_escape('"')? {
                    Escaped::Char(c) => {
                        let mut buf = [0u8; 4];
                        bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                    }
                    Escaped::Byte(b) => bytes.push(b),
                },
                Some(ch) => {
                    let mut buf = [0u8; 4];
                    bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                    self.advance();
                }
            }
        }

        let lexeme = String::from_utf8_lossy(&bytes).into_owned();
        Ok(Token { typ: TokenType::String, lexeme, pos })
    }

    fn read_raw_string(&mut self) -> Result<Token, LexError> {
        let pos = self.current_position();
        self.advance(); // Skip opening '`'

        let mut value = String::new();

        loop {
            match self.current_char() {
                None => return Err(LexError::UnterminatedRawString { pos }),
                Some('`') => {
                    self.advance();
                    break;
                }
                // Carriage returns are discarded from raw strings
                Some('\r') => self.advance(),
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        Ok(Token { typ: TokenType::String, lexeme: value, pos })
    }

    fn read_rune(&mut self) -> Result<Token, LexError> {
        let pos = self.current_position();
        self.advance(); // Skip opening '\''

        let value = match self.current_char() {
            None | Some('\n') | Some('\'') => return Err(LexError::InvalidRune { pos }),
            Some('\\') => match self.read_escape('\'')? {
                Escaped::Char(c) => c,
                Escaped::Byte(b) => char::from(b),
            },
            Some(ch) => {
                self.advance();
                ch
            }
        };

        if self.current_char() != Some('\'') {
            return Err(LexError::InvalidRune { pos });
        }
        self.advance();

        Ok(Token { typ: TokenType::Rune, lexeme: value.to_string(), pos })
    }

    /// Decode an escape sequence; the cursor sits on the backslash
    fn read_escape(&mut self, quote: char) -> Result<Escaped, LexError> {
        self.advance(); // Skip '\\'
        let pos = self.current_position();
        let Some(ch) = self.current_char() else {
            return Err(LexError::UnterminatedString { pos });
        };

        let simple = match ch {
            'a' => Some('\u{07}'),
            'b' => Some('\u{08}'),
            'f' => Some('\u{0C}'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'v' => Some('\u{0B}'),
            '\\' => Some('\\'),
            _ if ch == quote => Some(ch),
            _ => None,
        };
        if let Some(c) = simple {
            self.advance();
            return Ok(Escaped::Char(c));
        }

        match ch {
            'x' => {
                self.advance();
                let value = self.read_digits(2, 16, ch, pos)?;
                Ok(Escaped::Byte(value as u8))
            }
            'u' | 'U' => {
                self.advance();
                let width = if ch == 'u' { 4 } else { 8 };
                let value = self.read_digits(width, 16, ch, pos)?;
                char::from_u32(value).map(Escaped::Char).ok_or(LexError::InvalidEscape { ch, pos })
            }
            '0'..='7' => {
                let value = self.read_digits(3, 8, ch, pos)?;
                u8::try_from(value).map(Escaped::Byte).map_err(|_| LexError::InvalidEscape { ch, pos })
            }
            _ => Err(LexError::InvalidEscape { ch, pos }),
        }
    }

    fn read_digits(
        &mut self,
        count: usize,
        radix: u32,
        escape: char,
        pos: Position,
    ) -> Result<u32, LexError> {
        let mut value: u32 = 0;
        for _ in 0..count {
            let digit = self
                .current_char()
                .and_then(|c| c.to_digit(radix))
                .ok_or(LexError::InvalidEscape { ch: escape, pos })?;
            value = value * radix + digit;
            self.advance();
        }
        Ok(value)
    }

    /// Skip blanks and comments. Returns a semicolon token when a newline
    /// terminates the current statement.
    fn skip_whitespace_and_comments(&mut self) -> Result<Option<Token>, LexError> {
        loop {
            match self.current_char() {
                Some('\n') => {
                    let pos = self.current_position();
                    self.advance();
                    if self.insert_semi {
                        return Ok(Some(Token {
                            typ: TokenType::Semicolon,
                            lexeme: "\n".to_string(),
                            pos,
                        }));
                    }
                }
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek() == Some('/') => {
                    // The newline itself is left for the next iteration
                    while let Some(ch) = self.current_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek() == Some('*') => {
                    let pos = self.current_position();
                    self.advance();
                    self.advance();
                    let mut saw_newline = false;
                    loop {
                        match self.current_char() {
                            None => return Err(LexError::UnterminatedComment { pos }),
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(ch) => {
                                saw_newline |= ch == '\n';
                                self.advance();
                            }
                        }
                    }
                    if saw_newline && self.insert_semi {
                        return Ok(Some(Token {
                            typ: TokenType::Semicolon,
                            lexeme: "\n".to_string(),
                            pos,
                        }));
                    }
                }
                _ => return Ok(None),
            }
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.current).copied()
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(1)
    }

    fn peek_at(&self, distance: usize) -> Option<char> {
        self.input.get(self.current + distance).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.current += 1;
            self.offset += ch.len_utf8();

            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.input.len()
    }

    fn current_position(&self) -> Position {
        Position::new(self.offset, self.line, self.column)
    }
}

fn is_letter(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(src: &str) -> Vec<TokenType> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.typ).collect()
    }

    #[test]
    fn test_semicolon_inserted_after_identifier() {
        assert_eq!(
            types("a\nb"),
            vec![
                TokenType::Ident,
                TokenType::Semicolon,
                TokenType::Ident,
                TokenType::Semicolon,
                TokenType::Eof
            ]
        );
    }

    #[test]
    fn test_no_semicolon_after_operator() {
        assert_eq!(
            types("a +\nb"),
            vec![
                TokenType::Ident,
                TokenType::Operator,
                TokenType::Ident,
                TokenType::Semicolon,
                TokenType::Eof
            ]
        );
    }

    #[test]
    fn test_block_comment_with_newline_acts_as_newline() {
        let tokens = Lexer::new("a /* x\n y */ b").tokenize().unwrap();
        assert_eq!(tokens[1].typ, TokenType::Semicolon);
    }

    #[test]
    fn test_hex_float_rejected() {
        assert!(matches!(
            Lexer::new("0x1p-2").tokenize(),
            Err(LexError::InvalidNumber { .. })
        ));
    }
}
