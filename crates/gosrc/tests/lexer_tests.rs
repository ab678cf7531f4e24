use gosrc::error::LexError;
use gosrc::lexer::{Lexer, TokenType};

fn lex(src: &str) -> Vec<(TokenType, String)> {
    Lexer::new(src).tokenize().unwrap().into_iter().map(|t| (t.typ, t.lexeme)).collect()
}

// ===== Basic Tokens =====

#[test]
fn test_const_spec_tokens() {
    let tokens = lex("const Red Color = iota");
    let types: Vec<_> = tokens.iter().map(|(t, _)| t.clone()).collect();
    assert_eq!(
        types,
        vec![
            TokenType::Keyword,
            TokenType::Ident,
            TokenType::Ident,
            TokenType::Operator,
            TokenType::Ident,
            TokenType::Semicolon,
            TokenType::Eof,
        ]
    );
    assert_eq!(tokens[1].1, "Red");
    assert_eq!(tokens[3].1, "=");
}

#[test]
fn test_longest_operator_wins() {
    let tokens = lex("a &^ b << 2");
    assert_eq!(tokens[1], (TokenType::Operator, "&^".to_string()));
    assert_eq!(tokens[3], (TokenType::Operator, "<<".to_string()));
}

#[test]
fn test_selector_tokens() {
    let tokens = lex("colors.Red");
    assert_eq!(tokens[0], (TokenType::Ident, "colors".to_string()));
    assert_eq!(tokens[1].0, TokenType::Dot);
    assert_eq!(tokens[2], (TokenType::Ident, "Red".to_string()));
}

#[test]
fn test_unicode_identifier() {
    let tokens = lex("Größe");
    assert_eq!(tokens[0], (TokenType::Ident, "Größe".to_string()));
}

// ===== Numbers =====

#[test]
fn test_number_kinds() {
    let tokens = lex("42 0x1F 1.5 .5 1e9 2i 1_000");
    let types: Vec<_> = tokens.iter().take(7).map(|(t, _)| t.clone()).collect();
    assert_eq!(
        types,
        vec![
            TokenType::Int,
            TokenType::Int,
            TokenType::Float,
            TokenType::Float,
            TokenType::Float,
            TokenType::Imag,
            TokenType::Int,
        ]
    );
    assert_eq!(tokens[1].1, "0x1F");
    assert_eq!(tokens[6].1, "1_000");
}

// ===== Strings and Runes =====

#[test]
fn test_string_escapes_are_decoded() {
    let tokens = lex(r#""a\tb\n\"q\" \x41\u00e9""#);
    assert_eq!(tokens[0], (TokenType::String, "a\tb\n\"q\" Aé".to_string()));
}

#[test]
fn test_raw_string_keeps_backslashes() {
    let tokens = lex("`C:\\dir\\n`");
    assert_eq!(tokens[0], (TokenType::String, "C:\\dir\\n".to_string()));
}

#[test]
fn test_raw_string_spans_lines() {
    let tokens = lex("`line1\nline2`");
    assert_eq!(tokens[0], (TokenType::String, "line1\nline2".to_string()));
}

#[test]
fn test_rune_literals() {
    let tokens = lex(r"'a' '\n' '\''");
    assert_eq!(tokens[0], (TokenType::Rune, "a".to_string()));
    assert_eq!(tokens[1], (TokenType::Rune, "\n".to_string()));
    assert_eq!(tokens[2], (TokenType::Rune, "'".to_string()));
}

// ===== Comments and Semicolons =====

#[test]
fn test_line_comment_skipped() {
    let tokens = lex("Red // the first\nGreen");
    assert_eq!(tokens[0].1, "Red");
    assert_eq!(tokens[1].0, TokenType::Semicolon);
    assert_eq!(tokens[2].1, "Green");
}

#[test]
fn test_no_semicolon_after_open_paren() {
    let tokens = lex("const (\nA\n)");
    assert_eq!(tokens[1].0, TokenType::LParen);
    assert_eq!(tokens[2].1, "A");
    assert_eq!(tokens[3].0, TokenType::Semicolon);
    assert_eq!(tokens[4].0, TokenType::RParen);
}

#[test]
fn test_semicolon_after_return_keyword() {
    let tokens = lex("return\nx");
    assert_eq!(tokens[1].0, TokenType::Semicolon);
}

#[test]
fn test_positions() {
    let tokens = Lexer::new("package p\n\nconst A = 1").tokenize().unwrap();
    let a = tokens.iter().find(|t| t.lexeme == "A").unwrap();
    assert_eq!(a.pos.line, 3);
    assert_eq!(a.pos.column, 7);
}

// ===== Errors =====

#[test]
fn test_unterminated_string() {
    assert!(matches!(
        Lexer::new("\"abc").tokenize(),
        Err(LexError::UnterminatedString { .. })
    ));
}

#[test]
fn test_string_cannot_span_lines() {
    assert!(matches!(
        Lexer::new("\"abc\ndef\"").tokenize(),
        Err(LexError::UnterminatedString { .. })
    ));
}

#[test]
fn test_unterminated_raw_string() {
    assert!(matches!(
        Lexer::new("`abc").tokenize(),
        Err(LexError::UnterminatedRawString { .. })
    ));
}

#[test]
fn test_unterminated_block_comment() {
    assert!(matches!(
        Lexer::new("a /* never closed").tokenize(),
        Err(LexError::UnterminatedComment { .. })
    ));
}

#[test]
fn test_invalid_escape() {
    assert!(matches!(
        Lexer::new(r#""\q""#).tokenize(),
        Err(LexError::InvalidEscape { ch: 'q', .. })
    ));
}

#[test]
fn test_unexpected_character() {
    assert!(matches!(
        Lexer::new("a @ b").tokenize(),
        Err(LexError::UnexpectedChar { ch: '@', .. })
    ));
}
