use super::*;

fn tokens(source: &str) -> Vec<Token<'_>> {
    scan(source)
        .unwrap()
        .into_iter()
        .map(|lexeme| lexeme.token)
        .collect()
}

fn scan_err(source: &str) -> ParseErrorKind {
    scan(source).unwrap_err()
}

#[test]
fn simple_tokens() {
    let source = "package io.libyarp;\nmessage Foo { bar map<string,uint8> = 12; }";

    assert_eq!(
        tokens(source),
        vec![
            Token::PACKAGE,
            Token::Ident("io"),
            Token::Dot,
            Token::Ident("libyarp"),
            Token::Semicolon,
            Token::Newline,
            Token::MESSAGE,
            Token::Ident("Foo"),
            Token::LeftBrace,
            Token::Ident("bar"),
            Token::MAP,
            Token::LeftAngleBracket,
            Token::Ident("string"),
            Token::Comma,
            Token::Ident("uint8"),
            Token::RightAngleBracket,
            Token::Equals,
            Token::Number(12),
            Token::Semicolon,
            Token::RightBrace,
            Token::Eof,
        ]
    );
}

#[test]
fn method_tokens() {
    assert_eq!(
        tokens("list_contacts() -> stream Contact;"),
        vec![
            Token::Ident("list_contacts"),
            Token::LeftParen,
            Token::RightParen,
            Token::Arrow,
            Token::STREAM,
            Token::Ident("Contact"),
            Token::Semicolon,
            Token::Eof,
        ]
    );
}

#[test]
fn whitespace() {
    assert_eq!(
        tokens(" \t\r\n_foo9\r\n"),
        vec![
            Token::Newline,
            Token::Ident("_foo9"),
            Token::Newline,
            Token::Eof,
        ]
    );
    assert_eq!(tokens(""), vec![Token::Eof]);
}

#[test]
fn positions() {
    let lexemes = scan("package foo;\n  message Bar {}").unwrap();

    let message = &lexemes[4];
    assert_eq!(message.token, Token::MESSAGE);
    assert_eq!(message.span, 15..22);
    assert_eq!(message.position, Position { line: 2, column: 3 });

    let eof = lexemes.last().unwrap();
    assert_eq!(eof.token, Token::Eof);
    assert_eq!(eof.position, Position { line: 2, column: 17 });
}

#[test]
fn positions_count_characters() {
    let lexemes = scan("# héllo wörld\nfoo").unwrap();

    assert_eq!(lexemes[0].token, Token::Comment("héllo wörld"));
    assert_eq!(lexemes[2].position, Position { line: 2, column: 1 });

    let lexemes = scan("\"ü\" bar").unwrap();
    assert_eq!(lexemes[1].token, Token::Ident("bar"));
    assert_eq!(lexemes[1].position, Position { line: 1, column: 5 });
}

#[test]
fn string_literal() {
    assert_eq!(
        tokens(r#""hello \"world\"" "a\nb" "" "#),
        vec![
            Token::StringLiteral(Cow::Owned("hello \"world\"".to_owned())),
            Token::StringLiteral(Cow::Borrowed(r"a\nb")),
            Token::StringLiteral(Cow::Borrowed("")),
            Token::Eof,
        ]
    );
}

#[test]
fn string_literal_backslash_before_quote() {
    assert_eq!(
        tokens(r#""a\\" b" c"#),
        vec![
            Token::StringLiteral(Cow::Owned("a\\\" b".to_owned())),
            Token::Ident("c"),
            Token::Eof,
        ]
    );
    assert_eq!(
        tokens(r#""a\b" c"#),
        vec![
            Token::StringLiteral(Cow::Borrowed(r"a\b")),
            Token::Ident("c"),
            Token::Eof,
        ]
    );
}

#[test]
fn unterminated_string() {
    assert_eq!(
        scan_err("import \"foo\nbar"),
        ParseErrorKind::UnterminatedString { span: 7..11 }
    );
    assert_eq!(
        scan_err("import \"foo"),
        ParseErrorKind::UnterminatedString { span: 7..11 }
    );
    assert_eq!(
        scan_err(r#"import "foo\""#),
        ParseErrorKind::UnterminatedString { span: 7..13 }
    );
}

#[test]
fn comment() {
    assert_eq!(
        tokens("#   leading and trailing  \n#\nfoo # trailing"),
        vec![
            Token::Comment("leading and trailing"),
            Token::Newline,
            Token::Comment(""),
            Token::Newline,
            Token::Ident("foo"),
            Token::Comment("trailing"),
            Token::Eof,
        ]
    );
}

#[test]
fn annotation() {
    assert_eq!(
        tokens("@optional\n@repeated(foo, \"bar\")"),
        vec![
            Token::Annotation("optional"),
            Token::Newline,
            Token::Annotation("repeated"),
            Token::LeftParen,
            Token::Ident("foo"),
            Token::Comma,
            Token::StringLiteral(Cow::Borrowed("bar")),
            Token::RightParen,
            Token::Eof,
        ]
    );
}

#[test]
fn empty_annotation_name() {
    assert_eq!(
        scan_err("@ optional"),
        ParseErrorKind::EmptyAnnotationName { span: 0..1 }
    );
    assert_eq!(
        scan_err("foo @"),
        ParseErrorKind::EmptyAnnotationName { span: 4..5 }
    );
}

#[test]
fn invalid_arrow() {
    assert_eq!(
        scan_err("f() - Foo;"),
        ParseErrorKind::InvalidArrow {
            found: Some(" ".to_owned()),
            span: 4..6,
        }
    );
    assert_eq!(
        scan_err("f() -"),
        ParseErrorKind::InvalidArrow {
            found: None,
            span: 4..5,
        }
    );
}

#[test]
fn unexpected_character() {
    assert_eq!(
        scan_err("message Foo { bar int8 = 1; } $"),
        ParseErrorKind::UnexpectedCharacter {
            ch: "$".to_owned(),
            span: 30..31,
        }
    );
    assert_eq!(
        scan_err("foo ü"),
        ParseErrorKind::UnexpectedCharacter {
            ch: "ü".to_owned(),
            span: 4..6,
        }
    );
    assert_eq!(
        scan_err("a\u{0}b"),
        ParseErrorKind::UnexpectedCharacter {
            ch: "\\0".to_owned(),
            span: 1..2,
        }
    );
}

#[test]
fn integer_overflow() {
    let source = "id uint64 = 99999999999999999999999999999999999999;";

    assert_eq!(
        scan_err(source),
        ParseErrorKind::IntegerOutOfRange {
            span: 12..(source.len() - 1),
        }
    );
    assert_eq!(
        tokens("18446744073709551615"),
        vec![Token::Number(u64::MAX), Token::Eof]
    );
}

#[test]
fn digits_then_ident() {
    assert_eq!(
        tokens("12ab"),
        vec![Token::Number(12), Token::Ident("ab"), Token::Eof]
    );
}

#[test]
fn token_value() {
    assert_eq!(Token::Ident("foo").value(), "foo");
    assert_eq!(Token::StringLiteral(Cow::Borrowed("a b")).value(), "a b");
    assert_eq!(Token::Number(5).value(), "5");
    assert_eq!(Token::Dot.value(), ".");
    assert_eq!(Token::Newline.to_string(), "\\n");
    assert_eq!(Token::Eof.to_string(), "end of file");
}
