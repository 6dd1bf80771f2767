
use std::mem;

use logos::Span;

use crate::{
    ast::{
        clean_path, Annotation, Annotations, Declaration, Field, File, Import, Location, Message,
        MessageMember, Method, OneOfField, Package, Primitive, Service, Type, VOID,
    },
    error::ParseErrorKind,
    lex::{Lexeme, Token},
    lines::LineResolver,
};

/// Builds a [`File`] from scanned tokens. The first grammar error aborts the parse.
pub(crate) fn parse_file<'a>(
    source: &'a str,
    tokens: &[Lexeme<'a>],
) -> Result<File, ParseErrorKind> {
    Parser::new(source, tokens).parse()
}

struct Parser<'a, 't> {
    tokens: &'t [Lexeme<'a>],
    pos: usize,
    eof: Lexeme<'a>,
    lines: LineResolver<'a>,
    file: File,
    comments: Vec<String>,
    annotations: Vec<Annotation>,
}

impl<'a, 't> Parser<'a, 't> {
    fn new(source: &'a str, tokens: &'t [Lexeme<'a>]) -> Self {
        let lines = LineResolver::new(source);
        let eof = Lexeme {
            token: Token::Eof,
            span: source.len()..source.len(),
            position: lines.resolve(source.len()),
        };
        Parser {
            tokens,
            pos: 0,
            eof,
            lines,
            file: File::default(),
            comments: Vec::new(),
            annotations: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<File, ParseErrorKind> {
        self.parse_package()?;
        self.parse_imports()?;
        while self.peek_token() != &Token::Eof {
            self.parse_decorated(Self::parse_declaration)?;
        }
        Ok(self.file)
    }

    fn parse_package(&mut self) -> Result<(), ParseErrorKind> {
        while matches!(self.peek_token(), Token::Newline | Token::Comment(_)) {
            self.bump();
        }

        let start = self.expect_eq(Token::PACKAGE)?;
        let (name, _) = self.parse_dotted_name("a package name")?;
        let end = self.expect_eq(Token::Semicolon)?;

        self.file.push(Declaration::Package(Package {
            location: self.location(&start, &end),
            name,
        }));
        Ok(())
    }

    fn parse_imports(&mut self) -> Result<(), ParseErrorKind> {
        loop {
            match self.peek_token() {
                Token::Newline | Token::Comment(_) => self.parse_trivia(),
                token if *token == Token::IMPORT => {
                    self.flush_meta();
                    self.parse_import()?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn parse_import(&mut self) -> Result<(), ParseErrorKind> {
        let start = self.bump();
        let path = match &self.peek().token {
            Token::StringLiteral(path) => path.clone().into_owned(),
            _ => return Err(self.unexpected_token("a string literal")),
        };
        self.bump();
        let end = self.expect_eq(Token::Semicolon)?;
        let location = self.location(&start, &end);

        if let Some(first) = self.file.import_location(&clean_path(&path)) {
            return Err(ParseErrorKind::DuplicateImport {
                path,
                first: first.span.clone(),
                second: location.span,
            });
        }

        self.file
            .push(Declaration::Import(Import { location, path }));
        Ok(())
    }

    /// Consumes a newline, comment or annotation if one is next, updating the pending
    /// comments and annotations. Otherwise, `parse_item` is invoked to consume the next
    /// item.
    fn parse_decorated(
        &mut self,
        parse_item: impl FnOnce(&mut Self) -> Result<(), ParseErrorKind>,
    ) -> Result<(), ParseErrorKind> {
        match self.peek_token() {
            Token::Newline | Token::Comment(_) => {
                self.parse_trivia();
                Ok(())
            }
            Token::Annotation(_) => self.parse_annotation(),
            _ => parse_item(self),
        }
    }

    fn parse_trivia(&mut self) {
        match self.peek_token() {
            Token::Newline => {
                // A blank line detaches everything collected before it.
                if self.previous_is_newline() {
                    self.flush_meta();
                }
            }
            Token::Comment(text) => {
                let text = *text;
                if self.previous_is_newline() {
                    self.comments.push(text.to_owned());
                }
            }
            _ => return,
        }
        self.bump();
    }

    fn parse_annotation(&mut self) -> Result<(), ParseErrorKind> {
        let name = match self.peek_token() {
            Token::Annotation(name) => (*name).to_owned(),
            _ => return Err(self.unexpected_token("an annotation")),
        };
        let start = self.bump();

        let mut values = Vec::new();
        let end = if self.peek_token() == &Token::LeftParen {
            self.bump();
            let mut value: Vec<String> = Vec::new();
            loop {
                match self.peek_token() {
                    Token::RightParen => break,
                    Token::Comma => {
                        if value.is_empty() {
                            return Err(ParseErrorKind::EmptyAnnotationValue {
                                span: self.peek().span.clone(),
                            });
                        }
                        values.push(value.join(" "));
                        value.clear();
                        self.bump();
                    }
                    Token::Newline | Token::Eof => return Err(self.unexpected_token("')'")),
                    token => {
                        value.push(token.value());
                        self.bump();
                    }
                }
            }
            if !value.is_empty() {
                values.push(value.join(" "));
            }
            self.bump()
        } else {
            start.clone()
        };

        self.annotations.push(Annotation {
            location: self.location(&start, &end),
            name,
            values,
        });
        Ok(())
    }

    fn parse_declaration(&mut self) -> Result<(), ParseErrorKind> {
        let token = self.peek_token();
        if *token == Token::MESSAGE {
            self.parse_message()
        } else if *token == Token::SERVICE {
            self.parse_service()
        } else if *token == Token::IMPORT {
            Err(ParseErrorKind::MisplacedImport {
                span: self.peek().span.clone(),
            })
        } else if *token == Token::PACKAGE {
            match self.file.package_location() {
                Some(first) => Err(ParseErrorKind::DuplicatePackage {
                    first: first.span.clone(),
                    second: self.peek().span.clone(),
                }),
                None => Err(self.unexpected_token("'message' or 'service'")),
            }
        } else {
            Err(self.unexpected_token("'message' or 'service'"))
        }
    }

    fn parse_message(&mut self) -> Result<(), ParseErrorKind> {
        let (comments, annotations) = self.take_meta();
        let start = self.bump();
        let name = self.parse_declaration_name("a message name")?;
        self.expect_eq(Token::LeftBrace)?;

        let mut members = Vec::new();
        while self.peek_token() != &Token::RightBrace {
            self.parse_decorated(|p| p.parse_member(&mut members))?;
        }
        let end = self.bump();
        self.flush_meta();

        self.file.push(Declaration::Message(Message {
            location: self.location(&start, &end),
            name,
            comments,
            annotations,
            members,
        }));
        Ok(())
    }

    fn parse_member(&mut self, members: &mut Vec<MessageMember>) -> Result<(), ParseErrorKind> {
        if self.peek_token() == &Token::ONEOF {
            let oneof = self.parse_oneof()?;
            members.push(MessageMember::OneOf(oneof));
        } else {
            let field = self.parse_field()?;
            members.push(MessageMember::Field(field));
        }
        Ok(())
    }

    fn parse_oneof(&mut self) -> Result<OneOfField, ParseErrorKind> {
        let (comments, annotations) = self.take_meta();
        let start = self.bump();
        self.expect_eq(Token::LeftBrace)?;

        let mut fields = Vec::new();
        while self.peek_token() != &Token::RightBrace {
            self.parse_decorated(|p| {
                if p.peek_token() == &Token::ONEOF {
                    return Err(ParseErrorKind::NestedOneof {
                        span: p.peek().span.clone(),
                    });
                }
                fields.push(p.parse_field()?);
                Ok(())
            })?;
        }
        self.bump();

        let index = self.parse_index()?;
        let end = self.expect_eq(Token::Semicolon)?;
        self.flush_meta();

        Ok(OneOfField {
            location: self.location(&start, &end),
            index,
            fields,
            comments,
            annotations,
        })
    }

    fn parse_field(&mut self) -> Result<Field, ParseErrorKind> {
        let (comments, annotations) = self.take_meta();
        let (name, start) = self.expect_ident("a field name")?;
        let ty = self.parse_type()?;
        let index = self.parse_index()?;
        let end = self.expect_eq(Token::Semicolon)?;

        Ok(Field {
            location: self.location(&start, &end),
            name: name.to_owned(),
            ty,
            index,
            comments,
            annotations,
        })
    }

    fn parse_index(&mut self) -> Result<u64, ParseErrorKind> {
        self.expect_eq(Token::Equals)?;
        match self.peek_token() {
            &Token::Number(index) => {
                self.bump();
                Ok(index)
            }
            _ => Err(self.unexpected_token("an integer")),
        }
    }

    fn parse_type(&mut self) -> Result<Type, ParseErrorKind> {
        let (name, lexeme) = self.expect_ident("a type")?;
        if let Some(primitive) = Primitive::from_name(name) {
            return Ok(Type::Primitive(primitive));
        }

        if lexeme.token == Token::ARRAY {
            self.expect_eq(Token::LeftAngleBracket)?;
            let element = self.parse_type()?;
            self.expect_eq(Token::RightAngleBracket)?;
            Ok(Type::Array(Box::new(element)))
        } else if lexeme.token == Token::MAP {
            self.expect_eq(Token::LeftAngleBracket)?;
            let key = self.parse_map_key()?;
            self.expect_eq(Token::Comma)?;
            let value = self.parse_type()?;
            self.expect_eq(Token::RightAngleBracket)?;
            Ok(Type::Map {
                key,
                value: Box::new(value),
            })
        } else {
            let (name, _) = self.parse_dotted_name_rest(name.to_owned(), lexeme.span)?;
            Ok(Type::Unresolved(name))
        }
    }

    fn parse_map_key(&mut self) -> Result<Primitive, ParseErrorKind> {
        let (name, lexeme) = self.expect_ident("a map key type")?;
        match Primitive::from_name(name) {
            Some(key) if key.is_map_key() => Ok(key),
            _ => Err(ParseErrorKind::InvalidMapKeyType {
                expected: Primitive::map_key_names().collect::<Vec<_>>().join(", "),
                span: lexeme.span,
            }),
        }
    }

    fn parse_service(&mut self) -> Result<(), ParseErrorKind> {
        let (comments, annotations) = self.take_meta();
        let start = self.bump();
        let name = self.parse_declaration_name("a service name")?;
        self.expect_eq(Token::LeftBrace)?;

        let mut methods = Vec::new();
        while self.peek_token() != &Token::RightBrace {
            self.parse_decorated(|p| {
                methods.push(p.parse_method()?);
                Ok(())
            })?;
        }
        let end = self.bump();
        self.flush_meta();

        self.file.push(Declaration::Service(Service {
            location: self.location(&start, &end),
            name,
            comments,
            annotations,
            methods,
        }));
        Ok(())
    }

    fn parse_method(&mut self) -> Result<Method, ParseErrorKind> {
        let (comments, annotations) = self.take_meta();
        let (name, start) = self.expect_ident("a method name")?;
        self.expect_eq(Token::LeftParen)?;

        let argument_type = match self.peek_token() {
            Token::Ident(_) => self.parse_dotted_name("an argument type")?.0,
            Token::RightParen => VOID.to_owned(),
            _ => return Err(self.unexpected_token("an argument type or ')'")),
        };
        self.expect_eq(Token::RightParen)?;

        let (return_type, return_streaming) = match self.peek_token() {
            Token::Arrow => {
                self.bump();
                let streaming = self.peek_token() == &Token::STREAM;
                if streaming {
                    self.bump();
                }
                (self.parse_dotted_name("a return type")?.0, streaming)
            }
            Token::Semicolon => (VOID.to_owned(), false),
            _ => return Err(self.unexpected_token("'->' or ';'")),
        };
        let end = self.expect_eq(Token::Semicolon)?;

        Ok(Method {
            location: self.location(&start, &end),
            name: name.to_owned(),
            comments,
            annotations,
            argument_type,
            return_type,
            return_streaming,
        })
    }

    /// Parses the name of a message or service, which must not already be declared in
    /// this file.
    fn parse_declaration_name(&mut self, expected: &str) -> Result<String, ParseErrorKind> {
        let (name, lexeme) = self.expect_ident(expected)?;
        if let Some(first) = self.file.declaration_location(name) {
            return Err(ParseErrorKind::DuplicateName {
                name: name.to_owned(),
                first: first.span.clone(),
                second: lexeme.span,
            });
        }
        Ok(name.to_owned())
    }

    fn parse_dotted_name(&mut self, expected: &str) -> Result<(String, Span), ParseErrorKind> {
        let (first, lexeme) = self.expect_ident(expected)?;
        self.parse_dotted_name_rest(first.to_owned(), lexeme.span)
    }

    fn parse_dotted_name_rest(
        &mut self,
        mut name: String,
        mut span: Span,
    ) -> Result<(String, Span), ParseErrorKind> {
        while self.peek_token() == &Token::Dot {
            self.bump();
            let (part, lexeme) = self.expect_ident("an identifier")?;
            name.push('.');
            name.push_str(part);
            span.end = lexeme.span.end;
        }
        Ok((name, span))
    }

    fn expect_ident(&mut self, expected: &str) -> Result<(&'a str, Lexeme<'a>), ParseErrorKind> {
        match *self.peek_token() {
            Token::Ident(value) => Ok((value, self.bump())),
            _ => Err(self.unexpected_token(expected)),
        }
    }

    fn expect_eq(&mut self, expected: Token) -> Result<Lexeme<'a>, ParseErrorKind> {
        if *self.peek_token() == expected {
            Ok(self.bump())
        } else {
            Err(self.unexpected_token(format!("'{}'", expected)))
        }
    }

    fn unexpected_token(&self, expected: impl ToString) -> ParseErrorKind {
        let lexeme = self.peek();
        match &lexeme.token {
            Token::Eof => ParseErrorKind::UnexpectedEof {
                expected: expected.to_string(),
                span: lexeme.span.clone(),
            },
            token => ParseErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found: token.to_string(),
                span: lexeme.span.clone(),
            },
        }
    }

    fn take_meta(&mut self) -> (Vec<String>, Annotations) {
        (
            mem::take(&mut self.comments),
            Annotations::from(mem::take(&mut self.annotations)),
        )
    }

    fn flush_meta(&mut self) {
        self.comments.clear();
        self.annotations.clear();
    }

    fn location(&self, start: &Lexeme<'a>, end: &Lexeme<'a>) -> Location {
        Location {
            start: start.position,
            end: self.lines.resolve(end.span.end),
            span: start.span.start..end.span.end,
        }
    }

    fn previous_is_newline(&self) -> bool {
        match self.pos.checked_sub(1) {
            Some(index) => self.tokens[index].token == Token::Newline,
            None => true,
        }
    }

    fn peek(&self) -> &Lexeme<'a> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> &Lexeme<'a> {
        self.tokens.get(self.pos + n).unwrap_or(&self.eof)
    }

    fn peek_token(&self) -> &Token<'a> {
        &self.peek().token
    }

    fn bump(&mut self) -> Lexeme<'a> {
        let lexeme = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        lexeme
    }
}
