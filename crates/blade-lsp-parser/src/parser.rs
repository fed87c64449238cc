//! Recursive-descent template parser with local error recovery.
//!
//! Consumes the lexer's token stream and produces the syntax tree. Errors
//! are collected as `Error` nodes and parsing continues, unless the parser
//! was configured to fail fast.

use crate::ast::{
    Attribute, AttributeValue, BladeComment, Directive, DirectiveParams, Echo, EchoKind, Element,
    EmbeddedRegion, ErrorNode, Language, Node, TagClosing, TextRun, Tree,
};
use crate::lexer::Lexer;
use crate::php::{ExpressionAst, ExpressionParser, PhpVersion};
use crate::token::{Token, TokenKind};
use blade_lsp_types::{Position, Span};
use thiserror::Error;

/// HTML elements that never take a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Parser configuration.
///
/// `suppress_errors` collects error nodes instead of failing; `php_version`
/// is handed to the external PHP-expression parser; `with_positions` maps
/// embedded-expression positions back into host-document coordinates.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub suppress_errors: bool,
    pub php_version: PhpVersion,
    pub with_positions: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            suppress_errors: true,
            php_version: PhpVersion::default(),
            with_positions: true,
        }
    }
}

/// A structured parse failure, surfaced only in fail-fast mode.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("syntax error at {line}:{character}: {message}")]
    Syntax {
        message: String,
        line: u32,
        character: u32,
    },
}

/// Parse one template document.
pub fn parse_template(source: &str, options: ParserOptions) -> Result<Tree, ParseError> {
    TemplateParser::new(source, options).parse()
}

/// Recursive-descent consumer of the lexed token stream. One instance
/// parses one document.
pub struct TemplateParser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
    last_end: Position,
    options: ParserOptions,
    errors: Vec<ErrorNode>,
    php: ExpressionParser,
}

impl<'s> TemplateParser<'s> {
    pub fn new(source: &'s str, options: ParserOptions) -> Self {
        let tokens = Lexer::new(source).tokenize();
        let php = ExpressionParser::new(options.php_version);
        TemplateParser {
            source,
            tokens,
            pos: 0,
            last_end: Position::default(),
            options,
            errors: Vec::new(),
            php,
        }
    }

    pub fn parse(&mut self) -> Result<Tree, ParseError> {
        let children = self.parse_nodes(None)?;
        let end = self
            .tokens
            .last()
            .map(|t| t.span.end)
            .unwrap_or_default();
        Ok(Tree {
            children,
            errors: std::mem::take(&mut self.errors),
            span: Span::new(Position::default(), end),
        })
    }

    // --- Token cursor ---

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_kind(&self, n: usize) -> TokenKind {
        self.tokens[(self.pos + n).min(self.tokens.len() - 1)].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        self.last_end = token.span.end;
        token
    }

    /// Record a syntactic anomaly: an error node in suppress mode, a
    /// structured failure in fail-fast mode.
    fn record_error(&mut self, message: String, span: Span) -> Result<(), ParseError> {
        if self.options.suppress_errors {
            self.errors.push(ErrorNode { message, span });
            Ok(())
        } else {
            Err(ParseError::Syntax {
                message,
                line: span.start.line,
                character: span.start.character,
            })
        }
    }

    /// Consume the current token if it matches, else record an error node
    /// spanning the unexpected token and keep the position unchanged.
    fn expect(&mut self, kind: TokenKind) -> Result<Option<Token>, ParseError> {
        if self.kind() == kind {
            return Ok(Some(self.advance()));
        }
        let span = self.current().span;
        let found = self.kind();
        self.record_error(format!("expected {:?}, found {:?}", kind, found), span)?;
        Ok(None)
    }

    fn is_structural(kind: TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::StartTagOpen
                | TokenKind::EndTagOpen
                | TokenKind::EchoOpen
                | TokenKind::RawEchoOpen
                | TokenKind::CommentOpen
                | TokenKind::PhpTagOpen
                | TokenKind::PhpEchoOpen
                | TokenKind::At
                | TokenKind::ScriptContent
                | TokenKind::StyleContent
                | TokenKind::EndOfFile
        )
    }

    // --- Productions ---

    /// Parse sibling nodes until end of file or, inside an element, any
    /// closing tag (matching or not — a mismatch is resolved by an
    /// ancestor, which is what keeps recovery balanced).
    fn parse_nodes(&mut self, enclosing: Option<&str>) -> Result<Vec<Node>, ParseError> {
        let mut nodes: Vec<Node> = Vec::new();
        loop {
            match self.kind() {
                TokenKind::EndOfFile => break,
                TokenKind::EndTagOpen => {
                    if enclosing.is_some() {
                        break;
                    }
                    // Stray closing tag at the top level.
                    let open = self.advance();
                    let mut span = open.span;
                    if self.kind() == TokenKind::Name {
                        span.end = self.advance().span.end;
                    }
                    if self.kind() == TokenKind::TagClose {
                        span.end = self.advance().span.end;
                    }
                    self.record_error("unexpected closing tag".to_string(), span)?;
                }
                TokenKind::StartTagOpen => {
                    let element = self.parse_element()?;
                    nodes.push(element);
                }
                TokenKind::EchoOpen | TokenKind::RawEchoOpen => {
                    let echo = self.parse_echo()?;
                    nodes.push(Node::Echo(echo));
                }
                TokenKind::CommentOpen => {
                    let comment = self.parse_comment()?;
                    nodes.push(Node::Comment(comment));
                }
                TokenKind::PhpTagOpen | TokenKind::PhpEchoOpen => {
                    let region = self.parse_php_tag(false)?;
                    nodes.push(Node::EmbeddedRegion(region));
                }
                TokenKind::At => {
                    let directive = self.parse_directive()?;
                    nodes.push(Node::Directive(directive));
                }
                TokenKind::ScriptContent => {
                    let token = self.advance();
                    nodes.push(Node::EmbeddedRegion(EmbeddedRegion {
                        language: Language::Js,
                        text: token.text(self.source).to_string(),
                        in_attribute: false,
                        expression: None,
                        span: token.span,
                    }));
                }
                TokenKind::StyleContent => {
                    let token = self.advance();
                    nodes.push(Node::EmbeddedRegion(EmbeddedRegion {
                        language: Language::Css,
                        text: token.text(self.source).to_string(),
                        in_attribute: false,
                        expression: None,
                        span: token.span,
                    }));
                }
                _ => {
                    let text = self.parse_text_run();
                    nodes.push(text);
                }
            }
        }
        Ok(nodes)
    }

    /// Merge consecutive non-structural tokens into one text node.
    fn parse_text_run(&mut self) -> Node {
        let first = self.advance();
        let start = first.span.start;
        let mut end = first.span.end;
        while !Self::is_structural(self.kind()) {
            end = self.advance().span.end;
        }
        Node::Text(TextRun {
            text: self.source[start.offset..end.offset].to_string(),
            span: Span::new(start, end),
        })
    }

    fn parse_element(&mut self) -> Result<Node, ParseError> {
        let open = self.advance(); // <
        let start = open.span.start;
        let name_token = self.expect(TokenKind::Name)?;
        let (name, name_span) = match &name_token {
            Some(t) => (t.name(self.source).to_string(), t.span),
            None => (String::new(), open.span),
        };

        let attributes = self.parse_attributes()?;

        let mut element = Element {
            name,
            name_span,
            attributes,
            children: Vec::new(),
            self_closing: false,
            closing: TagClosing::Unclosed,
            span: Span::new(start, self.last_end),
        };

        match self.kind() {
            TokenKind::TagSelfClose => {
                let t = self.advance();
                element.self_closing = true;
                element.closing = TagClosing::SelfClosed;
                element.span.end = t.span.end;
                return Ok(Node::Element(element));
            }
            TokenKind::TagClose => {
                let t = self.advance();
                element.span.end = t.span.end;
            }
            _ => {
                let span = self.current().span;
                self.record_error(
                    format!("unterminated start tag <{}>", element.name),
                    span,
                )?;
                element.span.end = self.last_end;
                return Ok(Node::Element(element));
            }
        }

        if VOID_ELEMENTS.contains(&element.name.to_ascii_lowercase().as_str()) {
            element.closing = TagClosing::Void;
            return Ok(Node::Element(element));
        }

        let enclosing = element.name.clone();
        element.children = self.parse_nodes(Some(&enclosing))?;

        if self.close_tag_matches(&element.name) {
            self.advance(); // </
            let name_t = self.advance(); // name
            element.span.end = name_t.span.end;
            if let Some(t) = self.expect(TokenKind::TagClose)? {
                element.span.end = t.span.end;
            }
            element.closing = TagClosing::Closed;
        } else {
            // Close tag missing or owned by an ancestor: degrade the end
            // location to the last consumed token.
            let at = Span::new(self.last_end, self.last_end);
            self.record_error(format!("missing closing tag for <{}>", element.name), at)?;
            element.span.end = self.last_end;
            element.closing = TagClosing::Unclosed;
        }

        Ok(Node::Element(element))
    }

    fn close_tag_matches(&self, name: &str) -> bool {
        self.kind() == TokenKind::EndTagOpen
            && self.peek_kind(1) == TokenKind::Name
            && self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
                .name(self.source)
                .eq_ignore_ascii_case(name)
    }

    fn parse_attributes(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut attributes = Vec::new();
        loop {
            match self.kind() {
                TokenKind::TagClose
                | TokenKind::TagSelfClose
                | TokenKind::EndOfFile
                | TokenKind::StartTagOpen
                | TokenKind::EndTagOpen => break,
                TokenKind::Name => {
                    let attribute = self.parse_attribute(None)?;
                    attributes.push(attribute);
                }
                TokenKind::At => {
                    // `@click=...` is an attribute; anything else is a
                    // directive interleaved with the attributes.
                    if self.peek_kind(1) == TokenKind::Name
                        && self.peek_kind(2) == TokenKind::Equals
                    {
                        let at = self.advance();
                        let attribute = self.parse_attribute(Some(at))?;
                        attributes.push(attribute);
                    } else {
                        let directive = self.parse_directive()?;
                        attributes.push(Node::Directive(directive));
                    }
                }
                TokenKind::EchoOpen | TokenKind::RawEchoOpen => {
                    let echo = self.parse_echo()?;
                    attributes.push(Node::Echo(echo));
                }
                TokenKind::CommentOpen => {
                    let comment = self.parse_comment()?;
                    attributes.push(Node::Comment(comment));
                }
                TokenKind::PhpTagOpen | TokenKind::PhpEchoOpen => {
                    let region = self.parse_php_tag(false)?;
                    attributes.push(Node::EmbeddedRegion(region));
                }
                _ => {
                    let token = self.advance();
                    self.record_error(
                        format!("unexpected {:?} in tag", token.kind),
                        token.span,
                    )?;
                }
            }
        }
        Ok(attributes)
    }

    /// Parse an attribute starting at a Name token. When `at` is given the
    /// attribute is the framework-style `@name=` form and the `@` token has
    /// already been consumed.
    fn parse_attribute(&mut self, at: Option<Token>) -> Result<Node, ParseError> {
        let name_token = self.advance();
        let mut name = name_token.name(self.source).to_string();
        let mut span = name_token.span;
        if let Some(at) = at {
            name = format!("@{}", name);
            span.start = at.span.start;
        }

        let mut attribute = Attribute {
            name,
            name_span: name_token.span,
            value: None,
            span,
        };

        if self.kind() == TokenKind::Equals {
            self.advance();
            attribute.value = self.parse_attribute_value()?;
            if let Some(value) = &attribute.value {
                attribute.span.end = value.span.end;
            }
        }
        Ok(Node::Attribute(attribute))
    }

    fn parse_attribute_value(&mut self) -> Result<Option<AttributeValue>, ParseError> {
        match self.kind() {
            TokenKind::Quote => {
                let open = self.advance();
                let quote = open.text(self.source).chars().next();
                let start = open.span.start;
                let mut end = open.span.end;
                let mut parts = Vec::new();
                loop {
                    match self.kind() {
                        TokenKind::Quote => {
                            end = self.advance().span.end;
                            break;
                        }
                        TokenKind::EndOfFile => {
                            let span = Span::new(self.last_end, self.last_end);
                            self.record_error("unterminated attribute value".to_string(), span)?;
                            end = self.last_end;
                            break;
                        }
                        TokenKind::EchoOpen | TokenKind::RawEchoOpen => {
                            let echo = self.parse_echo()?;
                            parts.push(Node::Echo(echo));
                        }
                        TokenKind::CommentOpen => {
                            let comment = self.parse_comment()?;
                            parts.push(Node::Comment(comment));
                        }
                        TokenKind::At => {
                            let directive = self.parse_directive()?;
                            parts.push(Node::Directive(directive));
                        }
                        TokenKind::PhpTagOpen | TokenKind::PhpEchoOpen => {
                            let region = self.parse_php_tag(true)?;
                            parts.push(Node::EmbeddedRegion(region));
                        }
                        _ => {
                            // Single-token text: the closing quote must stay
                            // visible to this loop.
                            let token = self.advance();
                            parts.push(Node::Text(TextRun {
                                text: token.text(self.source).to_string(),
                                span: token.span,
                            }));
                        }
                    }
                }
                Ok(Some(AttributeValue {
                    quote,
                    parts,
                    span: Span::new(start, end),
                }))
            }
            TokenKind::Content => {
                let token = self.advance();
                Ok(Some(AttributeValue {
                    quote: None,
                    parts: vec![Node::Text(TextRun {
                        text: token.text(self.source).to_string(),
                        span: token.span,
                    })],
                    span: token.span,
                }))
            }
            TokenKind::EchoOpen | TokenKind::RawEchoOpen => {
                let echo = self.parse_echo()?;
                let span = echo.span;
                Ok(Some(AttributeValue {
                    quote: None,
                    parts: vec![Node::Echo(echo)],
                    span,
                }))
            }
            TokenKind::At => {
                let directive = self.parse_directive()?;
                let span = directive.span;
                Ok(Some(AttributeValue {
                    quote: None,
                    parts: vec![Node::Directive(directive)],
                    span,
                }))
            }
            _ => Ok(None),
        }
    }

    fn parse_echo(&mut self) -> Result<Echo, ParseError> {
        let open = self.advance();
        let (kind, content_kind, close_kind) = match open.kind {
            TokenKind::EchoOpen => (
                EchoKind::Escaped,
                TokenKind::EchoContent,
                TokenKind::EchoClose,
            ),
            _ => (
                EchoKind::Raw,
                TokenKind::RawEchoContent,
                TokenKind::RawEchoClose,
            ),
        };

        let mut content = String::new();
        let mut content_span = Span::new(open.span.end, open.span.end);
        if self.kind() == content_kind {
            let token = self.advance();
            content = token.text(self.source).to_string();
            content_span = token.span;
        }
        let close = self.expect(close_kind)?;
        let end = close.map(|t| t.span.end).unwrap_or(self.last_end);

        let expression = self.parse_php_snippet(&content, content_span.start);
        Ok(Echo {
            kind,
            content,
            content_span,
            expression,
            span: Span::new(open.span.start, end),
        })
    }

    fn parse_comment(&mut self) -> Result<BladeComment, ParseError> {
        let open = self.advance();
        let mut content = String::new();
        if self.kind() == TokenKind::CommentContent {
            content = self.advance().text(self.source).to_string();
        }
        let close = self.expect(TokenKind::CommentClose)?;
        let end = close.map(|t| t.span.end).unwrap_or(self.last_end);
        Ok(BladeComment {
            content,
            span: Span::new(open.span.start, end),
        })
    }

    fn parse_php_tag(&mut self, in_attribute: bool) -> Result<EmbeddedRegion, ParseError> {
        let open = self.advance(); // <?php or <?=
        let mut text = String::new();
        let mut content_start = open.span.end;
        if self.kind() == TokenKind::PhpContent {
            let token = self.advance();
            text = token.text(self.source).to_string();
            content_start = token.span.start;
        }
        let close = self.expect(TokenKind::PhpTagClose)?;
        let end = close.map(|t| t.span.end).unwrap_or(self.last_end);

        let expression = self.parse_php_snippet(&text, content_start);
        Ok(EmbeddedRegion {
            language: Language::Php,
            text,
            in_attribute,
            expression,
            span: Span::new(open.span.start, end),
        })
    }

    fn parse_directive(&mut self) -> Result<Directive, ParseError> {
        let at = self.advance(); // @
        let name_token = self.expect(TokenKind::Name)?;
        let (name, name_span) = match &name_token {
            Some(t) => (t.name(self.source).to_string(), t.span),
            None => (String::new(), at.span),
        };

        let mut directive = Directive {
            name,
            name_span,
            params: None,
            children: Vec::new(),
            span: Span::new(at.span.start, name_span.end),
        };

        match self.kind() {
            TokenKind::DirectiveParams => {
                let token = self.advance();
                let full = token.text(self.source);
                let inner = full.strip_prefix('(').unwrap_or(full);
                let inner = inner.strip_suffix(')').unwrap_or(inner);
                let mut inner_start = token.span.start;
                inner_start.advance("(");
                let expression = self.parse_php_snippet(inner, inner_start);
                directive.span.end = token.span.end;
                directive.params = Some(DirectiveParams {
                    text: inner.to_string(),
                    span: token.span,
                    expression,
                });
            }
            TokenKind::VerbatimContent => {
                // Verbatim body: plain markup excluded from Blade expansion.
                let token = self.advance();
                directive.children.push(Node::EmbeddedRegion(EmbeddedRegion {
                    language: Language::Html,
                    text: token.text(self.source).to_string(),
                    in_attribute: false,
                    expression: None,
                    span: token.span,
                }));
                self.expect(TokenKind::At)?;
                if let Some(t) = self.expect(TokenKind::Name)? {
                    directive.span.end = t.span.end;
                }
            }
            TokenKind::PhpContent => {
                // `@php ... @endphp` block.
                let token = self.advance();
                let text = token.text(self.source).to_string();
                let expression = self.parse_php_snippet(&text, token.span.start);
                directive.children.push(Node::EmbeddedRegion(EmbeddedRegion {
                    language: Language::Php,
                    text,
                    in_attribute: false,
                    expression,
                    span: token.span,
                }));
                self.expect(TokenKind::At)?;
                if let Some(t) = self.expect(TokenKind::Name)? {
                    directive.span.end = t.span.end;
                }
            }
            _ => {}
        }

        Ok(directive)
    }

    fn parse_php_snippet(&mut self, text: &str, base: Position) -> Option<ExpressionAst> {
        if text.trim().is_empty() {
            return None;
        }
        let base = if self.options.with_positions {
            base
        } else {
            Position::default()
        };
        self.php.parse_snippet(text, base)
    }
}
