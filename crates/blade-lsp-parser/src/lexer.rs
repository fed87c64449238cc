//! Blade/HTML template lexer.
//!
//! A state machine over the generic [`Tokenizer`](crate::tokenizer::Tokenizer)
//! that recognizes HTML tag structure, Blade echo/raw/comment/directive
//! syntax and embedded-language boundaries. Content between recognized
//! symbols is skipped in bulk with a single scan rather than tokenized
//! character by character.

use crate::token::{Token, TokenKind, Trivia};
use crate::tokenizer::{default_trivia, Rule, Tokenizer};
use blade_lsp_types::Span;
use regex::Regex;
use std::collections::VecDeque;
use std::sync::OnceLock;

/// Lexer states. `WithinScript` covers raw `<script>` capture; `<style>`
/// content is captured verbatim at the tag-close transition without nesting
/// rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexerState {
    WithinContent,
    AfterOpeningStartTag,
    WithinTag,
    WithinEndTag,
    AfterAttributeName,
    BeforeAttributeValue,
    WithinScript,
}

macro_rules! cached_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("invalid lexer pattern"))
        }
    };
}

cached_regex!(content_special, r"<|@|\{\{|\{!!");
cached_regex!(echo_close, r"\}\}");
cached_regex!(raw_echo_close, r"!!\}");
cached_regex!(comment_close, r"--\}\}");
cached_regex!(php_close, r"\?>");
cached_regex!(end_verbatim, r"@endverbatim");
cached_regex!(end_php_block, r"@endphp");
cached_regex!(dq_value_special, r#""|\{\{|\{!!|@"#);
cached_regex!(sq_value_special, r"'|\{\{|\{!!|@");
cached_regex!(unquoted_value, r#"[^ \t\r\n"'=<>/]+"#);
cached_regex!(leading_ws, r"[ \t\r\n]+");
cached_regex!(script_special, r"(?i)<!--|-->|</script|<script");
cached_regex!(style_close, r"(?i)</style");

fn token_rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            Rule::new(r"\{\{--", TokenKind::CommentOpen),
            Rule::new(r"--\}\}", TokenKind::CommentClose),
            Rule::new(r"\{\{", TokenKind::EchoOpen),
            Rule::new(r"\}\}", TokenKind::EchoClose),
            Rule::new(r"\{!!", TokenKind::RawEchoOpen),
            Rule::new(r"!!\}", TokenKind::RawEchoClose),
            Rule::new(r"(?i)<\?php", TokenKind::PhpTagOpen),
            Rule::new(r"<\?=", TokenKind::PhpEchoOpen),
            Rule::new(r"\?>", TokenKind::PhpTagClose),
            Rule::new(r"</", TokenKind::EndTagOpen),
            Rule::new(r"/>", TokenKind::TagSelfClose),
            Rule::new(r"<", TokenKind::StartTagOpen),
            Rule::new(r">", TokenKind::TagClose),
            Rule::new(r"=", TokenKind::Equals),
            Rule::new(r#"["']"#, TokenKind::Quote),
            Rule::new(r"@", TokenKind::At),
            Rule::new(r"[A-Za-z_][-A-Za-z0-9_:.]*", TokenKind::Name),
            Rule::new(r"[ \t]+", TokenKind::Whitespace),
            Rule::new(r"\r?\n", TokenKind::Newline),
        ]
    })
}

const SKIP_KINDS: &[TokenKind] = &[TokenKind::Whitespace, TokenKind::Newline];

/// Template lexer. Produces the full token stream for one document; re-lex
/// is always whole-document.
pub struct Lexer<'s> {
    tok: Tokenizer<'s>,
    state: LexerState,
    queue: VecDeque<Token>,
    last_tag: Option<String>,
    last_attribute: Option<String>,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str) -> Self {
        Lexer {
            tok: Tokenizer::new(source, token_rules(), SKIP_KINDS, default_trivia),
            state: LexerState::WithinContent,
            queue: VecDeque::new(),
            last_tag: None,
            last_attribute: None,
        }
    }

    pub fn source(&self) -> &'s str {
        self.tok.source()
    }

    pub fn state(&self) -> LexerState {
        self.state
    }

    /// The most recently opened tag name, lowercased.
    pub fn last_tag(&self) -> Option<&str> {
        self.last_tag.as_deref()
    }

    /// The most recently lexed attribute name.
    pub fn last_attribute(&self) -> Option<&str> {
        self.last_attribute.as_deref()
    }

    /// Produce the next token. After the end of input this keeps returning
    /// `EndOfFile`.
    pub fn next(&mut self) -> Token {
        loop {
            if let Some(token) = self.queue.pop_front() {
                return token;
            }
            self.step();
        }
    }

    /// Lex the whole document.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next();
            let eof = token.kind == TokenKind::EndOfFile;
            tokens.push(token);
            if eof {
                return tokens;
            }
        }
    }

    fn step(&mut self) {
        if self.tok.is_eof() {
            let pos = self.tok.position();
            let token = self.tok.make_token(TokenKind::EndOfFile, pos);
            self.push(token);
            return;
        }
        match self.state {
            LexerState::WithinContent => self.lex_content(),
            LexerState::AfterOpeningStartTag => self.lex_tag_name(),
            LexerState::WithinTag | LexerState::AfterAttributeName => self.lex_within_tag(),
            LexerState::WithinEndTag => self.lex_end_tag(),
            LexerState::BeforeAttributeValue => self.lex_attribute_value(),
            LexerState::WithinScript => self.lex_script(),
        }
    }

    fn push(&mut self, token: Token) {
        self.queue.push_back(token);
    }

    fn raw_token(&self, kind: TokenKind, span: Span) -> Token {
        Token {
            kind,
            span,
            length: span.len(),
            trivia: Trivia::default(),
        }
    }

    /// Emit a raw-content token up to the first occurrence of `until`
    /// (non-nesting). Returns whether the close pattern was found; it is not
    /// consumed.
    fn scan_raw(&mut self, until: &Regex, kind: TokenKind) -> bool {
        let (span, found) = self.tok.advance_until_regex(until);
        if !span.is_empty() {
            let token = self.raw_token(kind, span);
            self.push(token);
        }
        if !found {
            tracing::debug!(?kind, "unterminated raw region, degraded to end of input");
        }
        found
    }

    fn lex_content(&mut self) {
        let (span, _) = self.tok.advance_until_regex(content_special());
        if !span.is_empty() {
            let token = self.raw_token(TokenKind::Content, span);
            self.push(token);
        }
        if self.tok.is_eof() {
            return;
        }

        match self.tok.current_char() {
            Some('@') => {
                let at = self.tok.next_token();
                self.lex_at(at);
            }
            Some('<') => {
                let token = self.tok.next_token();
                match token.kind {
                    TokenKind::PhpTagOpen | TokenKind::PhpEchoOpen => {
                        self.push(token);
                        if self.scan_raw(php_close(), TokenKind::PhpContent) {
                            let close = self.tok.next_token();
                            self.push(close);
                        }
                    }
                    TokenKind::EndTagOpen => {
                        self.push(token);
                        self.state = LexerState::WithinEndTag;
                    }
                    TokenKind::StartTagOpen => {
                        // `<` only opens a tag when a name follows.
                        if matches!(self.tok.current_char(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                        {
                            self.push(token);
                            self.state = LexerState::AfterOpeningStartTag;
                        } else {
                            let literal = Token {
                                kind: TokenKind::Content,
                                ..token
                            };
                            self.push(literal);
                        }
                    }
                    _ => self.push(token),
                }
            }
            _ => {
                // `{{`, `{{--` or `{!!` — the rule table picks the longest.
                let token = self.tok.next_token();
                self.lex_blade_span(token);
            }
        }
    }

    /// Handle an already-consumed Blade open delimiter and its raw body.
    fn lex_blade_span(&mut self, open: Token) {
        match open.kind {
            TokenKind::CommentOpen => {
                self.push(open);
                if self.scan_raw(comment_close(), TokenKind::CommentContent) {
                    let close = self.tok.next_token();
                    self.push(close);
                }
            }
            TokenKind::EchoOpen => {
                self.push(open);
                if self.scan_raw(echo_close(), TokenKind::EchoContent) {
                    let close = self.tok.next_token();
                    self.push(close);
                }
            }
            TokenKind::RawEchoOpen => {
                self.push(open);
                if self.scan_raw(raw_echo_close(), TokenKind::RawEchoContent) {
                    let close = self.tok.next_token();
                    self.push(close);
                }
            }
            TokenKind::PhpTagOpen | TokenKind::PhpEchoOpen => {
                self.push(open);
                if self.scan_raw(php_close(), TokenKind::PhpContent) {
                    let close = self.tok.next_token();
                    self.push(close);
                }
            }
            _ => self.push(open),
        }
    }

    /// Handle an already-consumed `@` token in any state. Returns the name
    /// when the construct turned out to be a framework-style attribute
    /// (`@click=`) rather than a directive, so tag states can resume normal
    /// attribute scanning.
    fn lex_at(&mut self, at: Token) -> Option<String> {
        // `@` followed by whitespace (or nothing, or a non-name) is not a
        // directive: pop it back to literal content.
        let literal = match self.tok.current_char() {
            None => true,
            Some(c) if c.is_whitespace() => true,
            Some(c) => !(c.is_ascii_alphabetic() || c == '_'),
        };
        if literal {
            let token = Token {
                kind: TokenKind::Content,
                ..at
            };
            self.push(token);
            return None;
        }

        self.push(at);
        let name_token = self.tok.next_token();
        let name = name_token.name(self.tok.source()).to_string();
        self.push(name_token);

        match name.as_str() {
            "verbatim" => {
                // Peek-until: only suppress content when a matching end
                // marker actually exists; otherwise `@verbatim` is ordinary
                // content and nothing is swallowed.
                let rest = &self.tok.source()[self.tok.offset()..];
                if end_verbatim().is_match(rest) {
                    self.scan_raw(end_verbatim(), TokenKind::VerbatimContent);
                    let end_at = self.tok.next_token();
                    self.push(end_at);
                    let end_name = self.tok.next_token();
                    self.push(end_name);
                } else {
                    tracing::debug!("@verbatim without @endverbatim, treated as content");
                }
            }
            "php" => {
                if self.tok.current_char() == Some('(') {
                    self.scan_balanced_params();
                } else if self.scan_raw(end_php_block(), TokenKind::PhpContent) {
                    let end_at = self.tok.next_token();
                    self.push(end_at);
                    let end_name = self.tok.next_token();
                    self.push(end_name);
                }
            }
            _ => {
                // `@name(` captures a parenthesis-balanced argument region;
                // `@name=` is a framework attribute and the `=` is left for
                // the surrounding tag state.
                if self.tok.current_char() == Some('(') {
                    self.scan_balanced_params();
                } else if self.tok.current_char() == Some('=') {
                    return Some(name);
                }
            }
        }
        None
    }

    /// Capture `( ... )` with depth counting over nested parentheses,
    /// terminating when the depth returns to zero.
    fn scan_balanced_params(&mut self) {
        let source = self.tok.source();
        let start_offset = self.tok.offset();
        let mut depth = 0usize;
        let mut end = None;
        for (i, c) in source[start_offset..].char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(start_offset + i + 1);
                        break;
                    }
                }
                _ => {}
            }
        }
        let end = end.unwrap_or_else(|| {
            tracing::debug!("unbalanced directive argument, degraded to end of input");
            source.len()
        });
        let span = self.tok.advance_to(end);
        let token = self.raw_token(TokenKind::DirectiveParams, span);
        self.push(token);
    }

    fn lex_tag_name(&mut self) {
        let token = self.tok.next_token();
        if token.kind == TokenKind::Name {
            self.last_tag = Some(token.name(self.tok.source()).to_ascii_lowercase());
            self.push(token);
            self.state = LexerState::WithinTag;
        } else {
            self.push(token);
            self.state = LexerState::WithinContent;
        }
    }

    fn lex_within_tag(&mut self) {
        let token = self.tok.next_token();
        match token.kind {
            TokenKind::Name => {
                self.last_attribute = Some(token.name(self.tok.source()).to_string());
                self.push(token);
                self.state = LexerState::AfterAttributeName;
            }
            TokenKind::Equals if self.state == LexerState::AfterAttributeName => {
                self.push(token);
                self.state = LexerState::BeforeAttributeValue;
            }
            TokenKind::TagSelfClose => {
                self.push(token);
                self.last_tag = None;
                self.state = LexerState::WithinContent;
            }
            TokenKind::TagClose => {
                self.push(token);
                match self.last_tag.as_deref() {
                    Some("script") => self.state = LexerState::WithinScript,
                    Some("style") => {
                        self.lex_style_content();
                        self.state = LexerState::WithinContent;
                    }
                    _ => self.state = LexerState::WithinContent,
                }
            }
            TokenKind::EchoOpen
            | TokenKind::RawEchoOpen
            | TokenKind::CommentOpen
            | TokenKind::PhpTagOpen
            | TokenKind::PhpEchoOpen => {
                self.state = LexerState::WithinTag;
                self.lex_blade_span(token);
            }
            TokenKind::At => {
                self.state = LexerState::WithinTag;
                if let Some(name) = self.lex_at(token) {
                    // `@click=` behaves like an attribute name.
                    self.last_attribute = Some(format!("@{}", name));
                    self.state = LexerState::AfterAttributeName;
                }
            }
            TokenKind::EndTagOpen => {
                self.push(token);
                self.state = LexerState::WithinEndTag;
            }
            TokenKind::StartTagOpen => {
                // Malformed: a new tag begins inside the current one.
                self.push(token);
                self.state = LexerState::AfterOpeningStartTag;
            }
            _ => self.push(token),
        }
    }

    fn lex_end_tag(&mut self) {
        let token = self.tok.next_token();
        match token.kind {
            TokenKind::Name => self.push(token),
            TokenKind::TagClose => {
                self.push(token);
                self.state = LexerState::WithinContent;
            }
            TokenKind::EndOfFile => self.push(token),
            _ => {
                self.push(token);
                self.state = LexerState::WithinContent;
            }
        }
    }

    fn lex_attribute_value(&mut self) {
        self.tok.advance_if_regex(leading_ws());
        match self.tok.current_char() {
            Some(q @ ('"' | '\'')) => {
                let open = self.tok.next_token();
                self.push(open);
                let special = if q == '"' {
                    dq_value_special()
                } else {
                    sq_value_special()
                };
                loop {
                    let (span, found) = self.tok.advance_until_regex(special);
                    if !span.is_empty() {
                        let token = self.raw_token(TokenKind::Content, span);
                        self.push(token);
                    }
                    if !found {
                        tracing::debug!("unterminated attribute value");
                        break;
                    }
                    match self.tok.current_char() {
                        Some(c) if c == q => {
                            let close = self.tok.next_token();
                            self.push(close);
                            break;
                        }
                        Some('@') => {
                            let at = self.tok.next_token();
                            self.lex_at(at);
                        }
                        _ => {
                            let open = self.tok.next_token();
                            self.lex_blade_span(open);
                        }
                    }
                }
                self.state = LexerState::WithinTag;
            }
            Some('>') | Some('/') | None => {
                // No value after `=`; let the tag state consume what follows.
                self.state = LexerState::WithinTag;
            }
            Some('@') => {
                let at = self.tok.next_token();
                self.lex_at(at);
                self.state = LexerState::WithinTag;
            }
            _ => {
                let peeked = self.tok.peek(0);
                if matches!(
                    peeked.kind,
                    TokenKind::EchoOpen | TokenKind::RawEchoOpen | TokenKind::CommentOpen
                ) {
                    let open = self.tok.next_token();
                    self.lex_blade_span(open);
                } else if let Some(span) = self.tok.advance_if_regex(unquoted_value()) {
                    let token = self.raw_token(TokenKind::Content, span);
                    self.push(token);
                } else {
                    let token = self.tok.next_token();
                    self.push(token);
                }
                self.state = LexerState::WithinTag;
            }
        }
    }

    /// Verbatim `<style>` capture, no nesting rules.
    fn lex_style_content(&mut self) {
        let (span, found) = self.tok.advance_until_regex(style_close());
        if !span.is_empty() {
            let token = self.raw_token(TokenKind::StyleContent, span);
            self.push(token);
        }
        if !found {
            tracing::debug!("unterminated <style> content");
        }
    }

    /// Raw `<script>` capture. Legacy comment-wrapped scripts are honored:
    /// a `<script>` opened inside `<!-- -->` needs its own `</script>`
    /// before the real closing tag is recognized.
    fn lex_script(&mut self) {
        let start = self.tok.position();
        let mut in_comment = false;
        let mut nested_script = false;
        loop {
            let (_, found) = self.tok.advance_until_regex(script_special());
            if !found {
                tracing::debug!("unterminated <script> content");
                break;
            }
            let offset = self.tok.offset();
            let rest = &self.tok.source()[offset..];
            if rest.starts_with("<!--") {
                in_comment = true;
                self.tok.advance_to(offset + 4);
            } else if rest.starts_with("-->") {
                in_comment = false;
                self.tok.advance_to(offset + 3);
            } else if rest.get(..8).is_some_and(|s| s.eq_ignore_ascii_case("</script")) {
                if nested_script {
                    nested_script = false;
                    self.tok.advance_to(offset + 8);
                } else {
                    break;
                }
            } else {
                if in_comment {
                    nested_script = true;
                }
                self.tok.advance_to(offset + 7);
            }
        }
        let end = self.tok.position();
        if end.offset > start.offset {
            let token = self.raw_token(TokenKind::ScriptContent, Span::new(start, end));
            self.push(token);
        }
        self.state = LexerState::WithinContent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize()
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    fn texts<'s>(tokens: &[Token], source: &'s str) -> Vec<&'s str> {
        tokens.iter().map(|t| t.text(source)).collect()
    }

    #[test]
    fn test_plain_element() {
        let source = "<div>hello</div>";
        let tokens = lex(source);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::StartTagOpen,
                TokenKind::Name,
                TokenKind::TagClose,
                TokenKind::Content,
                TokenKind::EndTagOpen,
                TokenKind::Name,
                TokenKind::TagClose,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_attributes_and_values() {
        let source = r#"<a href="/home" disabled x=10>"#;
        let tokens = lex(source);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::StartTagOpen,
                TokenKind::Name, // a
                TokenKind::Name, // href
                TokenKind::Equals,
                TokenKind::Quote,
                TokenKind::Content, // /home
                TokenKind::Quote,
                TokenKind::Name, // disabled
                TokenKind::Name, // x
                TokenKind::Equals,
                TokenKind::Content, // 10
                TokenKind::TagClose,
                TokenKind::EndOfFile,
            ]
        );
        // The attribute name is resolved via trivia, no look-behind rescan.
        assert_eq!(tokens[2].trivia.text.as_deref(), Some("href"));
        assert!(tokens[2].trivia.skipped_whitespace);
    }

    #[test]
    fn test_echo_tokens() {
        let source = "a {{ $x }} b";
        let tokens = lex(source);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Content,
                TokenKind::EchoOpen,
                TokenKind::EchoContent,
                TokenKind::EchoClose,
                TokenKind::Content,
                TokenKind::EndOfFile,
            ]
        );
        assert_eq!(tokens[2].text(source), " $x ");
    }

    #[test]
    fn test_echo_close_scan_is_non_nesting() {
        // The close scan stops at the first `}}`, even inside a string.
        let source = "{{ '}}' }}";
        let tokens = lex(source);
        assert_eq!(tokens[1].kind, TokenKind::EchoContent);
        assert_eq!(tokens[1].text(source), " '");
        assert_eq!(tokens[2].kind, TokenKind::EchoClose);
    }

    #[test]
    fn test_raw_echo_and_comment() {
        let source = "{!! $html !!}{{-- note --}}";
        let tokens = lex(source);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::RawEchoOpen,
                TokenKind::RawEchoContent,
                TokenKind::RawEchoClose,
                TokenKind::CommentOpen,
                TokenKind::CommentContent,
                TokenKind::CommentClose,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_php_tags() {
        let source = "x <?php echo 1; ?> y <?= $v ?> z";
        let tokens = lex(source);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Content,
                TokenKind::PhpTagOpen,
                TokenKind::PhpContent,
                TokenKind::PhpTagClose,
                TokenKind::Content,
                TokenKind::PhpEchoOpen,
                TokenKind::PhpContent,
                TokenKind::PhpTagClose,
                TokenKind::Content,
                TokenKind::EndOfFile,
            ]
        );
        assert_eq!(tokens[2].text(source), " echo 1; ");
    }

    #[test]
    fn test_unterminated_php_tag_degrades_to_eof() {
        let source = "<?php echo 1;";
        let tokens = lex(source);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::PhpTagOpen,
                TokenKind::PhpContent,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_directive_with_balanced_nested_params() {
        let source = "@if(foo(1,2), bar())";
        let tokens = lex(source);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::At,
                TokenKind::Name,
                TokenKind::DirectiveParams,
                TokenKind::EndOfFile,
            ]
        );
        assert_eq!(tokens[2].text(source), "(foo(1,2), bar())");
    }

    #[test]
    fn test_bare_directive() {
        let source = "@csrf\n";
        let tokens = lex(source);
        assert_eq!(tokens[0].kind, TokenKind::At);
        assert_eq!(tokens[1].kind, TokenKind::Name);
        assert_eq!(tokens[1].name(source), "csrf");
    }

    #[test]
    fn test_at_followed_by_whitespace_is_literal() {
        let source = "mail @ example";
        let tokens = lex(source);
        assert_eq!(
            texts(&tokens, source),
            vec!["mail ", "@", " example", ""]
        );
        assert!(tokens.iter().all(|t| t.kind != TokenKind::At));
    }

    #[test]
    fn test_verbatim_with_end_marker() {
        let source = "@verbatim {{ raw }} @endverbatim after";
        let tokens = lex(source);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::At,
                TokenKind::Name, // verbatim
                TokenKind::VerbatimContent,
                TokenKind::At,
                TokenKind::Name, // endverbatim
                TokenKind::Content,
                TokenKind::EndOfFile,
            ]
        );
        assert_eq!(tokens[2].text(source), " {{ raw }} ");
    }

    #[test]
    fn test_verbatim_without_end_marker_does_not_swallow() {
        let source = "@verbatim cannot close {{ $x }}";
        let tokens = lex(source);
        // No verbatim capture: the echo after it is still tokenized.
        assert!(tokens.iter().all(|t| t.kind != TokenKind::VerbatimContent));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::EchoOpen));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::EchoClose));
    }

    #[test]
    fn test_php_block_directive() {
        let source = "@php $x = 1; @endphp";
        let tokens = lex(source);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::At,
                TokenKind::Name, // php
                TokenKind::PhpContent,
                TokenKind::At,
                TokenKind::Name, // endphp
                TokenKind::EndOfFile,
            ]
        );
        assert_eq!(tokens[2].text(source), " $x = 1; ");
    }

    #[test]
    fn test_php_directive_with_params() {
        let source = "@php($x = 1)";
        let tokens = lex(source);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::At,
                TokenKind::Name,
                TokenKind::DirectiveParams,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_framework_attribute_is_not_a_directive() {
        let source = r#"<button @click="open = true">"#;
        let tokens = lex(source);
        let click = tokens
            .iter()
            .position(|t| t.trivia.text.as_deref() == Some("click"))
            .unwrap();
        assert_eq!(tokens[click - 1].kind, TokenKind::At);
        assert_eq!(tokens[click + 1].kind, TokenKind::Equals);
        assert_eq!(tokens[click + 2].kind, TokenKind::Quote);
        assert!(tokens.iter().all(|t| t.kind != TokenKind::DirectiveParams));
    }

    #[test]
    fn test_blade_inside_attribute_value() {
        let source = r#"<a href="{{ $url }}">"#;
        let tokens = lex(source);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::StartTagOpen,
                TokenKind::Name,
                TokenKind::Name,
                TokenKind::Equals,
                TokenKind::Quote,
                TokenKind::EchoOpen,
                TokenKind::EchoContent,
                TokenKind::EchoClose,
                TokenKind::Quote,
                TokenKind::TagClose,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_directive_inside_tag() {
        let source = "<input @disabled(true)>";
        let tokens = lex(source);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::StartTagOpen,
                TokenKind::Name,
                TokenKind::At,
                TokenKind::Name,
                TokenKind::DirectiveParams,
                TokenKind::TagClose,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_script_raw_capture() {
        let source = "<script>if (a < b) { run(); }</script>";
        let tokens = lex(source);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::StartTagOpen,
                TokenKind::Name,
                TokenKind::TagClose,
                TokenKind::ScriptContent,
                TokenKind::EndTagOpen,
                TokenKind::Name,
                TokenKind::TagClose,
                TokenKind::EndOfFile,
            ]
        );
        assert_eq!(tokens[3].text(source), "if (a < b) { run(); }");
    }

    #[test]
    fn test_script_with_comment_wrapped_nested_script() {
        let source = "<script><!-- <script>x</script> --></script>";
        let tokens = lex(source);
        let content = tokens
            .iter()
            .find(|t| t.kind == TokenKind::ScriptContent)
            .unwrap();
        assert_eq!(content.text(source), "<!-- <script>x</script> -->");
    }

    #[test]
    fn test_style_raw_capture() {
        let source = "<style>a > b { color: red; }</style>";
        let tokens = lex(source);
        let content = tokens
            .iter()
            .find(|t| t.kind == TokenKind::StyleContent)
            .unwrap();
        assert_eq!(content.text(source), "a > b { color: red; }");
    }

    #[test]
    fn test_self_closing_tag() {
        let source = "<br/>text";
        let tokens = lex(source);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::StartTagOpen,
                TokenKind::Name,
                TokenKind::TagSelfClose,
                TokenKind::Content,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_lone_angle_bracket_is_content() {
        let source = "1 < 2";
        let tokens = lex(source);
        assert!(tokens.iter().all(|t| t.kind != TokenKind::StartTagOpen));
        let rebuilt: String = tokens.iter().map(|t| t.text(source)).collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_idempotent_relex() {
        let source = r#"<div class="{{ $c }}">@if(x) hi @endif</div>"#;
        assert_eq!(lex(source), lex(source));
    }

    #[test]
    fn test_spans_are_monotonic_and_non_overlapping() {
        let source = r#"<p a="{{ $x }}">@each('x', $items) <?php f(); ?></p>"#;
        let tokens = lex(source);
        for pair in tokens.windows(2) {
            assert!(
                pair[0].span.end.offset <= pair[1].span.start.offset,
                "overlap between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }
}
