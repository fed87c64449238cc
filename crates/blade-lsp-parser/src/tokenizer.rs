//! Generic regex-table-driven tokenizer.
//!
//! Matches an ordered rule table at the current offset (longest match wins,
//! ties go to the earlier rule), records skipped trivia instead of emitting
//! it, and exposes raw-capture primitives for spans that are not tokenized
//! internally. Reusable by any lexer that works over a rule table.

use crate::token::{Token, TokenKind, Trivia};
use blade_lsp_types::{Position, Span};
use regex::Regex;

/// One tokenizer rule: a pattern matched at the current offset mapping to a
/// token kind.
pub struct Rule {
    regex: Regex,
    kind: TokenKind,
}

impl Rule {
    pub fn new(pattern: &str, kind: TokenKind) -> Self {
        Rule {
            regex: Regex::new(pattern).expect("invalid tokenizer rule pattern"),
            kind,
        }
    }
}

/// Callback computing a token's trivia from its kind, text and whether
/// trivia was skipped immediately before it.
pub type TriviaFn = fn(TokenKind, &str, bool) -> Trivia;

/// Default trivia: record the skip flag, resolve text for name tokens.
pub fn default_trivia(kind: TokenKind, text: &str, skipped_whitespace: bool) -> Trivia {
    Trivia {
        skipped_whitespace,
        text: match kind {
            TokenKind::Name => Some(text.to_string()),
            _ => None,
        },
    }
}

/// Saved tokenizer state for backtracking.
#[derive(Debug, Clone, Copy)]
pub struct TokenizerState {
    pos: Position,
    skipped: bool,
}

/// Regex-table scanner over one source document with incremental position
/// tracking (line, UTF-16 character, byte offset).
pub struct Tokenizer<'s> {
    source: &'s str,
    pos: Position,
    rules: &'s [Rule],
    skip: &'s [TokenKind],
    trivia: TriviaFn,
    skipped: bool,
}

impl<'s> Tokenizer<'s> {
    pub fn new(
        source: &'s str,
        rules: &'s [Rule],
        skip: &'s [TokenKind],
        trivia: TriviaFn,
    ) -> Self {
        Tokenizer {
            source,
            pos: Position::default(),
            rules,
            skip,
            trivia,
            skipped: false,
        }
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    pub fn offset(&self) -> usize {
        self.pos.offset
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos.offset >= self.source.len()
    }

    /// The byte remaining at the current offset, if any.
    pub fn current_char(&self) -> Option<char> {
        self.source[self.pos.offset..].chars().next()
    }

    /// Save the current state for later backtracking.
    pub fn state(&self) -> TokenizerState {
        TokenizerState {
            pos: self.pos,
            skipped: self.skipped,
        }
    }

    /// Restore a previously saved state.
    pub fn restore(&mut self, state: TokenizerState) {
        self.pos = state.pos;
        self.skipped = state.skipped;
    }

    /// Move to an arbitrary byte offset, recomputing the position from the
    /// start of the document. Prefer `state`/`restore` on hot paths.
    pub fn set_offset(&mut self, offset: usize) {
        let offset = offset.min(self.source.len());
        let mut pos = Position::default();
        pos.advance(&self.source[..offset]);
        self.pos = pos;
        self.skipped = false;
    }

    /// Produce the next non-trivia token. Skipped kinds are recorded into
    /// the following token's trivia rather than emitted. Never fails: input
    /// no rule matches becomes a 1-character `Unrecognized` token.
    pub fn next_token(&mut self) -> Token {
        loop {
            if self.is_eof() {
                return self.make_token(TokenKind::EndOfFile, self.pos);
            }

            let rest = &self.source[self.pos.offset..];
            let mut best: Option<(usize, TokenKind)> = None;
            for rule in self.rules {
                if let Some(m) = rule.regex.find(rest) {
                    if m.start() != 0 || m.len() == 0 {
                        continue;
                    }
                    match best {
                        Some((len, _)) if m.len() <= len => {}
                        _ => best = Some((m.len(), rule.kind)),
                    }
                }
            }

            let start = self.pos;
            let token = match best {
                Some((len, kind)) => {
                    self.advance_len(len);
                    self.make_token(kind, start)
                }
                None => {
                    // No rule matched: consume one character so the caller
                    // always makes progress.
                    let len = rest.chars().next().map(char::len_utf8).unwrap_or(1);
                    self.advance_len(len);
                    self.make_token(TokenKind::Unrecognized, start)
                }
            };

            if self.skip.contains(&token.kind) {
                self.skipped = true;
                continue;
            }
            return token;
        }
    }

    /// Look ahead `n` tokens (0 = the next token) without consuming.
    pub fn peek(&mut self, n: usize) -> Token {
        let saved = self.state();
        let mut token = self.next_token();
        for _ in 0..n {
            token = self.next_token();
        }
        self.restore(saved);
        token
    }

    /// Advance to the start of the first match of `until` (or to the end of
    /// the document) and return the span covered plus whether the pattern
    /// was found. The match itself is not consumed.
    ///
    /// This is the single non-nesting raw scanning primitive: it stops at
    /// the first occurrence of the pattern with no awareness of nesting.
    pub fn advance_until_regex(&mut self, until: &Regex) -> (Span, bool) {
        let start = self.pos;
        let rest = &self.source[self.pos.offset..];
        match until.find(rest) {
            Some(m) => {
                self.advance_len(m.start());
                (Span::new(start, self.pos), true)
            }
            None => {
                self.advance_len(rest.len());
                (Span::new(start, self.pos), false)
            }
        }
    }

    /// Advance to an absolute byte offset at or after the current one and
    /// return the span covered. Used for captures whose end the caller
    /// computed itself (e.g. balanced-parenthesis scanning).
    pub fn advance_to(&mut self, offset: usize) -> Span {
        let start = self.pos;
        let target = offset.clamp(self.pos.offset, self.source.len());
        let text = &self.source[self.pos.offset..target];
        self.pos.advance(text);
        Span::new(start, self.pos)
    }

    /// Consume a match of `re` at the current offset, if present.
    pub fn advance_if_regex(&mut self, re: &Regex) -> Option<Span> {
        let rest = &self.source[self.pos.offset..];
        let m = re.find(rest)?;
        if m.start() != 0 || m.len() == 0 {
            return None;
        }
        let start = self.pos;
        self.advance_len(m.len());
        Some(Span::new(start, self.pos))
    }

    /// Build a token from `start` to the current position, consuming the
    /// recorded skip flag.
    pub fn make_token(&mut self, kind: TokenKind, start: Position) -> Token {
        let skipped = std::mem::take(&mut self.skipped);
        let span = Span::new(start, self.pos);
        let text = &self.source[span.start.offset..span.end.offset];
        Token {
            kind,
            span,
            length: span.len(),
            trivia: (self.trivia)(kind, text, skipped),
        }
    }

    fn advance_len(&mut self, len: usize) {
        let end = (self.pos.offset + len).min(self.source.len());
        let text = &self.source[self.pos.offset..end];
        self.pos.advance(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<Rule> {
        vec![
            Rule::new(r"\{\{--", TokenKind::CommentOpen),
            Rule::new(r"\{\{", TokenKind::EchoOpen),
            Rule::new(r"\}\}", TokenKind::EchoClose),
            Rule::new(r"[A-Za-z_][A-Za-z0-9_]*", TokenKind::Name),
            Rule::new(r"[ \t]+", TokenKind::Whitespace),
            Rule::new(r"\r?\n", TokenKind::Newline),
        ]
    }

    fn tokenize_all(source: &str, rules: &[Rule], skip: &[TokenKind]) -> Vec<Token> {
        let mut tok = Tokenizer::new(source, rules, skip, default_trivia);
        let mut out = Vec::new();
        loop {
            let t = tok.next_token();
            let eof = t.kind == TokenKind::EndOfFile;
            out.push(t);
            if eof {
                break;
            }
        }
        out
    }

    #[test]
    fn test_longest_match_wins() {
        let rules = rules();
        let mut tok = Tokenizer::new("{{--", &rules, &[], default_trivia);
        assert_eq!(tok.next_token().kind, TokenKind::CommentOpen);
    }

    #[test]
    fn test_skip_records_trivia() {
        let rules = rules();
        let skip = [TokenKind::Whitespace, TokenKind::Newline];
        let mut tok = Tokenizer::new("foo  bar", &rules, &skip, default_trivia);
        let foo = tok.next_token();
        assert!(!foo.trivia.skipped_whitespace);
        let bar = tok.next_token();
        assert!(bar.trivia.skipped_whitespace);
        assert_eq!(bar.trivia.text.as_deref(), Some("bar"));
    }

    #[test]
    fn test_unrecognized_fallback_always_progresses() {
        let rules = rules();
        let tokens = tokenize_all("§§", &rules, &[]);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].kind, TokenKind::Unrecognized);
        assert_eq!(tokens[1].kind, TokenKind::Unrecognized);
        assert_eq!(tokens[2].kind, TokenKind::EndOfFile);
    }

    #[test]
    fn test_span_coverage_reconstructs_source() {
        let rules = rules();
        let source = "foo {{ bar }}\nbaz §";
        let tokens = tokenize_all(source, &rules, &[]);
        let mut rebuilt = String::new();
        for t in &tokens {
            rebuilt.push_str(t.text(source));
        }
        assert_eq!(rebuilt, source);
        // No overlap, monotonically increasing.
        for pair in tokens.windows(2) {
            assert!(pair[0].span.end.offset <= pair[1].span.start.offset);
        }
    }

    #[test]
    fn test_idempotent_relex() {
        let rules = rules();
        let source = "foo {{ bar }}\nbaz";
        let a = tokenize_all(source, &rules, &[TokenKind::Whitespace]);
        let b = tokenize_all(source, &rules, &[TokenKind::Whitespace]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let rules = rules();
        let mut tok = Tokenizer::new("foo bar", &rules, &[TokenKind::Whitespace], default_trivia);
        let peeked = tok.peek(1);
        assert_eq!(peeked.trivia.text.as_deref(), Some("bar"));
        let next = tok.next_token();
        assert_eq!(next.trivia.text.as_deref(), Some("foo"));
    }

    #[test]
    fn test_advance_until_regex_captures_raw_span() {
        let rules = rules();
        let mut tok = Tokenizer::new("abc }} def", &rules, &[], default_trivia);
        let close = Regex::new(r"\}\}").unwrap();
        let (span, found) = tok.advance_until_regex(&close);
        assert!(found);
        assert_eq!(&"abc }} def"[span.start.offset..span.end.offset], "abc ");
        assert_eq!(tok.offset(), 4);
    }

    #[test]
    fn test_advance_until_regex_to_eof() {
        let rules = rules();
        let mut tok = Tokenizer::new("abc", &rules, &[], default_trivia);
        let close = Regex::new(r"\}\}").unwrap();
        let (span, found) = tok.advance_until_regex(&close);
        assert!(!found);
        assert_eq!(span.end.offset, 3);
        assert!(tok.is_eof());
    }

    #[test]
    fn test_set_offset_recomputes_position() {
        let rules = rules();
        let mut tok = Tokenizer::new("ab\ncd", &rules, &[], default_trivia);
        tok.set_offset(4);
        assert_eq!(tok.position().line, 1);
        assert_eq!(tok.position().character, 1);
    }

    #[test]
    fn test_position_tracking_lines() {
        let rules = rules();
        let mut tok = Tokenizer::new("foo\nbar", &rules, &[], default_trivia);
        tok.next_token(); // foo
        tok.next_token(); // newline
        let bar = tok.next_token();
        assert_eq!(bar.span.start.line, 1);
        assert_eq!(bar.span.start.character, 0);
        assert_eq!(bar.span.start.offset, 4);
    }
}
