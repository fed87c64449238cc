//! Token stream produced by the tokenizer and the template lexer.

use blade_lsp_types::Span;

/// Kind of a lexed token. This is a closed enumeration: anything the rules
/// do not recognize surfaces as a 1-character `Unrecognized` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Structural punctuation
    StartTagOpen, // <
    EndTagOpen,   // </
    TagClose,     // >
    TagSelfClose, // />
    Equals,       // =
    Quote,        // ' or "

    // Names (tag, attribute and directive names)
    Name,

    // Blade delimiters
    EchoOpen,     // {{
    EchoClose,    // }}
    RawEchoOpen,  // {!!
    RawEchoClose, // !!}
    CommentOpen,  // {{--
    CommentClose, // --}}
    At,           // @

    // PHP tag delimiters
    PhpTagOpen,  // <?php
    PhpEchoOpen, // <?=
    PhpTagClose, // ?>

    // Raw-content markers: spans captured in bulk, not tokenized inside
    Content,
    PhpContent,
    EchoContent,
    RawEchoContent,
    CommentContent,
    DirectiveParams,
    VerbatimContent,
    ScriptContent,
    StyleContent,

    // Trivia
    Whitespace,
    Newline,

    EndOfFile,
    Unrecognized,
}

/// Side information attached to a token.
///
/// `skipped_whitespace` records whether trivia was skipped immediately
/// before this token, so the lexer can test "was there whitespace here"
/// without a look-behind rescan. For `Name` tokens, `text` holds the
/// resolved name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trivia {
    pub skipped_whitespace: bool,
    pub text: Option<String>,
}

/// One token with its span in the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub length: usize,
    pub trivia: Trivia,
}

impl Token {
    /// Slice the token's text out of the source it was lexed from.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.start.offset..self.span.end.offset]
    }

    /// The resolved name for `Name` tokens, falling back to the span text.
    pub fn name<'s>(&'s self, source: &'s str) -> &'s str {
        match &self.trivia.text {
            Some(text) => text,
            None => self.text(source),
        }
    }
}
