//! Embedded-language region extraction.
//!
//! Flattens a parsed tree into the list of spans belonging to other
//! languages (PHP expressions and blocks, raw script/style content, verbatim
//! markup). Consumers synthesize per-language virtual documents from these:
//! content outside a language's regions is whitespace-padded to preserve
//! offsets, PHP regions are handed to the PHP parser.

use crate::ast::{Language, Node, Tree};
use blade_lsp_types::Span;

/// One contiguous span tagged with its language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageRegion {
    pub language: Language,
    pub span: Span,
    /// Whether the region occurs inside an attribute value.
    pub in_attribute: bool,
}

/// Collect all embedded-language regions of a parsed document in source
/// order.
pub fn extract_regions(tree: &Tree) -> Vec<LanguageRegion> {
    let mut regions = Vec::new();
    for node in &tree.children {
        collect(node, false, &mut regions);
    }
    regions.sort_by_key(|r| r.span.start.offset);
    regions
}

fn collect(node: &Node, in_attribute: bool, out: &mut Vec<LanguageRegion>) {
    match node {
        Node::Element(element) => {
            for attribute in &element.attributes {
                collect(attribute, in_attribute, out);
            }
            for child in &element.children {
                collect(child, in_attribute, out);
            }
        }
        Node::Attribute(attribute) => {
            if let Some(value) = &attribute.value {
                for part in &value.parts {
                    collect(part, true, out);
                }
            }
        }
        Node::Directive(directive) => {
            if let Some(params) = &directive.params {
                out.push(LanguageRegion {
                    language: Language::Php,
                    span: params.span,
                    in_attribute,
                });
            }
            for child in &directive.children {
                collect(child, in_attribute, out);
            }
        }
        Node::Echo(echo) => {
            out.push(LanguageRegion {
                language: Language::Php,
                span: echo.content_span,
                in_attribute,
            });
        }
        Node::EmbeddedRegion(region) => {
            out.push(LanguageRegion {
                language: region.language,
                span: region.span,
                in_attribute: region.in_attribute || in_attribute,
            });
        }
        Node::Comment(_) | Node::Text(_) | Node::Error(_) => {}
    }
}
