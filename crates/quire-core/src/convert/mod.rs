//! Rich-text editor output to stored Markdown
//!
//! Conversion is structural: the HTML fragment is parsed into a small
//! document tree, the tree is normalized, and Markdown is emitted from
//! the tree. Elements outside the supported set are kept as raw HTML.

pub mod ast;
mod emit;
mod normalize;
mod parse;

pub use ast::{Block, Inline, Style};

/// Convert editor HTML into the stored body format
pub fn to_storage_format(html: &str) -> String {
    let blocks = normalize::normalize(parse::parse_html(html));
    tracing::debug!(blocks = blocks.len(), "Converted rich text");
    emit::emit(&blocks)
}

/// Parse and normalize without emitting
pub fn parse(html: &str) -> Vec<Block> {
    normalize::normalize(parse::parse_html(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_document() {
        let html = "<h2>Intro</h2>\
            <p>Hello <strong>world</strong>, this is <em>new</em>.</p>\
            <ul><li><p>one</p></li><li><p>two</p></li></ul>\
            <hr>\
            <pre><code class=\"language-sh\">echo hi\n</code></pre>";
        assert_eq!(
            to_storage_format(html),
            "## Intro\n\n\
             Hello **world**, this is _new_.\n\n\
             - one\n- two\n\n\
             ---\n\n\
             ```sh\necho hi\n```\n"
        );
    }

    #[test]
    fn test_redundant_markup_cleaned() {
        let html = "<p><strong>a</strong><strong> b</strong><em></em> <s> </s>c</p>";
        assert_eq!(to_storage_format(html), "**a** **b** c\n");
    }

    #[test]
    fn test_whitespace_inside_markers_moved_out() {
        assert_eq!(
            to_storage_format("<p>say<strong> hi </strong>now</p>"),
            "say **hi** now\n"
        );
    }

    #[test]
    fn test_image_and_inline_code() {
        assert_eq!(
            to_storage_format("<p>run <code>ls</code></p><img src=\"/uploads/x.png\" alt=\"\">"),
            "run `ls`\n\n![image](/uploads/x.png)\n"
        );
    }

    #[test]
    fn test_unknown_inline_passes_through() {
        assert_eq!(
            to_storage_format("<p>E = mc<sup>2</sup></p>"),
            "E = mc<sup>2</sup>\n"
        );
    }

    #[test]
    fn test_blockquote_with_paragraphs() {
        assert_eq!(
            to_storage_format("<blockquote><p>quoted</p></blockquote>"),
            "> quoted\n"
        );
    }

    #[test]
    fn test_deep_heading_clamped() {
        assert_eq!(to_storage_format("<h6>Tiny</h6>"), "### Tiny\n");
    }

    #[test]
    fn test_bang_before_link_stays_a_link() {
        assert_eq!(
            to_storage_format("<p>Wow!<a href=\"https://x.io\">click</a></p>"),
            "Wow\\![click](https://x.io)\n"
        );
    }

    #[test]
    fn test_huge_list_start_clamped() {
        assert_eq!(
            to_storage_format("<ol start=\"18446744073709551615\"><li><p>a</p></li><li><p>b</p></li></ol>"),
            "999999998. a\n999999999. b\n"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(to_storage_format(""), "");
        assert_eq!(to_storage_format("<p></p>"), "");
    }

    #[test]
    fn test_plain_text_fragment() {
        assert_eq!(to_storage_format("just text"), "just text\n");
    }
}
