//! Tree cleanup before emission
//!
//! Editors produce redundant markup: empty `<strong></strong>` pairs,
//! adjacent spans with the same style, and whitespace inside style
//! boundaries. Emitting those verbatim yields markers that do not parse
//! back as the intended formatting (`** bold**`), so the tree is
//! rewritten into a canonical shape first.

use super::ast::{Block, Inline, Style};

pub fn normalize(blocks: Vec<Block>) -> Vec<Block> {
    blocks.into_iter().filter_map(normalize_block).collect()
}

fn normalize_block(block: Block) -> Option<Block> {
    match block {
        Block::Heading { level, content } => {
            let content = trim_edges(normalize_inlines(content));
            (!content.is_empty()).then_some(Block::Heading { level, content })
        }
        Block::Paragraph(content) => {
            let content = trim_edges(normalize_inlines(content));
            (!content.is_empty()).then_some(Block::Paragraph(content))
        }
        Block::Blockquote(children) => {
            let children = normalize(children);
            (!children.is_empty()).then_some(Block::Blockquote(children))
        }
        Block::List {
            ordered,
            start,
            items,
        } => {
            let items: Vec<Vec<Block>> = items
                .into_iter()
                .map(normalize)
                .filter(|item| !item.is_empty())
                .collect();
            (!items.is_empty()).then_some(Block::List {
                ordered,
                start,
                items,
            })
        }
        Block::Raw(html) => {
            let html = html.trim().to_string();
            (!html.is_empty()).then_some(Block::Raw(html))
        }
        other @ (Block::CodeBlock { .. } | Block::Rule) => Some(other),
    }
}

fn normalize_inlines(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut out = Vec::new();
    for inline in inlines {
        for piece in normalize_inline(inline) {
            push_merged(&mut out, piece);
        }
    }
    out
}

fn normalize_inline(inline: Inline) -> Vec<Inline> {
    match inline {
        Inline::Text(text) if text.is_empty() => Vec::new(),
        Inline::Code(code) if code.is_empty() => Vec::new(),
        Inline::Styled { style, content } => normalize_styled(style, content),
        Inline::Link { href, content } => vec![Inline::Link {
            href,
            content: normalize_inlines(content),
        }],
        other => vec![other],
    }
}

fn normalize_styled(style: Style, content: Vec<Inline>) -> Vec<Inline> {
    // Same style nested inside itself adds nothing
    let flattened: Vec<Inline> = normalize_inlines(content)
        .into_iter()
        .flat_map(|inline| match inline {
            Inline::Styled { style: inner, content } if inner == style => content,
            other => vec![other],
        })
        .collect();

    let mut content = Vec::new();
    for inline in flattened {
        push_merged(&mut content, inline);
    }

    let leading = take_leading_space(&mut content);
    let trailing = take_trailing_space(&mut content);

    let mut out = Vec::new();
    if leading {
        out.push(Inline::text(" "));
    }
    if !content.is_empty() {
        out.push(Inline::styled(style, content));
    }
    if trailing {
        out.push(Inline::text(" "));
    }
    out
}

/// Append an inline, merging it into the previous one where possible
fn push_merged(out: &mut Vec<Inline>, inline: Inline) {
    let inline = match (out.last_mut(), inline) {
        (Some(Inline::Text(prev)), Inline::Text(next)) => {
            if prev.ends_with(' ') && next.starts_with(' ') {
                prev.push_str(&next[1..]);
            } else {
                prev.push_str(&next);
            }
            return;
        }
        (
            Some(Inline::Styled {
                style: prev_style,
                content: prev_content,
            }),
            Inline::Styled { style, content },
        ) if *prev_style == style => {
            for child in content {
                push_merged(prev_content, child);
            }
            return;
        }
        (_, inline) => inline,
    };
    out.push(inline);
}

fn take_leading_space(content: &mut Vec<Inline>) -> bool {
    let Some(Inline::Text(text)) = content.first_mut() else {
        return false;
    };
    let trimmed = text.trim_start();
    if trimmed.len() == text.len() {
        return false;
    }
    *text = trimmed.to_string();
    if text.is_empty() {
        content.remove(0);
    }
    true
}

fn take_trailing_space(content: &mut Vec<Inline>) -> bool {
    let Some(Inline::Text(text)) = content.last_mut() else {
        return false;
    };
    let trimmed = text.trim_end();
    if trimmed.len() == text.len() {
        return false;
    }
    *text = trimmed.to_string();
    if text.is_empty() {
        content.pop();
    }
    true
}

/// Strip whitespace and line breaks at the start and end of a block
fn trim_edges(mut content: Vec<Inline>) -> Vec<Inline> {
    loop {
        match content.first_mut() {
            Some(Inline::LineBreak) => {
                content.remove(0);
            }
            Some(Inline::Text(text)) => {
                let trimmed = text.trim_start();
                if trimmed.is_empty() {
                    content.remove(0);
                } else {
                    *text = trimmed.to_string();
                    break;
                }
            }
            _ => break,
        }
    }
    loop {
        match content.last_mut() {
            Some(Inline::LineBreak) => {
                content.pop();
            }
            Some(Inline::Text(text)) => {
                let trimmed = text.trim_end();
                if trimmed.is_empty() {
                    content.pop();
                } else {
                    *text = trimmed.to_string();
                    break;
                }
            }
            _ => break,
        }
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strong(content: Vec<Inline>) -> Inline {
        Inline::styled(Style::Strong, content)
    }

    fn em(content: Vec<Inline>) -> Inline {
        Inline::styled(Style::Emphasis, content)
    }

    #[test]
    fn test_empty_styles_dropped() {
        let out = normalize_inlines(vec![
            Inline::text("a"),
            strong(vec![]),
            em(vec![Inline::text("")]),
            Inline::text("b"),
        ]);
        assert_eq!(out, vec![Inline::text("ab")]);
    }

    #[test]
    fn test_whitespace_only_style_becomes_space() {
        let out = normalize_inlines(vec![
            Inline::text("a"),
            strong(vec![Inline::text(" ")]),
            Inline::text("b"),
        ]);
        assert_eq!(out, vec![Inline::text("a b")]);
    }

    #[test]
    fn test_adjacent_same_style_merged() {
        let out = normalize_inlines(vec![
            strong(vec![Inline::text("a")]),
            strong(vec![Inline::text("b")]),
        ]);
        assert_eq!(out, vec![strong(vec![Inline::text("ab")])]);
    }

    #[test]
    fn test_edge_whitespace_hoisted() {
        let out = normalize_inlines(vec![
            Inline::text("x"),
            strong(vec![Inline::text(" bold ")]),
            Inline::text("y"),
        ]);
        assert_eq!(
            out,
            vec![
                Inline::text("x "),
                strong(vec![Inline::text("bold")]),
                Inline::text(" y"),
            ]
        );
    }

    #[test]
    fn test_nested_same_style_flattened() {
        let out = normalize_inlines(vec![strong(vec![strong(vec![Inline::text("a")])])]);
        assert_eq!(out, vec![strong(vec![Inline::text("a")])]);
    }

    #[test]
    fn test_different_styles_kept_apart() {
        let input = vec![strong(vec![Inline::text("a")]), em(vec![Inline::text("b")])];
        assert_eq!(normalize_inlines(input.clone()), input);
    }

    #[test]
    fn test_blank_paragraph_dropped() {
        let blocks = normalize(vec![
            Block::Paragraph(vec![Inline::text("  "), Inline::LineBreak]),
            Block::Paragraph(vec![Inline::text(" keep ")]),
        ]);
        assert_eq!(blocks, vec![Block::Paragraph(vec![Inline::text("keep")])]);
    }

    #[test]
    fn test_empty_list_items_dropped() {
        let blocks = normalize(vec![Block::List {
            ordered: false,
            start: 1,
            items: vec![vec![Block::Paragraph(vec![])], vec![]],
        }]);
        assert!(blocks.is_empty());
    }
}
