//! HTML to document tree

use scraper::{ElementRef, Html, Node};

use super::ast::{Block, Inline, Style};

/// Tags treated as blocks even though they are not converted
const OPAQUE_BLOCKS: &[&str] = &[
    "div", "section", "article", "aside", "header", "footer", "nav", "table", "figure",
    "details", "iframe", "video", "audio", "form", "dl",
];

/// Parse editor HTML into blocks
pub fn parse_html(html: &str) -> Vec<Block> {
    let fragment = Html::parse_fragment(html);
    parse_blocks(fragment.root_element())
}

fn parse_blocks(parent: ElementRef<'_>) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut loose: Vec<Inline> = Vec::new();

    for child in parent.children() {
        match child.value() {
            Node::Text(text) => loose.push(Inline::Text(collapse_whitespace(text))),
            Node::Element(_) => {
                let Some(element) = ElementRef::wrap(child) else {
                    continue;
                };
                match parse_block(element) {
                    Some(block) => {
                        flush_loose(&mut loose, &mut blocks);
                        blocks.push(block);
                    }
                    None => loose.extend(parse_inline(element)),
                }
            }
            _ => {}
        }
    }

    flush_loose(&mut loose, &mut blocks);
    blocks
}

/// Inline content found directly inside a block container becomes a paragraph
fn flush_loose(loose: &mut Vec<Inline>, blocks: &mut Vec<Block>) {
    let has_content = loose.iter().any(|inline| match inline {
        Inline::Text(t) => !t.trim().is_empty(),
        _ => true,
    });
    if has_content {
        blocks.push(Block::Paragraph(std::mem::take(loose)));
    } else {
        loose.clear();
    }
}

/// Convert a block element; `None` if the element is inline
fn parse_block(element: ElementRef<'_>) -> Option<Block> {
    let name = element.value().name();
    let block = match name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse::<u8>().unwrap_or(3).min(3);
            Block::Heading {
                level,
                content: parse_inlines(element),
            }
        }
        "p" => Block::Paragraph(parse_inlines(element)),
        "pre" => parse_code_block(element),
        "blockquote" => Block::Blockquote(parse_blocks(element)),
        "ul" | "ol" => parse_list(element, name == "ol"),
        "hr" => Block::Rule,
        _ if OPAQUE_BLOCKS.contains(&name) => Block::Raw(element.html()),
        _ => return None,
    };
    Some(block)
}

fn parse_code_block(pre: ElementRef<'_>) -> Block {
    let code_element = pre
        .children()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "code");

    let language = code_element.and_then(|code| {
        code.value()
            .classes()
            .find_map(|class| class.strip_prefix("language-"))
            .filter(|lang| !lang.is_empty())
            .map(str::to_string)
    });

    let mut code: String = pre.text().collect();
    if code.ends_with('\n') {
        code.pop();
    }

    Block::CodeBlock { language, code }
}

/// Markdown list numbers have at most nine digits
const MAX_LIST_START: u64 = 999_999_999;

fn parse_list(list: ElementRef<'_>, ordered: bool) -> Block {
    let items: Vec<Vec<Block>> = list
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "li")
        .map(parse_blocks)
        .collect();

    // The last item number must still fit
    let highest_start = MAX_LIST_START.saturating_sub(items.len().saturating_sub(1) as u64);
    let start = list
        .value()
        .attr("start")
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|n| n.min(highest_start))
        .unwrap_or(1);

    Block::List {
        ordered,
        start,
        items,
    }
}

/// Inline children of an element
fn parse_inlines(element: ElementRef<'_>) -> Vec<Inline> {
    let mut inlines = Vec::new();
    for child in element.children() {
        match child.value() {
            Node::Text(text) => inlines.push(Inline::Text(collapse_whitespace(text))),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    inlines.extend(parse_inline(child));
                }
            }
            _ => {}
        }
    }
    inlines
}

fn parse_inline(element: ElementRef<'_>) -> Vec<Inline> {
    let inline = match element.value().name() {
        "strong" | "b" => Inline::styled(Style::Strong, parse_inlines(element)),
        "em" | "i" => Inline::styled(Style::Emphasis, parse_inlines(element)),
        "del" | "s" | "strike" => Inline::styled(Style::Strikethrough, parse_inlines(element)),
        "code" => Inline::Code(element.text().collect()),
        "br" => Inline::LineBreak,
        "img" => match element.value().attr("src") {
            Some(src) if !src.trim().is_empty() => Inline::Image {
                src: src.trim().to_string(),
                alt: element.value().attr("alt").unwrap_or_default().to_string(),
            },
            _ => return Vec::new(),
        },
        "a" => match element.value().attr("href") {
            Some(href) if !href.trim().is_empty() => Inline::Link {
                href: href.trim().to_string(),
                content: parse_inlines(element),
            },
            _ => return parse_inlines(element),
        },
        // Editor wrappers that carry no formatting of their own
        "p" | "li" | "span" if element.value().attrs().next().is_none() => {
            return parse_inlines(element)
        }
        _ => Inline::Raw(element.html()),
    };
    vec![inline]
}

/// HTML whitespace rules: any run of whitespace renders as one space
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}
