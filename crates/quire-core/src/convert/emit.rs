//! Document tree to Markdown/MDX text

use super::ast::{Block, Inline, Style};

/// Characters that carry meaning anywhere in a line of Markdown or MDX
const ESCAPED: &[char] = &['\\', '`', '*', '_', '[', ']', '<', '{', '}', '~'];

/// Render blocks as a Markdown document ending in a single newline
pub fn emit(blocks: &[Block]) -> String {
    let mut out = emit_blocks(blocks);
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn emit_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(emit_block)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn emit_block(block: &Block) -> String {
    match block {
        Block::Heading { level, content } => {
            let text = emit_inlines(content).replace("\\\n", " ");
            format!("{} {}", "#".repeat(*level as usize), text)
        }
        Block::Paragraph(content) => emit_inlines(content)
            .lines()
            .map(escape_line_start)
            .collect::<Vec<_>>()
            .join("\n"),
        Block::CodeBlock { language, code } => {
            let fence = "`".repeat((longest_run(code, '`') + 1).max(3));
            format!(
                "{fence}{}\n{code}\n{fence}",
                language.as_deref().unwrap_or_default()
            )
        }
        Block::Blockquote(children) => emit_blocks(children)
            .lines()
            .map(|line| {
                if line.is_empty() {
                    ">".to_string()
                } else {
                    format!("> {line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Block::List {
            ordered,
            start,
            items,
        } => emit_list(*ordered, *start, items),
        Block::Rule => "---".to_string(),
        Block::Raw(html) => html.clone(),
    }
}

fn emit_list(ordered: bool, start: u64, items: &[Vec<Block>]) -> String {
    let rendered: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let marker = if ordered {
                format!("{}. ", start.saturating_add(index as u64))
            } else {
                "- ".to_string()
            };
            let indent = " ".repeat(marker.len());
            let body = emit_list_item(item);

            let mut lines = body.lines();
            let mut text = format!("{marker}{}", lines.next().unwrap_or_default());
            for line in lines {
                text.push('\n');
                if !line.is_empty() {
                    text.push_str(&indent);
                    text.push_str(line);
                }
            }
            text
        })
        .collect();

    // A blank line inside any item makes the whole list loose
    let separator = if rendered.iter().any(|item| item.contains("\n\n")) {
        "\n\n"
    } else {
        "\n"
    };
    rendered.join(separator)
}

/// Item blocks; a nested list hugs the text above it
fn emit_list_item(blocks: &[Block]) -> String {
    let mut out = String::new();
    for (index, block) in blocks.iter().enumerate() {
        if index > 0 {
            out.push_str(if matches!(block, Block::List { .. }) {
                "\n"
            } else {
                "\n\n"
            });
        }
        out.push_str(&emit_block(block));
    }
    out
}

fn emit_inlines(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for (index, inline) in inlines.iter().enumerate() {
        match inline {
            Inline::Text(text) => out.push_str(&escape_text(text)),
            Inline::Styled { style, content } => {
                let marker = match style {
                    Style::Strong => "**",
                    Style::Strikethrough => "~~",
                    Style::Emphasis => {
                        // Underscores do not open emphasis inside a word
                        let before = out.chars().last().is_some_and(char::is_alphanumeric);
                        let after = inlines
                            .get(index + 1)
                            .is_some_and(starts_with_alphanumeric);
                        if before || after {
                            "*"
                        } else {
                            "_"
                        }
                    }
                };
                out.push_str(marker);
                out.push_str(&emit_inlines(content));
                out.push_str(marker);
            }
            Inline::Code(code) => out.push_str(&code_span(code)),
            Inline::Link { href, content } => {
                let text = emit_inlines(content);
                let text = if text.is_empty() {
                    escape_text(href)
                } else {
                    text
                };
                // `!` right before `[` would turn the link into an image
                if out.ends_with('!') {
                    out.pop();
                    out.push_str("\\!");
                }
                out.push_str(&format!("[{text}]({})", destination(href)));
            }
            Inline::Image { src, alt } => {
                let alt = if alt.trim().is_empty() {
                    "image".to_string()
                } else {
                    escape_text(alt.trim())
                };
                out.push_str(&format!("![{alt}]({})", destination(src)));
            }
            Inline::LineBreak => out.push_str("\\\n"),
            Inline::Raw(html) => out.push_str(html),
        }
    }
    out
}

fn starts_with_alphanumeric(inline: &Inline) -> bool {
    match inline {
        Inline::Text(text) => text.chars().next().is_some_and(char::is_alphanumeric),
        _ => false,
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if ESCAPED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape characters that would start a block construct at the beginning of a line
fn escape_line_start(line: &str) -> String {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];

    let mut chars = trimmed.chars();
    let needs_escape = match chars.next() {
        Some('#' | '>' | '+' | '=' | '|') => true,
        Some('-') => matches!(chars.next(), None | Some(' ' | '-')),
        Some(c) if c.is_ascii_digit() => {
            let rest = trimmed.trim_start_matches(|c: char| c.is_ascii_digit());
            rest.starts_with(". ") || rest.starts_with(") ") || rest == "." || rest == ")"
        }
        _ => false,
    };

    if !needs_escape {
        return line.to_string();
    }
    match trimmed.chars().next() {
        Some(c) if c.is_ascii_digit() => {
            let digits = trimmed.len()
                - trimmed
                    .trim_start_matches(|c: char| c.is_ascii_digit())
                    .len();
            format!("{indent}{}\\{}", &trimmed[..digits], &trimmed[digits..])
        }
        _ => format!("{indent}\\{trimmed}"),
    }
}

fn code_span(code: &str) -> String {
    let fence = "`".repeat(longest_run(code, '`') + 1);
    if code.starts_with('`') || code.ends_with('`') {
        format!("{fence} {code} {fence}")
    } else {
        format!("{fence}{code}{fence}")
    }
}

fn destination(url: &str) -> String {
    if url.contains(|c: char| c.is_whitespace() || c == '(' || c == ')') {
        format!("<{}>", url.replace('<', "%3C").replace('>', "%3E"))
    } else {
        url.to_string()
    }
}

fn longest_run(text: &str, target: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == target {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}
