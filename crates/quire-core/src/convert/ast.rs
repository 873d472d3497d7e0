//! Document tree for rich-text content

/// Inline text style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Strong,
    Emphasis,
    Strikethrough,
}

/// Block-level node
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Heading, level 1 to 3
    Heading { level: u8, content: Vec<Inline> },
    Paragraph(Vec<Inline>),
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    Blockquote(Vec<Block>),
    List {
        ordered: bool,
        start: u64,
        items: Vec<Vec<Block>>,
    },
    Rule,
    /// Unrecognized element, kept as its original HTML
    Raw(String),
}

/// Inline node
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Styled { style: Style, content: Vec<Inline> },
    Code(String),
    Link { href: String, content: Vec<Inline> },
    Image { src: String, alt: String },
    LineBreak,
    /// Unrecognized element, kept as its original HTML
    Raw(String),
}

impl Inline {
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text(s.into())
    }

    pub fn styled(style: Style, content: Vec<Inline>) -> Self {
        Inline::Styled { style, content }
    }
}
