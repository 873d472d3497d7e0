//! Post command handlers

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use quire_core::storage::{decode, encode};
use quire_core::{to_storage_format, Admin, Caller, Metadata, StoreError};

use crate::editor::{confirm, edit_required};
use crate::output::{Output, OutputFormat};

/// Where the body of a new or edited post comes from
pub enum BodySource {
    /// Markdown given on the command line
    Text(String),
    /// Editor HTML in a file, converted to Markdown
    Html(PathBuf),
    /// Markdown in a file
    Markdown(PathBuf),
    /// Open $EDITOR
    Editor,
}

impl BodySource {
    pub fn from_flags(
        body: Option<String>,
        html_file: Option<PathBuf>,
        file: Option<PathBuf>,
    ) -> Self {
        match (body, html_file, file) {
            (Some(text), _, _) => BodySource::Text(text),
            (None, Some(path), _) => BodySource::Html(path),
            (None, None, Some(path)) => BodySource::Markdown(path),
            (None, None, None) => BodySource::Editor,
        }
    }

    fn read(self, initial: &str) -> Result<String> {
        match self {
            BodySource::Text(text) => Ok(text),
            BodySource::Html(path) => {
                let html = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read HTML file: {:?}", path))?;
                Ok(to_storage_format(&html))
            }
            BodySource::Markdown(path) => fs::read_to_string(&path)
                .with_context(|| format!("Failed to read file: {:?}", path)),
            BodySource::Editor => edit_required(initial, "post body"),
        }
    }
}

/// Fields of a post to create
pub struct NewPost {
    pub title: String,
    pub slug: Option<String>,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub layout: Option<String>,
    pub draft: bool,
}

/// Changes requested by `post edit`
#[derive(Default)]
pub struct PostEdit {
    pub title: Option<String>,
    pub rename: Option<String>,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub body: Option<String>,
}

impl PostEdit {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.rename.is_none()
            && self.tags.is_empty()
            && self.summary.is_none()
            && self.body.is_none()
    }
}

/// List posts, optionally filtered by tag or to published ones
pub fn list(admin: &Admin, tag: Option<String>, published: bool, output: &Output) -> Result<()> {
    let mut posts = match tag {
        Some(ref t) => admin.store().list_by_tag(t)?,
        None => admin.list()?,
    };
    if published {
        posts.retain(|p| !p.draft);
    }

    output.print_posts(&posts);
    Ok(())
}

/// Show a single post
pub fn show(admin: &Admin, slug: String, output: &Output) -> Result<()> {
    let record = admin
        .get(&slug)
        .with_context(|| format!("Failed to read post '{}'", slug))?;
    output.print_post(&record);
    Ok(())
}

/// Report whether a slug is taken
pub fn exists(admin: &Admin, slug: String, output: &Output) -> Result<()> {
    let exists = admin.exists(&slug);
    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({"slug": slug, "exists": exists}));
        }
        OutputFormat::Human | OutputFormat::Quiet => println!("{}", exists),
    }
    Ok(())
}

/// Create a new post
pub fn create(
    admin: &mut Admin,
    caller: Option<&Caller>,
    post: NewPost,
    source: BodySource,
    output: &Output,
) -> Result<()> {
    // Fail before opening an editor
    admin.policy().authorize(caller)?;

    let body = source.read("")?;

    let mut metadata = Metadata::dated_now(post.title)
        .with_tags(post.tags)
        .with_draft(post.draft);
    metadata.summary = post.summary;
    metadata.layout = post.layout;

    let slug = admin
        .create(caller, post.slug.as_deref(), metadata, &body)
        .context("Failed to create post")?;

    match output.format {
        OutputFormat::Human => output.success(&format!("Created post: {}", slug)),
        _ => output.print_post(&admin.get(&slug)?),
    }
    Ok(())
}

/// Edit a post
///
/// With no field flags the whole file, frontmatter included, opens in the
/// editor.
pub fn edit(
    admin: &mut Admin,
    caller: Option<&Caller>,
    slug: String,
    changes: PostEdit,
    output: &Output,
) -> Result<()> {
    admin.policy().authorize(caller)?;

    let record = admin
        .get(&slug)
        .with_context(|| format!("Failed to read post '{}'", slug))?;

    let (metadata, body) = if changes.is_empty() {
        let text = encode(&record.metadata, &record.body)?;
        let edited = edit_required(&text, "post")?;
        decode_edited(&edited)?
    } else {
        let mut metadata = record.metadata;
        if let Some(title) = changes.title {
            metadata.title = title;
        }
        if !changes.tags.is_empty() {
            metadata.tags = changes.tags;
        }
        if let Some(summary) = changes.summary {
            metadata.summary = (!summary.is_empty()).then_some(summary);
        }
        (metadata, changes.body.unwrap_or(record.body))
    };

    let new_slug = admin
        .update(caller, &slug, metadata, &body, changes.rename.as_deref())
        .context("Failed to update post")?;

    if new_slug != slug {
        output.success(&format!("Renamed post: {} -> {}", slug, new_slug));
    } else {
        output.success(&format!("Updated post: {}", slug));
    }
    if output.is_quiet() {
        println!("{}", new_slug);
    }
    Ok(())
}

/// Decode an edited post file; a broken frontmatter block is bad input
fn decode_edited(text: &str) -> Result<(Metadata, String)> {
    let decoded = decode(text).map_err(|e| {
        StoreError::validation(format!("edited post has an invalid frontmatter block: {}", e))
    })?;
    Ok(decoded)
}

/// Delete a post
pub fn delete(
    admin: &mut Admin,
    caller: Option<&Caller>,
    slug: String,
    yes: bool,
    output: &Output,
) -> Result<()> {
    admin.policy().authorize(caller)?;

    let record = admin
        .get(&slug)
        .with_context(|| format!("Failed to read post '{}'", slug))?;

    if !yes && output.should_prompt() {
        println!("Delete post: {} - {}", record.slug, record.metadata.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    admin
        .delete(caller, &slug)
        .context("Failed to delete post")?;

    output.success(&format!("Deleted post: {}", slug));
    Ok(())
}

/// Flip the draft flag
pub fn toggle_draft(
    admin: &mut Admin,
    caller: Option<&Caller>,
    slug: String,
    output: &Output,
) -> Result<()> {
    let draft = admin
        .toggle_draft(caller, &slug)
        .context("Failed to toggle draft flag")?;

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({"slug": slug, "draft": draft}));
        }
        OutputFormat::Quiet => println!("{}", draft),
        OutputFormat::Human => {
            let state = if draft { "a draft" } else { "published" };
            output.success(&format!("{} is now {}", slug, state));
        }
    }
    Ok(())
}
