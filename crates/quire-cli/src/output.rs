//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use quire_core::{Record, RecordSummary, StoreError, StoredAsset, TagCount, TagRewriteReport};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single post with its body
    pub fn print_post(&self, record: &Record) {
        match self.format {
            OutputFormat::Human => {
                let meta = &record.metadata;
                println!("Slug:    {}", record.slug);
                println!("Title:   {}", meta.title);
                println!("Date:    {}", meta.date);
                if !meta.tags.is_empty() {
                    println!("Tags:    {}", meta.tags.join(", "));
                }
                if meta.draft {
                    println!("Draft:   yes");
                }
                if let Some(ref summary) = meta.summary {
                    println!("Summary: {}", summary);
                }
                if let Some(ref layout) = meta.layout {
                    println!("Layout:  {}", layout);
                }
                println!();
                println!("{}", record.body.trim_end());
            }
            OutputFormat::Json => print_json(record),
            OutputFormat::Quiet => {
                println!("{}", record.slug);
            }
        }
    }

    /// Print a list of posts
    pub fn print_posts(&self, posts: &[RecordSummary]) {
        match self.format {
            OutputFormat::Human => {
                if posts.is_empty() {
                    println!("No posts found.");
                    return;
                }
                for post in posts {
                    let draft_indicator = if post.draft { " [draft]" } else { "" };
                    println!(
                        "{} | {}{} | {}",
                        truncate(short_date(&post.date), 10),
                        truncate(&post.title, 40),
                        draft_indicator,
                        post.slug
                    );
                }
                println!("\n{} post(s)", posts.len());
            }
            OutputFormat::Json => print_json(posts),
            OutputFormat::Quiet => {
                for post in posts {
                    println!("{}", post.slug);
                }
            }
        }
    }

    /// Print a list of tags
    pub fn print_tags(&self, tags: &[TagCount]) {
        match self.format {
            OutputFormat::Human => {
                if tags.is_empty() {
                    println!("No tags found.");
                    return;
                }
                for tag in tags {
                    println!("{} ({})", tag.name, tag.count);
                }
                println!("\n{} tag(s)", tags.len());
            }
            OutputFormat::Json => print_json(tags),
            OutputFormat::Quiet => {
                for tag in tags {
                    println!("{}", tag.name);
                }
            }
        }
    }

    /// Print the outcome of a corpus-wide tag rewrite
    pub fn print_report(&self, action: &str, report: &TagRewriteReport) {
        match self.format {
            OutputFormat::Human => {
                if report.matched == 0 {
                    println!("No posts carry that tag ({} scanned).", report.scanned);
                    return;
                }
                let mark = if report.is_complete() { "✓" } else { "⚠" };
                println!(
                    "{} {}: {} of {} post(s) rewritten",
                    mark,
                    action,
                    report.rewritten.len(),
                    report.matched
                );
                for failure in &report.failures {
                    println!("  failed: {} - {}", failure.slug, failure.error);
                }
            }
            OutputFormat::Json => print_json(report),
            OutputFormat::Quiet => {
                for slug in &report.rewritten {
                    println!("{}", slug);
                }
            }
        }
    }

    /// Print a stored upload
    pub fn print_asset(&self, asset: &StoredAsset) {
        match self.format {
            OutputFormat::Human => {
                println!("✓ Uploaded {} ({}, {} bytes)", asset.url, asset.mime, asset.size);
                println!("  Markdown: ![image]({})", asset.url);
            }
            OutputFormat::Json => print_json(asset),
            OutputFormat::Quiet => {
                println!("{}", asset.url);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Report a failed command on stderr
    ///
    /// Always printed, even in quiet mode.
    pub fn error(&self, error: &anyhow::Error) {
        let store_error = error.downcast_ref::<StoreError>();
        match self.format {
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "status": "error",
                        "message": format!("{:#}", error),
                        "category": store_error.map(StoreError::category),
                    })
                );
            }
            OutputFormat::Human | OutputFormat::Quiet => {
                eprintln!("Error: {:#}", error);
                if let Some(hint) = store_error.and_then(StoreError::recovery_suggestion) {
                    if !self.is_quiet() {
                        eprintln!("Hint: {}", hint);
                    }
                }
            }
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to serialize output: {}", e),
    }
}

/// Date part of an RFC 3339 timestamp
fn short_date(date: &str) -> &str {
    date.split('T').next().unwrap_or(date)
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
