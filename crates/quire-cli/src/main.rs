//! Quire CLI
//!
//! Command-line interface for Quire - flat-file blog content management.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use quire_core::{Admin, Caller, Config, ErrorCategory, StoreError};

mod commands;
mod editor;
mod output;

use commands::post::{BodySource, NewPost, PostEdit};
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Quire - flat-file blog content management")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Act as this identity (defaults to $QUIRE_IDENTITY)
    #[arg(long = "as", global = true, value_name = "IDENTITY")]
    identity: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage posts
    Post {
        #[command(subcommand)]
        command: PostCommands,
    },
    /// Manage tags
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
    /// Upload an image
    Upload {
        /// Image file
        file: PathBuf,
        /// MIME type to assume when the content is not recognized
        #[arg(long)]
        mime: Option<String>,
    },
    /// Convert editor HTML to Markdown (reads stdin without FILE)
    Convert {
        /// HTML file
        file: Option<PathBuf>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show content directory status
    Status,
    /// Show the current identity and whether it is the admin
    Whoami,
}

#[derive(Subcommand)]
enum PostCommands {
    /// List posts, newest first
    #[command(alias = "ls")]
    List {
        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Hide drafts
        #[arg(long)]
        published: bool,
    },
    /// Show a post
    Show {
        slug: String,
    },
    /// Check whether a slug is taken
    Exists {
        slug: String,
    },
    /// Create a new post
    #[command(alias = "add")]
    Create {
        /// Post title
        #[arg(short = 'T', long)]
        title: String,
        /// Slug (derived from the title if not given)
        #[arg(long)]
        slug: Option<String>,
        /// Tags to add
        #[arg(short, long)]
        tag: Vec<String>,
        /// Short summary for listings
        #[arg(long)]
        summary: Option<String>,
        /// Layout template name
        #[arg(long)]
        layout: Option<String>,
        /// Create as draft
        #[arg(long)]
        draft: bool,
        /// Markdown body (opens editor if no body source is given)
        #[arg(short, long, conflicts_with_all = ["html_file", "file"])]
        body: Option<String>,
        /// Read the body from an editor HTML file
        #[arg(long, conflicts_with = "file")]
        html_file: Option<PathBuf>,
        /// Read the Markdown body from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Edit a post (opens the whole file in the editor without flags)
    Edit {
        slug: String,
        /// New title
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// Move the post to a new slug
        #[arg(long, value_name = "NEW_SLUG")]
        rename: Option<String>,
        /// Replace all tags
        #[arg(short, long)]
        tag: Vec<String>,
        /// New summary (empty clears it)
        #[arg(long)]
        summary: Option<String>,
        /// New Markdown body
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Delete a post
    #[command(alias = "rm")]
    Delete {
        slug: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Flip a post between draft and published
    ToggleDraft {
        slug: String,
    },
}

#[derive(Subcommand)]
enum TagCommands {
    /// List tags with post counts
    #[command(alias = "ls")]
    List,
    /// Validate a tag and attach it to posts
    Add {
        name: String,
        /// Post to tag (repeatable)
        #[arg(long = "to", value_name = "SLUG")]
        posts: Vec<String>,
    },
    /// Rename a tag on every post
    Rename { old: String, new: String },
    /// Remove a tag from every post
    #[command(alias = "rm")]
    Delete {
        name: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (content_dir, upload_dir, upload_url_prefix, admin_identity, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    match run(cli, &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.error(&e);
            ExitCode::from(exit_status(&e))
        }
    }
}

fn run(cli: Cli, output: &Output) -> Result<()> {
    // Commands that don't need the store
    match &cli.command {
        Commands::Config { command } => {
            return handle_config_command(command.clone(), cli.config.as_ref(), output);
        }
        Commands::Convert { file } => return commands::convert::convert(file.clone()),
        _ => {}
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    init_logging(&config, cli.verbose);

    let caller = cli
        .identity
        .or_else(|| std::env::var("QUIRE_IDENTITY").ok())
        .filter(|id| !id.trim().is_empty())
        .map(Caller::new);
    let caller = caller.as_ref();
    debug!(identity = ?caller.map(Caller::identity), "resolved caller");

    let mut admin = Admin::open(&config).context("Failed to open content directory")?;

    match cli.command {
        Commands::Config { .. } | Commands::Convert { .. } => unreachable!(), // Handled above
        Commands::Post { command } => handle_post_command(command, &mut admin, caller, output),
        Commands::Tag { command } => handle_tag_command(command, &mut admin, caller, output),
        Commands::Upload { file, mime } => {
            commands::upload::upload(&mut admin, caller, file, mime, output)
        }
        Commands::Status => commands::status::show(&admin, &config, output),
        Commands::Whoami => commands::status::whoami(&admin, caller, output),
    }
}

fn handle_post_command(
    command: PostCommands,
    admin: &mut Admin,
    caller: Option<&Caller>,
    output: &Output,
) -> Result<()> {
    match command {
        PostCommands::List { tag, published } => {
            commands::post::list(admin, tag, published, output)
        }
        PostCommands::Show { slug } => commands::post::show(admin, slug, output),
        PostCommands::Exists { slug } => commands::post::exists(admin, slug, output),
        PostCommands::Create {
            title,
            slug,
            tag,
            summary,
            layout,
            draft,
            body,
            html_file,
            file,
        } => {
            let post = NewPost {
                title,
                slug,
                tags: tag,
                summary,
                layout,
                draft,
            };
            let source = BodySource::from_flags(body, html_file, file);
            commands::post::create(admin, caller, post, source, output)
        }
        PostCommands::Edit {
            slug,
            title,
            rename,
            tag,
            summary,
            body,
        } => {
            let changes = PostEdit {
                title,
                rename,
                tags: tag,
                summary,
                body,
            };
            commands::post::edit(admin, caller, slug, changes, output)
        }
        PostCommands::Delete { slug, yes } => {
            commands::post::delete(admin, caller, slug, yes, output)
        }
        PostCommands::ToggleDraft { slug } => {
            commands::post::toggle_draft(admin, caller, slug, output)
        }
    }
}

fn handle_tag_command(
    command: TagCommands,
    admin: &mut Admin,
    caller: Option<&Caller>,
    output: &Output,
) -> Result<()> {
    match command {
        TagCommands::List => commands::tag::list(admin, output),
        TagCommands::Add { name, posts } => commands::tag::add(admin, caller, name, posts, output),
        TagCommands::Rename { old, new } => commands::tag::rename(admin, caller, old, new, output),
        TagCommands::Delete { name, yes } => commands::tag::delete(admin, caller, name, yes, output),
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Exit status by error category: 2 fix input, 3 stop, 1 otherwise
fn exit_status(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<StoreError>().map(StoreError::category) {
        Some(ErrorCategory::FixInput) => 2,
        Some(ErrorCategory::Stop) => 3,
        Some(ErrorCategory::Retry) | None => 1,
    }
}

/// Initialize logging
///
/// Level comes from QUIRE_LOG, else `debug` with --verbose, else `warn`.
/// Logs go to `log_file` when configured, otherwise to stderr.
fn init_logging(config: &Config, verbose: bool) {
    let level = std::env::var("QUIRE_LOG")
        .ok()
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| if verbose { "debug" } else { "warn" }.to_string());
    let env_filter = EnvFilter::new(format!("quire_core={},quire={}", level, level));

    if let Some(ref log_path) = config.log_file {
        match OpenOptions::new().create(true).append(true).open(log_path) {
            Ok(log_file) => {
                // Ignore error if already initialized
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(log_file)
                    .try_init();
                return;
            }
            Err(e) => {
                eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            }
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_post_create() {
        let cli = Cli::try_parse_from([
            "quire", "--as", "me@example.com", "post", "create", "--title", "Hello", "--tag",
            "a", "--tag", "b", "--draft", "--body", "text",
        ])
        .unwrap();
        assert_eq!(cli.identity.as_deref(), Some("me@example.com"));
        match cli.command {
            Commands::Post {
                command: PostCommands::Create { title, tag, draft, .. },
            } => {
                assert_eq!(title, "Hello");
                assert_eq!(tag, vec!["a", "b"]);
                assert!(draft);
            }
            _ => panic!("expected post create"),
        }
    }

    #[test]
    fn test_body_sources_conflict() {
        let result = Cli::try_parse_from([
            "quire", "post", "create", "--title", "x", "--body", "b", "--file", "f.md",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_exit_codes() {
        let not_found: anyhow::Error = StoreError::NotFound {
            slug: "x".to_string(),
        }
        .into();
        assert_eq!(exit_status(&not_found), 3);

        let invalid = anyhow::Error::from(StoreError::validation("bad")).context("while creating");
        assert_eq!(exit_status(&invalid), 2);

        assert_eq!(exit_status(&anyhow::anyhow!("other")), 1);
    }
}
