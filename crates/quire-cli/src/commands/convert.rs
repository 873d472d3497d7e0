//! Convert command handler

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};

use quire_core::to_storage_format;

/// Convert editor HTML from a file or stdin and print the Markdown
pub fn convert(file: Option<PathBuf>) -> Result<()> {
    let html = match file {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path))?,
        None => {
            let mut html = String::new();
            io::stdin()
                .read_to_string(&mut html)
                .context("Failed to read HTML from stdin")?;
            html
        }
    };

    print!("{}", to_storage_format(&html));
    Ok(())
}
