//! Tag command handlers

use anyhow::{bail, Context, Result};

use quire_core::{Admin, Caller};

use crate::editor::confirm;
use crate::output::Output;

/// List all tags with usage counts
pub fn list(admin: &Admin, output: &Output) -> Result<()> {
    let tags = admin.list_tags()?;
    output.print_tags(&tags);
    Ok(())
}

/// Validate a tag name and attach it to the given posts
///
/// A tag with no posts does not exist on disk, so without `posts` this only
/// checks the name.
pub fn add(
    admin: &mut Admin,
    caller: Option<&Caller>,
    name: String,
    posts: Vec<String>,
    output: &Output,
) -> Result<()> {
    let name = admin.add_tag(caller, &name)?;

    let mut attached = 0;
    for slug in &posts {
        let mut record = admin
            .get(slug)
            .with_context(|| format!("Failed to read post '{}'", slug))?;
        if record.metadata.has_tag(&name) {
            continue;
        }
        record.metadata.tags.push(name.clone());
        admin
            .update(caller, slug, record.metadata, &record.body, None)
            .with_context(|| format!("Failed to tag post '{}'", slug))?;
        attached += 1;
    }

    if posts.is_empty() {
        output.success(&format!("Tag '{}' is valid; attach it to a post to use it", name));
    } else {
        output.success(&format!("Tagged {} post(s) with '{}'", attached, name));
    }
    Ok(())
}

/// Rename a tag on every post
pub fn rename(
    admin: &mut Admin,
    caller: Option<&Caller>,
    old_name: String,
    new_name: String,
    output: &Output,
) -> Result<()> {
    let report = admin
        .rename_tag(caller, &old_name, &new_name)
        .context("Failed to rename tag")?;

    output.print_report(&format!("Renamed '{}' to '{}'", old_name, new_name), &report);
    if !report.is_complete() {
        bail!("{} post(s) could not be rewritten", report.failures.len());
    }
    Ok(())
}

/// Remove a tag from every post
pub fn delete(
    admin: &mut Admin,
    caller: Option<&Caller>,
    name: String,
    yes: bool,
    output: &Output,
) -> Result<()> {
    admin.policy().authorize(caller)?;

    if !yes && output.should_prompt() {
        let count = admin
            .list_tags()?
            .into_iter()
            .find(|t| t.name == name.trim())
            .map(|t| t.count)
            .unwrap_or(0);
        println!("Remove tag '{}' from {} post(s)", name, count);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let report = admin
        .delete_tag(caller, &name)
        .context("Failed to delete tag")?;

    output.print_report(&format!("Deleted '{}'", name), &report);
    if !report.is_complete() {
        bail!("{} post(s) could not be rewritten", report.failures.len());
    }
    Ok(())
}
