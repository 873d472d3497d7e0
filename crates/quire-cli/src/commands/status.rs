//! Status and identity command handlers

use anyhow::Result;

use quire_core::{Admin, Caller, Config};

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(admin: &Admin, config: &Config, output: &Output) -> Result<()> {
    let stats = admin.stats()?;
    let tag_count = admin.list_tags()?.len();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "content_dir": config.content_dir,
                    "upload_dir": config.upload_dir,
                    "admin_configured": config.admin_identity.is_some(),
                    "counts": {
                        "posts": stats.total,
                        "published": stats.published,
                        "drafts": stats.drafts,
                        "tags": tag_count
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", stats.total);
        }
        OutputFormat::Human => {
            println!("Quire Status");
            println!("============");
            println!();
            println!("Storage:");
            println!("  Content: {}", config.content_dir.display());
            println!("  Uploads: {}", config.upload_dir.display());
            println!();
            println!("Admin:");
            println!(
                "  Identity: {}",
                config.admin_identity.as_deref().unwrap_or("(not set)")
            );
            println!();
            println!("Contents:");
            println!("  Posts:     {}", stats.total);
            println!("  Published: {}", stats.published);
            println!("  Drafts:    {}", stats.drafts);
            println!("  Tags:      {}", tag_count);
        }
    }

    Ok(())
}

/// Show the caller identity and whether it may edit content
pub fn whoami(admin: &Admin, caller: Option<&Caller>, output: &Output) -> Result<()> {
    let is_admin = admin.check_admin(caller);
    let identity = caller.map(Caller::identity);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({"identity": identity, "admin": is_admin})
            );
        }
        OutputFormat::Quiet => {
            println!("{}", identity.unwrap_or_default());
        }
        OutputFormat::Human => match identity {
            Some(identity) if is_admin => println!("{} (admin)", identity),
            Some(identity) => println!("{} (read-only)", identity),
            None => {
                println!("No identity. Pass --as <identity> or set QUIRE_IDENTITY.");
            }
        },
    }

    Ok(())
}
