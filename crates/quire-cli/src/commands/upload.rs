//! Upload command handler

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use quire_core::{Admin, Caller, StoreError, MAX_UPLOAD_BYTES};

use crate::output::Output;

/// Store an image file in the upload directory
pub fn upload(
    admin: &mut Admin,
    caller: Option<&Caller>,
    file: PathBuf,
    mime: Option<String>,
    output: &Output,
) -> Result<()> {
    admin.policy().authorize(caller)?;

    // Refuse oversized files before reading them into memory
    let len = fs::metadata(&file)
        .with_context(|| format!("Failed to read file: {:?}", file))?
        .len();
    let size = usize::try_from(len).unwrap_or(usize::MAX);
    if size > MAX_UPLOAD_BYTES {
        return Err(StoreError::PayloadTooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        }
        .into());
    }

    let bytes = fs::read(&file).with_context(|| format!("Failed to read file: {:?}", file))?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let asset = admin
        .upload(caller, &name, &bytes, mime.as_deref())
        .context("Upload rejected")?;

    output.print_asset(&asset);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use quire_core::{AdminPolicy, AssetStore, ErrorCategory, Store};
    use std::fs::File;
    use tempfile::TempDir;

    const ADMIN: &str = "me@example.com";

    fn setup() -> (TempDir, Admin) {
        let temp = TempDir::new().unwrap();
        let store = Store::open_dir(temp.path().join("blog")).unwrap();
        let assets = AssetStore::new(temp.path().join("uploads"), "/uploads");
        let admin = Admin::new(store, assets, AdminPolicy::new(Some(ADMIN)));
        (temp, admin)
    }

    #[test]
    fn test_oversized_file_rejected_by_size() {
        let (temp, mut admin) = setup();
        let path = temp.path().join("huge.png");
        File::create(&path)
            .unwrap()
            .set_len(MAX_UPLOAD_BYTES as u64 + 1)
            .unwrap();

        let caller = Caller::new(ADMIN);
        let err = upload(
            &mut admin,
            Some(&caller),
            path,
            None,
            &Output::new(OutputFormat::Quiet),
        )
        .unwrap_err();

        let store_error = err.downcast_ref::<StoreError>().unwrap();
        assert!(matches!(store_error, StoreError::PayloadTooLarge { .. }));
        assert_eq!(store_error.category(), ErrorCategory::FixInput);
        assert!(!admin.assets().dir().exists());
    }

    #[test]
    fn test_upload_png_file() {
        let (temp, mut admin) = setup();
        let path = temp.path().join("pic.png");
        fs::write(
            &path,
            [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D],
        )
        .unwrap();

        let caller = Caller::new(ADMIN);
        upload(
            &mut admin,
            Some(&caller),
            path,
            None,
            &Output::new(OutputFormat::Quiet),
        )
        .unwrap();
        assert_eq!(fs::read_dir(admin.assets().dir()).unwrap().count(), 1);
    }
}
