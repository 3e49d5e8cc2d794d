//! Atomic write operations for JSONL files.
//!
//! Writes go to a temporary file which is renamed over the target only
//! after the full write succeeds. On POSIX systems a same-filesystem
//! rename is atomic, so a crash mid-write leaves the original file
//! intact (at worst a stray `.tmp` file remains).

use crate::error::Result;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Atomically replaces `path` with the given lines.
///
/// Lines are separated by newlines; the final line is terminated only
/// when `trailing_newline` is set, so a source file that ended without
/// one can be reproduced exactly. The target file is only replaced
/// after every line has been written and flushed to the temporary
/// file; a partial write never leaves a truncated target in place.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, an I/O
/// error occurs during writing, or the rename fails. On failure the
/// temporary file is removed on a best-effort basis and the original
/// file is left unchanged.
pub async fn write_lines_atomic<P, I, S>(path: P, lines: I, trailing_newline: bool) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let path = path.as_ref();
    let temp_path = make_temp_path(path);

    if let Err(e) = write_to_temp_file(&temp_path, lines, trailing_newline).await {
        // Best-effort cleanup of the temp file
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, path).await?;

    Ok(())
}

/// Creates a temporary file path for atomic write operations.
///
/// Appends `.tmp` to the filename: `store.jsonl` becomes
/// `store.jsonl.tmp`, an extensionless path gets a bare `.tmp`.
fn make_temp_path(path: &Path) -> std::path::PathBuf {
    let mut temp_path = path.to_path_buf();
    let new_extension = match path.extension() {
        Some(ext) => {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".tmp");
            new_ext
        }
        None => std::ffi::OsString::from("tmp"),
    };
    temp_path.set_extension(new_extension);
    temp_path
}

/// Writes lines to the temporary file, ensuring a full flush.
async fn write_to_temp_file<I, S>(temp_path: &Path, lines: I, trailing_newline: bool) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let file = File::create(temp_path).await?;
    let mut writer = BufWriter::new(file);

    let mut wrote_any = false;
    for line in lines {
        if wrote_any {
            writer.write_all(b"\n").await?;
        }
        writer.write_all(line.as_ref().as_bytes()).await?;
        wrote_any = true;
    }
    if wrote_any && trailing_newline {
        writer.write_all(b"\n").await?;
    }

    writer.flush().await?;
    Ok(())
}
