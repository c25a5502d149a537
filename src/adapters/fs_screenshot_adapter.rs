//! Local filesystem screenshot storage.

use crate::domain::error::JournalError;
use crate::domain::trade::{ScreenshotRef, ScreenshotSlot, TradeId};
use crate::ports::screenshot_port::ScreenshotStore;
use rand::Rng;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const IMAGE_DIR: &str = "journal_images";
const NONCE_BYTES: usize = 8;
const MAX_NAME_ATTEMPTS: usize = 8;

/// Writes images under `<base>/<user>/journal_images/`. The returned
/// reference is the file's full path.
pub struct FsScreenshotAdapter {
    base_dir: PathBuf,
}

impl FsScreenshotAdapter {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    fn user_dir(&self, user_id: &str) -> PathBuf {
        self.base_dir.join(user_id).join(IMAGE_DIR)
    }
}

/// Keeps the final path component and replaces anything outside
/// `[A-Za-z0-9._-]`.
fn sanitize_file_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

fn random_nonce() -> String {
    let nonce: [u8; NONCE_BYTES] = rand::thread_rng().r#gen();
    hex::encode(nonce)
}

/// Creates `<dir>/<prefix>_<nonce>_<file_name>` without ever replacing an
/// existing file, drawing a new nonce when the name is taken.
fn create_unique(
    dir: &Path,
    prefix: &str,
    file_name: &str,
    bytes: &[u8],
    mut nonce: impl FnMut() -> String,
) -> Result<PathBuf, JournalError> {
    for _ in 0..MAX_NAME_ATTEMPTS {
        let path = dir.join(format!("{prefix}_{}_{file_name}", nonce()));
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(JournalError::Screenshot {
                    reason: format!("failed to create {}: {e}", path.display()),
                });
            }
        };
        if let Err(e) = file.write_all(bytes) {
            let _ = fs::remove_file(&path);
            return Err(JournalError::Screenshot {
                reason: format!("failed to write {}: {e}", path.display()),
            });
        }
        return Ok(path);
    }
    Err(JournalError::Screenshot {
        reason: format!("no free file name for {file_name} in {}", dir.display()),
    })
}

impl ScreenshotStore for FsScreenshotAdapter {
    fn store(
        &self,
        user_id: &str,
        id: &TradeId,
        slot: ScreenshotSlot,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ScreenshotRef, JournalError> {
        if bytes.is_empty() {
            return Err(JournalError::Screenshot {
                reason: format!("{file_name} is empty"),
            });
        }

        let dir = self.user_dir(user_id);
        fs::create_dir_all(&dir).map_err(|e| JournalError::Screenshot {
            reason: format!("failed to create {}: {e}", dir.display()),
        })?;

        let prefix = format!("{id}_{}", slot.as_str());
        let path = create_unique(
            &dir,
            &prefix,
            &sanitize_file_name(file_name),
            bytes,
            random_nonce,
        )?;

        Ok(ScreenshotRef::new(path.to_string_lossy()))
    }

    /// Deleting a file that is already gone is not an error.
    fn delete(&self, reference: &ScreenshotRef) -> Result<(), JournalError> {
        match fs::remove_file(reference.as_str()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(JournalError::Screenshot {
                reason: format!("failed to delete {reference}: {e}"),
            }),
        }
    }
}
