//! Files attached to steps during evaluation.
//!
//! Each evaluation context owns one [`AttachmentLog`]. Attachments are
//! numbered in creation order and written beneath the log's directory, so
//! concurrently running contexts must use distinct directories.

use std::{fs, io};

use camino::{Utf8Path, Utf8PathBuf};

use crate::ast::Attachment;

/// Per-context attachment writer.
#[derive(Debug, Clone, Default)]
pub struct AttachmentLog {
    dir: Option<Utf8PathBuf>,
    counter: u32,
    entries: Vec<Attachment>,
}

impl AttachmentLog {
    /// Create a log writing into `dir`; `None` disables attachments.
    #[must_use]
    pub const fn new(dir: Option<Utf8PathBuf>) -> Self {
        Self {
            dir,
            counter: 0,
            entries: Vec::new(),
        }
    }

    /// Whether attachments are written at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// Directory attachments are written to.
    #[must_use]
    pub fn dir(&self) -> Option<&Utf8Path> {
        self.dir.as_deref()
    }

    /// Write `content` as a new attachment.
    ///
    /// Returns `Ok(None)` when attachments are disabled.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the directory or file cannot be written.
    pub fn attach(
        &mut self,
        name: &str,
        extension: &str,
        content: &[u8],
    ) -> io::Result<Option<Attachment>> {
        let Some(dir) = self.dir.as_ref() else {
            return Ok(None);
        };
        fs::create_dir_all(dir)?;
        self.counter += 1;
        let file = dir.join(format!(
            "{:04}-{}.{extension}",
            self.counter,
            file_stem(name)
        ));
        fs::write(&file, content)?;
        tracing::debug!(attachment = name, file = %file, "attachment written");
        let attachment = Attachment {
            name: name.to_owned(),
            file,
        };
        self.entries.push(attachment.clone());
        Ok(Some(attachment))
    }

    /// All attachments sorted by file name.
    #[must_use]
    pub fn list(&self) -> Vec<Attachment> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| a.file.file_name().cmp(&b.file.file_name()));
        entries
    }
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}
