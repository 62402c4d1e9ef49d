use crate::session::derive_title;
use thiserror::Error;

pub const MAX_FILENAME_STEM: usize = 50;
pub const FALLBACK_STEM: &str = "flowrite-session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub filename: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("Nothing to Export: start writing something before exporting.")]
    NothingToExport,
}

/// Projects `content` into a downloadable `.txt` file. Does not mutate anything.
pub fn export_text(content: &str) -> Result<Export, ExportError> {
    if content.trim().is_empty() {
        return Err(ExportError::NothingToExport);
    }
    Ok(Export {
        filename: format!("{}.txt", filename_stem(&derive_title(content))),
        text: content.to_string(),
    })
}

/// ASCII letters, digits, `_`, `-` and whitespace survive; everything else
/// becomes `_`. Capped at 50 characters.
pub fn filename_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c.is_whitespace() {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILENAME_STEM)
        .collect();
    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    }
}
