//! Client-side CSV export of extracted text.
//!
//! The format is deliberately tiny: one `"extracted_text"` header line and one
//! quoted data row. Internal double-quotes are doubled per RFC 4180; embedded
//! newlines stay inside the quoted field. The file is named after the source
//! image's base filename and written atomically (temp file in the target
//! directory, then persist) so a crash can never leave a half-written export.

use crate::error::DocintelError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// CSV column header for the single exported field.
const CSV_HEADER: &str = "\"extracted_text\"";

/// Render the extracted text as a single-column CSV document.
///
/// Exactly one header line plus one quoted data row; every `"` in the text is
/// doubled.
pub fn csv_for_text(text: &str) -> String {
    let escaped = text.replace('"', "\"\"");
    format!("{CSV_HEADER}\n\"{escaped}\"")
}

/// Write the CSV export next to the given base name: `{out_dir}/{base}.csv`.
///
/// `base_name` is normally [`crate::capture::AcquiredImage::base_name`] —
/// the source image's filename with its extension stripped.
pub fn export_csv(
    text: &str,
    base_name: &str,
    out_dir: &Path,
) -> Result<PathBuf, DocintelError> {
    let path = out_dir.join(format!("{base_name}.csv"));
    let content = csv_for_text(text);

    let mut tmp = tempfile::NamedTempFile::new_in(out_dir).map_err(|e| {
        DocintelError::ExportFailed {
            path: path.clone(),
            source: e,
        }
    })?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| DocintelError::ExportFailed {
            path: path.clone(),
            source: e,
        })?;
    tmp.persist(&path)
        .map_err(|e| DocintelError::ExportFailed {
            path: path.clone(),
            source: e.error,
        })?;

    info!("Exported CSV: {}", path.display());
    Ok(path)
}
