use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pilot_core::UploadFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("path has no file name: {0:?}")]
    MissingName(PathBuf),
}

/// Read a file from disk into an upload. Only the file name travels to the
/// backend; the type is guessed from the extension and left unset otherwise.
pub fn load_upload(path: &Path) -> Result<UploadFile, UploadError> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| UploadError::MissingName(path.to_path_buf()))?;
    let bytes = fs::read(path).map_err(|source| UploadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let upload = UploadFile::new(name, bytes);
    Ok(match guess_mime(path) {
        Some(mime) => upload.with_mime(mime),
        None => upload,
    })
}

fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;
    if ext.eq_ignore_ascii_case("pdf") {
        Some("application/pdf")
    } else if ext.eq_ignore_ascii_case("txt") {
        Some("text/plain")
    } else {
        None
    }
}
