use std::fmt;
use std::path::{Path, PathBuf};

use crate::protocol::StreamError;
use crate::stream::Stream;

/// Outcome codes reported by the upload layer for a multipart file part.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum UploadError {
    #[default]
    Ok,
    IniSize,
    FormSize,
    Partial,
    NoFile,
    NoTmpDir,
    CantWrite,
    Extension,
}

impl UploadError {
    /// Maps the numeric code used by upload tables; `0` is success. Code `5` is unassigned.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(UploadError::Ok),
            1 => Some(UploadError::IniSize),
            2 => Some(UploadError::FormSize),
            3 => Some(UploadError::Partial),
            4 => Some(UploadError::NoFile),
            6 => Some(UploadError::NoTmpDir),
            7 => Some(UploadError::CantWrite),
            8 => Some(UploadError::Extension),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            UploadError::Ok => 0,
            UploadError::IniSize => 1,
            UploadError::FormSize => 2,
            UploadError::Partial => 3,
            UploadError::NoFile => 4,
            UploadError::NoTmpDir => 6,
            UploadError::CantWrite => 7,
            UploadError::Extension => 8,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, UploadError::Ok)
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            UploadError::Ok => "upload succeeded",
            UploadError::IniSize => "file exceeds the server size limit",
            UploadError::FormSize => "file exceeds the form size limit",
            UploadError::Partial => "file was only partially uploaded",
            UploadError::NoFile => "no file was uploaded",
            UploadError::NoTmpDir => "missing temporary directory",
            UploadError::CantWrite => "failed to write file to disk",
            UploadError::Extension => "upload stopped by an extension",
        };
        f.write_str(reason)
    }
}

/// A file received as part of a multipart request, already spooled to a temporary path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    tmp_path: PathBuf,
    size: Option<u64>,
    error: UploadError,
    client_filename: Option<String>,
    client_media_type: Option<String>,
}

impl UploadedFile {
    pub fn new(tmp_path: impl Into<PathBuf>, size: Option<u64>, error: UploadError) -> Self {
        Self { tmp_path: tmp_path.into(), size, error, client_filename: None, client_media_type: None }
    }

    pub fn with_client_filename(mut self, filename: impl Into<String>) -> Self {
        self.client_filename = Some(filename.into());
        self
    }

    pub fn with_client_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.client_media_type = Some(media_type.into());
        self
    }

    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn error(&self) -> UploadError {
        self.error
    }

    pub fn client_filename(&self) -> Option<&str> {
        self.client_filename.as_deref()
    }

    pub fn client_media_type(&self) -> Option<&str> {
        self.client_media_type.as_deref()
    }

    /// Opens the spooled file read-only.
    pub fn stream(&self) -> Result<Stream, StreamError> {
        if !self.error.is_ok() {
            return Err(StreamError::invalid_argument(format!("cannot open failed upload: {}", self.error)));
        }
        Stream::open(&self.tmp_path, "rb")
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn error_codes() {
        for code in [0, 1, 2, 3, 4, 6, 7, 8] {
            assert_eq!(UploadError::from_code(code).unwrap().code(), code);
        }
        assert_eq!(UploadError::from_code(5), None);
        assert_eq!(UploadError::from_code(9), None);
    }

    #[test]
    fn failed_upload_has_no_stream() {
        let file = UploadedFile::new("/nonexistent", None, UploadError::Partial);
        assert!(matches!(file.stream(), Err(StreamError::InvalidArgument { .. })));
    }

    #[test]
    fn opens_spooled_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload");
        fs::write(&path, "uploaded").unwrap();

        let file = UploadedFile::new(&path, Some(8), UploadError::Ok)
            .with_client_filename("notes.txt")
            .with_client_media_type("text/plain");

        assert_eq!(file.client_filename(), Some("notes.txt"));
        assert_eq!(file.client_media_type(), Some("text/plain"));

        let mut stream = file.stream().unwrap();
        assert!(!stream.is_writable());
        assert_eq!(stream.contents().unwrap(), "uploaded");
    }
}
