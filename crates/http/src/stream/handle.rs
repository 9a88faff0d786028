//! The byte-stream primitive a [`Stream`](super::Stream) wraps, and the built-in implementations.

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::Mode;

/// An open, addressable byte source/sink.
///
/// Implementors report their capabilities through [`Handle::mode`] and
/// [`Handle::is_seekable`]; the wrapping stream checks those before delegating.
pub trait Handle: Read + Write + Seek + fmt::Debug + Send {
    fn mode(&self) -> &Mode;

    fn is_seekable(&self) -> bool {
        true
    }

    /// True once the handle has reported end-of-data.
    fn is_eof(&self) -> bool;

    /// Total byte length, if it can be determined.
    fn size(&self) -> Option<u64>;

    fn stream_type(&self) -> &'static str;

    fn wrapper_type(&self) -> &'static str;

    fn uri(&self) -> Option<&str> {
        None
    }

    /// Releases the handle. Called once by the owning stream on close.
    fn release(&mut self) -> io::Result<()> {
        self.flush()
    }
}

/// An in-memory buffer handle.
#[derive(Debug)]
pub struct MemoryHandle {
    cursor: Cursor<Vec<u8>>,
    mode: Mode,
}

impl MemoryHandle {
    /// An empty read/write buffer.
    pub fn new() -> Self {
        Self { cursor: Cursor::new(Vec::new()), mode: Mode::from_static("w+b") }
    }

    /// A read/write buffer pre-filled with `bytes`, positioned at the start.
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self { cursor: Cursor::new(bytes.into()), mode: Mode::from_static("r+b") }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.cursor.into_inner()
    }
}

impl Default for MemoryHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Read for MemoryHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Write for MemoryHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.cursor.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemoryHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl Handle for MemoryHandle {
    fn mode(&self) -> &Mode {
        &self.mode
    }

    fn is_eof(&self) -> bool {
        self.cursor.position() >= self.cursor.get_ref().len() as u64
    }

    fn size(&self) -> Option<u64> {
        Some(self.cursor.get_ref().len() as u64)
    }

    fn stream_type(&self) -> &'static str {
        "MEMORY"
    }

    fn wrapper_type(&self) -> &'static str {
        "memory"
    }

    fn uri(&self) -> Option<&str> {
        Some("memory://")
    }
}

/// A file opened with fopen-style mode semantics.
#[derive(Debug)]
pub struct FileHandle {
    file: File,
    mode: Mode,
    path: String,
    eof: bool,
    seekable: bool,
}

impl FileHandle {
    /// Opens `path`. Seekability is decided once here: only regular files are seekable,
    /// so devices, FIFOs and sockets opened by path report `false`.
    pub fn open<P: AsRef<Path>>(path: P, mode: Mode) -> io::Result<Self> {
        let path = path.as_ref();
        let file = mode.open_options().open(path)?;
        let seekable = file.metadata().is_ok_and(|metadata| metadata.is_file());
        Ok(Self { file, mode, path: path.to_string_lossy().into_owned(), eof: false, seekable })
    }
}

impl Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.file.read(buf)?;
        if n < buf.len() {
            self.eof = true;
        }
        Ok(n)
    }
}

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Seek for FileHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let position = self.file.seek(pos)?;
        self.eof = false;
        Ok(position)
    }
}

impl Handle for FileHandle {
    fn mode(&self) -> &Mode {
        &self.mode
    }

    fn is_seekable(&self) -> bool {
        self.seekable
    }

    fn is_eof(&self) -> bool {
        self.eof
    }

    fn size(&self) -> Option<u64> {
        // only regular files have a meaningful length
        self.file.metadata().ok().filter(std::fs::Metadata::is_file).map(|metadata| metadata.len())
    }

    fn stream_type(&self) -> &'static str {
        "STDIO"
    }

    fn wrapper_type(&self) -> &'static str {
        "plainfile"
    }

    fn uri(&self) -> Option<&str> {
        Some(&self.path)
    }

    fn release(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// A forward-only, read-only handle over any reader, e.g. a pipe or socket half.
///
/// Only `SeekFrom::Current(0)` is supported, which reports the number of bytes consumed so far.
pub struct ReaderHandle<R> {
    reader: R,
    mode: Mode,
    position: u64,
    eof: bool,
}

impl<R: Read + Send> ReaderHandle<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, mode: Mode::from_static("rb"), position: 0, eof: false }
    }
}

impl<R> fmt::Debug for ReaderHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderHandle")
            .field("mode", &self.mode)
            .field("position", &self.position)
            .field("eof", &self.eof)
            .finish_non_exhaustive()
    }
}

impl<R: Read> Read for ReaderHandle<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.eof = true;
        }
        self.position += n as u64;
        Ok(n)
    }
}

impl<R> Write for ReaderHandle<R> {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "reader handle is read-only"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<R> Seek for ReaderHandle<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match pos {
            SeekFrom::Current(0) => Ok(self.position),
            _ => Err(io::Error::new(io::ErrorKind::Unsupported, "reader handle is not seekable")),
        }
    }
}

impl<R: Read + Send> Handle for ReaderHandle<R> {
    fn mode(&self) -> &Mode {
        &self.mode
    }

    fn is_seekable(&self) -> bool {
        false
    }

    fn is_eof(&self) -> bool {
        self.eof
    }

    fn size(&self) -> Option<u64> {
        None
    }

    fn stream_type(&self) -> &'static str {
        "generic"
    }

    fn wrapper_type(&self) -> &'static str {
        "reader"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_handle_reports_eof_at_end() {
        let mut handle = MemoryHandle::with_bytes("ab");
        assert!(!handle.is_eof());

        let mut buf = [0u8; 2];
        handle.read_exact(&mut buf).unwrap();
        assert!(handle.is_eof());
        assert_eq!(handle.size(), Some(2));
    }

    #[test]
    fn reader_handle_tracks_position() {
        let mut handle = ReaderHandle::new(&b"hello"[..]);
        let mut buf = [0u8; 3];
        handle.read_exact(&mut buf).unwrap();

        assert_eq!(handle.stream_position().unwrap(), 3);
        assert!(handle.seek(SeekFrom::Start(0)).is_err());
        assert!(handle.write(b"x").is_err());
        assert!(!handle.is_seekable());
    }
}
