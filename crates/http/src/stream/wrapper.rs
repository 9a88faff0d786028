use std::fmt;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use bytes::Bytes;
use serde_json::{Map, Value};
use tracing::trace;

use super::{FileHandle, Handle, MemoryHandle, Metadata, Mode, ReaderHandle};
use crate::ensure;
use crate::protocol::StreamError;

/// Reference point for [`Stream::seek`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Whence {
    Set,
    Current,
    End,
}

/// Exclusive owner of one [`Handle`].
///
/// Once the handle is detached or closed the stream is permanently empty: data
/// operations fail, while capability queries (`is_readable`, `eof`, `size`, ...)
/// answer with a degraded default instead.
///
/// The stream carries a single cursor shared by reads, writes and seeks, so it must
/// not be driven from several threads at once without external locking.
pub struct Stream {
    handle: Option<Box<dyn Handle>>,
}

impl Stream {
    pub fn new<H: Handle + 'static>(handle: H) -> Self {
        Self { handle: Some(Box::new(handle)) }
    }

    pub fn from_boxed(handle: Box<dyn Handle>) -> Self {
        Self { handle: Some(handle) }
    }

    /// An empty, readable and writable in-memory stream.
    pub fn memory() -> Self {
        Self::new(MemoryHandle::new())
    }

    /// An in-memory stream holding `bytes`, positioned at the start.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(MemoryHandle::with_bytes(bytes))
    }

    /// A forward-only, read-only stream whose size is unknown.
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self::new(ReaderHandle::new(reader))
    }

    /// Opens `path` with an fopen-style `mode`.
    pub fn open<P: AsRef<Path>>(path: P, mode: &str) -> Result<Self, StreamError> {
        let mode = Mode::parse(mode)?;
        Ok(Self::new(FileHandle::open(path, mode)?))
    }

    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_seekable(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| handle.is_seekable())
    }

    pub fn is_writable(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| handle.mode().is_writable())
    }

    pub fn is_readable(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| handle.mode().is_readable())
    }

    /// Reads up to `length` bytes. Returns fewer when the source runs out.
    pub fn read(&mut self, length: usize) -> Result<Bytes, StreamError> {
        ensure!(self.is_readable(), StreamError::NotReadable);
        let handle = self.handle_mut()?;

        let mut buf = Vec::new();
        handle.take(length as u64).read_to_end(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    /// Writes `data` with a single call to the handle and returns the number of bytes it accepted.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, StreamError> {
        ensure!(self.is_writable(), StreamError::NotWritable);
        let handle = self.handle_mut()?;
        Ok(handle.write(data)?)
    }

    /// Releases the handle. Does nothing if it is already gone.
    pub fn close(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(e) = handle.release() {
                trace!(cause = %e, "error while releasing stream handle");
            }
        }
    }

    /// True when there is no handle or the handle has reached end-of-data.
    pub fn eof(&self) -> bool {
        self.handle.as_ref().is_none_or(|handle| handle.is_eof())
    }

    pub fn tell(&mut self) -> Result<u64, StreamError> {
        let handle = self.handle_mut()?;
        Ok(handle.stream_position()?)
    }

    pub fn rewind(&mut self) -> Result<(), StreamError> {
        self.seek(0, Whence::Set)
    }

    /// Moves the cursor. Negative offsets are rejected for every `whence`.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<(), StreamError> {
        ensure!(offset >= 0, StreamError::invalid_argument(format!("negative seek offset: {offset}")));
        ensure!(self.handle.is_some(), StreamError::detached());
        ensure!(self.is_seekable(), StreamError::NotSeekable);

        let position = match whence {
            Whence::Set => SeekFrom::Start(offset.unsigned_abs()),
            Whence::Current => SeekFrom::Current(offset),
            Whence::End => SeekFrom::End(offset),
        };
        self.handle_mut()?.seek(position)?;
        Ok(())
    }

    /// Byte length of the underlying data, if known.
    pub fn size(&self) -> Option<u64> {
        self.handle.as_ref().and_then(|handle| handle.size())
    }

    /// Reads everything from the current position to the end.
    pub fn contents(&mut self) -> Result<Bytes, StreamError> {
        let handle = self.handle_mut()?;
        let mut buf = Vec::new();
        handle.read_to_end(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    /// Hands the handle to the caller and leaves this stream empty.
    pub fn detach(&mut self) -> Option<Box<dyn Handle>> {
        self.handle.take()
    }

    /// The full metadata mapping; empty when there is no handle.
    pub fn metadata(&self) -> Map<String, Value> {
        match self.handle.as_deref() {
            Some(handle) => Metadata::of(handle).into_map(),
            None => Map::new(),
        }
    }

    /// A single metadata entry, or `None` when there is no handle or no such key.
    pub fn metadata_value(&self, key: &str) -> Option<Value> {
        self.metadata().remove(key)
    }

    /// The whole stream: rewinds first when seekable, otherwise reads from the current
    /// position. Rewind and read failures are returned, not swallowed.
    pub fn read_all(&mut self) -> Result<Bytes, StreamError> {
        if self.is_seekable() {
            self.rewind()?;
        }
        self.contents()
    }

    fn handle_mut(&mut self) -> Result<&mut Box<dyn Handle>, StreamError> {
        self.handle.as_mut().ok_or_else(StreamError::detached)
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream").field("handle", &self.handle).finish()
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        self.close();
    }
}

impl<H: Handle + 'static> From<H> for Stream {
    fn from(handle: H) -> Self {
        Self::new(handle)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io;

    use super::*;

    /// A handle whose every I/O call fails.
    #[derive(Debug)]
    struct BrokenHandle {
        mode: Mode,
    }

    impl BrokenHandle {
        fn new() -> Self {
            Self { mode: Mode::from_static("r+b") }
        }
    }

    impl Read for BrokenHandle {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device gone"))
        }
    }

    impl Write for BrokenHandle {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("device gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for BrokenHandle {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Err(io::Error::other("device gone"))
        }
    }

    impl Handle for BrokenHandle {
        fn mode(&self) -> &Mode {
            &self.mode
        }

        fn is_eof(&self) -> bool {
            false
        }

        fn size(&self) -> Option<u64> {
            None
        }

        fn stream_type(&self) -> &'static str {
            "TEST"
        }

        fn wrapper_type(&self) -> &'static str {
            "broken"
        }
    }

    /// A writable handle that accepts at most `limit` bytes per call.
    #[derive(Debug)]
    struct ShortWriteHandle {
        inner: MemoryHandle,
        limit: usize,
    }

    impl Read for ShortWriteHandle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Write for ShortWriteHandle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(self.limit);
            self.inner.write(&buf[..n])
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    impl Seek for ShortWriteHandle {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    impl Handle for ShortWriteHandle {
        fn mode(&self) -> &Mode {
            self.inner.mode()
        }

        fn is_eof(&self) -> bool {
            self.inner.is_eof()
        }

        fn size(&self) -> Option<u64> {
            self.inner.size()
        }

        fn stream_type(&self) -> &'static str {
            self.inner.stream_type()
        }

        fn wrapper_type(&self) -> &'static str {
            self.inner.wrapper_type()
        }
    }

    #[test]
    fn write_rewind_read_round_trip() {
        let mut stream = Stream::memory();
        assert_eq!(stream.write(b"abc").unwrap(), 3);

        stream.rewind().unwrap();
        assert_eq!(&stream.read(3).unwrap()[..], b"abc");
        assert_eq!(stream.size(), Some(3));
    }

    #[test]
    fn huge_read_length_returns_what_is_there() {
        let mut stream = Stream::from_bytes("abc");
        assert_eq!(&stream.read(usize::MAX).unwrap()[..], b"abc");
        assert!(stream.read(usize::MAX).unwrap().is_empty());
    }

    #[test]
    fn binary_contents_are_returned_intact() {
        let mut stream = Stream::from_bytes(vec![0xff, 0x41, 0x00]);
        assert_eq!(&stream.contents().unwrap()[..], &[0xff, 0x41, 0x00]);
        assert_eq!(&stream.read_all().unwrap()[..], &[0xff, 0x41, 0x00]);
    }

    #[test]
    fn underlying_io_failures_surface_as_io_errors() {
        let mut stream = Stream::new(BrokenHandle::new());
        assert!(matches!(stream.read(4), Err(StreamError::Io { .. })));
        assert!(matches!(stream.write(b"x"), Err(StreamError::Io { .. })));
        assert!(matches!(stream.tell(), Err(StreamError::Io { .. })));
        assert!(matches!(stream.seek(1, Whence::Set), Err(StreamError::Io { .. })));
        assert!(matches!(stream.contents(), Err(StreamError::Io { .. })));
        assert!(matches!(stream.read_all(), Err(StreamError::Io { .. })));

        let err = stream.read(1).unwrap_err();
        assert!(!err.is_detached());
    }

    #[test]
    fn write_reports_bytes_the_handle_accepted() {
        let mut stream = Stream::new(ShortWriteHandle { inner: MemoryHandle::new(), limit: 2 });
        assert_eq!(stream.write(b"hello").unwrap(), 2);
        assert_eq!(stream.read_all().unwrap(), "he");
    }

    #[test]
    fn boxed_handles_can_be_wrapped() {
        let handle: Box<dyn Handle> = Box::new(MemoryHandle::with_bytes("boxed"));
        let mut stream = Stream::from_boxed(handle);
        assert!(stream.is_attached());
        assert!(stream.is_seekable());
        assert_eq!(stream.read_all().unwrap(), "boxed");

        let mut again = Stream::from_boxed(stream.detach().unwrap());
        assert!(!stream.is_attached());
        assert_eq!(again.read_all().unwrap(), "boxed");
    }

    #[test]
    fn short_read_is_not_padded() {
        let mut stream = Stream::from_bytes("hi");
        let bytes = stream.read(10).unwrap();
        assert_eq!(&bytes[..], b"hi");
        assert!(stream.eof());
        assert!(stream.read(10).unwrap().is_empty());
    }

    #[test]
    fn negative_seek_is_invalid_in_every_state() {
        let mut stream = Stream::from_bytes("data");
        assert!(matches!(stream.seek(-1, Whence::Set), Err(StreamError::InvalidArgument { .. })));
        assert!(matches!(stream.seek(-1, Whence::End), Err(StreamError::InvalidArgument { .. })));

        stream.detach();
        assert!(matches!(stream.seek(-1, Whence::Set), Err(StreamError::InvalidArgument { .. })));

        let mut reader = Stream::from_reader(&b"data"[..]);
        assert!(matches!(reader.seek(-1, Whence::Current), Err(StreamError::InvalidArgument { .. })));
    }

    #[test]
    fn seek_and_tell() {
        let mut stream = Stream::from_bytes("0123456789");
        stream.seek(4, Whence::Set).unwrap();
        assert_eq!(stream.tell().unwrap(), 4);

        stream.seek(2, Whence::Current).unwrap();
        assert_eq!(stream.tell().unwrap(), 6);
        assert_eq!(stream.contents().unwrap(), "6789");

        stream.seek(0, Whence::End).unwrap();
        assert_eq!(stream.tell().unwrap(), 10);
    }

    #[test]
    fn contents_reads_from_current_position() {
        let mut stream = Stream::from_bytes("hello world");
        stream.read(6).unwrap();
        assert_eq!(stream.contents().unwrap(), "world");
        assert_eq!(stream.contents().unwrap(), "");
    }

    #[test]
    fn detached_stream_fails_data_operations() {
        let mut stream = Stream::from_bytes("abc");
        let handle = stream.detach();
        assert!(handle.is_some());
        assert!(!stream.is_attached());

        assert!(matches!(stream.read(1), Err(StreamError::NotReadable)));
        assert!(matches!(stream.write(b"x"), Err(StreamError::NotWritable)));
        assert!(stream.tell().unwrap_err().is_detached());
        assert!(stream.contents().unwrap_err().is_detached());
        assert!(stream.rewind().unwrap_err().is_detached());
        assert!(stream.read_all().unwrap_err().is_detached());
    }

    #[test]
    fn detached_stream_degrades_queries() {
        let mut stream = Stream::memory();
        stream.detach();

        assert!(!stream.is_readable());
        assert!(!stream.is_writable());
        assert!(!stream.is_seekable());
        assert!(stream.eof());
        assert_eq!(stream.size(), None);
        assert!(stream.metadata().is_empty());
        assert_eq!(stream.metadata_value("mode"), None);
        assert!(stream.detach().is_none());
    }

    #[test]
    fn detached_handle_keeps_working() {
        let mut stream = Stream::from_bytes("moved");
        let mut handle = stream.detach().unwrap();

        let mut text = String::new();
        handle.read_to_string(&mut text).unwrap();
        assert_eq!(text, "moved");
    }

    #[test]
    fn close_is_idempotent() {
        let mut stream = Stream::memory();
        stream.close();
        stream.close();
        assert!(!stream.is_attached());
        assert!(stream.eof());
    }

    #[test]
    fn metadata_lookup() {
        let stream = Stream::from_bytes("x");
        assert_eq!(stream.metadata_value("mode"), Some(Value::from("r+b")));
        assert_eq!(stream.metadata_value("seekable"), Some(Value::Bool(true)));
        assert_eq!(stream.metadata_value("no-such-key"), None);
        assert!(stream.metadata().contains_key("wrapper_type"));
    }

    #[test]
    fn read_all_rewinds_seekable_streams() {
        let mut stream = Stream::from_bytes("full body");
        stream.read(5).unwrap();
        assert_eq!(stream.read_all().unwrap(), "full body");
        assert_eq!(stream.read_all().unwrap(), "full body");
    }

    #[test]
    fn read_all_on_non_seekable_reads_remaining() {
        let mut stream = Stream::from_reader(&b"pipe data"[..]);
        assert!(!stream.is_seekable());
        assert!(!stream.is_writable());
        assert!(stream.is_readable());
        assert_eq!(stream.size(), None);

        stream.read(5).unwrap();
        assert_eq!(stream.tell().unwrap(), 5);
        assert_eq!(stream.read_all().unwrap(), "data");
        assert_eq!(stream.read_all().unwrap(), "");
    }

    #[test]
    fn non_seekable_stream_rejects_seek() {
        let mut stream = Stream::from_reader(&b"abc"[..]);
        assert!(matches!(stream.rewind(), Err(StreamError::NotSeekable)));
        assert!(matches!(stream.seek(1, Whence::Set), Err(StreamError::NotSeekable)));
    }

    #[test]
    fn read_only_file_is_not_writable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("read-only");
        fs::write(&path, "on disk").unwrap();

        let mut stream = Stream::open(&path, "r").unwrap();
        assert!(stream.is_readable());
        assert!(!stream.is_writable());
        assert!(matches!(stream.write(b"x"), Err(StreamError::NotWritable)));
        assert_eq!(stream.size(), Some(7));
        assert_eq!(stream.contents().unwrap(), "on disk");
        assert!(stream.eof());
        assert!(stream.is_seekable());
    }

    #[test]
    fn write_only_file_is_not_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("write-only");

        let mut stream = Stream::open(&path, "w").unwrap();
        assert!(!stream.is_readable());
        assert_eq!(stream.write(b"12345").unwrap(), 5);
        assert_eq!(stream.size(), Some(5));
        assert!(matches!(stream.read(1), Err(StreamError::NotReadable)));
        assert_eq!(stream.metadata_value("wrapper_type"), Some(Value::from("plainfile")));

        stream.close();
        assert_eq!(fs::read_to_string(&path).unwrap(), "12345");
    }

    #[test]
    fn open_rejects_bad_mode_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(Stream::open(dir.path().join("unused"), "z"), Err(StreamError::InvalidArgument { .. })));
        assert!(matches!(Stream::open(dir.path().join("does-not-exist"), "r"), Err(StreamError::Io { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn character_device_is_not_seekable() {
        let mut stream = Stream::open("/dev/null", "r").unwrap();
        assert!(!stream.is_seekable());
        assert!(matches!(stream.rewind(), Err(StreamError::NotSeekable)));
        assert_eq!(stream.metadata_value("seekable"), Some(Value::Bool(false)));
        assert!(stream.read_all().unwrap().is_empty());
    }
}
