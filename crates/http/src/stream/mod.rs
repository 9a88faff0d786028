//! Byte-stream wrapper with strict pre-condition checks.
//!
//! A [`Stream`] owns exactly one [`Handle`] and exposes read/write/seek/metadata
//! operations over it. The handle can be moved back out with [`Stream::detach`],
//! after which the stream stays empty for good.
//!
//! # Example
//!
//! ```
//! use micro_message::stream::Stream;
//!
//! let mut stream = Stream::memory();
//! stream.write(b"abc")?;
//! stream.rewind()?;
//! assert_eq!(&stream.read(3)?[..], b"abc");
//! assert_eq!(stream.size(), Some(3));
//! # Ok::<(), micro_message::protocol::StreamError>(())
//! ```

mod handle;
mod metadata;
mod mode;
mod wrapper;

pub use handle::FileHandle;
pub use handle::Handle;
pub use handle::MemoryHandle;
pub use handle::ReaderHandle;
pub use metadata::Metadata;
pub use mode::Mode;
pub use wrapper::Stream;
pub use wrapper::Whence;
