use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::stream::Stream;

/// The body stream attached to a request.
///
/// Derived requests share the same stream, the way they share every other field, so a
/// read through one generation moves the cursor seen by all of them. The lock only makes
/// the handle transferable between threads; callers that read concurrently still need to
/// agree on who owns the cursor.
#[derive(Clone)]
pub struct Body {
    inner: Arc<Mutex<Stream>>,
}

impl Body {
    pub fn new(stream: Stream) -> Self {
        Self { inner: Arc::new(Mutex::new(stream)) }
    }

    /// Locks the stream for exclusive use.
    ///
    /// The lock is not reentrant. Holding the guard while calling anything that locks the
    /// same body again on this thread, such as [`ServerRequest::parsed_body`] on a request
    /// carrying it, deadlocks. Drop the guard first.
    ///
    /// [`ServerRequest::parsed_body`]: crate::protocol::ServerRequest::parsed_body
    pub fn lock(&self) -> MutexGuard<'_, Stream> {
        // a panic mid-read leaves the stream usable; there is no invariant to protect
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` with the stream locked.
    pub fn apply<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&mut Stream) -> T,
    {
        let mut guard = self.lock();
        f(&mut guard)
    }

    /// True if both handles refer to the same stream.
    pub fn ptr_eq(&self, other: &Body) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<Stream> for Body {
    fn from(stream: Stream) -> Self {
        Self::new(stream)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Ok(stream) => f.debug_tuple("Body").field(&*stream).finish(),
            Err(_) => f.debug_tuple("Body").field(&"<locked>").finish(),
        }
    }
}
