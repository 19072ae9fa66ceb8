//! Fragment caching: capture a block of generated output once, replay it
//! on later calls.
//!
//! ```ignore
//! let mut page = FragmentCache::new(&store, std::io::stdout());
//! if page.start_cache("sidebar", 3600)? {
//!     write!(page, "{}", render_sidebar())?;
//!     page.end_cache()?;
//! }
//! ```

use std::io::{self, Write};

use crate::cache::CacheStore;
use crate::error::{CacheError, Result};

/// Outcome of [`CacheStore::start_fragment`].
#[derive(Debug)]
pub enum Fragment {
    /// Previously captured output; the caller skips generating it.
    Hit(Vec<u8>),
    /// Nothing cached; write the output into the capture and hand it to
    /// [`CacheStore::end_fragment`].
    Miss(Capture),
}

/// Buffer collecting output for one fragment key.
#[derive(Debug)]
pub struct Capture {
    key: String,
    ttl_seconds: u64,
    buffer: Vec<u8>,
}

impl Capture {
    fn new(key: &str, ttl_seconds: u64) -> Self {
        Self {
            key: key.to_string(),
            ttl_seconds,
            buffer: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Output captured so far.
    pub fn contents(&self) -> &[u8] {
        &self.buffer
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CacheStore {
    /// Looks up a fragment; empty cached output counts as a miss.
    pub fn start_fragment(&self, key: &str, ttl_seconds: u64) -> Fragment {
        match self.get::<String>(key) {
            Some(text) if !text.is_empty() => Fragment::Hit(text.into_bytes()),
            _ => Fragment::Miss(Capture::new(key, ttl_seconds)),
        }
    }

    /// Stores the captured output under its key and returns it.
    pub fn end_fragment(&self, capture: Capture) -> Result<Vec<u8>> {
        self.store_fragment(&capture.key, &capture.buffer, capture.ttl_seconds)?;
        Ok(capture.buffer)
    }

    /// Fragments are stored as JSON strings, so the output must be UTF-8.
    fn store_fragment(&self, key: &str, output: &[u8], ttl_seconds: u64) -> Result<()> {
        let text = std::str::from_utf8(output).map_err(|e| CacheError::Serialization {
            reason: format!("fragment {key} is not valid UTF-8: {e}"),
        })?;
        self.set(key, text, ttl_seconds)
    }
}

// == Fragment Cache ==
/// Start/end pairs over an output sink.
///
/// While a capture is open, everything written to the `FragmentCache` lands
/// in the capture buffer; otherwise it goes straight through to the sink.
pub struct FragmentCache<'a, W: Write> {
    store: &'a CacheStore,
    sink: W,
    capture: Option<Capture>,
}

impl<'a, W: Write> FragmentCache<'a, W> {
    pub fn new(store: &'a CacheStore, sink: W) -> Self {
        Self {
            store,
            sink,
            capture: None,
        }
    }

    /// Replays `key` into the sink, or begins capturing it.
    ///
    /// Returns `true` when the caller must generate the content (and then
    /// call [`end_cache`](Self::end_cache)), `false` when it was replayed.
    pub fn start_cache(&mut self, key: &str, ttl_seconds: u64) -> Result<bool> {
        if self.capture.is_some() {
            return Err(CacheError::CaptureActive);
        }

        match self.store.start_fragment(key, ttl_seconds) {
            Fragment::Hit(bytes) => {
                self.sink.write_all(&bytes).map_err(CacheError::Output)?;
                Ok(false)
            }
            Fragment::Miss(capture) => {
                self.capture = Some(capture);
                Ok(true)
            }
        }
    }

    /// Closes the open capture, stores it and writes it to the sink.
    ///
    /// The output reaches the sink even if storing it failed. When storing
    /// fails that error is returned, otherwise any error from the sink.
    pub fn end_cache(&mut self) -> Result<Vec<u8>> {
        let Capture {
            key,
            ttl_seconds,
            buffer,
        } = self.capture.take().ok_or(CacheError::NoActiveCapture)?;

        let stored = self.store.store_fragment(&key, &buffer, ttl_seconds);
        let emitted = self.sink.write_all(&buffer).map_err(CacheError::Output);
        stored.and(emitted)?;

        Ok(buffer)
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> Write for FragmentCache<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.capture.as_mut() {
            Some(capture) => capture.write(buf),
            None => self.sink.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}
