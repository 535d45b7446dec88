use std::io::{self, Write};
use std::sync::Arc;

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

pub const REDACTED: &str = "CENSORED";

pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, REDACTED)
}

/// Buffers one formatted event and writes it, with the secret replaced, when flushed or dropped.
pub struct RedactingWriter<W: Write> {
    inner: W,
    secret: Arc<str>,
    buffer: Vec<u8>,
}

impl<W: Write> RedactingWriter<W> {
    pub fn new(inner: W, secret: Arc<str>) -> Self {
        Self {
            inner,
            secret,
            buffer: Vec::new(),
        }
    }

    fn drain(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let text = String::from_utf8_lossy(&self.buffer);
        let redacted = redact(&text, &self.secret);
        self.buffer.clear();
        self.inner.write_all(redacted.as_bytes())?;
        self.inner.flush()
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drain()
    }
}

impl<W: Write> Drop for RedactingWriter<W> {
    fn drop(&mut self) {
        let _ = self.drain();
    }
}

/// `MakeWriter` that censors the API token from every log line. Writes to stderr by default.
#[derive(Clone)]
pub struct RedactingMakeWriter<M = fn() -> io::Stderr> {
    inner: M,
    secret: Arc<str>,
}

impl RedactingMakeWriter {
    pub fn new(secret: &str) -> Self {
        Self::wrapping(io::stderr as fn() -> io::Stderr, secret)
    }
}

impl<M> RedactingMakeWriter<M> {
    pub fn wrapping(inner: M, secret: &str) -> Self {
        Self {
            inner,
            secret: Arc::from(secret),
        }
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new(self.inner.make_writer(), Arc::clone(&self.secret))
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the default level.
pub fn init(verbose: bool, secret: &str) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(RedactingMakeWriter::new(secret))
        .try_init();
}
