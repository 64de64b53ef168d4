// src/events/intercept.rs

//! Output interception.
//!
//! [`InterceptedWriter`] sits in front of a real output stream. Every write
//! is forwarded unchanged to that stream, and each complete non-blank line
//! is also sent to an [`EventSender`] as one event.
//!
//! The sink is handed in explicitly at construction; nothing is rebound
//! globally. Wrapping is by value, so the same target cannot end up wrapped
//! twice: [`InterceptedWriter::reinstall`] swaps the sink in place instead,
//! and [`InterceptedWriter::into_inner`] gives the original stream back.

use std::io::{self, Write};

use crate::events::EventSender;

#[derive(Debug)]
pub struct InterceptedWriter<W: Write> {
    inner: W,
    sink: EventSender,
    /// Bytes of a line that has not seen its terminating `\n` yet.
    partial: Vec<u8>,
}

impl<W: Write> InterceptedWriter<W> {
    pub fn new(inner: W, sink: EventSender) -> Self {
        Self {
            inner,
            sink,
            partial: Vec::new(),
        }
    }

    /// Point this writer at a new sink without adding another layer.
    ///
    /// Any buffered partial line is flushed to the old sink first.
    pub fn reinstall(mut self, sink: EventSender) -> Self {
        self.flush_partial();
        self.sink = sink;
        self
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutable access to the wrapped stream. Bytes written through it
    /// directly bypass interception.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Emit any trailing partial line and return the original stream.
    pub fn into_inner(mut self) -> W {
        self.flush_partial();
        self.inner
    }

    fn enqueue_lines(&mut self, buf: &[u8]) {
        self.partial.extend_from_slice(buf);
        while let Some(pos) = self.partial.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            self.emit(&line[..line.len() - 1]);
        }
    }

    fn flush_partial(&mut self) {
        if !self.partial.is_empty() {
            let line = std::mem::take(&mut self.partial);
            self.emit(&line);
        }
    }

    fn emit(&self, raw: &[u8]) {
        // Lossy decode: a malformed fragment becomes U+FFFD rather than
        // taking the worker down.
        let text = String::from_utf8_lossy(raw);
        let text = text.trim_end_matches('\r');
        if !text.trim().is_empty() {
            self.sink.send(text);
        }
    }
}

impl<W: Write> Write for InterceptedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Queue first, so a broken local stream never costs an event.
        self.enqueue_lines(buf);
        self.inner.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
