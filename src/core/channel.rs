//! Line framing over the engine's byte streams
//!
//! The engine protocol has no framing beyond `\n`. Writes go out as one
//! buffer per command and are flushed immediately; reads yield one line at
//! a time with the terminator removed.

use std::io::{self, BufRead, BufReader, Read, Write};

/// Write half: sends newline-terminated commands.
pub struct LineWriter<W: Write> {
    inner: W,
}

impl<W: Write> LineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Append `\n`, write the whole line in one call and flush.
    pub fn send_line(&mut self, line: &str) -> io::Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        self.inner.write_all(&buf)?;
        self.inner.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

/// Read half: yields lines without their `\n` / `\r\n` terminator.
pub struct LineReader<R: Read> {
    inner: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            buf: Vec::with_capacity(256),
        }
    }

    /// Read the next line.
    ///
    /// Returns `Ok(None)` at end of data. Bytes that are not valid UTF-8 are
    /// replaced rather than treated as a read error, so a stray byte from the
    /// engine never ends the stream. A final line without a terminator is
    /// still returned.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        loop {
            match self.inner.read_until(b'\n', &mut self.buf) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}

impl<R: Read> Iterator for LineReader<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_line().transpose()
    }
}
