use std::{borrow::Cow, io, io::BufRead};

use regex::Regex;

use crate::unescape::unescape_codepoints;

/// Below this many buffered bytes a streamed source is read from again.
pub const LOW_WATER: usize = 2048;
/// How many bytes a streamed source is topped up to, rounded up to the end of a line.
pub const HIGH_WATER: usize = 10240;

/// A cursor over text which is either fully available up front or pulled
/// line by line from a reader as matching requires it.
///
/// Streamed input is always appended in whole lines, so anything that can not
/// span a line boundary is never seen cut in half.
pub struct Scanner<'a> {
    buffer: Cow<'a, str>,
    position: usize,
    reader: Option<Box<dyn BufRead + 'a>>,
    unescape: bool,
    low_water: usize,
    high_water: usize,
}

impl<'a> Scanner<'a> {
    /// Scans a string, numeric escapes are decoded up front when `unescape` is set.
    pub fn new(src: &'a str, unescape: bool) -> Scanner<'a> {
        let buffer = match unescape {
            true => unescape_codepoints(src),
            false => Cow::Borrowed(src),
        };
        Scanner {
            buffer,
            position: 0,
            reader: None,
            unescape,
            low_water: LOW_WATER,
            high_water: HIGH_WATER,
        }
    }

    /// Scans a stream, numeric escapes are decoded in every line read when `unescape` is set.
    pub fn from_reader(reader: impl BufRead + 'a, unescape: bool) -> Scanner<'a> {
        Scanner {
            buffer: Cow::Owned(String::new()),
            position: 0,
            reader: Some(Box::new(reader)),
            unescape,
            low_water: LOW_WATER,
            high_water: HIGH_WATER,
        }
    }

    pub fn with_water_marks(mut self, low_water: usize, high_water: usize) -> Scanner<'a> {
        assert!(low_water <= high_water, "Low water mark above high water mark");
        self.low_water = low_water;
        self.high_water = high_water;
        self
    }

    /// The buffered text which has not been consumed yet.
    pub fn rest(&self) -> &str {
        &self.buffer[self.position..]
    }

    /// Whether more text may still arrive from the reader.
    pub fn is_streaming(&self) -> bool {
        self.reader.is_some()
    }

    /// Tops the buffer up to the high water mark if it has fallen below the low water mark.
    pub fn fill(&mut self) -> io::Result<()> {
        let buffered = self.rest().len();
        if buffered < self.low_water && self.is_streaming() {
            self.read_lines(self.high_water - buffered)?;
        }
        Ok(())
    }

    /// Unconditionally reads at least one more line. Returns `false` if the input is exhausted.
    pub fn feed(&mut self) -> io::Result<bool> {
        let read = self.read_lines(self.high_water.max(1))?;
        Ok(read > 0)
    }

    /// Whether all input has been consumed.
    pub fn is_at_end(&mut self) -> io::Result<bool> {
        self.fill()?;
        Ok(self.rest().is_empty())
    }

    /// Length of the match of an anchored pattern at the cursor.
    pub fn match_len(&self, pattern: &Regex) -> Option<usize> {
        pattern.find(self.rest()).map(|m| m.end())
    }

    /// Consumes `len` bytes, returning the consumed text.
    #[track_caller]
    pub fn advance(&mut self, len: usize) -> &str {
        let start = self.position;
        assert!(start + len <= self.buffer.len(), "Advancing past the buffer");
        self.position += len;
        &self.buffer[start..self.position]
    }

    fn read_lines(&mut self, target: usize) -> io::Result<usize> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(0);
        };

        // consumed text is never looked at again
        let buffer = self.buffer.to_mut();
        buffer.drain(..self.position);
        self.position = 0;

        let mut line = String::new();
        let mut read = 0;
        let mut exhausted = false;
        while read < target {
            line.clear();
            let count = reader.read_line(&mut line)?;
            if count == 0 {
                exhausted = true;
                break;
            }
            read += count;

            match self.unescape {
                true => buffer.push_str(&unescape_codepoints(&line)),
                false => buffer.push_str(&line),
            }
        }

        if exhausted {
            self.reader = None;
        }
        Ok(read)
    }
}
