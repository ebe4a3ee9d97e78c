use crate::Span;

/// Read position inside the original input.
///
/// A cursor is an offset plus a 1-based line counter. Every operation returns
/// a new cursor; text is only ever borrowed from the original buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor<'a> {
    input: &'a str,
    offset: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            offset: 0,
            line: 1,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.input.len()
    }

    /// Unconsumed input from the cursor to the end of the buffer.
    pub fn rest(&self) -> &'a str {
        &self.input[self.offset..]
    }

    pub fn at_line_start(&self) -> bool {
        self.offset == 0 || self.input.as_bytes()[self.offset - 1] == b'\n'
    }

    /// Remainder of the current line, without its line ending.
    pub fn current_line(&self) -> &'a str {
        let rest = self.rest();
        let end = rest.find('\n').unwrap_or(rest.len());
        let line = &rest[..end];
        line.strip_suffix('\r').unwrap_or(line)
    }

    /// True when only whitespace is left on the current line.
    pub fn at_line_end(&self) -> bool {
        self.current_line().trim().is_empty()
    }

    /// Move forward by `bytes`, never past the end of the current line.
    pub fn advance(self, bytes: usize) -> Self {
        let bytes = bytes.min(self.current_line().len());
        Self {
            offset: self.offset + bytes,
            ..self
        }
    }

    pub fn skip_inline_whitespace(self) -> Self {
        let line = self.current_line();
        self.advance(line.len() - line.trim_start().len())
    }

    /// Start of the following line, or end of input.
    pub fn next_line(self) -> Self {
        match self.rest().find('\n') {
            Some(idx) => Self {
                offset: self.offset + idx + 1,
                line: self.line + 1,
                ..self
            },
            None => Self {
                offset: self.input.len(),
                ..self
            },
        }
    }

    /// Next whitespace-delimited token on the current line and the cursor after it.
    pub fn peek_token(&self) -> Option<(&'a str, Cursor<'a>)> {
        let start = self.skip_inline_whitespace();
        let line = start.current_line();
        if line.is_empty() {
            return None;
        }
        let len = line.find(char::is_whitespace).unwrap_or(line.len());
        Some((&line[..len], start.advance(len)))
    }

    /// Span from this cursor up to `end` on this cursor's line.
    pub fn span_to(&self, end: &Cursor<'_>) -> Span {
        Span {
            line: self.line,
            start_byte: self.offset,
            end_byte: end.offset.max(self.offset),
        }
    }

    /// Span covering the rest of the current line.
    pub fn line_span(&self) -> Span {
        Span {
            line: self.line,
            start_byte: self.offset,
            end_byte: self.offset + self.current_line().len(),
        }
    }
}
