//! Input sources consumed by `READ`.

use std::io::{self, BufRead};

/// A sequence of text lines. `READ` pulls one line per execution.
pub trait InputSource {
    /// The next line without its terminator, or `None` at end of input.
    fn next_line(&mut self) -> io::Result<Option<String>>;
}

/// Line-oriented reader over any buffered source: standard input, an opened
/// file, or an in-memory buffer.
#[derive(Debug)]
pub struct LineInput<R> {
    reader: R,
}

impl<R: BufRead> LineInput<R> {
    /// Wrap a buffered reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> InputSource for LineInput<R> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn lines_without_terminators() {
        let mut input = LineInput::new(Cursor::new("first\nsecond\r\nlast"));
        assert_eq!(input.next_line().unwrap(), Some("first".to_string()));
        assert_eq!(input.next_line().unwrap(), Some("second".to_string()));
        assert_eq!(input.next_line().unwrap(), Some("last".to_string()));
        assert_eq!(input.next_line().unwrap(), None);
        assert_eq!(input.next_line().unwrap(), None);
    }

    #[test]
    fn empty_line_is_not_end_of_input() {
        let mut input = LineInput::new(Cursor::new("\n"));
        assert_eq!(input.next_line().unwrap(), Some(String::new()));
        assert_eq!(input.next_line().unwrap(), None);
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let mut input = LineInput::new(Cursor::new(vec![0xff, 0xfe, b'\n']));
        assert!(input.next_line().is_err());
    }
}
