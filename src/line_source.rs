use std::io::{self, BufRead};

/// Thread-safe-when-wrapped-in-a-mutex source of whole lines. This is the
/// "provided utility" the ingester pulls from; callers may substitute any
/// implementation (a network stream, a decompressing reader, …) as long as
/// it upholds this contract.
pub trait LineSource: Send {
    fn next_line(&mut self) -> io::Result<Option<String>>;
}

/// Default line source: a buffered reader with the trailing newline (and
/// CR, for CRLF input) stripped.
pub struct BufLineSource<R> {
    reader: R,
    buf: String,
}

impl<R: BufRead> BufLineSource<R> {
    pub fn new(reader: R) -> Self {
        BufLineSource {
            reader,
            buf: String::new(),
        }
    }
}

impl<R: BufRead + Send> LineSource for BufLineSource<R> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        let read = self.reader.read_line(&mut self.buf)?;
        if read == 0 {
            return Ok(None);
        }
        while self.buf.ends_with('\n') || self.buf.ends_with('\r') {
            self.buf.pop();
        }
        Ok(Some(self.buf.clone()))
    }
}
