//! CSV row emission.
//!
//! Cells are comma-joined, one `\n`-terminated line per row. A cell containing
//! a comma, a double quote, or a line break is quoted with inner quotes doubled.

use bytes::{BufMut, Bytes, BytesMut};

pub const DELIMITER: u8 = b',';

#[derive(Debug, Default)]
pub struct RowWriter {
    buf: BytesMut,
    rows: usize,
}

impl RowWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row of cells.
    pub fn write_row<S: AsRef<str>>(&mut self, cells: &[S]) {
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                self.buf.put_u8(DELIMITER);
            }
            self.write_cell(cell.as_ref());
        }
        self.buf.put_u8(b'\n');
        self.rows += 1;
    }

    fn write_cell(&mut self, cell: &str) {
        let needs_quotes = cell
            .bytes()
            .any(|b| b == DELIMITER || b == b'"' || b == b'\n' || b == b'\r');

        if !needs_quotes {
            self.buf.put_slice(cell.as_bytes());
            return;
        }

        self.buf.put_u8(b'"');
        for (i, part) in cell.split('"').enumerate() {
            if i > 0 {
                self.buf.put_slice(b"\"\"");
            }
            self.buf.put_slice(part.as_bytes());
        }
        self.buf.put_u8(b'"');
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}
