/// Line-by-line tokenizer for station observation files
///
/// Each line becomes one row of whitespace-separated tokens. The literal
/// `-9999` sentinel is replaced with `RawToken::Missing`; everything else is
/// passed through untouched for the normalizer to validate.
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

/// Token the source files use for "no data"
pub const MISSING_SENTINEL: &str = "-9999";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawToken {
    Value(String),
    Missing,
}

impl RawToken {
    fn from_token(token: &str) -> Self {
        if token == MISSING_SENTINEL {
            RawToken::Missing
        } else {
            RawToken::Value(token.to_string())
        }
    }
}

pub type RawRow = Vec<RawToken>;

pub fn tokenize(line: &str) -> RawRow {
    line.split_whitespace().map(RawToken::from_token).collect()
}

/// Lazy row sequence over any buffered reader
pub struct RowScanner<R> {
    lines: Lines<R>,
}

impl RowScanner<BufReader<File>> {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> RowScanner<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl<R: BufRead> Iterator for RowScanner<R> {
    type Item = io::Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next().map(|line| line.map(|l| tokenize(&l)))
    }
}
