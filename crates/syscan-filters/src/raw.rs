use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use syscan_core::digest_bytes;
use syscan_core::errors::{ErrorInfo, SyscanError};

/// Root of the raw input tree, laid out as `<root>/<SET>/<file>`.
///
/// Every file opened through the source has the digest of the exact text
/// handed to the caller recorded, see [`RawSource::digests`].
#[derive(Debug, Clone)]
pub struct RawSource {
    root: PathBuf,
    opened: RefCell<BTreeMap<String, String>>,
}

impl RawSource {
    /// Uses `root` as the raw data directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            opened: RefCell::new(BTreeMap::new()),
        }
    }

    /// SHA-256 digests of the files opened so far, keyed by file name.
    pub fn digests(&self) -> BTreeMap<String, String> {
        self.opened.borrow().clone()
    }

    /// Directory holding the raw inputs.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `file` for dataset `set`.
    pub fn path(&self, set: &str, file: &str) -> PathBuf {
        self.root.join(set).join(file)
    }

    /// Reads `file` of dataset `set`.
    pub fn open(&self, set: &str, file: &str) -> Result<RawTable, SyscanError> {
        let path = self.path(set, file);
        let text = fs::read_to_string(&path).map_err(|err| {
            SyscanError::Input(
                ErrorInfo::new("raw-open", format!("cannot read {file}: {err}"))
                    .with_context("dataset", set)
                    .with_context("path", path.display().to_string()),
            )
        })?;
        let table = RawTable {
            name: file.to_string(),
            text,
        };
        self.opened
            .borrow_mut()
            .insert(table.name.clone(), table.digest());
        Ok(table)
    }
}

/// Contents of one raw whitespace-separated table.
///
/// Blank lines and lines starting with `#` are ignored.
#[derive(Debug, Clone)]
pub struct RawTable {
    name: String,
    text: String,
}

impl RawTable {
    /// Wraps in-memory text, mostly for tests.
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// File name the table was read from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// SHA-256 of the raw text.
    pub fn digest(&self) -> String {
        digest_bytes(self.text.as_bytes())
    }

    fn content_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
    }

    /// The first `count` content lines, one token stream per line.
    pub fn rows(&self, count: usize) -> Result<Vec<TokenStream<'_>>, SyscanError> {
        let rows: Vec<_> = self
            .content_lines()
            .take(count)
            .map(|(line, text)| {
                let tokens = text.split_whitespace().map(move |t| (line, t)).collect();
                TokenStream::new(&self.name, tokens)
            })
            .collect();
        if rows.len() < count {
            return Err(SyscanError::Format(
                ErrorInfo::new(
                    "too-few-rows",
                    format!("{} holds {} rows, expected {count}", self.name, rows.len()),
                )
                .with_context("file", self.name.clone()),
            ));
        }
        Ok(rows)
    }

    /// Every token of the table in reading order, ignoring line breaks.
    pub fn tokens(&self) -> TokenStream<'_> {
        let tokens = self
            .content_lines()
            .flat_map(|(line, text)| text.split_whitespace().map(move |t| (line, t)))
            .collect();
        TokenStream::new(&self.name, tokens)
    }
}

/// Sequential reader over the tokens of a raw table.
#[derive(Debug, Clone)]
pub struct TokenStream<'a> {
    file: &'a str,
    tokens: Vec<(usize, &'a str)>,
    pos: usize,
}

impl<'a> TokenStream<'a> {
    fn new(file: &'a str, tokens: Vec<(usize, &'a str)>) -> Self {
        Self {
            file,
            tokens,
            pos: 0,
        }
    }

    fn error(&self, code: &str, message: String, field: &str) -> SyscanError {
        let line = self
            .tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|(line, _)| line.to_string())
            .unwrap_or_default();
        SyscanError::Format(
            ErrorInfo::new(code, message)
                .with_context("file", self.file)
                .with_context("line", line)
                .with_context("field", field),
        )
    }

    /// Parses the next token as a number; `field` names it in errors.
    pub fn next_f64(&mut self, field: &str) -> Result<f64, SyscanError> {
        let (_, token) = match self.tokens.get(self.pos) {
            Some(entry) => *entry,
            None => {
                return Err(self.error(
                    "unexpected-end",
                    format!("{} ended before {field}", self.file),
                    field,
                ))
            }
        };
        let value = token.parse::<f64>().map_err(|err| {
            self.error("parse-number", format!("cannot parse {token:?}: {err}"), field)
        })?;
        self.pos += 1;
        Ok(value)
    }

    /// Reads `count` numbers.
    pub fn take_f64(&mut self, count: usize, field: &str) -> Result<Vec<f64>, SyscanError> {
        (0..count).map(|_| self.next_f64(field)).collect()
    }

    /// Discards `count` tokens without parsing them.
    pub fn skip(&mut self, count: usize, field: &str) -> Result<(), SyscanError> {
        if self.pos + count > self.tokens.len() {
            return Err(self.error(
                "unexpected-end",
                format!("{} ended before {field}", self.file),
                field,
            ));
        }
        self.pos += count;
        Ok(())
    }

    /// Tokens not consumed yet.
    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let table = RawTable::from_text("toy.data", "# header\n\n1 2 3\n4 5\n");
        let rows = table.rows(2).unwrap();
        assert_eq!(rows[0].remaining(), 3);
        let mut tokens = table.tokens();
        assert_eq!(tokens.take_f64(5, "value").unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(tokens.remaining(), 0);
    }

    #[test]
    fn parse_errors_name_file_line_and_field() {
        let table = RawTable::from_text("toy.data", "1.0\nnope\n");
        let mut tokens = table.tokens();
        tokens.next_f64("first").unwrap();
        let err = tokens.next_f64("second").unwrap_err();
        let info = err.info();
        assert_eq!(info.code, "parse-number");
        assert_eq!(info.context.get("line").map(String::as_str), Some("2"));
        assert_eq!(info.context.get("field").map(String::as_str), Some("second"));
    }

    #[test]
    fn short_tables_are_rejected() {
        let table = RawTable::from_text("toy.data", "1\n");
        assert_eq!(table.rows(2).unwrap_err().info().code, "too-few-rows");
        let mut tokens = table.tokens();
        assert_eq!(tokens.skip(2, "pair").unwrap_err().info().code, "unexpected-end");
    }

    #[test]
    fn opened_files_record_the_digest_of_the_parsed_text() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("SET")).unwrap();
        fs::write(dir.path().join("SET").join("toy.data"), "1 2\n").unwrap();
        let source = RawSource::new(dir.path());
        assert!(source.digests().is_empty());

        let table = source.open("SET", "toy.data").unwrap();
        fs::write(dir.path().join("SET").join("toy.data"), "3 4\n").unwrap();
        let digests = source.digests();
        assert_eq!(digests.len(), 1);
        assert_eq!(digests.get("toy.data"), Some(&table.digest()));
        assert_eq!(table.digest(), digest_bytes(b"1 2\n"));
        let _ = source.open("SET", "missing.data");
        assert_eq!(source.digests().len(), 1);
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = RawSource::new(dir.path());
        let err = source.open("SET", "missing.data").unwrap_err();
        assert!(matches!(err, SyscanError::Input(_)));
        assert!(err.info().message.contains("missing.data"));
    }
}
