//! Gzipped JSON record reader
//!
//! Each file is one or more concatenated gzip members whose content is either
//! a JSON array of objects or a whitespace-separated stream of objects
//! (NDJSON). The layout is detected from the first non-whitespace byte.
//! Both layouts are read one record at a time.

use crate::error::{Error, Result};
use flate2::read::MultiGzDecoder;
use serde::Deserialize;
use serde_json::de::IoRead;
use serde_json::{StreamDeserializer, Value};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

type GzReader = BufReader<MultiGzDecoder<File>>;

/// Layout of the decompressed JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonLayout {
    /// A single top-level array of records
    Array,
    /// Records one after another (NDJSON or concatenated)
    Stream,
    /// No content at all
    Empty,
}

enum Records {
    Array(ArrayElements),
    Stream(StreamDeserializer<'static, IoRead<GzReader>, Value>),
    Empty,
}

/// Iterator over the records of one gzipped JSON file
pub struct GzipJsonReader {
    path: PathBuf,
    layout: JsonLayout,
    records: Records,
    position: usize,
}

impl GzipJsonReader {
    /// Open a file and detect its layout
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .map_err(|e| Error::filesystem(&path, format!("Failed to open: {e}")))?;
        let mut reader = BufReader::new(MultiGzDecoder::new(file));

        let first = first_significant_byte(&mut reader)
            .map_err(|e| Error::decode(&path, format!("Failed to decompress: {e}")))?;

        let (layout, records) = match first {
            None => (JsonLayout::Empty, Records::Empty),
            Some(b'[') => (JsonLayout::Array, Records::Array(ArrayElements::new(reader))),
            Some(_) => {
                let stream = serde_json::Deserializer::from_reader(reader).into_iter::<Value>();
                (JsonLayout::Stream, Records::Stream(stream))
            }
        };

        Ok(Self {
            path,
            layout,
            records,
            position: 0,
        })
    }

    /// Detected layout
    pub fn layout(&self) -> JsonLayout {
        self.layout
    }

    /// Path being read
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for GzipJsonReader {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = match &mut self.records {
            Records::Empty => None,
            Records::Array(elements) => elements.next_value().transpose().map(|item| {
                item.map_err(|e| {
                    Error::decode(
                        &self.path,
                        format!("Invalid JSON array after record {}: {e}", self.position),
                    )
                })
            }),
            Records::Stream(stream) => stream.next().map(|item| {
                item.map_err(|e| {
                    Error::decode(
                        &self.path,
                        format!("Invalid JSON after record {}: {e}", self.position),
                    )
                })
            }),
        }?;

        let position = self.position;
        self.position += 1;

        let record = next.and_then(|value| {
            if value.is_object() {
                Ok(value)
            } else {
                Err(Error::decode(
                    &self.path,
                    format!("Record {position} is not a JSON object"),
                ))
            }
        });
        if record.is_err() {
            self.records = Records::Empty;
        }
        Some(record)
    }
}

impl std::fmt::Debug for GzipJsonReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GzipJsonReader")
            .field("path", &self.path)
            .field("layout", &self.layout)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

/// Read every record of a file into memory
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    GzipJsonReader::open(path)?.collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayState {
    First,
    Next,
    Done,
}

/// Pull parser over the elements of a top-level JSON array
///
/// Only the element being parsed is held in memory. The separators between
/// elements are checked here and each element is parsed by its own
/// deserializer over the shared buffered reader.
struct ArrayElements {
    reader: GzReader,
    state: ArrayState,
}

impl ArrayElements {
    /// `reader` must be positioned on the opening `[`
    fn new(mut reader: GzReader) -> Self {
        reader.consume(1);
        Self {
            reader,
            state: ArrayState::First,
        }
    }

    fn next_value(&mut self) -> std::result::Result<Option<Value>, String> {
        if self.state == ArrayState::Done {
            return Ok(None);
        }

        let byte = first_significant_byte(&mut self.reader).map_err(|e| self.fail(e))?;
        match byte {
            None => return Err(self.fail("unexpected end of input")),
            Some(b']') => {
                self.reader.consume(1);
                self.state = ArrayState::Done;
                let trailing =
                    first_significant_byte(&mut self.reader).map_err(|e| e.to_string())?;
                return match trailing {
                    None => Ok(None),
                    Some(b) => Err(format!(
                        "trailing characters after array: '{}'",
                        char::from(b)
                    )),
                };
            }
            Some(b',') if self.state == ArrayState::Next => self.reader.consume(1),
            Some(_) if self.state == ArrayState::First => {}
            Some(b) => {
                return Err(self.fail(format!("expected ',' or ']', found '{}'", char::from(b))));
            }
        }

        let parsed = {
            let mut de = serde_json::Deserializer::from_reader(&mut self.reader);
            Value::deserialize(&mut de)
        };
        let value = parsed.map_err(|e| self.fail(e))?;
        self.state = ArrayState::Next;
        Ok(Some(value))
    }

    fn fail(&mut self, err: impl std::fmt::Display) -> String {
        self.state = ArrayState::Done;
        err.to_string()
    }
}

/// Skip leading whitespace and return the next byte without consuming it
fn first_significant_byte(reader: &mut impl BufRead) -> std::io::Result<Option<u8>> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }
        if let Some(pos) = buf.iter().position(|b| !b.is_ascii_whitespace()) {
            let byte = buf[pos];
            reader.consume(pos);
            return Ok(Some(byte));
        }
        let len = buf.len();
        reader.consume(len);
    }
}
