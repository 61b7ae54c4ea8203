//! JSON-lines stream adapter: one [`StreamEntry`] per line.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use objreg_store::ObjectRecord;
use tracing::debug;

use crate::error::PersistResult;
use crate::stream::{ObjectReader, ObjectWriter, StreamEntry, StreamItem};

/// Appends records to any `Write` sink, one JSON object per line.
pub struct JsonLinesWriter<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    /// Number of lines written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the sink.
    pub fn finish(mut self) -> PersistResult<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl JsonLinesWriter<BufWriter<File>> {
    /// Create (or truncate) a file at `path`.
    pub fn create(path: &Path) -> PersistResult<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> ObjectWriter for JsonLinesWriter<W> {
    fn write_object(&mut self, record: &ObjectRecord) -> PersistResult<()> {
        let line = serde_json::to_string(&StreamEntry::from_record(record))?;
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }
}

/// A parsed JSON-lines stream held in memory.
///
/// Blank lines are skipped. A line that does not parse becomes a
/// [`StreamItem::missing`] named `<line N>` so a load reports it instead
/// of silently dropping it.
#[derive(Clone, Debug, Default)]
pub struct JsonLinesReader {
    items: Vec<StreamItem>,
}

impl JsonLinesReader {
    pub fn open(path: &Path) -> PersistResult<Self> {
        Self::from_reader(File::open(path)?)
    }

    /// Read every line from `input`. Only I/O failures are errors; bytes
    /// that are not valid UTF-8 or JSON become `<line N>` items.
    pub fn from_reader(input: impl Read) -> PersistResult<Self> {
        let mut items = Vec::new();
        for (idx, line) in BufReader::new(input).split(b'\n').enumerate() {
            let line = line?;
            let line = line.strip_suffix(b"\r").unwrap_or(&line);
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<StreamEntry>(line) {
                Ok(entry) => items.push(entry.into_item()),
                Err(e) => {
                    debug!(line = idx + 1, error = %e, "unparsable stream line");
                    items.push(StreamItem::missing(format!("<line {}>", idx + 1)));
                }
            }
        }
        Ok(Self { items })
    }

    /// Parse from an in-memory string.
    pub fn parse(text: &str) -> PersistResult<Self> {
        Self::from_reader(text.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ObjectReader for JsonLinesReader {
    fn all(&self) -> PersistResult<Vec<StreamItem>> {
        Ok(self.items.clone())
    }
}
