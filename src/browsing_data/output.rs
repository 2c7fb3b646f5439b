//! Serialization of sources to JSON or CSV, and the files they land in.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use super::Source;
use crate::error::OutputError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const JSON_INDENT: &[u8] = b"  ";

/// Output serialization format, chosen once per export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Csv,
}

impl OutputFormat {
    /// `"json"` selects JSON; every other flag falls back to CSV.
    pub fn from_flag(flag: &str) -> Self {
        if flag.trim().eq_ignore_ascii_case("json") {
            OutputFormat::Json
        } else {
            OutputFormat::Csv
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Type-erased view of a source's records.
///
/// Implemented for every `Vec<T>` of serializable rows, so concrete sources
/// only have to hand out their record vector.
pub trait RecordSet {
    fn write_json(&self, w: &mut dyn Write) -> Result<(), OutputError>;
    fn write_csv(&self, w: &mut dyn Write) -> Result<(), OutputError>;
}

impl<T: Serialize> RecordSet for Vec<T> {
    fn write_json(&self, w: &mut dyn Write) -> Result<(), OutputError> {
        encode_json(self, w)
    }

    fn write_csv(&self, w: &mut dyn Write) -> Result<(), OutputError> {
        encode_csv(self, w)
    }
}

/// Pretty JSON: two-space indent, every continuation line additionally
/// prefixed with two spaces, HTML characters left as-is, trailing newline.
pub fn encode_json<T: Serialize + ?Sized>(value: &T, w: &mut dyn Write) -> Result<(), OutputError> {
    {
        let mut prefixed = LinePrefixer::new(&mut *w, JSON_INDENT);
        let formatter = PrettyFormatter::with_indent(JSON_INDENT);
        let mut ser = serde_json::Serializer::with_formatter(&mut prefixed, formatter);
        value.serialize(&mut ser)?;
    }
    w.write_all(b"\n")?;
    Ok(())
}

/// BOM-prefixed CSV with a header row taken from the record's field names.
pub fn encode_csv<T: Serialize>(records: &[T], w: &mut dyn Write) -> Result<(), OutputError> {
    w.write_all(UTF8_BOM)?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .from_writer(&mut *w);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `prefix` after every newline passing through it.
struct LinePrefixer<'a, W: Write + ?Sized> {
    inner: &'a mut W,
    prefix: &'static [u8],
}

impl<'a, W: Write + ?Sized> LinePrefixer<'a, W> {
    fn new(inner: &'a mut W, prefix: &'static [u8]) -> Self {
        Self { inner, prefix }
    }
}

impl<W: Write + ?Sized> Write for LinePrefixer<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.inner.write_all(&rest[..=pos])?;
            self.inner.write_all(self.prefix)?;
            rest = &rest[pos + 1..];
        }
        self.inner.write_all(rest)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Output file name for one exported source: `{label}_{name}.{ext}`.
///
/// Spaces and path separators in the label become underscores. An empty
/// `name` yields an empty string, which [`Outputter::create_file`] rejects.
pub fn filename(label: &str, name: &str, ext: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    let label: String = label
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    format!("{}_{}.{}", label, name, ext)
}

/// Serializer for one configured format.
#[derive(Debug, Clone, Copy)]
pub struct Outputter {
    format: OutputFormat,
}

impl Outputter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    pub fn write(&self, source: &dyn Source, w: &mut dyn Write) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => source.records().write_json(w),
            OutputFormat::Csv => source.records().write_csv(w),
        }
    }

    /// Serialize a source into an in-memory string.
    pub fn render(&self, source: &dyn Source) -> Result<String, OutputError> {
        let mut buf = Vec::new();
        self.write(source, &mut buf)?;
        String::from_utf8(buf)
            .map_err(|e| OutputError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    /// Create (or truncate) `dir/filename` for writing, creating `dir` first
    /// when it does not exist. An empty `dir` means the working directory.
    pub fn create_file(&self, dir: &Path, filename: &str) -> Result<File, OutputError> {
        if filename.is_empty() {
            return Err(OutputError::EmptyFilename);
        }

        if !dir.as_os_str().is_empty() && !dir.exists() {
            create_dir_owner_only(dir)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        Ok(options.open(dir.join(filename))?)
    }
}

fn create_dir_owner_only(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}
