//! Result record model shared by every source.

use serde::{Serialize, Serializer};
use serde_json::ser::{Formatter, PrettyFormatter};
use std::io;

/// Placeholder for an absent title, author, or year
pub const UNKNOWN: &str = "Unknown";

/// Placeholder for an absent link
pub const NO_URL: &str = "No URL";

/// Placeholder for an absent DOI
pub const NO_DOI: &str = "No DOI";

/// Author information as reported by a source.
///
/// Sources either give an ordered list of names or nothing at all; the latter
/// is printed as the `"Unknown"` sentinel rather than an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authors {
    Names(Vec<String>),
    Unknown,
}

impl From<Vec<String>> for Authors {
    fn from(names: Vec<String>) -> Self {
        Authors::Names(names)
    }
}

impl Serialize for Authors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Authors::Names(names) => names.serialize(serializer),
            Authors::Unknown => serializer.serialize_str(UNKNOWN),
        }
    }
}

/// Publication year.
///
/// Google Scholar reports the year as text, Semantic Scholar as a number, and
/// CrossRef leaves it `null` when no print date exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Year {
    Number(i64),
    Text(String),
    Unknown,
    Absent,
}

impl Serialize for Year {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Year::Number(year) => serializer.serialize_i64(*year),
            Year::Text(year) => serializer.serialize_str(year),
            Year::Unknown => serializer.serialize_str(UNKNOWN),
            Year::Absent => serializer.serialize_unit(),
        }
    }
}

/// A normalized search result.
///
/// Field order matters: records are printed in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    pub title: String,

    pub authors: Authors,

    pub year: Year,

    /// Only CrossRef records carry a DOI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    pub link: String,
}

impl ResultRecord {
    /// Create a record with every optional field set to its sentinel
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            authors: Authors::Unknown,
            year: Year::Unknown,
            doi: None,
            link: NO_URL.to_string(),
        }
    }

    pub fn authors(mut self, authors: impl Into<Authors>) -> Self {
        self.authors = authors.into();
        self
    }

    pub fn year(mut self, year: Year) -> Self {
        self.year = year;
        self
    }

    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    /// Pretty JSON with a four-space indent, one block per record.
    ///
    /// Output is pure ASCII: anything outside printable ASCII is written as
    /// `\uXXXX` (surrogate pairs above the BMP).
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = AsciiFormatter(PrettyFormatter::with_indent(b"    "));
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        // ASCII only, so always valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Pretty formatter that escapes every non-printable-ASCII character
struct AsciiFormatter<'a>(PrettyFormatter<'a>);

impl Formatter for AsciiFormatter<'_> {
    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        for c in fragment.chars() {
            if (' '..='~').contains(&c) {
                writer.write_all(&[c as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_value(writer)
    }
}
