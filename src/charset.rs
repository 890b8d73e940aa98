use std::borrow::Cow;

use encoding_rs::Encoding;

use crate::error::{Error, Result};

// encoding_rs has no ISO-8859-9, -11 and -12 of its own; iso-8859-1 and
// iso-8859-9 are decoded as their windows supersets (WHATWG)
static SUPPORTED_LABELS: &[&str] = &[
    "utf-8",
    "utf8",
    "iso-8859-1",
    "iso-8859-2",
    "iso-8859-3",
    "iso-8859-4",
    "iso-8859-5",
    "iso-8859-6",
    "iso-8859-7",
    "iso-8859-8",
    "iso-8859-9",
    "iso-8859-10",
    "iso-8859-13",
    "iso-8859-14",
    "iso-8859-15",
    "iso-8859-16",
    "windows-1250",
    "windows-1251",
    "windows-1252",
    "windows-1253",
    "windows-1254",
    "windows-1255",
    "windows-1256",
    "windows-1257",
    "windows-1258",
    "cp1250",
    "cp1251",
    "cp1252",
    "cp1253",
    "cp1254",
    "cp1255",
    "cp1256",
    "cp1257",
    "cp1258",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charset {
    encoding: &'static Encoding,
}

impl Charset {
    pub fn utf8() -> Self {
        Charset {
            encoding: encoding_rs::UTF_8,
        }
    }

    // empty name means UTF-8
    pub fn from_name(name: &str) -> Result<Self> {
        let label = name.trim().to_lowercase().replace('_', "-");
        if label.is_empty() {
            return Ok(Self::utf8());
        }
        if !SUPPORTED_LABELS.contains(&label.as_str()) {
            return Err(Error::Config(format!("unsupported encoding: {:?}", name)));
        }
        let encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| Error::Config(format!("unsupported encoding: {:?}", name)))?;
        Ok(Charset { encoding })
    }

    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    pub fn is_utf8(&self) -> bool {
        self.encoding == encoding_rs::UTF_8
    }

    pub fn decode<'a>(&self, bytes: &'a [u8], line: usize) -> Result<Cow<'a, str>> {
        let decoded = if self.is_utf8() {
            std::str::from_utf8(bytes).ok().map(Cow::Borrowed)
        } else {
            self.encoding.decode_without_bom_handling_and_without_replacement(bytes)
        };
        decoded.ok_or(Error::Decode {
            line,
            charset: self.name(),
        })
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::utf8()
    }
}
