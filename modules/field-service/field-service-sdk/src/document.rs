//! Document numbering types.
//!
//! A document number renders as `<PREFIX>-<YEAR>-<NNN>`, with `NNN` padded to
//! at least three digits. Each `(kind, year)` pair owns one counter, addressed
//! by its [`SequenceKey`] (`"quote:2025"`, `"invoice:2025"`).

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid document number or sequence key: '{0}'")]
pub struct InvalidDocumentNumber(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentKind {
    Quote,
    Invoice,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 2] = [DocumentKind::Quote, DocumentKind::Invoice];

    /// Human-readable number prefix.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            DocumentKind::Quote => "DEV",
            DocumentKind::Invoice => "INV",
        }
    }

    /// Name used in sequence keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Quote => "quote",
            DocumentKind::Invoice => "invoice",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.prefix() == prefix)
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one monotonic counter: document kind plus calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceKey {
    pub kind: DocumentKind,
    pub year: i32,
}

impl SequenceKey {
    #[must_use]
    pub fn new(kind: DocumentKind, year: i32) -> Self {
        Self { kind, year }
    }
}

impl fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.year)
    }
}

impl FromStr for SequenceKey {
    type Err = InvalidDocumentNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidDocumentNumber(s.to_owned());
        let (name, year) = s.split_once(':').ok_or_else(invalid)?;
        let kind = DocumentKind::from_name(name).ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        Ok(Self { kind, year })
    }
}

/// A minted document number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentNumber {
    key: SequenceKey,
    value: u64,
}

impl DocumentNumber {
    #[must_use]
    pub fn new(key: SequenceKey, value: u64) -> Self {
        Self { key, value }
    }

    #[must_use]
    pub fn key(&self) -> SequenceKey {
        self.key
    }

    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        self.key.kind
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.key.year
    }

    /// Counter value this number was minted from.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.value
    }
}

impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:03}",
            self.key.kind.prefix(),
            self.key.year,
            self.value
        )
    }
}

impl FromStr for DocumentNumber {
    type Err = InvalidDocumentNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidDocumentNumber(s.to_owned());
        let mut parts = s.splitn(3, '-');
        let (Some(prefix), Some(year), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        if value.len() < 3 || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let kind = DocumentKind::from_prefix(prefix).ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let value = value.parse::<u64>().map_err(|_| invalid())?;
        if value == 0 {
            return Err(invalid());
        }
        Ok(Self::new(SequenceKey::new(kind, year), value))
    }
}
