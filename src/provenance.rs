//! Provenance types.
//!
//! Every constraint carries the citation it was extracted from. Without it
//! an UNSAT core is just a list of ids; with it the core becomes a pair of
//! quotes a reviewer can check against the record.

use serde::{Deserialize, Serialize};

/// Default bound on stored quotes, in characters.
pub const MAX_QUOTE_LEN: usize = 500;

/// Citation backing a constraint.
///
/// # Examples
///
/// ```
/// use lexcheck::Provenance;
///
/// let p = Provenance::new("doc-7", "Smith FD-302")
///     .with_doc_type("FD-302")
///     .with_quote("Smith never met Jones.");
/// assert_eq!(p.doc_title, "Smith FD-302");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Provenance {
    /// Identifier of the source document.
    #[serde(default)]
    pub doc_id: String,

    /// Human-readable document title.
    #[serde(default)]
    pub doc_title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Quoted excerpt, truncated to a bounded length.
    #[serde(default)]
    pub quote: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court: Option<String>,

    /// Free-form date string as it appears in the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
}

impl Provenance {
    /// Creates a provenance record for a document.
    #[must_use]
    pub fn new(doc_id: impl Into<String>, doc_title: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            doc_title: doc_title.into(),
            ..Self::default()
        }
    }

    /// Sets the quote, truncated to [`MAX_QUOTE_LEN`] characters.
    #[must_use]
    pub fn with_quote(mut self, quote: &str) -> Self {
        self.quote = truncate_chars(quote, MAX_QUOTE_LEN);
        self
    }

    /// Sets the court.
    #[must_use]
    pub fn with_court(mut self, court: impl Into<String>) -> Self {
        self.court = Some(court.into());
        self
    }

    /// Sets the date.
    #[must_use]
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Sets the document type.
    #[must_use]
    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    /// Sets paragraph and page.
    #[must_use]
    pub fn with_location(mut self, paragraph: Option<u32>, page: Option<u32>) -> Self {
        self.paragraph = paragraph;
        self.page = page;
        self
    }

    /// Returns the descriptor the authority model classifies.
    #[must_use]
    pub fn descriptor(&self) -> SourceDescriptor {
        SourceDescriptor::from(self)
    }
}

/// The four fields authority detection looks at. All default to empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceDescriptor {
    #[serde(default)]
    pub doc_title: String,
    #[serde(default)]
    pub court: String,
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub doc_type: String,
}

impl SourceDescriptor {
    /// Descriptor with only the court set.
    #[must_use]
    pub fn court(court: impl Into<String>) -> Self {
        Self {
            court: court.into(),
            ..Self::default()
        }
    }

    /// Descriptor with only the document type set.
    #[must_use]
    pub fn doc_type(doc_type: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            ..Self::default()
        }
    }
}

impl From<&Provenance> for SourceDescriptor {
    fn from(p: &Provenance) -> Self {
        Self {
            doc_title: p.doc_title.clone(),
            court: p.court.clone().unwrap_or_default(),
            quote: p.quote.clone(),
            doc_type: p.doc_type.clone().unwrap_or_default(),
        }
    }
}

/// Optional per-document context passed alongside findings.
///
/// Findings often cite a document without repeating its court or date; a
/// matching source document fills those gaps.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceDocument {
    #[serde(default)]
    pub doc_id: String,
    #[serde(default, alias = "title")]
    pub doc_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
}

impl SourceDocument {
    /// True if this document is the one `provenance` cites.
    #[must_use]
    pub fn describes(&self, provenance: &Provenance) -> bool {
        if !self.doc_id.is_empty() && !provenance.doc_id.is_empty() {
            return self.doc_id == provenance.doc_id;
        }
        !self.doc_title.is_empty() && self.doc_title == provenance.doc_title
    }

    /// Fills fields `provenance` leaves unset. Never overwrites.
    pub fn enrich(&self, provenance: &mut Provenance) {
        if provenance.court.is_none() {
            provenance.court.clone_from(&self.court);
        }
        if provenance.date.is_none() {
            provenance.date.clone_from(&self.date);
        }
        if provenance.doc_type.is_none() {
            provenance.doc_type.clone_from(&self.doc_type);
        }
    }
}

/// Truncates to at most `max` characters on a char boundary.
#[must_use]
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
