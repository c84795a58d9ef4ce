//! Options for packing and extracting containers

use super::alignment::{PaddingRule, alignment_for};

/// Options for [`GfsWriter`](super::GfsWriter)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GfsWriteOptions {
    /// Align every payload to 4096 bytes instead of packing them tightly
    pub aligned: bool,
    /// Padding formula used for the header and between payloads
    pub padding_rule: PaddingRule,
    /// Sort entries by relative path instead of keeping directory-walk order
    pub sort_entries: bool,
}

impl Default for GfsWriteOptions {
    fn default() -> Self {
        Self {
            aligned: false,
            padding_rule: PaddingRule::Canonical,
            sort_entries: true,
        }
    }
}

impl GfsWriteOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_aligned(mut self, aligned: bool) -> Self {
        self.aligned = aligned;
        self
    }

    #[must_use]
    pub fn with_padding_rule(mut self, rule: PaddingRule) -> Self {
        self.padding_rule = rule;
        self
    }

    #[must_use]
    pub fn with_sort_entries(mut self, sort: bool) -> Self {
        self.sort_entries = sort;
        self
    }

    /// Alignment written for every entry.
    #[must_use]
    pub fn alignment(&self) -> u32 {
        alignment_for(self.aligned)
    }
}

/// Options for [`GfsOperations::extract_with_options`](super::GfsOperations::extract_with_options)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfsExtractOptions {
    /// Only extract entries whose path or file name matches this glob (`*`, `?`)
    pub filter: Option<String>,
    /// Replace files that already exist in the destination
    pub overwrite: bool,
}

impl Default for GfsExtractOptions {
    fn default() -> Self {
        Self {
            filter: None,
            overwrite: true,
        }
    }
}

impl GfsExtractOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}
