//! Per-call options.
//!
//! This module provides [`Options`], the value bag every call carries: the
//! object id the call targets, an object mask, a filter and a result window.

use softlayer_core::normalize_mask;

/// Options for a single call.
///
/// Every field is optional and "unset" is distinct from zero: a limit of
/// `Some(0)` is sent to the API, `None` is not.
///
/// # Example
///
/// ```
/// use softlayer_session::Options;
///
/// let options = Options::new()
///     .id(1234)
///     .mask("id,hostname,datacenter[name]")
///     .limit(50);
///
/// assert_eq!(options.get_mask(), Some("mask[id,hostname,datacenter[name]]"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub(crate) id: Option<i64>,
    pub(crate) mask: Option<String>,
    pub(crate) filter: Option<String>,
    pub(crate) limit: Option<u32>,
    pub(crate) offset: Option<u32>,
}

impl Options {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Target a single object instance.
    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the object mask.
    ///
    /// The mask is normalized with [`normalize_mask`], so `"a,b"` is stored as
    /// `"mask[a,b]"`.
    pub fn mask(mut self, mask: impl AsRef<str>) -> Self {
        self.mask = Some(normalize_mask(mask.as_ref()));
        self
    }

    /// Set the object filter.
    ///
    /// The filter is passed through to the API untouched.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Limit the number of results returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `offset` results.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn get_id(&self) -> Option<i64> {
        self.id
    }

    pub fn get_mask(&self) -> Option<&str> {
        self.mask.as_deref()
    }

    pub fn get_filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn get_limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn get_offset(&self) -> Option<u32> {
        self.offset
    }
}
