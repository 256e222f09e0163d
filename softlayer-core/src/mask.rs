//! Object-mask normalization.
//!
//! The API accepts either a single bare property name (`id`) or a fully
//! enveloped mask expression (`mask[id,hostname,datacenter[name]]`). Anything
//! else has to be wrapped, otherwise a top-level list or a nested reference is
//! parsed as several directives instead of one mask.

/// Envelope token every composite mask must start with.
pub const MASK_ENVELOPE: &str = "mask[";

/// Normalize a user supplied object mask.
///
/// Wraps `mask` in `mask[...]` when it is not already enveloped and contains
/// either a nested property (`[`) or a list separator (`,`). Bare property
/// names and the empty string are returned unchanged.
///
/// The function is total and idempotent:
///
/// ```
/// use softlayer_core::normalize_mask;
///
/// assert_eq!(normalize_mask("a[b],c"), "mask[a[b],c]");
/// assert_eq!(normalize_mask("mask[a[b],c]"), "mask[a[b],c]");
/// assert_eq!(normalize_mask("hostname"), "hostname");
/// ```
pub fn normalize_mask(mask: &str) -> String {
    if needs_envelope(mask) {
        format!("{MASK_ENVELOPE}{mask}]")
    } else {
        mask.to_string()
    }
}

/// Whether [`normalize_mask`] would wrap `mask`.
pub fn needs_envelope(mask: &str) -> bool {
    !mask.starts_with(MASK_ENVELOPE) && (mask.contains('[') || mask.contains(','))
}
