//! Room naming: how template rooms and cloned rooms are recognized.
//!
//! Nothing is persisted about which clone came from which template.
//! Instead, family is encoded in the channel name itself:
//!
//! ```text
//! "⌛ General"  ──(clone)──→  "♻: General"
//!  ^ template marker            ^ clone marker
//! ```
//!
//! Every room whose name starts with [`CLONE_MARKER`] is treated as
//! controller-owned and becomes eligible for reaping once empty.

/// Marks a voice channel as a clone template (U+231B HOURGLASS).
pub const TEMPLATE_MARKER: &str = "\u{231B}";

/// Marks a voice channel as created by the controller
/// (U+267B BLACK UNIVERSAL RECYCLING SYMBOL).
pub const CLONE_MARKER: &str = "\u{267B}";

/// Returns `true` if `name` designates a template room.
pub fn is_template_name(name: &str) -> bool {
    name.starts_with(TEMPLATE_MARKER)
}

/// Returns `true` if `name` designates a cloned room.
pub fn is_clone_name(name: &str) -> bool {
    name.starts_with(CLONE_MARKER)
}

/// Derives the name of a cloned room from its template's name.
///
/// Every occurrence of the template marker is removed, then the clone
/// marker plus `": "` is prepended. A single space directly after the
/// removed leading marker is its separator and is dropped; any further
/// whitespace belongs to the name.
pub fn clone_name(template_name: &str) -> String {
    let stripped = template_name.replace(TEMPLATE_MARKER, "");
    let name = stripped.strip_prefix(' ').unwrap_or(stripped.as_str());
    format!("{CLONE_MARKER}: {name}")
}
