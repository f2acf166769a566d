//! Canonical YAML tag names and tag canonicalisation.
//!
//! The event parser may report the same tag in several textual forms
//! (shorthand `!!int`, local `!int`, the expanded `tag:yaml.org,2002:int`,
//! or the expanded form with a stray `!`). Everything downstream works with
//! the `!!` shorthand, so tags are normalised here once.
use std::borrow::Cow;

pub(crate) const TAG_STR: &str = "!!str";
pub(crate) const TAG_INT: &str = "!!int";
pub(crate) const TAG_FLOAT: &str = "!!float";
pub(crate) const TAG_BOOL: &str = "!!bool";
pub(crate) const TAG_NULL: &str = "!!null";
pub(crate) const TAG_SEQ: &str = "!!seq";
pub(crate) const TAG_MAP: &str = "!!map";
pub(crate) const TAG_BINARY: &str = "!!binary";

const YAML_DOMAIN: &str = "tag:yaml.org,2002:";

/// Normalise a raw tag string to its `!!` shorthand form.
///
/// Tags in the `tag:yaml.org,2002:` domain become `!!suffix`; anything else
/// (local `!foo` tags, application domains) is preserved verbatim.
pub(crate) fn short_tag(raw: &str) -> Cow<'_, str> {
    let raw = raw
        .strip_prefix("!<")
        .and_then(|r| r.strip_suffix('>'))
        .unwrap_or(raw);
    if let Some(suffix) = raw.strip_prefix(YAML_DOMAIN) {
        let suffix = suffix.strip_prefix('!').unwrap_or(suffix);
        return Cow::Owned(format!("!!{suffix}"));
    }
    Cow::Borrowed(raw)
}

/// True when the (already shortened) tag names the `!!binary` type.
pub(crate) fn is_binary_tag(tag: &str) -> bool {
    tag == TAG_BINARY
}
