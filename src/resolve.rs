//! Implicit tag resolution for the YAML 1.1 core schema.
//!
//! `resolve` is a pure function from (explicit tag, raw scalar text) to
//! (canonical tag, typed value). Untagged plain scalars run the rule chain
//! null → bool → int → float → str; quoted/block scalars without a tag are
//! strings; an explicit core tag re-runs its rule and fails hard when the
//! raw text does not parse.

use std::borrow::Cow;

use crate::error::Error;
use crate::parse_scalars::{is_null_literal, parse_bool, parse_float, parse_int};
use crate::tags::{self, short_tag};

/// Typed value produced by tag resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Resolved<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Raw text, for `!!str` and for any non-core tag.
    Str(&'a str),
}

/// Classify a scalar.
///
/// `implicit` is true for plain-style scalars without an explicit tag; only
/// those are subject to the implicit rule chain. The returned tag is the
/// `!!` shorthand canonical form.
pub(crate) fn resolve<'t, 'v>(
    tag: Option<&'t str>,
    value: &'v str,
    implicit: bool,
) -> Result<(Cow<'t, str>, Resolved<'v>), Error> {
    let Some(raw_tag) = tag else {
        if !implicit {
            // Quoted or block scalar: the text is the value.
            return Ok((Cow::Borrowed(tags::TAG_STR), Resolved::Str(value)));
        }
        return Ok(resolve_implicit(value));
    };

    let canonical = short_tag(raw_tag);
    let resolved = match canonical.as_ref() {
        tags::TAG_STR => Resolved::Str(value),
        tags::TAG_NULL => {
            if is_null_literal(value) {
                Resolved::Null
            } else {
                return Err(coercion(value, tags::TAG_NULL));
            }
        }
        tags::TAG_BOOL => match parse_bool(value) {
            Some(b) => Resolved::Bool(b),
            None => return Err(coercion(value, tags::TAG_BOOL)),
        },
        tags::TAG_INT => match parse_int(value) {
            Some(i) => Resolved::Int(i),
            None => return Err(coercion(value, tags::TAG_INT)),
        },
        tags::TAG_FLOAT => match parse_float(value) {
            Some(f) => Resolved::Float(f),
            None => return Err(coercion(value, tags::TAG_FLOAT)),
        },
        // !!binary, !!timestamp, application tags: keep the raw text and let
        // the decoder (or a setter hook) interpret it.
        _ => Resolved::Str(value),
    };
    Ok((canonical, resolved))
}

fn resolve_implicit(value: &str) -> (Cow<'static, str>, Resolved<'_>) {
    if is_null_literal(value) {
        return (Cow::Borrowed(tags::TAG_NULL), Resolved::Null);
    }
    if let Some(b) = parse_bool(value) {
        return (Cow::Borrowed(tags::TAG_BOOL), Resolved::Bool(b));
    }
    if let Some(i) = parse_int(value) {
        return (Cow::Borrowed(tags::TAG_INT), Resolved::Int(i));
    }
    if let Some(f) = parse_float(value) {
        return (Cow::Borrowed(tags::TAG_FLOAT), Resolved::Float(f));
    }
    (Cow::Borrowed(tags::TAG_STR), Resolved::Str(value))
}

fn coercion(raw: &str, tag: &'static str) -> Error {
    Error::TagCoercion {
        raw: raw.to_string(),
        tag,
    }
}
