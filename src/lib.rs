//! YAML 1.1 decoding into serde targets.
//!
//! The input is parsed into a document tree first (one document per call;
//! anchors are recorded in a per-document table), untagged plain scalars are
//! classified by the YAML 1.1 implicit rules (`yes` is a boolean, `0x1F` an
//! integer, `.inf` a float), and the tree is then decoded into the caller's
//! type. Aliases expand during decoding, with cycle detection and an
//! expansion budget.
//!
//! Two behaviours set this decoder apart from stricter YAML libraries:
//! - String targets always receive the raw scalar text, so `v: "on"` and
//!   `v: on` both decode into a `String` field unchanged.
//! - A sequence element or mapping entry whose value does not fit the
//!   target type is dropped rather than failing the decode: `[A, 1, C]`
//!   into `Vec<i64>` yields `[1]`.

use serde::de::DeserializeOwned;

pub use crate::error::{Error, Location};
pub use crate::options::{AliasLimits, DuplicateKeyPolicy, Options};
pub use crate::setter::{Hooked, Setter, Tagged};
pub use crate::value::Value;

mod base64;
mod de;
mod error;
mod loader;
pub mod options;
mod parse_scalars;
mod resolve;
mod setter;
mod tags;
mod value;

/// Deserialize any `T: serde::de::DeserializeOwned` from a YAML string.
///
/// Only the first document of the input is consumed; empty input decodes as
/// YAML null.
///
/// ```rust
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct Config {
///     name: String,
///     enabled: bool,
///     retries: i32,
/// }
///
/// let yaml = "
/// name: My Application
/// enabled: yes
/// retries: 5
/// ";
///
/// let cfg: Config = serde_yaml11::from_str(yaml).unwrap();
/// assert!(cfg.enabled);
/// assert_eq!(cfg.retries, 5);
/// ```
pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T, Error> {
    from_str_with_options(input, Options::default())
}

/// Deserialize a YAML string with configurable [`Options`].
///
/// ```rust
/// use std::collections::HashMap;
///
/// use serde_yaml11::{DuplicateKeyPolicy, Options};
///
/// let options = Options {
///     duplicate_keys: DuplicateKeyPolicy::FirstWins,
///     ..Options::default()
/// };
/// let m: HashMap<String, i64> =
///     serde_yaml11::from_str_with_options("a: 1\na: 2\n", options).unwrap();
/// assert_eq!(m["a"], 1);
/// ```
pub fn from_str_with_options<T: DeserializeOwned>(
    input: &str,
    options: Options,
) -> Result<T, Error> {
    let doc = loader::load(input)?;
    de::decode_document(&doc, &options)
}

/// Deserialize from a UTF-8 byte slice.
///
/// Equivalent to [`from_str`] after validating the bytes are UTF-8.
pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    from_slice_with_options(bytes, Options::default())
}

/// Deserialize from a UTF-8 byte slice with configurable [`Options`].
pub fn from_slice_with_options<T: DeserializeOwned>(
    bytes: &[u8],
    options: Options,
) -> Result<T, Error> {
    let input =
        std::str::from_utf8(bytes).map_err(|_| Error::msg("input is not valid UTF-8"))?;
    from_str_with_options(input, options)
}
