//! Custom decode hooks.
//!
//! [`Tagged`] decodes any node as its canonical tag plus the untyped value.
//! [`Setter`] and [`Hooked`] build on it to reproduce the classic
//! `SetYAML(tag, value) -> bool` hook protocol: the hook sees what the
//! decoder resolved and may refuse it, in which case the surrounding mapping
//! entry or sequence element is dropped.

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use crate::value::Value;

/// Magic newtype name routing `Tagged::deserialize` through the node
/// deserializer (which synthesizes a `{ tag, value }` view for it).
pub(crate) const TAGGED_NEWTYPE: &str = "__yaml_tagged";

/// Marker message for a hook that refused its value; recognised as a
/// droppable-slot failure by the decode retry loop.
pub(crate) const SETTER_REFUSED: &str = "value refused by set_yaml hook";

/// A decoded node paired with its canonical tag.
///
/// The tag is `!!map` for mappings, `!!seq` for sequences, and the resolved
/// scalar tag otherwise (`!!str`, `!!int`, ..., or a preserved application
/// tag such as `!!foo`).
///
/// ```rust
/// use serde_yaml11::Tagged;
///
/// let t: Tagged = serde_yaml11::from_str("!!foo 'BAR!'").unwrap();
/// assert_eq!(t.tag, "!!foo");
/// assert_eq!(t.value.as_str(), Some("BAR!"));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Tagged {
    pub tag: String,
    pub value: Value,
}

impl<'de> Deserialize<'de> for Tagged {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TaggedVisitor;

        impl<'de> Visitor<'de> for TaggedVisitor {
            type Value = Tagged;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a tag-aware newtype wrapper")
            }

            fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Tagged, D::Error>
            where
                D: Deserializer<'de>,
            {
                #[derive(Deserialize)]
                struct Repr {
                    tag: String,
                    value: Value,
                }

                let repr = Repr::deserialize(deserializer)?;
                Ok(Tagged {
                    tag: repr.tag,
                    value: repr.value,
                })
            }
        }

        deserializer.deserialize_newtype_struct(TAGGED_NEWTYPE, TaggedVisitor)
    }
}

/// Hook invoked with the canonical tag and untyped value of a node.
///
/// Returning `false` refuses the value: the mapping entry (or sequence
/// element) holding it is omitted from the decoded result.
pub trait Setter {
    fn set_yaml(&mut self, tag: &str, value: Value) -> bool;
}

/// Decode target routing every node through a [`Setter`] implementation.
///
/// ```rust
/// use serde_yaml11::{Hooked, Setter, Value};
///
/// struct Raw {
///     tag: String,
///     value: Value,
/// }
///
/// impl Default for Raw {
///     fn default() -> Self {
///         Raw { tag: String::new(), value: Value::Null }
///     }
/// }
///
/// impl Setter for Raw {
///     fn set_yaml(&mut self, tag: &str, value: Value) -> bool {
///         self.tag = tag.to_string();
///         self.value = value;
///         true
///     }
/// }
///
/// let raw: Hooked<Raw> = serde_yaml11::from_str("[1, A]").unwrap();
/// assert_eq!(raw.0.tag, "!!seq");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hooked<T>(pub T);

impl<T> Hooked<T> {
    /// Consume the wrapper and return the hook target.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<'de, T> Deserialize<'de> for Hooked<T>
where
    T: Setter + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tagged = Tagged::deserialize(deserializer)?;
        let mut inner = T::default();
        if inner.set_yaml(&tagged.tag, tagged.value) {
            Ok(Hooked(inner))
        } else {
            Err(de::Error::custom(SETTER_REFUSED))
        }
    }
}
