use serde::{Deserialize, Serialize};

/// Duplicate key handling policy for mappings.
///
/// Keys are compared by their explicit tag and raw scalar text (containers
/// structurally), before any target type is known: `1` and `'1'` count as
/// the same key, while `!!int 1` and `!!str 1` stay distinct.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum DuplicateKeyPolicy {
    /// Error out on encountering a duplicate key.
    Error,
    /// First key wins: later duplicate pairs are dropped.
    FirstWins,
    /// Last key wins: a later duplicate pair replaces the earlier value.
    LastWins,
}

/// Limits applied to alias expansion.
///
/// The cycle guard already rejects self-referential anchors, but nested
/// non-cyclic aliases can still multiply the amount of decoded data
/// (`a: &a [..]`, `b: &b [*a, *a]`, ...). This budget caps the total.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AliasLimits {
    /// Maximum number of alias dereferences across one decode call.
    pub max_expansions: usize,
}

impl Default for AliasLimits {
    fn default() -> Self {
        Self {
            max_expansions: 100_000,
        }
    }
}

/// Decoder configuration.
///
/// Example: tighten the alias budget and reject duplicate keys.
///
/// ```rust
/// use std::collections::HashMap;
///
/// use serde_yaml11::{AliasLimits, DuplicateKeyPolicy, Options};
///
/// let options = Options {
///     duplicate_keys: DuplicateKeyPolicy::Error,
///     alias_limits: AliasLimits { max_expansions: 1000 },
/// };
/// let m: HashMap<String, i64> =
///     serde_yaml11::from_str_with_options("a: 1\nb: 2\n", options).unwrap();
/// assert_eq!(m["b"], 2);
/// ```
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Options {
    /// Policy for duplicate mapping keys. YAML 1.1 decoders traditionally
    /// let the last occurrence win, which is the default here.
    pub duplicate_keys: DuplicateKeyPolicy,
    /// Limits for alias expansion.
    pub alias_limits: AliasLimits,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            duplicate_keys: DuplicateKeyPolicy::LastWins,
            alias_limits: AliasLimits::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = Options::default();
        assert!(matches!(opts.duplicate_keys, DuplicateKeyPolicy::LastWins));
        assert_eq!(opts.alias_limits.max_expansions, 100_000);
    }
}
