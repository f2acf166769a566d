//! Type-directed decoder: walks the document tree against a serde target.
//!
//! Supported targets:
//! - Scalars: string (raw text, always), bool, integers, floats, char.
//! - Bytes: `!!binary` (base64) or sequences of 0..=255.
//! - Arbitrarily nested sequences and mappings, serde derive structs.
//! - Externally-tagged enums: `Variant` or `{ Variant: value }`.
//! - `Option<T>` (YAML null forms map to `None`).
//! - [`crate::Tagged`] / [`crate::Hooked`] via the `__yaml_tagged` protocol.
//!
//! Aliases resolve lazily by anchor-name lookup with a cycle guard and an
//! expansion budget. Type and overflow mismatches do not fail the decode:
//! the offending sequence element or mapping entry is dropped instead.
//!
//! Fail-silent mechanics: serde seeds are single-use, so a failed entry
//! cannot be skipped in place. The decoder instead tracks the tree path of
//! the slot being decoded; when a recoverable error surfaces, the entry
//! point retries the decode with that slot added to a skip set. Each retry
//! learns at least one new slot, so the loop terminates.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use ahash::RandomState;
use serde::de::{self, DeserializeOwned, Deserializer as _, IntoDeserializer, Visitor};

use crate::base64::decode_base64;
use crate::error::{Error, Location};
use crate::loader::{Document, Node, NodeId, NodeKind};
use crate::options::{DuplicateKeyPolicy, Options};
use crate::parse_scalars::is_null_literal;
use crate::resolve::{resolve, Resolved};
use crate::setter::TAGGED_NEWTYPE;
use crate::tags::{self, short_tag};

type FastHashMap<K, V> = HashMap<K, V, RandomState>;
type FastHashSet<T> = HashSet<T, RandomState>;

/// Path of a slot in the tree: (container node, child slot index) pairs from
/// the root down. For mappings the slot index is the pair index, shared by
/// key and value, so skipping a slot drops the whole entry.
type SlotPath = Vec<(NodeId, usize)>;

/// Decode the document root into `T`, retrying with a growing skip set
/// until every recoverable failure has been turned into an omitted slot.
pub(crate) fn decode_document<'de, T>(doc: &Document<'de>, options: &Options) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    let mut skipped: FastHashSet<SlotPath> = FastHashSet::default();
    loop {
        let state = DecodeState::new(doc, options, &skipped);
        let result = T::deserialize(NodeDeserializer {
            state: &state,
            node: doc.root(),
        });
        match result {
            Ok(value) => return Ok(value),
            Err(err) => {
                if err.is_fatal() {
                    return Err(err);
                }
                let Some(slot) = state.failed_slot.borrow_mut().take() else {
                    return Err(err);
                };
                if !skipped.insert(slot) {
                    // No progress: the same slot failed twice.
                    return Err(err);
                }
            }
        }
    }
}

/// Shared state for one decode attempt.
struct DecodeState<'de, 'a> {
    doc: &'a Document<'de>,
    dup_policy: DuplicateKeyPolicy,
    max_expansions: usize,
    /// Slots learned to be undecodable in earlier attempts.
    skipped: &'a FastHashSet<SlotPath>,
    /// Path of the container slot currently being decoded.
    path: RefCell<SlotPath>,
    /// First recoverable failure observed during this attempt.
    failed_slot: RefCell<Option<SlotPath>>,
    /// Anchor names currently being expanded (cycle guard).
    expanding: RefCell<FastHashSet<String>>,
    /// Total alias dereferences so far.
    expansions: Cell<usize>,
}

impl<'de, 'a> DecodeState<'de, 'a> {
    fn new(doc: &'a Document<'de>, options: &Options, skipped: &'a FastHashSet<SlotPath>) -> Self {
        Self {
            doc,
            dup_policy: options.duplicate_keys,
            max_expansions: options.alias_limits.max_expansions,
            skipped,
            path: RefCell::new(Vec::new()),
            failed_slot: RefCell::new(None),
            expanding: RefCell::new(FastHashSet::default()),
            expansions: Cell::new(0),
        }
    }

    /// Record the current path as the failing slot, once per attempt.
    /// A failure at the root has no surrounding slot to drop.
    fn note_failure(&self) {
        let mut failed = self.failed_slot.borrow_mut();
        if failed.is_none() {
            let path = self.path.borrow();
            if !path.is_empty() {
                *failed = Some(path.clone());
            }
        }
    }

    fn slot_skipped(&self, container: NodeId, index: usize) -> bool {
        if self.skipped.is_empty() {
            return false;
        }
        let path = self.path.borrow();
        let mut candidate = Vec::with_capacity(path.len() + 1);
        candidate.extend_from_slice(&path);
        candidate.push((container, index));
        self.skipped.contains(&candidate)
    }

    /// Canonical fingerprint of a node for duplicate-key collapse.
    ///
    /// Scalar keys compare by explicit tag plus raw text, not by the
    /// implicit resolution, so `1` and `'1'` count as the same key (both
    /// decode to the text `1` for string-keyed targets) while `!!int 1`
    /// and `!!str 1` stay distinct.
    fn fingerprint(&self, id: NodeId, depth: usize) -> Fingerprint {
        if depth > 64 {
            return Fingerprint::Truncated;
        }
        let node = self.doc.node(id);
        match node.kind {
            NodeKind::Scalar => Fingerprint::Scalar {
                tag: node
                    .tag
                    .as_deref()
                    .map(|t| short_tag(t).into_owned())
                    .unwrap_or_default(),
                value: node.value.to_string(),
            },
            NodeKind::Sequence => Fingerprint::Sequence(
                node.children
                    .iter()
                    .map(|&child| self.fingerprint(child, depth + 1))
                    .collect(),
            ),
            NodeKind::Mapping => Fingerprint::Mapping(
                node.children
                    .chunks_exact(2)
                    .map(|kv| {
                        (
                            self.fingerprint(kv[0], depth + 1),
                            self.fingerprint(kv[1], depth + 1),
                        )
                    })
                    .collect(),
            ),
            NodeKind::Alias => match self.doc.anchor(&node.value) {
                Some(target) => self.fingerprint(target, depth + 1),
                None => Fingerprint::Scalar {
                    tag: String::new(),
                    value: node.value.to_string(),
                },
            },
        }
    }
}

/// Canonical fingerprint of a mapping key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Fingerprint {
    Scalar { tag: String, value: String },
    Sequence(Vec<Fingerprint>),
    Mapping(Vec<(Fingerprint, Fingerprint)>),
    /// Nesting beyond the comparison depth cap.
    Truncated,
}

impl Fingerprint {
    /// The key text, when the key is an untagged or string-tagged scalar.
    fn stringy(&self) -> Option<String> {
        match self {
            Fingerprint::Scalar { tag, value } if tag.is_empty() || tag == tags::TAG_STR => {
                Some(value.clone())
            }
            _ => None,
        }
    }
}

/// Removes the anchor name from the expansion set when an alias has been
/// fully decoded.
struct ExpansionGuard<'de, 'a> {
    state: &'a DecodeState<'de, 'a>,
    name: String,
}

impl Drop for ExpansionGuard<'_, '_> {
    fn drop(&mut self) {
        self.state.expanding.borrow_mut().remove(&self.name);
    }
}

/// Decode one child slot, recording its path for skip bookkeeping and
/// failure attribution.
fn decode_slot<'de, 'a, S>(
    state: &'a DecodeState<'de, 'a>,
    container: NodeId,
    index: usize,
    child: NodeId,
    seed: S,
) -> Result<S::Value, Error>
where
    S: de::DeserializeSeed<'de>,
{
    state.path.borrow_mut().push((container, index));
    let result = seed.deserialize(NodeDeserializer { state, node: child });
    if let Err(err) = &result {
        if !err.is_fatal() {
            state.note_failure();
        }
    }
    state.path.borrow_mut().pop();
    result
}

/// Serde deserializer over one tree node.
#[derive(Clone, Copy)]
struct NodeDeserializer<'de, 'a> {
    state: &'a DecodeState<'de, 'a>,
    node: NodeId,
}

impl<'de, 'a> NodeDeserializer<'de, 'a> {
    fn node(&self) -> &'a Node<'de> {
        self.state.doc.node(self.node)
    }

    /// Follow alias nodes to their anchored target.
    ///
    /// Checks the cycle guard and the expansion budget; the returned guards
    /// keep the traversed names marked as in-flight until the caller is done
    /// with the target node.
    fn dealias(self) -> Result<(Self, Vec<ExpansionGuard<'de, 'a>>), Error> {
        let mut current = self;
        let mut guards = Vec::new();
        loop {
            let node = current.node();
            if node.kind != NodeKind::Alias {
                return Ok((current, guards));
            }
            let name = node.value.as_ref();
            let Some(target) = self.state.doc.anchor(name) else {
                return Err(Error::UnknownAnchor {
                    name: name.to_string(),
                });
            };
            if self.state.expanding.borrow().contains(name) {
                return Err(Error::RecursiveAnchor {
                    name: name.to_string(),
                });
            }
            let count = self.state.expansions.get() + 1;
            if count > self.state.max_expansions {
                return Err(Error::AliasLimit {
                    limit: self.state.max_expansions,
                });
            }
            self.state.expansions.set(count);
            self.state.expanding.borrow_mut().insert(name.to_string());
            guards.push(ExpansionGuard {
                state: self.state,
                name: name.to_string(),
            });
            current = NodeDeserializer {
                state: self.state,
                node: target,
            };
        }
    }

    fn scalar_node(&self) -> Result<&'a Node<'de>, Error> {
        let node = self.node();
        if node.kind == NodeKind::Scalar {
            Ok(node)
        } else {
            Err(Error::mismatch("a scalar", node.location))
        }
    }

    fn resolved(node: &'a Node<'de>) -> Result<(Cow<'a, str>, Resolved<'a>), Error> {
        resolve(node.tag.as_deref(), node.value.as_ref(), node.implicit)
    }

    /// Integer dispatch shared by all widths; anything that does not resolve
    /// to an in-range integer is a mismatch, not a failure.
    fn integer<T: TryFrom<i64>>(node: &'a Node<'de>) -> Result<T, Error> {
        match Self::resolved(node)?.1 {
            Resolved::Int(i) => {
                T::try_from(i).map_err(|_| Error::mismatch("an integer in range", node.location))
            }
            _ => Err(Error::mismatch("an integer", node.location)),
        }
    }

    /// Canonical tag for the `__yaml_tagged` protocol.
    fn canonical_tag(&self, node: &'a Node<'de>) -> Result<String, Error> {
        match node.kind {
            NodeKind::Mapping => Ok(tags::TAG_MAP.to_string()),
            NodeKind::Sequence => Ok(tags::TAG_SEQ.to_string()),
            NodeKind::Scalar => Self::resolved(node).map(|(tag, _)| tag.into_owned()),
            NodeKind::Alias => Err(Error::mismatch("a resolved node", node.location)),
        }
    }
}

/// True when the scalar reads as YAML null (explicit `!!null` tag, or a
/// plain implicit null literal).
fn node_is_null(node: &Node<'_>) -> bool {
    if node.kind != NodeKind::Scalar {
        return false;
    }
    match &node.tag {
        Some(tag) => short_tag(tag).as_ref() == tags::TAG_NULL,
        None => node.implicit && is_null_literal(&node.value),
    }
}

fn node_binary_tag(node: &Node<'_>) -> bool {
    match &node.tag {
        Some(tag) => tags::is_binary_tag(short_tag(tag).as_ref()),
        None => false,
    }
}

impl<'de, 'a> de::Deserializer<'de> for NodeDeserializer<'de, 'a> {
    type Error = Error;

    /// Typeless entry point: the resolved tag decides the visit.
    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        let node = de.node();
        match node.kind {
            NodeKind::Scalar => match Self::resolved(node)?.1 {
                Resolved::Null => visitor.visit_unit(),
                Resolved::Bool(b) => visitor.visit_bool(b),
                Resolved::Int(i) => visitor.visit_i64(i),
                Resolved::Float(f) => visitor.visit_f64(f),
                Resolved::Str(_) => match &node.value {
                    Cow::Borrowed(s) => visitor.visit_borrowed_str(*s),
                    Cow::Owned(s) => visitor.visit_str(s),
                },
            },
            NodeKind::Sequence => de.deserialize_seq(visitor),
            NodeKind::Mapping => de.deserialize_map(visitor),
            NodeKind::Alias => Err(Error::mismatch("a resolved node", node.location)),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        let node = de.scalar_node()?;
        match Self::resolved(node)?.1 {
            Resolved::Bool(b) => visitor.visit_bool(b),
            _ => Err(Error::mismatch("a boolean", node.location)),
        }
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        visitor.visit_i8(Self::integer(de.scalar_node()?)?)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        visitor.visit_i16(Self::integer(de.scalar_node()?)?)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        visitor.visit_i32(Self::integer(de.scalar_node()?)?)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        visitor.visit_i64(Self::integer(de.scalar_node()?)?)
    }

    fn deserialize_i128<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        visitor.visit_i128(Self::integer(de.scalar_node()?)?)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        visitor.visit_u8(Self::integer(de.scalar_node()?)?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        visitor.visit_u16(Self::integer(de.scalar_node()?)?)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        visitor.visit_u32(Self::integer(de.scalar_node()?)?)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        visitor.visit_u64(Self::integer(de.scalar_node()?)?)
    }

    fn deserialize_u128<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        visitor.visit_u128(Self::integer(de.scalar_node()?)?)
    }

    /// Floats accept only a float resolution; integers are not promoted.
    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        let node = de.scalar_node()?;
        match Self::resolved(node)?.1 {
            Resolved::Float(f) => visitor.visit_f32(f as f32),
            _ => Err(Error::mismatch("a float", node.location)),
        }
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        let node = de.scalar_node()?;
        match Self::resolved(node)?.1 {
            Resolved::Float(f) => visitor.visit_f64(f),
            _ => Err(Error::mismatch("a float", node.location)),
        }
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        let node = de.scalar_node()?;
        let mut chars = node.value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(Error::mismatch("a single character", node.location)),
        }
    }

    /// String targets always receive the raw scalar text, whatever the
    /// implicit resolution says. The resolver still runs so an impossible
    /// explicit tag fails the decode.
    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        let node = de.scalar_node()?;
        if node_binary_tag(node) {
            let data = decode_base64(&node.value)?;
            let text = String::from_utf8(data)
                .map_err(|_| Error::mismatch("UTF-8 text in !!binary", node.location))?;
            return visitor.visit_string(text);
        }
        Self::resolved(node)?;
        match &node.value {
            Cow::Borrowed(s) => visitor.visit_borrowed_str(*s),
            Cow::Owned(s) => visitor.visit_str(s),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    /// Bytes come from a `!!binary` scalar or a sequence of 0..=255.
    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        let node = de.node();
        match node.kind {
            NodeKind::Scalar if node_binary_tag(node) => {
                visitor.visit_byte_buf(decode_base64(&node.value)?)
            }
            NodeKind::Sequence => {
                let mut out = Vec::with_capacity(node.children.len());
                for &child in &node.children {
                    let (element, _guards) = NodeDeserializer {
                        state: de.state,
                        node: child,
                    }
                    .dealias()?;
                    let element = element.scalar_node()?;
                    out.push(Self::integer::<u8>(element)?);
                }
                visitor.visit_byte_buf(out)
            }
            _ => Err(Error::mismatch(
                "a !!binary scalar or a sequence of bytes",
                node.location,
            )),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        if node_is_null(de.node()) {
            visitor.visit_none()
        } else {
            visitor.visit_some(de)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        let node = de.node();
        if node_is_null(node) {
            visitor.visit_unit()
        } else {
            Err(Error::mismatch("null", node.location))
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        let node = de.node();
        // An empty mapping also reads as a unit struct.
        if node.kind == NodeKind::Mapping && node.children.is_empty() {
            return visitor.visit_unit();
        }
        de.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        if name == TAGGED_NEWTYPE {
            let (de, _guards) = self.dealias()?;
            let tag = de.canonical_tag(de.node())?;
            return visitor.visit_newtype_struct(TaggedDeser { de, tag, state: 0 });
        }
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        let node = de.node();
        match node.kind {
            NodeKind::Sequence => visitor.visit_seq(SeqChildren {
                state: de.state,
                container: de.node,
                children: &node.children,
                index: 0,
            }),
            NodeKind::Scalar if node_is_null(node) => visitor.visit_seq(EmptySeq),
            NodeKind::Scalar if node_binary_tag(node) => {
                let data = decode_base64(&node.value)?;
                visitor.visit_seq(ByteSeq { data, index: 0 })
            }
            _ => Err(Error::mismatch("a sequence", node.location)),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        let node = de.node();
        match node.kind {
            NodeKind::Mapping => {
                let pairs = mapping_pairs(de.state, node)?;
                visitor.visit_map(MapPairs {
                    state: de.state,
                    container: de.node,
                    pairs,
                    cursor: 0,
                    pending: None,
                })
            }
            // A null value in mapping position reads as an empty mapping, so
            // `key:` with no value decodes structs and maps to their empty
            // shape.
            NodeKind::Scalar if node_is_null(node) => visitor.visit_map(EmptyMap),
            _ => Err(Error::mismatch("a mapping", node.location)),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_map(visitor)
    }

    /// Externally-tagged enums: `Variant` or `{ Variant: value }`.
    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let (de, _guards) = self.dealias()?;
        let node = de.node();
        match node.kind {
            NodeKind::Scalar => visitor.visit_enum(EnumDeser {
                state: de.state,
                variant: node.value.to_string(),
                payload: None,
                location: node.location,
            }),
            NodeKind::Mapping => {
                if node.children.len() != 2 {
                    return Err(Error::mismatch(
                        "a single-entry mapping for an enum variant",
                        node.location,
                    ));
                }
                let key = de.state.doc.node(node.children[0]);
                if key.kind != NodeKind::Scalar {
                    return Err(Error::mismatch("a string variant name", key.location));
                }
                visitor.visit_enum(EnumDeser {
                    state: de.state,
                    variant: key.value.to_string(),
                    payload: Some(node.children[1]),
                    location: key.location,
                })
            }
            _ => Err(Error::mismatch(
                "a scalar or single-entry mapping for an enum",
                node.location,
            )),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_any(visitor)
    }
}

/// `SeqAccess` over a sequence node's children.
struct SeqChildren<'de, 'a> {
    state: &'a DecodeState<'de, 'a>,
    container: NodeId,
    children: &'a [NodeId],
    index: usize,
}

impl<'de, 'a> de::SeqAccess<'de> for SeqChildren<'de, 'a> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Error>
    where
        T: de::DeserializeSeed<'de>,
    {
        while self.index < self.children.len()
            && self.state.slot_skipped(self.container, self.index)
        {
            self.index += 1;
        }
        if self.index >= self.children.len() {
            return Ok(None);
        }
        let index = self.index;
        self.index += 1;
        decode_slot(self.state, self.container, index, self.children[index], seed).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.children.len() - self.index)
    }
}

struct EmptySeq;

impl<'de> de::SeqAccess<'de> for EmptySeq {
    type Error = Error;

    fn next_element_seed<T>(&mut self, _seed: T) -> Result<Option<T::Value>, Error>
    where
        T: de::DeserializeSeed<'de>,
    {
        Ok(None)
    }
}

/// `SeqAccess` over the bytes of a decoded `!!binary` payload.
struct ByteSeq {
    data: Vec<u8>,
    index: usize,
}

impl<'de> de::SeqAccess<'de> for ByteSeq {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Error>
    where
        T: de::DeserializeSeed<'de>,
    {
        if self.index >= self.data.len() {
            return Ok(None);
        }
        let byte = self.data[self.index];
        self.index += 1;
        seed.deserialize(byte.into_deserializer()).map(Some)
    }
}

struct EmptyMap;

impl<'de> de::MapAccess<'de> for EmptyMap {
    type Error = Error;

    fn next_key_seed<K>(&mut self, _seed: K) -> Result<Option<K::Value>, Error>
    where
        K: de::DeserializeSeed<'de>,
    {
        Ok(None)
    }

    fn next_value_seed<V>(&mut self, _seed: V) -> Result<V::Value, Error>
    where
        V: de::DeserializeSeed<'de>,
    {
        Err(Error::msg("no values in an empty mapping"))
    }
}

/// One surviving key/value pair; `index` is the pair's position in the tree,
/// stable across retries.
struct MapPair {
    key: NodeId,
    value: NodeId,
    index: usize,
}

/// Collapse duplicate keys according to the configured policy.
fn mapping_pairs<'de, 'a>(
    state: &'a DecodeState<'de, 'a>,
    node: &'a Node<'de>,
) -> Result<Vec<MapPair>, Error> {
    let mut pairs: Vec<MapPair> = Vec::with_capacity(node.children.len() / 2);
    let mut seen: FastHashMap<Fingerprint, usize> = FastHashMap::default();
    for (index, kv) in node.children.chunks_exact(2).enumerate() {
        let (key, value) = (kv[0], kv[1]);
        let fingerprint = state.fingerprint(key, 0);
        match seen.entry(fingerprint) {
            Entry::Occupied(slot) => match state.dup_policy {
                DuplicateKeyPolicy::Error => {
                    return Err(Error::DuplicateKey {
                        key: slot.key().stringy(),
                        location: state.doc.node(key).location,
                    });
                }
                DuplicateKeyPolicy::FirstWins => {}
                DuplicateKeyPolicy::LastWins => {
                    pairs[*slot.get()] = MapPair { key, value, index };
                }
            },
            Entry::Vacant(slot) => {
                slot.insert(pairs.len());
                pairs.push(MapPair { key, value, index });
            }
        }
    }
    Ok(pairs)
}

/// `MapAccess` over a mapping node's collapsed pairs. Key and value of one
/// pair share a slot index, so a recoverable failure in either drops the
/// whole entry on retry.
struct MapPairs<'de, 'a> {
    state: &'a DecodeState<'de, 'a>,
    container: NodeId,
    pairs: Vec<MapPair>,
    cursor: usize,
    pending: Option<(NodeId, usize)>,
}

impl<'de, 'a> de::MapAccess<'de> for MapPairs<'de, 'a> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Error>
    where
        K: de::DeserializeSeed<'de>,
    {
        while self.cursor < self.pairs.len() {
            let pair = &self.pairs[self.cursor];
            if self.state.slot_skipped(self.container, pair.index) {
                self.cursor += 1;
                continue;
            }
            break;
        }
        if self.cursor >= self.pairs.len() {
            return Ok(None);
        }
        let pair = &self.pairs[self.cursor];
        let (key, value, index) = (pair.key, pair.value, pair.index);
        self.cursor += 1;
        self.pending = Some((value, index));
        decode_slot(self.state, self.container, index, key, seed).map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Error>
    where
        V: de::DeserializeSeed<'de>,
    {
        let (value, index) = self
            .pending
            .take()
            .ok_or_else(|| Error::msg("mapping value requested before its key"))?;
        decode_slot(self.state, self.container, index, value, seed)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.pairs.len() - self.cursor)
    }
}

/// `EnumAccess`/`VariantAccess` for externally-tagged enums.
struct EnumDeser<'de, 'a> {
    state: &'a DecodeState<'de, 'a>,
    variant: String,
    payload: Option<NodeId>,
    location: Location,
}

impl<'de, 'a> de::EnumAccess<'de> for EnumDeser<'de, 'a> {
    type Error = Error;
    type Variant = VariantDeser<'de, 'a>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant), Error>
    where
        V: de::DeserializeSeed<'de>,
    {
        let EnumDeser {
            state,
            variant,
            payload,
            location,
        } = self;
        let value = seed.deserialize(variant.into_deserializer())?;
        Ok((
            value,
            VariantDeser {
                state,
                payload,
                location,
            },
        ))
    }
}

struct VariantDeser<'de, 'a> {
    state: &'a DecodeState<'de, 'a>,
    payload: Option<NodeId>,
    location: Location,
}

impl<'de, 'a> VariantDeser<'de, 'a> {
    fn payload(self) -> Result<NodeDeserializer<'de, 'a>, Error> {
        match self.payload {
            Some(node) => Ok(NodeDeserializer {
                state: self.state,
                node,
            }),
            None => Err(Error::mismatch("a value for this enum variant", self.location)),
        }
    }
}

impl<'de, 'a> de::VariantAccess<'de> for VariantDeser<'de, 'a> {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Error> {
        match self.payload {
            None => Ok(()),
            Some(node) if node_is_null(self.state.doc.node(node)) => Ok(()),
            Some(node) => Err(Error::mismatch(
                "no value for this unit enum variant",
                self.state.doc.node(node).location,
            )),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value, Error>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(self.payload()?)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        self.payload()?.deserialize_seq(visitor)
    }

    fn struct_variant<V>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        self.payload()?.deserialize_struct("", fields, visitor)
    }
}

/// Deserializer behind the `__yaml_tagged` newtype: synthesizes the
/// `{ tag, value }` struct view consumed by `Tagged::deserialize`.
struct TaggedDeser<'de, 'a> {
    de: NodeDeserializer<'de, 'a>,
    tag: String,
    state: u8,
}

impl<'de, 'a> de::Deserializer<'de> for TaggedDeser<'de, 'a> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_struct("Tagged", &["tag", "value"], visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_map(TaggedMapAccess {
            de: self.de,
            tag: self.tag,
            state: self.state,
        })
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

/// Yields exactly two pairs, in order: `tag`, then `value`.
struct TaggedMapAccess<'de, 'a> {
    de: NodeDeserializer<'de, 'a>,
    tag: String,
    state: u8,
}

impl<'de, 'a> de::MapAccess<'de> for TaggedMapAccess<'de, 'a> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Error>
    where
        K: de::DeserializeSeed<'de>,
    {
        let key = match self.state {
            0 => "tag",
            1 => "value",
            _ => return Ok(None),
        };
        self.state += 1;
        seed.deserialize(key.into_deserializer()).map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Error>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.state {
            1 => seed.deserialize(self.tag.clone().into_deserializer()),
            2 => seed.deserialize(self.de),
            _ => Err(Error::msg("invalid tagged wrapper state")),
        }
    }
}
