//! Tree builder: drains the saphyr event stream into a document tree.
//!
//! Responsibilities
//! - Parse exactly one document into an arena of [`Node`]s (the rest of a
//!   multi-document stream is left untouched).
//! - Register anchored nodes in the document anchor table, keyed by the
//!   anchor *name*, at the node's start event. A later definition of the
//!   same name replaces the earlier one.
//! - Track source locations for diagnostics.
//!
//! Anchor names
//! - saphyr reports anchors as interned numeric ids. The table, the alias
//!   cycle guard and the error messages all speak in names, so the names are
//!   recovered from the input text using the event spans: scan backwards
//!   from a node's start for `&name`, slice the alias token for `*name`.
//!   Recovery only runs for events that actually carry an anchor id.

use std::borrow::Cow;
use std::collections::HashMap;

use ahash::RandomState;
use saphyr_parser::{Event, Parser, ScalarStyle, Span, StrInput};

use crate::error::{location_from_span, Error, Location};

type FastHashMap<K, V> = HashMap<K, V, RandomState>;

/// Index of a node inside its document's arena.
pub(crate) type NodeId = usize;

/// Nesting deeper than this is treated as hostile input.
const MAX_DEPTH: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Scalar,
    Sequence,
    Mapping,
    Alias,
}

/// One node of the document tree.
///
/// Mapping children are laid out flat as `[k0, v0, k1, v1, ...]`, preserving
/// source order; duplicates stay in the tree and are collapsed by the
/// decoder according to the configured policy.
#[derive(Debug)]
pub(crate) struct Node<'de> {
    pub(crate) kind: NodeKind,
    pub(crate) location: Location,
    /// Explicit tag as reported by the parser, `None` when absent.
    pub(crate) tag: Option<String>,
    /// Scalar raw text; for aliases, the referenced anchor name.
    pub(crate) value: Cow<'de, str>,
    /// True for plain-style scalars without an explicit tag.
    pub(crate) implicit: bool,
    pub(crate) children: Vec<NodeId>,
}

/// One parsed YAML document: the node arena, its root, and the anchor table.
#[derive(Debug)]
pub(crate) struct Document<'de> {
    nodes: Vec<Node<'de>>,
    root: NodeId,
    anchors: FastHashMap<&'de str, NodeId>,
}

impl<'de> Document<'de> {
    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node<'de> {
        &self.nodes[id]
    }

    pub(crate) fn anchor(&self, name: &str) -> Option<NodeId> {
        self.anchors.get(name).copied()
    }
}

/// Parse the first YAML document of `input` into a [`Document`].
///
/// Empty input (or a bare stream without documents) yields a document whose
/// root is a null scalar.
pub(crate) fn load(input: &str) -> Result<Document<'_>, Error> {
    Loader {
        input,
        parser: Parser::new_from_str(input),
        nodes: Vec::new(),
        anchors: FastHashMap::default(),
        last_location: Location::UNKNOWN,
    }
    .load_document()
}

struct Loader<'de> {
    input: &'de str,
    parser: Parser<'de, StrInput<'de>>,
    nodes: Vec<Node<'de>>,
    anchors: FastHashMap<&'de str, NodeId>,
    last_location: Location,
}

impl<'de> Loader<'de> {
    fn load_document(mut self) -> Result<Document<'de>, Error> {
        loop {
            let Some((event, span)) = self.next()? else {
                return Ok(self.null_document());
            };
            match event {
                Event::StreamStart | Event::Nothing => continue,
                Event::StreamEnd => return Ok(self.null_document()),
                Event::DocumentStart(_) => {
                    let (event, span) = self.next_required()?;
                    let root = self.parse_node(event, span, 0)?;
                    match self.next()? {
                        Some((Event::DocumentEnd, _)) | None => {}
                        Some((_, span)) => {
                            return Err(Error::mismatch(
                                "end of document",
                                location_from_span(&span),
                            ));
                        }
                    }
                    // Stop here: only the first document is consumed.
                    return Ok(Document {
                        nodes: self.nodes,
                        root,
                        anchors: self.anchors,
                    });
                }
                _ => {
                    return Err(Error::mismatch(
                        "start of document",
                        location_from_span(&span),
                    ));
                }
            }
        }
    }

    /// Parse one node rooted at `event`, recursively.
    fn parse_node(&mut self, event: Event<'de>, span: Span, depth: usize) -> Result<NodeId, Error> {
        let location = location_from_span(&span);
        if depth > MAX_DEPTH {
            return Err(Error::Depth { location });
        }
        match event {
            Event::Scalar(value, style, anchor_id, tag) => {
                let tag = tag.map(|t| t.to_string());
                let implicit = tag.is_none() && matches!(style, ScalarStyle::Plain);
                let id = self.push(Node {
                    kind: NodeKind::Scalar,
                    location,
                    tag,
                    value,
                    implicit,
                    children: Vec::new(),
                });
                self.register_anchor(anchor_id, &span, id);
                Ok(id)
            }
            Event::SequenceStart(anchor_id, _tag) => {
                let id = self.push(Node {
                    kind: NodeKind::Sequence,
                    location,
                    tag: None,
                    value: Cow::Borrowed(""),
                    implicit: false,
                    children: Vec::new(),
                });
                self.register_anchor(anchor_id, &span, id);
                let mut children = Vec::new();
                loop {
                    let (event, span) = self.next_required()?;
                    if matches!(event, Event::SequenceEnd) {
                        break;
                    }
                    children.push(self.parse_node(event, span, depth + 1)?);
                }
                self.nodes[id].children = children;
                Ok(id)
            }
            Event::MappingStart(anchor_id, _tag) => {
                let id = self.push(Node {
                    kind: NodeKind::Mapping,
                    location,
                    tag: None,
                    value: Cow::Borrowed(""),
                    implicit: false,
                    children: Vec::new(),
                });
                self.register_anchor(anchor_id, &span, id);
                let mut children = Vec::new();
                loop {
                    let (event, span) = self.next_required()?;
                    if matches!(event, Event::MappingEnd) {
                        break;
                    }
                    children.push(self.parse_node(event, span, depth + 1)?);
                    let (event, span) = self.next_required()?;
                    children.push(self.parse_node(event, span, depth + 1)?);
                }
                self.nodes[id].children = children;
                Ok(id)
            }
            Event::Alias(_anchor_id) => {
                let name = alias_name(self.input, &span)
                    .ok_or_else(|| Error::mismatch("alias name", location))?;
                Ok(self.push(Node {
                    kind: NodeKind::Alias,
                    location,
                    tag: None,
                    value: Cow::Borrowed(name),
                    implicit: false,
                    children: Vec::new(),
                }))
            }
            _ => Err(Error::mismatch("scalar, sequence, or mapping", location)),
        }
    }

    fn push(&mut self, node: Node<'de>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    /// Record `node` under the anchor name preceding `span`, if any.
    ///
    /// Runs at the node's *start* event, so an alias inside an anchored
    /// container already sees the container registered.
    fn register_anchor(&mut self, anchor_id: usize, span: &Span, node: NodeId) {
        if anchor_id == 0 {
            return;
        }
        if let Some(name) = anchor_name_before(self.input, span) {
            self.anchors.insert(name, node);
        }
    }

    fn next(&mut self) -> Result<Option<(Event<'de>, Span)>, Error> {
        match self.parser.next() {
            Some(item) => {
                let (event, span) = item.map_err(Error::from_scan_error)?;
                self.last_location = location_from_span(&span);
                Ok(Some((event, span)))
            }
            None => Ok(None),
        }
    }

    fn next_required(&mut self) -> Result<(Event<'de>, Span), Error> {
        self.next()?
            .ok_or(Error::Eof {
                location: self.last_location,
            })
    }

    fn null_document(mut self) -> Document<'de> {
        let root = self.push(Node {
            kind: NodeKind::Scalar,
            location: Location::new(1, 1),
            tag: None,
            value: Cow::Borrowed(""),
            implicit: true,
            children: Vec::new(),
        });
        Document {
            nodes: self.nodes,
            root,
            anchors: self.anchors,
        }
    }
}

/// Characters permitted in anchor names: printable, no whitespace, no flow
/// indicators.
fn is_anchor_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '[' | ']' | '{' | '}' | ',' | '&' | '*')
}

/// Translate the parser's character index to a byte offset.
fn byte_index(input: &str, char_index: usize) -> usize {
    if input.is_ascii() {
        return char_index.min(input.len());
    }
    input
        .char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(input.len())
}

/// Recover the `&name` anchor text preceding the node that starts at `span`.
fn anchor_name_before<'de>(input: &'de str, span: &Span) -> Option<&'de str> {
    let start = byte_index(input, span.start.index());
    let mut search_start = start.saturating_sub(200);
    while !input.is_char_boundary(search_start) {
        search_start += 1;
    }
    let region = &input[search_start..start];
    let amp = region.rfind('&')?;
    let after = &region[amp + 1..];
    let end = after
        .find(|c: char| !is_anchor_char(c))
        .unwrap_or(after.len());
    let name = &after[..end];
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Recover the referenced name from an alias token `*name` at `span`.
fn alias_name<'de>(input: &'de str, span: &Span) -> Option<&'de str> {
    let start = byte_index(input, span.start.index());
    let end = byte_index(input, span.end.index()).max(start);
    let region = &input[start..end.min(input.len())];
    let star = region.find('*')?;
    let after = &region[star + 1..];
    let end = after
        .find(|c: char| !is_anchor_char(c))
        .unwrap_or(after.len());
    let name = &after[..end];
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
