//! Schema-driven decoder (bytes -> value)
//!
//! The decoder walks the schema tree and the input together. Tag overrides
//! are resolved in three steps: an override handed down by a parent (through
//! a reference) takes precedence over the node's own, an explicit override
//! adds a constructed wrapper, and an implicit override replaces the natural
//! tag of the node's body. CHOICE and Any have no natural tag, so an
//! implicit override on them acts as an explicit wrapper.

use crate::ber::{BerLength, BerTag, BerTagClass, Cursor, View};
use crate::codec::primitive::{check_size, decode_primitive};
use crate::config::CodecConfig;
use crate::schema::{
    CompositeKind, Node, NodeKind, PrimitiveKind, Reference, RepeatedKind, SchemaRef, TagOverride,
};
use dermodel_core::{
    CodecResult, DecodeError, DecodeResult, ErrorKind, Fields, SchemaPath, Value,
};

/// Decoder driven by a schema tree
///
/// A decoder can be reused; each call to [`decode`](Self::decode) starts
/// from the root path with zero depth.
pub struct Decoder<'c> {
    config: &'c CodecConfig,
    path: Vec<String>,
    depth: usize,
}

impl<'c> Decoder<'c> {
    /// Create a decoder
    ///
    /// # Arguments
    /// * `config` - Strictness and nesting limit applied to every call
    pub fn new(config: &'c CodecConfig) -> Self {
        Self {
            config,
            path: Vec::new(),
            depth: 0,
        }
    }

    /// Decode a complete input
    ///
    /// # Arguments
    /// * `node` - Schema of the outermost value
    /// * `input` - Complete encoded input
    ///
    /// # Error Handling
    /// Bytes left after the outermost value fail with `TrailingData`. Every
    /// error carries the schema path and absolute byte offset of the failure.
    pub fn decode(&mut self, node: &Node, input: &[u8]) -> DecodeResult<Value> {
        self.path.clear();
        self.depth = 0;
        let mut cursor = Cursor::new(input, self.config.encoding);
        self.decode_complete(node, &mut cursor)
    }

    fn decode_complete(&mut self, node: &Node, cursor: &mut Cursor<'_>) -> DecodeResult<Value> {
        if cursor.at_end() && node.optional {
            log::debug!("optional `{}` absent from empty input", self.path_string());
            return Ok(node.default.clone().unwrap_or(Value::Null));
        }

        let value = self.decode_node(node, cursor, None, &Fields::new())?;
        if cursor.remaining() > 0 {
            return Err(self.error(
                ErrorKind::TrailingData {
                    remaining: cursor.remaining(),
                },
                cursor.offset(),
            ));
        }
        Ok(value)
    }

    fn decode_node(
        &mut self,
        node: &Node,
        cursor: &mut Cursor<'_>,
        outer: Option<TagOverride>,
        siblings: &Fields,
    ) -> DecodeResult<Value> {
        if self.depth >= self.config.max_depth {
            return Err(self.error(
                ErrorKind::DepthExceeded {
                    limit: self.config.max_depth,
                },
                cursor.offset(),
            ));
        }
        self.depth += 1;
        log::trace!(
            "decoding {} at `{}` (offset {})",
            node.describe(),
            self.path_string(),
            cursor.offset()
        );

        let result = match outer {
            Some(wrapper @ TagOverride::Explicit(..)) => {
                self.decode_wrapper(wrapper, node, cursor, node.tag, siblings)
            }
            Some(TagOverride::Implicit(class, number)) => {
                // The parent's tag replaces the outermost tag, an explicit wrapper included
                let tag = if node.tag.is_some_and(|t| t.is_explicit()) {
                    TagOverride::Explicit(class, number)
                } else {
                    TagOverride::Implicit(class, number)
                };
                self.decode_tagged(node, cursor, Some(tag), siblings)
            }
            None => self.decode_tagged(node, cursor, node.tag, siblings),
        };

        self.depth -= 1;
        result
    }

    fn decode_tagged(
        &mut self,
        node: &Node,
        cursor: &mut Cursor<'_>,
        tag: Option<TagOverride>,
        siblings: &Fields,
    ) -> DecodeResult<Value> {
        match tag {
            Some(wrapper @ TagOverride::Explicit(..)) => {
                self.decode_wrapper(wrapper, node, cursor, None, siblings)
            }
            Some(TagOverride::Implicit(class, number)) => match node.kind {
                NodeKind::Choice(_) | NodeKind::Any => self.decode_wrapper(
                    TagOverride::Explicit(class, number),
                    node,
                    cursor,
                    None,
                    siblings,
                ),
                _ => self.decode_body(node, cursor, Some((class, number)), siblings),
            },
            None => self.decode_body(node, cursor, None, siblings),
        }
    }

    fn decode_wrapper(
        &mut self,
        wrapper: TagOverride,
        node: &Node,
        cursor: &mut Cursor<'_>,
        inner: Option<TagOverride>,
        siblings: &Fields,
    ) -> DecodeResult<Value> {
        let view = self.open_constructed(cursor, wrapper.wrapper_tag())?;
        let value = self.decode_tagged(node, cursor, inner, siblings)?;
        self.close(cursor, view)?;
        Ok(value)
    }

    fn decode_body(
        &mut self,
        node: &Node,
        cursor: &mut Cursor<'_>,
        implicit: Option<(BerTagClass, u32)>,
        siblings: &Fields,
    ) -> DecodeResult<Value> {
        match &node.kind {
            NodeKind::Primitive(kind) => self.decode_primitive_node(node, *kind, cursor, implicit),
            NodeKind::Composite(kind, children) => {
                self.decode_composite(*kind, children, cursor, implicit)
            }
            NodeKind::Repeated(kind, element) => {
                self.decode_repeated(node, *kind, element, cursor, implicit)
            }
            NodeKind::Choice(alternatives) => self.decode_choice(alternatives, cursor, siblings),
            NodeKind::Reference(reference) => {
                let target = self.resolve(reference, siblings, cursor.offset())?;
                let target_node = self.bound_node(&target, cursor.offset())?;
                let outer = implicit.map(|(class, number)| TagOverride::Implicit(class, number));
                self.decode_node(target_node, cursor, outer, siblings)
            }
            NodeKind::Any => {
                let offset = cursor.offset();
                let raw = self.at(offset, cursor.read_raw_tlv())?;
                match &node.contains {
                    Some(schema) => self.decode_contained(schema, raw, offset),
                    None => Ok(Value::Bytes(raw.to_vec())),
                }
            }
        }
    }

    fn decode_primitive_node(
        &mut self,
        node: &Node,
        kind: PrimitiveKind,
        cursor: &mut Cursor<'_>,
        implicit: Option<(BerTagClass, u32)>,
    ) -> DecodeResult<Value> {
        let expected = match implicit {
            Some((class, number)) => BerTag::new(class, false, number),
            None => BerTag::universal(false, kind.universal_tag()),
        };
        let length = self.expect_header(cursor, expected)?;
        let offset = cursor.offset();
        let content = self.at(offset, cursor.read_content(length))?;

        if let Some(schema) = &node.contains {
            self.at(offset, check_size(kind, content, &node.constraints))?;
            let payload = match kind {
                PrimitiveKind::BitStr => match content.split_first() {
                    Some((0, payload)) => payload,
                    _ => {
                        return Err(self.error(
                            ErrorKind::MalformedContent(
                                "encapsulating BIT STRING must have no unused bits".to_string(),
                            ),
                            offset,
                        ));
                    }
                },
                _ => content,
            };
            let payload_offset = offset + (content.len() - payload.len());
            return self.decode_contained(schema, payload, payload_offset);
        }

        self.at(
            offset,
            decode_primitive(kind, content, &node.constraints, cursor.encoding()),
        )
    }

    fn decode_composite(
        &mut self,
        kind: CompositeKind,
        children: &[(String, Node)],
        cursor: &mut Cursor<'_>,
        implicit: Option<(BerTagClass, u32)>,
    ) -> DecodeResult<Value> {
        let expected = match implicit {
            Some((class, number)) => BerTag::new(class, true, number),
            None => BerTag::universal(true, kind.universal_tag()),
        };
        let view = self.open_constructed(cursor, expected)?;

        let mut fields = Fields::with_capacity(children.len());
        for (key, child) in children {
            self.path.push(key.clone());

            if child.optional && !self.is_present(child, cursor, &fields)? {
                match &child.default {
                    Some(default) => {
                        log::debug!("`{}` absent, using default", self.path_string());
                        fields.insert(key.clone(), default.clone());
                    }
                    None => log::debug!("optional `{}` absent", self.path_string()),
                }
                self.path.pop();
                continue;
            }
            if cursor.at_end() {
                return Err(self.error(ErrorKind::MissingField(key.clone()), cursor.offset()));
            }

            let value = self.decode_node(child, cursor, None, &fields)?;
            fields.insert(key.clone(), value);
            self.path.pop();
        }

        self.close(cursor, view)?;
        Ok(Value::Map(fields))
    }

    fn decode_repeated(
        &mut self,
        node: &Node,
        kind: RepeatedKind,
        element: &Node,
        cursor: &mut Cursor<'_>,
        implicit: Option<(BerTagClass, u32)>,
    ) -> DecodeResult<Value> {
        let expected = match implicit {
            Some((class, number)) => BerTag::new(class, true, number),
            None => BerTag::universal(true, kind.universal_tag()),
        };
        let start = cursor.offset();
        let view = self.open_constructed(cursor, expected)?;

        let no_siblings = Fields::new();
        let mut items = Vec::new();
        while !cursor.at_end() {
            self.path.push(format!("[{}]", items.len()));
            let item = self.decode_node(element, cursor, None, &no_siblings)?;
            self.path.pop();
            items.push(item);
        }
        self.close(cursor, view)?;

        if let Some((min, max)) = node.constraints.size {
            if items.len() < min || items.len() > max {
                return Err(self.error(
                    ErrorKind::LengthOutOfRange {
                        length: items.len(),
                        min,
                        max,
                    },
                    start,
                ));
            }
        }
        Ok(Value::Seq(items))
    }

    fn decode_choice(
        &mut self,
        alternatives: &[(String, Node)],
        cursor: &mut Cursor<'_>,
        siblings: &Fields,
    ) -> DecodeResult<Value> {
        let offset = cursor.offset();
        let tag = self.at(offset, cursor.peek_tag())?.ok_or_else(|| {
            self.error(
                ErrorKind::NoMatchingChoice {
                    found: "end of content".to_string(),
                },
                offset,
            )
        })?;

        for (label, alternative) in alternatives {
            if self.matches(alternative, tag, siblings, offset, 0)? {
                log::debug!("choice `{}` selected `{}`", self.path_string(), label);
                self.path.push(label.clone());
                let value = self.decode_node(alternative, cursor, None, siblings)?;
                self.path.pop();
                return Ok(Value::Choice(label.clone(), Box::new(value)));
            }
        }

        Err(self.error(
            ErrorKind::NoMatchingChoice {
                found: tag.to_string(),
            },
            offset,
        ))
    }

    /// Decode a nested payload as an independent input
    fn decode_contained(
        &mut self,
        schema: &SchemaRef,
        payload: &[u8],
        base: usize,
    ) -> DecodeResult<Value> {
        let node = self.bound_node(schema, base)?;
        let mut inner = Cursor::with_base(payload, base, self.config.encoding);
        self.decode_complete(node, &mut inner)
    }

    /// One-tag lookahead for an optional child
    fn is_present(
        &self,
        child: &Node,
        cursor: &mut Cursor<'_>,
        siblings: &Fields,
    ) -> DecodeResult<bool> {
        let offset = cursor.offset();
        let mark = cursor.save();
        let peeked = cursor.peek_tag();
        cursor.restore(mark);
        match self.at(offset, peeked)? {
            Some(tag) => self.matches(child, tag, siblings, offset, 0),
            None => Ok(false),
        }
    }

    /// Whether `tag` can start an encoding of `node`
    fn matches(
        &self,
        node: &Node,
        tag: BerTag,
        siblings: &Fields,
        offset: usize,
        hops: usize,
    ) -> DecodeResult<bool> {
        if hops >= self.config.max_depth {
            return Err(self.error(
                ErrorKind::DepthExceeded {
                    limit: self.config.max_depth,
                },
                offset,
            ));
        }
        if let Some(tag_override) = node.tag {
            return Ok(tag.class() == tag_override.class() && tag.number() == tag_override.number());
        }
        match &node.kind {
            NodeKind::Choice(alternatives) => {
                for (_, alternative) in alternatives {
                    if self.matches(alternative, tag, siblings, offset, hops + 1)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            NodeKind::Reference(reference) => {
                let target = self.resolve(reference, siblings, offset)?;
                let target_node = self.bound_node(&target, offset)?;
                self.matches(target_node, tag, siblings, offset, hops + 1)
            }
            NodeKind::Any => Ok(true),
            _ => Ok(node
                .natural_tag()
                .is_some_and(|natural| natural.same_identity(&tag))),
        }
    }

    fn resolve(
        &self,
        reference: &Reference,
        siblings: &Fields,
        offset: usize,
    ) -> DecodeResult<SchemaRef> {
        reference.resolve(siblings).ok_or_else(|| {
            self.error(
                ErrorKind::UnresolvedReference(reference.describe()),
                offset,
            )
        })
    }

    fn bound_node<'s>(&self, schema: &'s SchemaRef, offset: usize) -> DecodeResult<&'s Node> {
        schema.get().ok_or_else(|| {
            self.error(
                ErrorKind::UnresolvedReference(format!("`{}` is not bound", schema.name())),
                offset,
            )
        })
    }

    fn expect_header(&self, cursor: &mut Cursor<'_>, expected: BerTag) -> DecodeResult<BerLength> {
        let offset = cursor.offset();
        let (tag, length) = self.at(offset, cursor.read_header())?;
        if tag != expected {
            return Err(self.error(
                ErrorKind::TagMismatch {
                    expected: expected.to_string(),
                    found: tag.to_string(),
                },
                offset,
            ));
        }
        Ok(length)
    }

    fn open_constructed(&self, cursor: &mut Cursor<'_>, expected: BerTag) -> DecodeResult<View> {
        let length = self.expect_header(cursor, expected)?;
        let offset = cursor.offset();
        self.at(offset, cursor.open(length))
    }

    fn close(&self, cursor: &mut Cursor<'_>, view: View) -> DecodeResult<()> {
        let offset = cursor.offset();
        self.at(offset, cursor.close(view))
    }

    fn path_string(&self) -> String {
        SchemaPath::new(self.path.clone()).to_string()
    }

    fn error(&self, kind: ErrorKind, offset: usize) -> DecodeError {
        DecodeError::new(kind, SchemaPath::new(self.path.clone()), offset)
    }

    fn at<T>(&self, offset: usize, result: CodecResult<T>) -> DecodeResult<T> {
        result.map_err(|kind| self.error(kind, offset))
    }
}
