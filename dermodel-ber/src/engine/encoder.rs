//! Schema-driven encoder (value -> bytes)
//!
//! Produces definite-length DER output. Tag overrides follow the same
//! rules as [`Decoder`](super::Decoder).

use crate::ber::{BerTag, BerTagClass, BerWriter, Cursor, tlv};
use crate::codec::primitive::encode_primitive;
use crate::config::CodecConfig;
use crate::schema::{
    CompositeKind, Node, NodeKind, PrimitiveKind, Reference, RepeatedKind, SchemaRef, TagOverride,
};
use dermodel_core::{
    CodecResult, EncodeError, EncodeResult, ErrorKind, Fields, SchemaPath, Value,
};

/// Encoder driven by a schema tree
///
/// Like [`Decoder`](super::Decoder), an encoder can be reused across calls.
pub struct Encoder<'c> {
    config: &'c CodecConfig,
    path: Vec<String>,
    depth: usize,
}

impl<'c> Encoder<'c> {
    /// Create an encoder
    ///
    /// # Arguments
    /// * `config` - Nesting limit applied to every call
    pub fn new(config: &'c CodecConfig) -> Self {
        Self {
            config,
            path: Vec::new(),
            depth: 0,
        }
    }

    /// Encode `value` as DER
    ///
    /// # Arguments
    /// * `node` - Schema of the outermost value
    /// * `value` - Value shaped like `node`
    ///
    /// # Error Handling
    /// Errors carry the schema path of the failing node.
    pub fn encode(&mut self, node: &Node, value: &Value) -> EncodeResult<Vec<u8>> {
        self.path.clear();
        self.depth = 0;
        self.encode_node(node, value, None, &Fields::new())
    }

    fn encode_node(
        &mut self,
        node: &Node,
        value: &Value,
        outer: Option<TagOverride>,
        siblings: &Fields,
    ) -> EncodeResult<Vec<u8>> {
        if self.depth >= self.config.max_depth {
            return Err(self.error(ErrorKind::DepthExceeded {
                limit: self.config.max_depth,
            }));
        }
        self.depth += 1;
        log::trace!("encoding {} at `{}`", node.describe(), self.path_string());

        let result = match outer {
            Some(wrapper @ TagOverride::Explicit(..)) => {
                let inner = self.encode_tagged(node, value, node.tag, siblings);
                inner.map(|content| tlv(wrapper.wrapper_tag(), &content))
            }
            Some(TagOverride::Implicit(class, number)) => {
                let tag = if node.tag.is_some_and(|t| t.is_explicit()) {
                    TagOverride::Explicit(class, number)
                } else {
                    TagOverride::Implicit(class, number)
                };
                self.encode_tagged(node, value, Some(tag), siblings)
            }
            None => self.encode_tagged(node, value, node.tag, siblings),
        };

        self.depth -= 1;
        result
    }

    fn encode_tagged(
        &mut self,
        node: &Node,
        value: &Value,
        tag: Option<TagOverride>,
        siblings: &Fields,
    ) -> EncodeResult<Vec<u8>> {
        match tag {
            Some(wrapper @ TagOverride::Explicit(..)) => {
                let content = self.encode_body(node, value, None, siblings)?;
                Ok(tlv(wrapper.wrapper_tag(), &content))
            }
            Some(TagOverride::Implicit(class, number)) => match node.kind {
                NodeKind::Choice(_) | NodeKind::Any => {
                    let content = self.encode_body(node, value, None, siblings)?;
                    Ok(tlv(TagOverride::Explicit(class, number).wrapper_tag(), &content))
                }
                _ => self.encode_body(node, value, Some((class, number)), siblings),
            },
            None => self.encode_body(node, value, None, siblings),
        }
    }

    fn encode_body(
        &mut self,
        node: &Node,
        value: &Value,
        implicit: Option<(BerTagClass, u32)>,
        siblings: &Fields,
    ) -> EncodeResult<Vec<u8>> {
        match &node.kind {
            NodeKind::Primitive(kind) => self.encode_primitive_node(node, *kind, value, implicit),
            NodeKind::Composite(kind, children) => {
                self.encode_composite(*kind, children, value, implicit)
            }
            NodeKind::Repeated(kind, element) => {
                self.encode_repeated(node, *kind, element, value, implicit)
            }
            NodeKind::Choice(alternatives) => self.encode_choice(alternatives, value, siblings),
            NodeKind::Reference(reference) => {
                let target = self.resolve(reference, siblings)?;
                let target_node = self.bound_node(&target)?;
                let outer = implicit.map(|(class, number)| TagOverride::Implicit(class, number));
                self.encode_node(target_node, value, outer, siblings)
            }
            NodeKind::Any => match (&node.contains, value) {
                (_, Value::Bytes(raw)) => {
                    self.check_single_tlv(raw)?;
                    Ok(raw.clone())
                }
                (Some(schema), other) => self.encode_contained(schema, other),
                (None, other) => Err(self.error(ErrorKind::invalid_value(
                    "raw bytes",
                    other.type_name(),
                ))),
            },
        }
    }

    fn encode_primitive_node(
        &mut self,
        node: &Node,
        kind: PrimitiveKind,
        value: &Value,
        implicit: Option<(BerTagClass, u32)>,
    ) -> EncodeResult<Vec<u8>> {
        let content = match (&node.contains, kind, value) {
            (Some(schema), PrimitiveKind::OctStr, other) if !matches!(other, Value::Bytes(_)) => {
                self.encode_contained(schema, other)?
            }
            (Some(schema), PrimitiveKind::BitStr, other)
                if !matches!(other, Value::Bytes(_) | Value::BitString(_)) =>
            {
                let payload = self.encode_contained(schema, other)?;
                let mut content = Vec::with_capacity(payload.len() + 1);
                content.push(0);
                content.extend_from_slice(&payload);
                content
            }
            _ => self.at(encode_primitive(kind, value, &node.constraints))?,
        };

        let tag = match implicit {
            Some((class, number)) => BerTag::new(class, false, number),
            None => BerTag::universal(false, kind.universal_tag()),
        };
        Ok(tlv(tag, &content))
    }

    fn encode_composite(
        &mut self,
        kind: CompositeKind,
        children: &[(String, Node)],
        value: &Value,
        implicit: Option<(BerTagClass, u32)>,
    ) -> EncodeResult<Vec<u8>> {
        let Value::Map(fields) = value else {
            return Err(self.error(ErrorKind::invalid_value("map", value.type_name())));
        };

        for key in fields.keys() {
            if !children.iter().any(|(name, _)| name == key) {
                log::warn!("ignoring unknown field `{}` at `{}`", key, self.path_string());
            }
        }

        let mut writer = BerWriter::new();
        let mut preceding = Fields::with_capacity(children.len());
        for (key, child) in children {
            self.path.push(key.clone());
            match fields.get(key) {
                None if child.optional => {
                    log::debug!("optional `{}` absent", self.path_string());
                    if let Some(default) = &child.default {
                        preceding.insert(key.clone(), default.clone());
                    }
                }
                None => return Err(self.error(ErrorKind::MissingField(key.clone()))),
                Some(field) if child.default.as_ref() == Some(field) => {
                    log::debug!("`{}` equals its default, omitted", self.path_string());
                    preceding.insert(key.clone(), field.clone());
                }
                Some(field) => {
                    let bytes = self.encode_node(child, field, None, &preceding)?;
                    writer.write_raw(&bytes);
                    preceding.insert(key.clone(), field.clone());
                }
            }
            self.path.pop();
        }

        let tag = match implicit {
            Some((class, number)) => BerTag::new(class, true, number),
            None => BerTag::universal(true, kind.universal_tag()),
        };
        Ok(tlv(tag, writer.as_slice()))
    }

    fn encode_repeated(
        &mut self,
        node: &Node,
        kind: RepeatedKind,
        element: &Node,
        value: &Value,
        implicit: Option<(BerTagClass, u32)>,
    ) -> EncodeResult<Vec<u8>> {
        let Value::Seq(items) = value else {
            return Err(self.error(ErrorKind::invalid_value("sequence", value.type_name())));
        };
        if let Some((min, max)) = node.constraints.size {
            if items.len() < min || items.len() > max {
                return Err(self.error(ErrorKind::LengthOutOfRange {
                    length: items.len(),
                    min,
                    max,
                }));
            }
        }

        let no_siblings = Fields::new();
        let mut writer = BerWriter::new();
        for (index, item) in items.iter().enumerate() {
            self.path.push(format!("[{index}]"));
            let bytes = self.encode_node(element, item, None, &no_siblings)?;
            writer.write_raw(&bytes);
            self.path.pop();
        }

        let tag = match implicit {
            Some((class, number)) => BerTag::new(class, true, number),
            None => BerTag::universal(true, kind.universal_tag()),
        };
        Ok(tlv(tag, writer.as_slice()))
    }

    fn encode_choice(
        &mut self,
        alternatives: &[(String, Node)],
        value: &Value,
        siblings: &Fields,
    ) -> EncodeResult<Vec<u8>> {
        let (label, inner) = match value {
            Value::Choice(label, inner) => (label.as_str(), inner.as_ref()),
            Value::Map(fields) => {
                let mut selected = fields
                    .iter()
                    .filter(|(key, _)| alternatives.iter().any(|(name, _)| name == key));
                match (selected.next(), selected.next()) {
                    (Some((key, inner)), None) => (key, inner),
                    (None, _) => {
                        return Err(self.error(ErrorKind::AmbiguousOrMissingChoice(
                            "no alternative selected".to_string(),
                        )));
                    }
                    (Some(_), Some(_)) => {
                        return Err(self.error(ErrorKind::AmbiguousOrMissingChoice(
                            "more than one alternative selected".to_string(),
                        )));
                    }
                }
            }
            other => {
                return Err(self.error(ErrorKind::AmbiguousOrMissingChoice(format!(
                    "expected a choice, found {}",
                    other.type_name()
                ))));
            }
        };

        let Some((name, alternative)) = alternatives.iter().find(|(name, _)| name == label) else {
            return Err(self.error(ErrorKind::AmbiguousOrMissingChoice(format!(
                "unknown alternative `{label}`"
            ))));
        };
        log::debug!("choice `{}` encoding `{}`", self.path_string(), name);
        self.path.push(name.clone());
        let bytes = self.encode_node(alternative, inner, None, siblings)?;
        self.path.pop();
        Ok(bytes)
    }

    fn encode_contained(&mut self, schema: &SchemaRef, value: &Value) -> EncodeResult<Vec<u8>> {
        let node = self.bound_node(schema)?;
        self.encode_node(node, value, None, &Fields::new())
    }

    fn check_single_tlv(&self, raw: &[u8]) -> EncodeResult<()> {
        let mut cursor = Cursor::new(raw, self.config.encoding);
        self.at(cursor.read_raw_tlv())?;
        if cursor.remaining() > 0 {
            return Err(self.error(ErrorKind::TrailingData {
                remaining: cursor.remaining(),
            }));
        }
        Ok(())
    }

    fn resolve(&self, reference: &Reference, siblings: &Fields) -> EncodeResult<SchemaRef> {
        reference
            .resolve(siblings)
            .ok_or_else(|| self.error(ErrorKind::UnresolvedReference(reference.describe())))
    }

    fn bound_node<'s>(&self, schema: &'s SchemaRef) -> EncodeResult<&'s Node> {
        schema.get().ok_or_else(|| {
            self.error(ErrorKind::UnresolvedReference(format!(
                "`{}` is not bound",
                schema.name()
            )))
        })
    }

    fn path_string(&self) -> String {
        SchemaPath::new(self.path.clone()).to_string()
    }

    fn error(&self, kind: ErrorKind) -> EncodeError {
        EncodeError::new(kind, SchemaPath::new(self.path.clone()))
    }

    fn at<T>(&self, result: CodecResult<T>) -> EncodeResult<T> {
        result.map_err(|kind| self.error(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dermodel_core::BigInt;

    fn encode(node: &Node, value: &Value) -> EncodeResult<Vec<u8>> {
        Encoder::new(&CodecConfig::default()).encode(node, value)
    }

    fn map(pairs: Vec<(&str, Value)>) -> Value {
        Value::Map(pairs.into_iter().collect())
    }

    #[test]
    fn test_encode_primitives() {
        assert_eq!(encode(&Node::bool(), &Value::Bool(true)).unwrap(), vec![0x01, 0x01, 0xFF]);
        assert_eq!(
            encode(&Node::int(), &Value::Int(BigInt::from(128))).unwrap(),
            vec![0x02, 0x02, 0x00, 0x80]
        );
        assert_eq!(encode(&Node::null(), &Value::Null).unwrap(), vec![0x05, 0x00]);
    }

    #[test]
    fn test_encode_sequence_with_optional() {
        let node = Node::seq([("key", Node::bool()), ("opt", Node::bool().optional())]);
        let value = map(vec![("key", Value::Bool(true))]);
        assert_eq!(encode(&node, &value).unwrap(), vec![0x30, 0x03, 0x01, 0x01, 0xFF]);
    }

    #[test]
    fn test_default_omitted() {
        let node = Node::seq([
            ("a", Node::int()),
            ("b", Node::int().explicit(0).default(3i64)),
        ]);
        let value = map(vec![("a", Value::from(1i64)), ("b", Value::from(3i64))]);
        assert_eq!(encode(&node, &value).unwrap(), vec![0x30, 0x03, 0x02, 0x01, 0x01]);
    }

    #[test]
    fn test_missing_field() {
        let node = Node::seq([("a", Node::int()), ("b", Node::int())]);
        let err = encode(&node, &map(vec![("a", Value::from(1i64))])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingField("b".to_string()));
        assert_eq!(err.path.to_string(), "b");
    }

    #[test]
    fn test_invalid_value_path() {
        let node = Node::seq([("items", Node::seqof(Node::bool()))]);
        let value = map(vec![(
            "items",
            Value::Seq(vec![Value::Bool(true), Value::from(2i64)]),
        )]);
        let err = encode(&node, &value).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidValue { .. }));
        assert_eq!(err.path.to_string(), "items[1]");
    }

    #[test]
    fn test_choice_forms() {
        let node = Node::choice([("number", Node::int()), ("apple", Node::bool())]);
        let expected = vec![0x01, 0x01, 0xFF];
        assert_eq!(encode(&node, &Value::choice("apple", true)).unwrap(), expected);
        assert_eq!(
            encode(&node, &map(vec![("apple", Value::Bool(true))])).unwrap(),
            expected
        );

        let err = encode(
            &node,
            &map(vec![("apple", Value::Bool(true)), ("number", Value::from(1i64))]),
        )
        .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::AmbiguousOrMissingChoice(_)));

        let err = encode(&node, &Value::choice("pear", true)).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::AmbiguousOrMissingChoice(_)));

        let err = encode(&node, &map(vec![("pear", Value::Bool(true))])).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::AmbiguousOrMissingChoice(_)));
    }

    #[test]
    fn test_encoder_reuse_starts_at_root() {
        let config = CodecConfig::default();
        let mut encoder = Encoder::new(&config);
        let node = Node::seq([("a", Node::seq([("b", Node::int())]))]);

        let err = encoder
            .encode(&node, &map(vec![("a", map(vec![]))]))
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MissingField(_)));
        assert_eq!(err.path.to_string(), "a.b");

        let err = encoder.encode(&Node::bool(), &Value::Null).unwrap_err();
        assert_eq!(err.path.to_string(), "<root>");

        assert_eq!(
            encoder
                .encode(&node, &map(vec![("a", map(vec![("b", Value::from(7i64))]))]))
                .unwrap(),
            vec![0x30, 0x05, 0x30, 0x03, 0x02, 0x01, 0x07]
        );
    }

    #[test]
    fn test_tagging() {
        assert_eq!(
            encode(&Node::octstr().explicit(2), &Value::from("X")).unwrap(),
            vec![0xA2, 0x03, 0x04, 0x01, 0x58]
        );
        assert_eq!(
            encode(&Node::octstr().implicit(2), &Value::from("X")).unwrap(),
            vec![0x82, 0x01, 0x58]
        );
        let choice = Node::choice([("flag", Node::bool())]).implicit(1);
        assert_eq!(
            encode(&choice, &Value::choice("flag", false)).unwrap(),
            vec![0xA1, 0x03, 0x01, 0x01, 0x00]
        );
    }

    #[test]
    fn test_contains_octet_string() {
        let inner = SchemaRef::new("Inner", Node::seq([("n", Node::int())]));
        let node = Node::octstr().contains(inner);
        let value = map(vec![("n", Value::from(5i64))]);
        assert_eq!(
            encode(&node, &value).unwrap(),
            vec![0x04, 0x05, 0x30, 0x03, 0x02, 0x01, 0x05]
        );
        // Raw bytes are passed through untouched
        assert_eq!(
            encode(&node, &Value::Bytes(vec![0x05, 0x00])).unwrap(),
            vec![0x04, 0x02, 0x05, 0x00]
        );
    }

    #[test]
    fn test_any_requires_single_element() {
        let node = Node::any();
        assert_eq!(
            encode(&node, &Value::Bytes(vec![0x05, 0x00])).unwrap(),
            vec![0x05, 0x00]
        );
        let err = encode(&node, &Value::Bytes(vec![0x05, 0x00, 0x05, 0x00])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TrailingData { remaining: 2 });
    }

    #[test]
    fn test_dynamic_reference_sees_preceding_fields() {
        let node = Node::seq([
            ("kind", Node::int()),
            (
                "body",
                Node::switch(
                    "kind",
                    [
                        ("1", SchemaRef::new("Flag", Node::bool())),
                        ("2", SchemaRef::new("Text", Node::utf8str())),
                    ],
                ),
            ),
        ]);
        let value = map(vec![("kind", Value::from(2i64)), ("body", Value::from("hi"))]);
        assert_eq!(
            encode(&node, &value).unwrap(),
            vec![0x30, 0x07, 0x02, 0x01, 0x02, 0x0C, 0x02, 0x68, 0x69]
        );

        let value = map(vec![("kind", Value::from(3i64)), ("body", Value::from("hi"))]);
        let err = encode(&node, &value).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnresolvedReference(_)));
    }
}
