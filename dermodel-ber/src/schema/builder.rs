//! Schema construction
//!
//! Nodes are built with a constructor per ASN.1 type and refined with
//! by-value modifier methods:
//!
//! ```
//! use dermodel_ber::Node;
//!
//! let certificate_version = Node::seq([
//!     ("version", Node::int().explicit(0).default(0i64)),
//!     ("serial", Node::int()),
//!     ("issuerUid", Node::bitstr().implicit(1).optional()),
//! ]);
//! assert!(certificate_version.validate().is_ok());
//! ```

use crate::ber::types::BerTagClass;
use crate::schema::node::{
    CompositeKind, Labels, Node, NodeKind, PrimitiveKind, RepeatedKind, TagOverride,
};
use crate::schema::reference::{Reference, SchemaRef};
use dermodel_core::{BigInt, Fields, SchemaError, SchemaPath, Value};
use std::collections::HashSet;

impl Node {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Node::new(NodeKind::Primitive(kind))
    }

    pub fn bool() -> Self {
        Node::primitive(PrimitiveKind::Bool)
    }

    pub fn int() -> Self {
        Node::primitive(PrimitiveKind::Int)
    }

    pub fn bitstr() -> Self {
        Node::primitive(PrimitiveKind::BitStr)
    }

    pub fn octstr() -> Self {
        Node::primitive(PrimitiveKind::OctStr)
    }

    pub fn null() -> Self {
        Node::primitive(PrimitiveKind::Null)
    }

    pub fn objid() -> Self {
        Node::primitive(PrimitiveKind::ObjId)
    }

    pub fn objdesc() -> Self {
        Node::primitive(PrimitiveKind::ObjDesc)
    }

    pub fn real() -> Self {
        Node::primitive(PrimitiveKind::Real)
    }

    pub fn enumerated() -> Self {
        Node::primitive(PrimitiveKind::Enum)
    }

    pub fn utf8str() -> Self {
        Node::primitive(PrimitiveKind::Utf8Str)
    }

    pub fn numstr() -> Self {
        Node::primitive(PrimitiveKind::NumStr)
    }

    pub fn printstr() -> Self {
        Node::primitive(PrimitiveKind::PrintStr)
    }

    pub fn t61str() -> Self {
        Node::primitive(PrimitiveKind::T61Str)
    }

    pub fn ia5str() -> Self {
        Node::primitive(PrimitiveKind::Ia5Str)
    }

    pub fn utctime() -> Self {
        Node::primitive(PrimitiveKind::UtcTime)
    }

    pub fn gentime() -> Self {
        Node::primitive(PrimitiveKind::GenTime)
    }

    pub fn graphicstr() -> Self {
        Node::primitive(PrimitiveKind::GraphicStr)
    }

    pub fn iso646str() -> Self {
        Node::primitive(PrimitiveKind::Iso646Str)
    }

    pub fn generalstr() -> Self {
        Node::primitive(PrimitiveKind::GeneralStr)
    }

    pub fn bmpstr() -> Self {
        Node::primitive(PrimitiveKind::BmpStr)
    }

    pub fn any() -> Self {
        Node::new(NodeKind::Any)
    }

    pub fn seq<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Node)>,
        K: Into<String>,
    {
        Node::composite(CompositeKind::Seq, fields)
    }

    pub fn set<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Node)>,
        K: Into<String>,
    {
        Node::composite(CompositeKind::Set, fields)
    }

    fn composite<I, K>(kind: CompositeKind, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Node)>,
        K: Into<String>,
    {
        let fields = fields.into_iter().map(|(k, n)| (k.into(), n)).collect();
        Node::new(NodeKind::Composite(kind, fields))
    }

    pub fn seqof(element: Node) -> Self {
        Node::new(NodeKind::Repeated(RepeatedKind::SeqOf, Box::new(element)))
    }

    pub fn setof(element: Node) -> Self {
        Node::new(NodeKind::Repeated(RepeatedKind::SetOf, Box::new(element)))
    }

    pub fn choice<I, K>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = (K, Node)>,
        K: Into<String>,
    {
        let alternatives = alternatives
            .into_iter()
            .map(|(k, n)| (k.into(), n))
            .collect();
        Node::new(NodeKind::Choice(alternatives))
    }

    /// Use another schema in place
    pub fn reference(schema: impl Into<SchemaRef>) -> Self {
        Node::new(NodeKind::Reference(Reference::Fixed(schema.into())))
    }

    /// Schema chosen from the fields decoded so far in the enclosing composite
    pub fn dynamic<F>(resolver: F) -> Self
    where
        F: Fn(&Fields) -> Option<SchemaRef> + Send + Sync + 'static,
    {
        Node::new(NodeKind::Reference(Reference::dynamic(resolver)))
    }

    /// Schema chosen by the string form of the sibling field `key`
    pub fn switch<K, I, S>(key: impl Into<String>, cases: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<SchemaRef>,
    {
        Node::new(NodeKind::Reference(Reference::switch(key, cases)))
    }

    /// Context-specific implicit tag
    pub fn implicit(self, number: u32) -> Self {
        self.implicit_tag(BerTagClass::ContextSpecific, number)
    }

    /// Context-specific explicit tag
    pub fn explicit(self, number: u32) -> Self {
        self.explicit_tag(BerTagClass::ContextSpecific, number)
    }

    pub fn implicit_tag(mut self, class: BerTagClass, number: u32) -> Self {
        self.tag = Some(TagOverride::Implicit(class, number));
        self
    }

    pub fn explicit_tag(mut self, class: BerTagClass, number: u32) -> Self {
        self.tag = Some(TagOverride::Explicit(class, number));
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Default value; implies `optional`
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.optional = true;
        self.default = Some(value.into());
        self
    }

    /// Exact content length (or element count for repetitions)
    pub fn size(self, size: usize) -> Self {
        self.size_range(size, size)
    }

    pub fn size_range(mut self, min: usize, max: usize) -> Self {
        self.constraints.size = Some((min, max));
        self
    }

    /// Inclusive integer value range
    pub fn range(mut self, min: impl Into<BigInt>, max: impl Into<BigInt>) -> Self {
        self.constraints.range = Some((min.into(), max.into()));
        self
    }

    /// Value to label table for INTEGER, ENUMERATED and OBJECT IDENTIFIER
    pub fn labels<I, K, L>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, L)>,
        K: Into<String>,
        L: Into<String>,
    {
        self.constraints.labels = Some(Labels::new(pairs));
        self
    }

    /// Payload of an OCTET STRING, BIT STRING or Any is itself encoded with `schema`
    pub fn contains(mut self, schema: impl Into<SchemaRef>) -> Self {
        self.contains = Some(schema.into());
        self
    }

    /// Check the tree for duplicate keys and labels and ill-placed constraints
    ///
    /// References are not followed; each referenced model is validated by
    /// whoever defines it.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut path = Vec::new();
        self.validate_at(&mut path)
    }

    fn validate_at(&self, path: &mut Vec<String>) -> Result<(), SchemaError> {
        let here = |path: &Vec<String>| SchemaPath::new(path.clone());
        let invalid = |reason: &str, path: &Vec<String>| SchemaError::InvalidConstraint {
            reason: reason.to_string(),
            path: here(path),
        };

        let primitive = match &self.kind {
            NodeKind::Primitive(kind) => Some(*kind),
            _ => None,
        };

        if let Some((min, max)) = self.constraints.size {
            let sized = primitive.is_some_and(PrimitiveKind::is_sized)
                || matches!(self.kind, NodeKind::Repeated(..));
            if !sized {
                return Err(invalid("size applies to strings and repetitions", path));
            }
            if min > max {
                return Err(invalid("size minimum exceeds maximum", path));
            }
        }

        if let Some((min, max)) = &self.constraints.range {
            if !primitive.is_some_and(PrimitiveKind::is_integer) {
                return Err(invalid("range applies to INTEGER and ENUMERATED", path));
            }
            if min > max {
                return Err(invalid("range minimum exceeds maximum", path));
            }
        }

        if let Some(labels) = &self.constraints.labels {
            if !primitive.is_some_and(PrimitiveKind::accepts_labels) {
                return Err(invalid(
                    "labels apply to INTEGER, ENUMERATED and OBJECT IDENTIFIER",
                    path,
                ));
            }
            if let Some(label) = labels.duplicates().first() {
                return Err(SchemaError::DuplicateLabel {
                    label: label.clone(),
                    path: here(path),
                });
            }
        }

        if self.contains.is_some()
            && !matches!(
                self.kind,
                NodeKind::Primitive(PrimitiveKind::OctStr | PrimitiveKind::BitStr) | NodeKind::Any
            )
        {
            return Err(invalid(
                "contains applies to OCTET STRING, BIT STRING and ANY",
                path,
            ));
        }

        match &self.kind {
            NodeKind::Composite(_, fields) => {
                let mut seen = HashSet::new();
                for (key, child) in fields {
                    if !seen.insert(key.as_str()) {
                        return Err(SchemaError::DuplicateKey {
                            key: key.clone(),
                            path: here(path),
                        });
                    }
                    path.push(key.clone());
                    child.validate_at(path)?;
                    path.pop();
                }
            }
            NodeKind::Choice(alternatives) => {
                if alternatives.is_empty() {
                    return Err(SchemaError::EmptyChoice(here(path)));
                }
                let mut seen = HashSet::new();
                for (label, alternative) in alternatives {
                    if !seen.insert(label.as_str()) {
                        return Err(SchemaError::DuplicateLabel {
                            label: label.clone(),
                            path: here(path),
                        });
                    }
                    path.push(label.clone());
                    alternative.validate_at(path)?;
                    path.pop();
                }
            }
            NodeKind::Repeated(_, element) => {
                path.push("[]".to_string());
                element.validate_at(path)?;
                path.pop();
            }
            NodeKind::Primitive(_) | NodeKind::Reference(_) | NodeKind::Any => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers() {
        let node = Node::int().explicit(3).default(7i64).range(0, 100);
        assert_eq!(
            node.tag_override(),
            Some(TagOverride::Explicit(BerTagClass::ContextSpecific, 3))
        );
        assert!(node.is_optional());
        assert_eq!(node.default_value(), Some(&Value::from(7i64)));
        assert_eq!(
            node.constraints().range,
            Some((BigInt::from(0), BigInt::from(100)))
        );
    }

    #[test]
    fn test_last_tag_override_wins() {
        let node = Node::octstr().explicit(1).implicit(2);
        assert_eq!(
            node.tag_override(),
            Some(TagOverride::Implicit(BerTagClass::ContextSpecific, 2))
        );
    }

    #[test]
    fn test_validate_duplicate_key() {
        let node = Node::seq([
            ("a", Node::int()),
            ("inner", Node::seq([("b", Node::bool()), ("b", Node::null())])),
        ]);
        match node.validate() {
            Err(SchemaError::DuplicateKey { key, path }) => {
                assert_eq!(key, "b");
                assert_eq!(path.to_string(), "inner");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_validate_choice() {
        assert!(matches!(
            Node::choice(Vec::<(String, Node)>::new()).validate(),
            Err(SchemaError::EmptyChoice(_))
        ));
        assert!(matches!(
            Node::choice([("x", Node::int()), ("x", Node::bool())]).validate(),
            Err(SchemaError::DuplicateLabel { .. })
        ));
    }

    #[test]
    fn test_validate_constraints() {
        assert!(Node::octstr().size_range(3, 7).validate().is_ok());
        assert!(Node::seqof(Node::int()).size_range(1, 4).validate().is_ok());
        assert!(Node::bool().size(1).validate().is_err());
        assert!(Node::octstr().size_range(7, 3).validate().is_err());
        assert!(Node::octstr().range(0, 1).validate().is_err());
        assert!(Node::int().range(5, 1).validate().is_err());
        assert!(Node::bool().labels([("1", "yes")]).validate().is_err());
        assert!(Node::int().contains(Node::int()).validate().is_err());
        assert!(Node::octstr().contains(Node::int()).validate().is_ok());
        assert!(matches!(
            Node::enumerated()
                .labels([("0", "off"), ("1", "off")])
                .validate(),
            Err(SchemaError::DuplicateLabel { .. })
        ));
    }
}
