//! Schema node tree

use crate::ber::types::{BerTag, BerTagClass};
use crate::schema::reference::{Reference, SchemaRef};
use dermodel_core::{BigInt, Value};
use std::collections::HashMap;

/// Leaf types and their universal tag numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Int,
    BitStr,
    OctStr,
    Null,
    ObjId,
    ObjDesc,
    Real,
    Enum,
    Utf8Str,
    NumStr,
    PrintStr,
    T61Str,
    Ia5Str,
    UtcTime,
    GenTime,
    GraphicStr,
    Iso646Str,
    GeneralStr,
    BmpStr,
}

impl PrimitiveKind {
    pub fn universal_tag(self) -> u32 {
        match self {
            PrimitiveKind::Bool => 1,
            PrimitiveKind::Int => 2,
            PrimitiveKind::BitStr => 3,
            PrimitiveKind::OctStr => 4,
            PrimitiveKind::Null => 5,
            PrimitiveKind::ObjId => 6,
            PrimitiveKind::ObjDesc => 7,
            PrimitiveKind::Real => 9,
            PrimitiveKind::Enum => 10,
            PrimitiveKind::Utf8Str => 12,
            PrimitiveKind::NumStr => 18,
            PrimitiveKind::PrintStr => 19,
            PrimitiveKind::T61Str => 20,
            PrimitiveKind::Ia5Str => 22,
            PrimitiveKind::UtcTime => 23,
            PrimitiveKind::GenTime => 24,
            PrimitiveKind::GraphicStr => 25,
            PrimitiveKind::Iso646Str => 26,
            PrimitiveKind::GeneralStr => 27,
            PrimitiveKind::BmpStr => 30,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "BOOLEAN",
            PrimitiveKind::Int => "INTEGER",
            PrimitiveKind::BitStr => "BIT STRING",
            PrimitiveKind::OctStr => "OCTET STRING",
            PrimitiveKind::Null => "NULL",
            PrimitiveKind::ObjId => "OBJECT IDENTIFIER",
            PrimitiveKind::ObjDesc => "ObjectDescriptor",
            PrimitiveKind::Real => "REAL",
            PrimitiveKind::Enum => "ENUMERATED",
            PrimitiveKind::Utf8Str => "UTF8String",
            PrimitiveKind::NumStr => "NumericString",
            PrimitiveKind::PrintStr => "PrintableString",
            PrimitiveKind::T61Str => "T61String",
            PrimitiveKind::Ia5Str => "IA5String",
            PrimitiveKind::UtcTime => "UTCTime",
            PrimitiveKind::GenTime => "GeneralizedTime",
            PrimitiveKind::GraphicStr => "GraphicString",
            PrimitiveKind::Iso646Str => "VisibleString",
            PrimitiveKind::GeneralStr => "GeneralString",
            PrimitiveKind::BmpStr => "BMPString",
        }
    }

    /// Kinds whose content length may be constrained with `size`
    pub fn is_sized(self) -> bool {
        !matches!(
            self,
            PrimitiveKind::Bool
                | PrimitiveKind::Int
                | PrimitiveKind::Enum
                | PrimitiveKind::Null
                | PrimitiveKind::Real
                | PrimitiveKind::ObjId
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(self, PrimitiveKind::Int | PrimitiveKind::Enum)
    }

    pub fn accepts_labels(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int | PrimitiveKind::Enum | PrimitiveKind::ObjId
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositeKind {
    Seq,
    Set,
}

impl CompositeKind {
    pub fn universal_tag(self) -> u32 {
        match self {
            CompositeKind::Seq => 16,
            CompositeKind::Set => 17,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeatedKind {
    SeqOf,
    SetOf,
}

impl RepeatedKind {
    pub fn universal_tag(self) -> u32 {
        match self {
            RepeatedKind::SeqOf => 16,
            RepeatedKind::SetOf => 17,
        }
    }
}

/// Tag replacing (implicit) or wrapping (explicit) a node's natural tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagOverride {
    Implicit(BerTagClass, u32),
    Explicit(BerTagClass, u32),
}

impl TagOverride {
    pub fn class(&self) -> BerTagClass {
        match self {
            TagOverride::Implicit(class, _) | TagOverride::Explicit(class, _) => *class,
        }
    }

    pub fn number(&self) -> u32 {
        match self {
            TagOverride::Implicit(_, number) | TagOverride::Explicit(_, number) => *number,
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, TagOverride::Explicit(..))
    }

    /// Constructed wire tag of an explicit wrapper
    pub fn wrapper_tag(&self) -> BerTag {
        BerTag::new(self.class(), true, self.number())
    }
}

/// Two-way mapping between wire values and symbolic labels
///
/// Wire values are keyed by their string form: dotted notation for object
/// identifiers, decimal for integers and enumerations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels {
    to_label: HashMap<String, String>,
    to_key: HashMap<String, String>,
    duplicates: Vec<String>,
}

impl Labels {
    pub fn new<I, K, L>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, L)>,
        K: Into<String>,
        L: Into<String>,
    {
        let mut labels = Labels::default();
        for (key, label) in pairs {
            let (key, label) = (key.into(), label.into());
            if labels.to_key.contains_key(&label) || labels.to_label.contains_key(&key) {
                labels.duplicates.push(label.clone());
            }
            labels.to_key.insert(label.clone(), key.clone());
            labels.to_label.insert(key, label);
        }
        labels
    }

    pub fn label_for(&self, key: &str) -> Option<&str> {
        self.to_label.get(key).map(String::as_str)
    }

    pub fn key_for(&self, label: &str) -> Option<&str> {
        self.to_key.get(label).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.to_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_label.is_empty()
    }

    /// Labels or keys that were given more than once
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }
}

/// Size, value range and label constraints of a node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    /// Inclusive byte length bounds of primitive content, or element count of a repetition
    pub size: Option<(usize, usize)>,
    pub range: Option<(BigInt, BigInt)>,
    pub labels: Option<Labels>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.size.is_none() && self.range.is_none() && self.labels.is_none()
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Primitive(PrimitiveKind),
    Composite(CompositeKind, Vec<(String, Node)>),
    Repeated(RepeatedKind, Box<Node>),
    Choice(Vec<(String, Node)>),
    Reference(Reference),
    Any,
}

/// One node of a schema tree
///
/// Built with the constructors and modifier methods in
/// [`builder`](crate::schema::builder); immutable afterwards.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) tag: Option<TagOverride>,
    pub(crate) optional: bool,
    pub(crate) default: Option<Value>,
    pub(crate) constraints: Constraints,
    pub(crate) contains: Option<SchemaRef>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            tag: None,
            optional: false,
            default: None,
            constraints: Constraints::default(),
            contains: None,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn tag_override(&self) -> Option<TagOverride> {
        self.tag
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub fn contained(&self) -> Option<&SchemaRef> {
        self.contains.as_ref()
    }

    /// Tag the node has on the wire when no override applies
    ///
    /// `None` for CHOICE, Any and references, whose tag depends on the
    /// selected alternative, the input, or the target.
    pub fn natural_tag(&self) -> Option<BerTag> {
        match &self.kind {
            NodeKind::Primitive(kind) => Some(BerTag::universal(false, kind.universal_tag())),
            NodeKind::Composite(kind, _) => Some(BerTag::universal(true, kind.universal_tag())),
            NodeKind::Repeated(kind, _) => Some(BerTag::universal(true, kind.universal_tag())),
            NodeKind::Choice(_) | NodeKind::Reference(_) | NodeKind::Any => None,
        }
    }

    /// Short human-readable description used in error messages
    pub fn describe(&self) -> String {
        match &self.kind {
            NodeKind::Primitive(kind) => kind.name().to_string(),
            NodeKind::Composite(CompositeKind::Seq, _) => "SEQUENCE".to_string(),
            NodeKind::Composite(CompositeKind::Set, _) => "SET".to_string(),
            NodeKind::Repeated(RepeatedKind::SeqOf, _) => "SEQUENCE OF".to_string(),
            NodeKind::Repeated(RepeatedKind::SetOf, _) => "SET OF".to_string(),
            NodeKind::Choice(_) => "CHOICE".to_string(),
            NodeKind::Reference(reference) => reference.describe(),
            NodeKind::Any => "ANY".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universal_tags() {
        assert_eq!(PrimitiveKind::Bool.universal_tag(), 1);
        assert_eq!(PrimitiveKind::Iso646Str.universal_tag(), 26);
        assert_eq!(PrimitiveKind::BmpStr.universal_tag(), 30);
        assert_eq!(CompositeKind::Set.universal_tag(), 17);
    }

    #[test]
    fn test_labels_both_ways() {
        let labels = Labels::new([("1.2.840.113549.1.1.1", "rsaEncryption"), ("2.5.4.3", "cn")]);
        assert_eq!(labels.label_for("2.5.4.3"), Some("cn"));
        assert_eq!(labels.key_for("rsaEncryption"), Some("1.2.840.113549.1.1.1"));
        assert_eq!(labels.label_for("2.5.4.4"), None);
        assert!(labels.duplicates().is_empty());

        let clashing = Labels::new([("0", "off"), ("1", "off")]);
        assert_eq!(clashing.duplicates(), &["off".to_string()]);
    }

    #[test]
    fn test_natural_tag() {
        let node = Node::new(NodeKind::Primitive(PrimitiveKind::OctStr));
        assert_eq!(node.natural_tag(), Some(BerTag::universal(false, 4)));
        assert_eq!(Node::new(NodeKind::Any).natural_tag(), None);
    }
}
