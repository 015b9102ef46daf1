//! Shareable handles to schema nodes and data-dependent resolution

use crate::schema::node::Node;
use dermodel_core::{Fields, SchemaError};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

struct Slot {
    name: String,
    node: OnceCell<Node>,
}

/// Handle to a named schema node, cheap to clone
///
/// A handle can be created before its node exists ([`SchemaRef::deferred`])
/// and bound exactly once later, which is how self-referencing and
/// forward-declared models are built.
#[derive(Clone)]
pub struct SchemaRef {
    slot: Arc<Slot>,
}

impl SchemaRef {
    pub fn new(name: impl Into<String>, node: Node) -> Self {
        Self {
            slot: Arc::new(Slot {
                name: name.into(),
                node: OnceCell::with_value(node),
            }),
        }
    }

    pub fn deferred(name: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Slot {
                name: name.into(),
                node: OnceCell::new(),
            }),
        }
    }

    /// Attach the node of a deferred handle
    pub fn bind(&self, node: Node) -> Result<(), SchemaError> {
        self.slot
            .node
            .set(node)
            .map_err(|_| SchemaError::AlreadyBound(self.slot.name.clone()))
    }

    pub fn get(&self) -> Option<&Node> {
        self.slot.node.get()
    }

    pub fn is_bound(&self) -> bool {
        self.slot.node.get().is_some()
    }

    pub fn name(&self) -> &str {
        &self.slot.name
    }

    pub fn ptr_eq(&self, other: &SchemaRef) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl From<Node> for SchemaRef {
    fn from(node: Node) -> Self {
        SchemaRef::new("<anonymous>", node)
    }
}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRef")
            .field("name", &self.slot.name)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Picks a schema from the fields already decoded in the enclosing composite
pub type Resolver = Arc<dyn Fn(&Fields) -> Option<SchemaRef> + Send + Sync>;

#[derive(Clone)]
pub enum Reference {
    Fixed(SchemaRef),
    Dynamic(Resolver),
}

impl Reference {
    pub fn dynamic<F>(resolver: F) -> Self
    where
        F: Fn(&Fields) -> Option<SchemaRef> + Send + Sync + 'static,
    {
        Reference::Dynamic(Arc::new(resolver))
    }

    /// Resolver keyed on the string form of a sibling field
    ///
    /// Strings match as-is, integers in decimal, booleans as `true` or
    /// `false` and object identifiers in dotted form.
    pub fn switch<K, I, S>(key: impl Into<String>, cases: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<SchemaRef>,
    {
        let key = key.into();
        let cases: HashMap<String, SchemaRef> = cases
            .into_iter()
            .map(|(k, s)| (k.into(), s.into()))
            .collect();
        Reference::dynamic(move |fields| {
            let selector = fields.get(&key)?.key_string()?;
            cases.get(&selector).cloned()
        })
    }

    /// Resolve against the sibling fields
    pub fn resolve(&self, siblings: &Fields) -> Option<SchemaRef> {
        match self {
            Reference::Fixed(schema) => Some(schema.clone()),
            Reference::Dynamic(resolver) => resolver(siblings),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Reference::Fixed(schema) => schema.name().to_string(),
            Reference::Dynamic(_) => "<dynamic>".to_string(),
        }
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Fixed(schema) => f.debug_tuple("Fixed").field(schema).finish(),
            Reference::Dynamic(_) => f.debug_tuple("Dynamic").finish(),
        }
    }
}
