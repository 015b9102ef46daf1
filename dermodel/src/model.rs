//! Named models

use dermodel_ber::{CodecConfig, Node, SchemaRef, engine};
use dermodel_core::{
    DecodeError, DecodeResult, EncodeError, EncodeResult, ErrorKind, SchemaError, SchemaPath,
    Value,
};

/// A validated schema with a name
///
/// Cloning is cheap; clones share the underlying schema tree.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    schema: SchemaRef,
}

impl Model {
    /// Build and validate a model
    ///
    /// The closure receives the model's own handle, which can be referenced
    /// from inside the tree for recursive structures.
    ///
    /// ```
    /// use dermodel::{Model, Node};
    ///
    /// let tree = Model::define("Tree", |this| {
    ///     Node::seq([
    ///         ("leaf", Node::bool()),
    ///         ("child", Node::reference(this.clone()).optional()),
    ///     ])
    /// })?;
    /// assert!(tree.decode(&[0x30, 0x03, 0x01, 0x01, 0x00]).is_ok());
    /// # Ok::<(), dermodel::DermodelError>(())
    /// ```
    pub fn define<F>(name: impl Into<String>, build: F) -> Result<Self, SchemaError>
    where
        F: FnOnce(&SchemaRef) -> Node,
    {
        let name = name.into();
        let schema = SchemaRef::deferred(name.clone());
        let node = build(&schema);
        node.validate()?;
        schema.bind(node)?;
        log::debug!("defined model `{}`", name);
        Ok(Self { name, schema })
    }

    /// Wrap an already built tree
    pub fn from_node(name: impl Into<String>, node: Node) -> Result<Self, SchemaError> {
        Self::define(name, |_| node)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Decode DER input
    pub fn decode(&self, input: &[u8]) -> DecodeResult<Value> {
        self.decode_with(input, &CodecConfig::default())
    }

    pub fn decode_with(&self, input: &[u8], config: &CodecConfig) -> DecodeResult<Value> {
        let node = self.schema.get().ok_or_else(|| {
            DecodeError::new(self.unbound(), SchemaPath::root(), 0)
        })?;
        engine::decode(node, input, config)
    }

    /// Encode as DER
    pub fn encode(&self, value: &Value) -> EncodeResult<Vec<u8>> {
        self.encode_with(value, &CodecConfig::default())
    }

    pub fn encode_with(&self, value: &Value, config: &CodecConfig) -> EncodeResult<Vec<u8>> {
        let node = self
            .schema
            .get()
            .ok_or_else(|| EncodeError::new(self.unbound(), SchemaPath::root()))?;
        engine::encode(node, value, config)
    }

    fn unbound(&self) -> ErrorKind {
        ErrorKind::UnresolvedReference(format!("`{}` is not bound", self.name))
    }
}

impl From<Model> for SchemaRef {
    fn from(model: Model) -> Self {
        model.schema
    }
}

impl From<&Model> for SchemaRef {
    fn from(model: &Model) -> Self {
        model.schema.clone()
    }
}
