//! Registry of named models

use crate::model::Model;
use dermodel_ber::{CodecConfig, Node, SchemaRef};
use dermodel_core::{DermodelError, DermodelResult, SchemaError, Value};
use std::collections::BTreeMap;

/// Models addressed by name, sharing one codec configuration
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, Model>,
    config: CodecConfig,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Define a model and register it under `name`
    pub fn define<F>(&mut self, name: impl Into<String>, build: F) -> Result<&Model, SchemaError>
    where
        F: FnOnce(&SchemaRef) -> Node,
    {
        let name = name.into();
        if self.models.contains_key(&name) {
            return Err(SchemaError::DuplicateModel(name));
        }
        let model = Model::define(name.clone(), build)?;
        Ok(self.models.entry(name).or_insert(model))
    }

    pub fn register(&mut self, model: Model) -> Result<(), SchemaError> {
        if self.models.contains_key(model.name()) {
            return Err(SchemaError::DuplicateModel(model.name().to_string()));
        }
        log::debug!("registered model `{}`", model.name());
        self.models.insert(model.name().to_string(), model);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn decode(&self, name: &str, input: &[u8]) -> DermodelResult<Value> {
        let model = self.lookup(name)?;
        Ok(model.decode_with(input, &self.config)?)
    }

    pub fn encode(&self, name: &str, value: &Value) -> DermodelResult<Vec<u8>> {
        let model = self.lookup(name)?;
        Ok(model.encode_with(value, &self.config)?)
    }

    fn lookup(&self, name: &str) -> DermodelResult<&Model> {
        self.get(name)
            .ok_or_else(|| DermodelError::UnknownModel(name.to_string()))
    }
}
