use std::collections::HashMap;

use crate::ast::Payload;
use crate::error::SymbolError;
use crate::source_map::PayloadSourceMap;

/// A resource model registered under its resource's name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    pub payload: Payload,
    pub source_map: PayloadSourceMap,
}

/// Resource models by symbol name, for `[Name][]` references.
#[derive(Debug, Clone, Default)]
pub struct ModelTable {
    models: HashMap<String, Model>,
}

impl ModelTable {
    pub fn define(&mut self, name: &str, model: Model) -> Result<(), SymbolError> {
        if self.models.contains_key(name) {
            return Err(SymbolError::AlreadyDefined(name.to_string()));
        }
        self.models.insert(name.to_string(), model);
        Ok(())
    }

    /// Replaces an existing definition, e.g. after a dangling body was added.
    pub fn update(&mut self, name: &str, model: Model) {
        if let Some(existing) = self.models.get_mut(name) {
            *existing = model;
        }
    }

    pub fn resolve(&self, name: &str) -> Result<&Model, SymbolError> {
        self.models
            .get(name)
            .ok_or_else(|| SymbolError::Undefined(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(body: &str) -> Model {
        Model {
            payload: Payload {
                name: "Note".to_string(),
                body: body.to_string(),
                ..Payload::default()
            },
            source_map: PayloadSourceMap::default(),
        }
    }

    #[test]
    fn symbols_are_defined_once() {
        let mut table = ModelTable::default();
        assert_eq!(table.define("Note", model("{}")), Ok(()));
        assert_eq!(
            table.define("Note", model("[]")),
            Err(SymbolError::AlreadyDefined("Note".to_string()))
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn update_replaces_known_symbols_only() {
        let mut table = ModelTable::default();
        table.update("Note", model("{}"));
        assert!(table.is_empty());

        table.define("Note", model("{}")).unwrap();
        table.update("Note", model("{\"a\": 1}"));
        assert_eq!(table.resolve("Note").unwrap().payload.body, "{\"a\": 1}");
        assert_eq!(
            table.resolve("Task"),
            Err(SymbolError::Undefined("Task".to_string()))
        );
    }
}
