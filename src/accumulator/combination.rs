use std::{collections::HashMap, sync::Arc};

use super::{flatten_into, StructAttrAccumulator};
use crate::{
    error::LineError,
    model::{AttrMap, Structure},
};

// structures may overlap, but never two of the same name
#[derive(Debug, Default)]
pub struct CombinationAccumulator {
    items: HashMap<String, Structure>,
    cached_attrs: Arc<AttrMap>,
    dirty: bool,
}

impl CombinationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Structure> {
        self.items.get(name)
    }
}

impl StructAttrAccumulator for CombinationAccumulator {
    fn begin(&mut self, structure: Structure) -> Result<(), LineError> {
        if self.items.contains_key(&structure.name) {
            return Err(LineError::DuplicateStructure {
                name: structure.name,
            });
        }
        self.items.insert(structure.name.clone(), structure);
        self.dirty = true;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<Structure, LineError> {
        let structure = self.items.remove(name).ok_or_else(|| LineError::UnopenedTag {
            name: name.to_owned(),
        })?;
        self.dirty = true;
        Ok(structure)
    }

    fn current_attrs(&mut self) -> Arc<AttrMap> {
        if self.dirty {
            let mut attrs = AttrMap::new();
            for item in self.items.values() {
                flatten_into(&mut attrs, item);
            }
            self.cached_attrs = Arc::new(attrs);
            self.dirty = false;
        }
        Arc::clone(&self.cached_attrs)
    }

    fn depth(&self) -> usize {
        self.items.len()
    }
}
