use std::sync::Arc;

use super::{flatten_into, StructAttrAccumulator};
use crate::{
    error::LineError,
    model::{AttrMap, Structure},
};

// only the innermost structure may be closed
#[derive(Debug, Default)]
pub struct StackAccumulator {
    items: Vec<Structure>,
    cached_attrs: Arc<AttrMap>,
    dirty: bool,
}

impl StackAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top(&self) -> Option<&Structure> {
        self.items.last()
    }
}

impl StructAttrAccumulator for StackAccumulator {
    fn begin(&mut self, structure: Structure) -> Result<(), LineError> {
        self.items.push(structure);
        self.dirty = true;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<Structure, LineError> {
        match self.items.pop() {
            None => Err(LineError::UnopenedTag {
                name: name.to_owned(),
            }),
            Some(top) if top.name != name => {
                let expected = top.name.clone();
                self.items.push(top);
                Err(LineError::UnbalancedTag {
                    expected,
                    found: name.to_owned(),
                })
            }
            Some(top) => {
                self.dirty = true;
                Ok(top)
            }
        }
    }

    fn current_attrs(&mut self) -> Arc<AttrMap> {
        if self.dirty {
            // from the innermost frame outwards; an outer structure of the
            // same name wins
            let mut attrs = AttrMap::new();
            for item in self.items.iter().rev() {
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
