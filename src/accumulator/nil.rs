use std::sync::Arc;

use tracing::warn;

use super::StructAttrAccumulator;
use crate::{
    error::LineError,
    model::{AttrMap, Structure},
};

#[derive(Debug)]
pub struct NilAccumulator {
    empty: Arc<AttrMap>,
}

impl NilAccumulator {
    pub fn new() -> Self {
        warn!("using nil structural attribute accumulator, tokens will carry no structural attributes");
        NilAccumulator {
            empty: Arc::new(AttrMap::new()),
        }
    }
}

impl Default for NilAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl StructAttrAccumulator for NilAccumulator {
    fn begin(&mut self, _structure: Structure) -> Result<(), LineError> {
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<Structure, LineError> {
        Ok(Structure::new(name, AttrMap::new()))
    }

    fn current_attrs(&mut self) -> Arc<AttrMap> {
        Arc::clone(&self.empty)
    }

    fn depth(&self) -> usize {
        0
    }
}
