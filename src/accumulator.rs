// 構造属性の蓄積
//
// Three interchangeable ways of keeping track of the structures which are
// open at the current line:
// - stack: strict xml-like nesting
// - combination: structures may overlap, but a name can be open only once
// - nil: no tracking at all (tokens get no structural attributes)

mod combination;
mod nil;
mod stack;

use std::{fmt, str::FromStr, sync::Arc};

pub use combination::CombinationAccumulator;
pub use nil::NilAccumulator;
pub use stack::StackAccumulator;

use crate::{
    error::{Error, LineError},
    model::{AttrMap, Structure},
};

pub trait StructAttrAccumulator {
    fn begin(&mut self, structure: Structure) -> Result<(), LineError>;

    fn end(&mut self, name: &str) -> Result<Structure, LineError>;

    // e.g. `doc.author => Isaac Asimov`
    fn current_attrs(&mut self) -> Arc<AttrMap>;

    fn depth(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccumulatorType {
    #[default]
    Stack,
    Combination,
    Nil,
}

impl AccumulatorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccumulatorType::Stack => "stack",
            AccumulatorType::Combination => "comb",
            AccumulatorType::Nil => "nil",
        }
    }
}

impl fmt::Display for AccumulatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccumulatorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "" | "stack" => Ok(AccumulatorType::Stack),
            "comb" | "combination" => Ok(AccumulatorType::Combination),
            "nil" | "none" => Ok(AccumulatorType::Nil),
            s => Err(Error::Config(format!("unknown accumulator type: {:?}", s))),
        }
    }
}

#[derive(Debug)]
pub enum Accumulator {
    Stack(StackAccumulator),
    Combination(CombinationAccumulator),
    Nil(NilAccumulator),
}

impl Accumulator {
    pub fn new(kind: AccumulatorType) -> Self {
        match kind {
            AccumulatorType::Stack => Accumulator::Stack(StackAccumulator::new()),
            AccumulatorType::Combination => {
                Accumulator::Combination(CombinationAccumulator::new())
            }
            AccumulatorType::Nil => Accumulator::Nil(NilAccumulator::new()),
        }
    }

    pub fn kind(&self) -> AccumulatorType {
        match self {
            Accumulator::Stack(_) => AccumulatorType::Stack,
            Accumulator::Combination(_) => AccumulatorType::Combination,
            Accumulator::Nil(_) => AccumulatorType::Nil,
        }
    }
}

impl FromStr for Accumulator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Ok(Accumulator::new(s.parse()?))
    }
}

impl StructAttrAccumulator for Accumulator {
    fn begin(&mut self, structure: Structure) -> Result<(), LineError> {
        match self {
            Accumulator::Stack(acc) => acc.begin(structure),
            Accumulator::Combination(acc) => acc.begin(structure),
            Accumulator::Nil(acc) => acc.begin(structure),
        }
    }

    fn end(&mut self, name: &str) -> Result<Structure, LineError> {
        match self {
            Accumulator::Stack(acc) => acc.end(name),
            Accumulator::Combination(acc) => acc.end(name),
            Accumulator::Nil(acc) => acc.end(name),
        }
    }

    fn current_attrs(&mut self) -> Arc<AttrMap> {
        match self {
            Accumulator::Stack(acc) => acc.current_attrs(),
            Accumulator::Combination(acc) => acc.current_attrs(),
            Accumulator::Nil(acc) => acc.current_attrs(),
        }
    }

    fn depth(&self) -> usize {
        match self {
            Accumulator::Stack(acc) => acc.depth(),
            Accumulator::Combination(acc) => acc.depth(),
            Accumulator::Nil(acc) => acc.depth(),
        }
    }
}

fn flatten_into(attrs: &mut AttrMap, structure: &Structure) {
    for (k, v) in &structure.attrs {
        attrs.insert(format!("{}.{}", structure.name, k), v.clone());
    }
}
