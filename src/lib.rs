pub mod accumulator;
pub mod charset;
pub mod config;
pub mod error;
pub mod filter;
pub mod grammar;
pub mod model;
pub mod pipeline;
pub mod source;

pub use accumulator::{Accumulator, AccumulatorType, StructAttrAccumulator};
pub use config::ParserConf;
pub use error::{Error, LineError, Result};
pub use filter::FilterCnf;
pub use model::{AttrMap, Event, Structure, StructureClose, Token};
pub use pipeline::{
    parse_vertical_file, parse_vertical_file_with_cancel, parse_vertical_reader, CancelFlag,
    LineProcessor,
};
