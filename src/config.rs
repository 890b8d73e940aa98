use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    accumulator::AccumulatorType,
    charset::Charset,
    error::{Error, Result},
    filter::FilterCnf,
    source::InputSource,
};

pub const DEFAULT_CHANNEL_CHUNK_SIZE: usize = 250_000;
pub const DEFAULT_LOG_PROGRESS_EACH_NTH: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserConf {
    pub input_file_path: String,

    #[serde(default)]
    pub filter_args: FilterCnf,

    // empty = utf-8
    #[serde(default)]
    pub encoding: String,

    // stack / comb / nil, empty = stack
    #[serde(default)]
    pub struct_attr_accumulator: String,

    #[serde(default = "default_channel_chunk_size")]
    pub channel_chunk_size: usize,

    // 0 = no progress logging
    #[serde(default = "default_log_progress_each_nth")]
    pub log_progress_each_nth: usize,
}

fn default_channel_chunk_size() -> usize {
    DEFAULT_CHANNEL_CHUNK_SIZE
}

fn default_log_progress_each_nth() -> usize {
    DEFAULT_LOG_PROGRESS_EACH_NTH
}

impl ParserConf {
    pub fn new(input_file_path: impl Into<String>) -> Self {
        ParserConf {
            input_file_path: input_file_path.into(),
            filter_args: FilterCnf::default(),
            encoding: String::new(),
            struct_attr_accumulator: String::new(),
            channel_chunk_size: DEFAULT_CHANNEL_CHUNK_SIZE,
            log_progress_each_nth: DEFAULT_LOG_PROGRESS_EACH_NTH,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data)
            .map_err(|err| Error::Config(format!("{}: {}", path.display(), err)))
    }

    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data)
            .map_err(|err| Error::Config(format!("invalid parser configuration: {}", err)))
    }

    pub fn input_source(&self) -> Result<InputSource> {
        InputSource::parse(&self.input_file_path)
    }

    pub(crate) fn resolve(&self) -> Result<ResolvedConf> {
        let accumulator: AccumulatorType = self.struct_attr_accumulator.parse()?;
        let charset = Charset::from_name(&self.encoding)?;
        if self.channel_chunk_size == 0 {
            return Err(Error::Config("channelChunkSize must be positive".to_owned()));
        }
        Ok(ResolvedConf {
            accumulator,
            charset,
            filter: self.filter_args.clone(),
            chunk_size: self.channel_chunk_size,
            log_progress_each_nth: self.log_progress_each_nth,
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ResolvedConf {
    pub accumulator: AccumulatorType,
    pub charset: Charset,
    pub filter: FilterCnf,
    pub chunk_size: usize,
    pub log_progress_each_nth: usize,
}
