use std::{fmt, path::PathBuf, process::ExitStatus};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Open,
    Close,
    SelfClose,
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagKind::Open => write!(f, "open"),
            TagKind::Close => write!(f, "close"),
            TagKind::SelfClose => write!(f, "self closing"),
        }
    }
}

// travels with the event, the processor decides whether to go on
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("cannot parse {kind} element '{src}'")]
    MalformedTag { kind: TagKind, src: String },

    #[error("tag nesting problem: expected {expected}, found {found}")]
    UnbalancedTag { expected: String, found: String },

    #[error("cannot close structure '{name}': it is not open")]
    UnopenedTag { name: String },

    #[error("structure '{name}' is already open")]
    DuplicateStructure { name: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot decode line {line} as {charset}")]
    Decode { line: usize, charset: &'static str },

    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command '{command}' exited with {status}")]
    Process { command: String, status: ExitStatus },

    #[error("processor failed at line {line}: {source}")]
    Processor {
        line: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("parsing cancelled")]
    Cancelled,

    #[error("line producer panicked")]
    ProducerPanicked,
}
