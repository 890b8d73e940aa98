use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;

use crate::filter::FilterCnf;

// plain attribute names inside a Structure, `struct.attr` on a Token
pub type AttrMap = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub idx: usize,
    pub word: String,
    pub attrs: Vec<String>,
    pub struct_attrs: Arc<AttrMap>,
}

impl Token {
    pub fn word_lc(&self) -> String {
        self.word.to_lowercase()
    }

    // column 0 is the word itself
    pub fn pos_attr_by_index(&self, idx: usize) -> Option<&str> {
        match idx {
            0 => Some(&self.word),
            i => self.attrs.get(i - 1).map(|s| s.as_str()),
        }
    }

    pub fn struct_attr(&self, key: &str) -> Option<&str> {
        self.struct_attrs.get(key).map(|s| s.as_str())
    }

    pub fn matches_filter(&self, filter: &FilterCnf) -> bool {
        filter.matches(&self.struct_attrs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Structure {
    pub name: String,
    pub attrs: AttrMap,
    // no StructureClose follows
    pub self_closing: bool,
}

impl Structure {
    pub fn new(name: impl Into<String>, attrs: AttrMap) -> Self {
        Structure {
            name: name.into(),
            attrs,
            self_closing: false,
        }
    }

    pub fn self_closing(name: impl Into<String>, attrs: AttrMap) -> Self {
        Structure {
            name: name.into(),
            attrs,
            self_closing: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureClose {
    pub name: String,
}

impl StructureClose {
    pub fn new(name: impl Into<String>) -> Self {
        StructureClose { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum Event {
    Token(Token),
    Structure(Structure),
    StructureClose(StructureClose),
}
