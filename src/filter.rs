use std::str::FromStr;

use anyhow::{bail, ensure, Result};
use serde::{Deserialize, Serialize};

use crate::model::AttrMap;

// CNF: AND of clauses, each clause an OR of (key, value) pairs, e.g.
// [[["div.author", "John Doe"]], [["div.title", "Unknown"], ["div.title", "Superunknown"]]]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterCnf {
    clauses: Vec<Vec<(String, String)>>,
}

impl FilterCnf {
    pub fn new(clauses: Vec<Vec<(String, String)>>) -> Self {
        FilterCnf { clauses }
    }

    pub fn from_pairs(clauses: &[&[(&str, &str)]]) -> Self {
        FilterCnf {
            clauses: clauses
                .iter()
                .map(|clause| {
                    clause
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect()
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[Vec<(String, String)>] {
        &self.clauses
    }

    // `key=value|key=value|...`
    pub fn push_clause(&mut self, src: &str) -> Result<()> {
        let mut clause = Vec::new();
        for alt in src.split('|') {
            let Some((key, value)) = alt.split_once('=') else {
                bail!("Invalid filter alternative (expected key=value): {:?}", alt);
            };
            let key = key.trim();
            ensure!(!key.is_empty(), "Empty attribute name in filter: {:?}", src);
            clause.push((key.to_owned(), value.to_owned()));
        }
        self.clauses.push(clause);
        Ok(())
    }

    pub fn matches(&self, attrs: &AttrMap) -> bool {
        matches(attrs, self)
    }
}

// clauses separated by ';'
impl FromStr for FilterCnf {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut filter = FilterCnf::default();
        for clause in s.split(';').filter(|c| !c.trim().is_empty()) {
            filter.push_clause(clause)?;
        }
        Ok(filter)
    }
}

pub fn matches(attrs: &AttrMap, filter: &FilterCnf) -> bool {
    filter.clauses.iter().all(|clause| {
        clause
            .iter()
            .any(|(key, value)| attrs.get(key).is_some_and(|v| v == value))
    })
}
