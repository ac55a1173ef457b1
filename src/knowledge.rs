//! Rule table: subject-scoped keyword rules loaded from a JSON file
//!
//! The table is authored out-of-band and never mutated by the server. It is
//! loaded once at startup; a reload swaps in a freshly parsed table as a
//! whole, so a request always sees one consistent snapshot.

mod error;

pub use error::KnowledgeError;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// A keyword set paired with a canned answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    /// Lowercase substrings; the first one found in a message selects `answer`
    pub keywords: Vec<String>,
    pub answer: String,
}

impl RuleEntry {
    #[must_use]
    pub fn new<K, S>(keywords: K, answer: impl Into<String>) -> Self
    where
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            answer: answer.into(),
        }
    }
}

/// Subject name to ordered rules. Rule order is match priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    subjects: HashMap<String, Vec<RuleEntry>>,
}

impl RuleTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and fixtures
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>, rules: Vec<RuleEntry>) -> Self {
        self.subjects.insert(subject.into(), rules);
        self
    }

    /// Parse a table from JSON text
    ///
    /// # Errors
    /// Returns the underlying `serde_json` error if the text is not a
    /// subject-to-rules mapping.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Read and parse the table at `path`
    ///
    /// # Errors
    /// `KnowledgeError::Read` if the file cannot be read,
    /// `KnowledgeError::Parse` if it is not valid rule table JSON.
    pub fn from_file(path: &Path) -> Result<Self, KnowledgeError> {
        let text = std::fs::read_to_string(path).map_err(|source| KnowledgeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| KnowledgeError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    pub fn rules(&self, subject: &str) -> Option<&[RuleEntry]> {
        self.subjects.get(subject).map(Vec::as_slice)
    }

    /// Subject names in sorted order
    #[must_use]
    pub fn subjects(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.subjects.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.subjects.values().map(Vec::len).sum()
    }

    /// Rules containing an empty keyword, as `(subject, rule index)`.
    /// An empty keyword is a substring of every message.
    #[must_use]
    pub fn wildcard_rules(&self) -> Vec<(&str, usize)> {
        let mut found: Vec<(&str, usize)> = self
            .subjects
            .iter()
            .flat_map(|(subject, rules)| {
                rules
                    .iter()
                    .enumerate()
                    .filter(|(_, rule)| rule.keywords.iter().any(String::is_empty))
                    .map(move |(index, _)| (subject.as_str(), index))
            })
            .collect();
        found.sort_unstable();
        found
    }
}

/// Shared, reloadable holder of the current rule table
#[derive(Debug)]
pub struct KnowledgeBase {
    path: PathBuf,
    table: RwLock<Arc<RuleTable>>,
}

impl KnowledgeBase {
    /// Load the table at `path`
    ///
    /// # Errors
    /// Propagates any `KnowledgeError` from reading or parsing the file.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, KnowledgeError> {
        let path = path.into();
        let table = RuleTable::from_file(&path)?;
        warn_on_wildcards(&table);
        Ok(Self::new(path, table))
    }

    /// Wrap an already-built table; `path` is where reloads read from
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, table: RuleTable) -> Self {
        Self {
            path: path.into(),
            table: RwLock::new(Arc::new(table)),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current table. Callers keep this snapshot for the whole request.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RuleTable> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-read the data file and swap it in. On error the old table stays.
    ///
    /// # Errors
    /// Propagates any `KnowledgeError` from reading or parsing the file.
    pub fn reload(&self) -> Result<Arc<RuleTable>, KnowledgeError> {
        let table = Arc::new(RuleTable::from_file(&self.path)?);
        warn_on_wildcards(&table);
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = table.clone();
        tracing::info!(
            path = %self.path.display(),
            subjects = table.subjects().len(),
            rules = table.rule_count(),
            "Rule table reloaded"
        );
        Ok(table)
    }
}

fn warn_on_wildcards(table: &RuleTable) {
    for (subject, index) in table.wildcard_rules() {
        tracing::warn!(
            subject,
            rule = index,
            "Rule has an empty keyword and will match every message"
        );
    }
}
