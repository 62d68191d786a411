//! Dictionary (reference data) lookup.
//!
//! A dictionary is a named taxonomy such as "Defect Found In". Each category
//! has compiled-in entries with fixed ids and may be extended with
//! user-defined entries kept in storage.

pub mod builtin;

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{RamError, RamResult};
use crate::lists::merge_lists;
use crate::storage::{self, Pool};

/// Categories with compiled-in entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DictionaryCategory {
    DefectFoundIn,
    RootCause,
}

impl DictionaryCategory {
    pub const ALL: [DictionaryCategory; 2] =
        [DictionaryCategory::DefectFoundIn, DictionaryCategory::RootCause];

    /// Key under which entries of this category are stored.
    pub fn name(&self) -> &'static str {
        match self {
            DictionaryCategory::DefectFoundIn => "Defect Found In",
            DictionaryCategory::RootCause => "Root Cause",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for DictionaryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One dictionary value.
///
/// Two entries are equal when they name the same value in the same category,
/// whatever their ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub id: Uuid,
    pub category: String,
    pub name: String,
    pub built_in: bool,
}

impl PartialEq for DictionaryEntry {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category && self.name == other.name
    }
}

impl From<&builtin::BuiltinEntry> for DictionaryEntry {
    fn from(entry: &builtin::BuiltinEntry) -> Self {
        Self {
            id: entry.id,
            category: entry.category.name().to_string(),
            name: entry.name.to_string(),
            built_in: true,
        }
    }
}

#[derive(Clone)]
pub struct DictionaryService {
    pool: Pool,
}

impl DictionaryService {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Stored entries whose category equals `category`. Unknown categories
    /// give an empty list.
    pub fn find_by_type(&self, category: &str) -> RamResult<Vec<DictionaryEntry>> {
        let conn = self.pool.get()?;
        Ok(storage::dictionary::find_by_category(&conn, category)?)
    }

    /// Built-in entries of `category` followed by the stored ones.
    pub fn list_category(&self, category: &str) -> RamResult<Vec<DictionaryEntry>> {
        let builtins: Vec<DictionaryEntry> = DictionaryCategory::from_name(category)
            .map(|c| builtin::for_category(c).iter().map(DictionaryEntry::from).collect())
            .unwrap_or_default();
        let stored = self.find_by_type(category)?;
        Ok(merge_lists(&builtins, &stored))
    }

    /// Resolve an id to its entry, built-in or stored.
    pub fn resolve(&self, id: Uuid) -> RamResult<Option<DictionaryEntry>> {
        if let Some(entry) = builtin::find(id) {
            return Ok(Some(entry.into()));
        }
        let conn = self.pool.get()?;
        Ok(storage::dictionary::get(&conn, id)?)
    }

    pub fn create(&self, category: &str, name: &str) -> RamResult<DictionaryEntry> {
        let category = category.trim();
        let name = name.trim();
        if category.is_empty() || name.is_empty() {
            return Err(RamError::DictionaryEntry(
                "category and name must not be empty".to_string(),
            ));
        }

        let category = DictionaryCategory::from_name(category)
            .ok_or_else(|| RamError::DictionaryEntry(format!("unknown category '{}'", category)))?
            .name();

        let candidate = DictionaryEntry {
            id: Uuid::new_v4(),
            category: category.to_string(),
            name: name.to_string(),
            built_in: false,
        };
        if self.list_category(category)?.contains(&candidate) {
            return Err(RamError::DictionaryEntry(format!(
                "'{}' already exists in '{}'",
                name, category
            )));
        }

        let conn = self.pool.get()?;
        storage::dictionary::insert(&conn, &candidate)?;
        tracing::info!(id = %candidate.id, %category, %name, "dictionary entry created");
        Ok(candidate)
    }

    pub fn delete(&self, id: Uuid) -> RamResult<()> {
        if builtin::find(id).is_some() {
            return Err(RamError::DictionaryEntry(format!(
                "built-in entry '{}' cannot be deleted",
                id
            )));
        }
        let conn = self.pool.get()?;
        if !storage::dictionary::delete(&conn, id)? {
            return Err(RamError::DictionaryEntry(format!("entry '{}' not found", id)));
        }
        Ok(())
    }
}
