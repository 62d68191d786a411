//! Compiled-in reference taxonomies.
//!
//! These UUIDs are persisted by clients (test runs store root-cause and
//! defect-found-in ids) and must never change.

use uuid::Uuid;

use super::DictionaryCategory;

/// A built-in dictionary value with a fixed identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinEntry {
    pub id: Uuid,
    pub category: DictionaryCategory,
    pub name: &'static str,
}

const fn entry(id: u128, category: DictionaryCategory, name: &'static str) -> BuiltinEntry {
    BuiltinEntry {
        id: Uuid::from_u128(id),
        category,
        name,
    }
}

pub const DEFECT_FOUND_IN: [BuiltinEntry; 7] = [
    entry(0x5c1c_7b7e_2f1a_4d3e_9a61_0000_0000_0101, DictionaryCategory::DefectFoundIn, "Analysis"),
    entry(0x5c1c_7b7e_2f1a_4d3e_9a61_0000_0000_0102, DictionaryCategory::DefectFoundIn, "Build"),
    entry(0x5c1c_7b7e_2f1a_4d3e_9a61_0000_0000_0103, DictionaryCategory::DefectFoundIn, "E2E Test"),
    entry(0x5c1c_7b7e_2f1a_4d3e_9a61_0000_0000_0104, DictionaryCategory::DefectFoundIn, "Integration Test"),
    entry(0x5c1c_7b7e_2f1a_4d3e_9a61_0000_0000_0105, DictionaryCategory::DefectFoundIn, "Production"),
    entry(0x5c1c_7b7e_2f1a_4d3e_9a61_0000_0000_0106, DictionaryCategory::DefectFoundIn, "System Test"),
    entry(0x5c1c_7b7e_2f1a_4d3e_9a61_0000_0000_0107, DictionaryCategory::DefectFoundIn, "Unit Test"),
];

pub const ROOT_CAUSE: [BuiltinEntry; 5] = [
    entry(0x5c1c_7b7e_2f1a_4d3e_9a61_0000_0000_0201, DictionaryCategory::RootCause, "Not Analyzed"),
    entry(0x5c1c_7b7e_2f1a_4d3e_9a61_0000_0000_0202, DictionaryCategory::RootCause, "Product Issue"),
    entry(0x5c1c_7b7e_2f1a_4d3e_9a61_0000_0000_0203, DictionaryCategory::RootCause, "Test Issue"),
    entry(0x5c1c_7b7e_2f1a_4d3e_9a61_0000_0000_0204, DictionaryCategory::RootCause, "Environment Issue"),
    entry(0x5c1c_7b7e_2f1a_4d3e_9a61_0000_0000_0205, DictionaryCategory::RootCause, "Data Issue"),
];

pub fn for_category(category: DictionaryCategory) -> &'static [BuiltinEntry] {
    match category {
        DictionaryCategory::DefectFoundIn => &DEFECT_FOUND_IN,
        DictionaryCategory::RootCause => &ROOT_CAUSE,
    }
}

pub fn find(id: Uuid) -> Option<&'static BuiltinEntry> {
    DEFECT_FOUND_IN.iter().chain(ROOT_CAUSE.iter()).find(|e| e.id == id)
}
