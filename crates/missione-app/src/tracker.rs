// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::ids::{ItemKey, SectionIndex};

/// Completion flag per checklist item. Absent keys read as not completed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionTracker {
    flags: BTreeMap<ItemKey, bool>,
}

impl CompletionTracker {
    /// Flips the flag for `key` and returns the new value.
    pub fn toggle(&mut self, key: ItemKey) -> bool {
        let flag = self.flags.entry(key).or_insert(false);
        *flag = !*flag;
        *flag
    }

    pub fn is_completed(&self, key: ItemKey) -> bool {
        self.flags.get(&key).copied().unwrap_or(false)
    }

    pub fn completed_count<'a>(&self, keys: impl IntoIterator<Item = &'a ItemKey>) -> usize {
        keys.into_iter()
            .filter(|key| self.is_completed(**key))
            .count()
    }

    pub fn clear(&mut self) {
        self.flags.clear();
    }
}

/// Expansion flag per section. Sections start collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionTracker {
    flags: BTreeMap<SectionIndex, bool>,
}

impl ExpansionTracker {
    pub fn toggle_section(&mut self, index: SectionIndex) -> bool {
        let flag = self.flags.entry(index).or_insert(false);
        *flag = !*flag;
        *flag
    }

    pub fn is_expanded(&self, index: SectionIndex) -> bool {
        self.flags.get(&index).copied().unwrap_or(false)
    }

    pub fn set_expanded(&mut self, index: SectionIndex, expanded: bool) {
        self.flags.insert(index, expanded);
    }
}
