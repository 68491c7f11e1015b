// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! position_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(usize);

        impl $name {
            pub const fn new(value: usize) -> Self {
                Self(value)
            }

            pub const fn get(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            fn from(value: usize) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

position_id!(SectionIndex);
position_id!(ItemIndex);

/// Structural key of a checklist item: its section and its position inside it.
///
/// Labels are display text only; two sections may repeat a label without the
/// completion flags colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub section: SectionIndex,
    pub item: ItemIndex,
}

impl ItemKey {
    pub const fn new(section: usize, item: usize) -> Self {
        Self {
            section: SectionIndex::new(section),
            item: ItemIndex::new(item),
        }
    }

    /// Parses the `S.I` form, for example `1.4`.
    pub fn parse(raw: &str) -> Result<Self> {
        let (section, item) = raw
            .trim()
            .split_once('.')
            .ok_or_else(|| anyhow!("item key {raw:?} must look like <section>.<item>, e.g. 1.4"))?;
        let section: usize = section
            .parse()
            .with_context(|| format!("invalid section number in item key {raw:?}"))?;
        let item: usize = item
            .parse()
            .with_context(|| format!("invalid item number in item key {raw:?}"))?;
        Ok(Self::new(section, item))
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.item)
    }
}
