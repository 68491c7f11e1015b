// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::Serialize;
use tracing::debug;

use crate::{
    CalculatorInput, Checklist, CompletionTracker, Contribution, ExpansionTracker, ItemKey, Link,
    RateTable, SectionIndex,
};

/// All interaction state for one mounted checklist view.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    checklist: Checklist,
    rates: RateTable,
    pub completion: CompletionTracker,
    pub expansion: ExpansionTracker,
    pub calculator: CalculatorInput,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Checklist::mission(), RateTable::standard())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    ToggleItem(ItemKey),
    ToggleSection(SectionIndex),
    SetDistance(String),
    ExpandAll,
    CollapseAll,
    ResetProgress,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    ItemToggled { key: ItemKey, completed: bool },
    SectionToggled { index: SectionIndex, expanded: bool },
    DistanceChanged(Option<Contribution>),
    ProgressReset,
    StatusUpdated(String),
    StatusCleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(self) -> bool {
        self.total > 0 && self.done == self.total
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSnapshot {
    pub key: ItemKey,
    pub label: String,
    pub icon: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionSnapshot {
    pub index: SectionIndex,
    pub title: String,
    pub expanded: bool,
    pub progress: Progress,
    pub has_calculator: bool,
    pub items: Vec<ItemSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculatorSnapshot {
    pub input: String,
    pub result: Option<Contribution>,
}

/// Render-relevant view of the state after an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub title: String,
    pub progress: Progress,
    pub sections: Vec<SectionSnapshot>,
    pub calculator: CalculatorSnapshot,
    pub links: Vec<Link>,
}

impl AppState {
    pub fn new(checklist: Checklist, rates: RateTable) -> Self {
        Self {
            checklist,
            rates,
            completion: CompletionTracker::default(),
            expansion: ExpansionTracker::default(),
            calculator: CalculatorInput::default(),
            status_line: None,
        }
    }

    pub fn checklist(&self) -> &Checklist {
        &self.checklist
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Result<Vec<AppEvent>> {
        let events = match command {
            AppCommand::ToggleItem(key) => {
                if !self.checklist.contains(key) {
                    bail!(
                        "no checklist item {key}; sections are numbered from 0 and hold {}",
                        self.section_sizes()
                    );
                }
                let completed = self.completion.toggle(key);
                debug!(%key, completed, "item toggled");
                vec![AppEvent::ItemToggled { key, completed }]
            }
            AppCommand::ToggleSection(index) => {
                if !self.checklist.contains_section(index) {
                    bail!(
                        "no section {index}; the checklist has {} sections",
                        self.checklist.section_count()
                    );
                }
                let expanded = self.expansion.toggle_section(index);
                debug!(%index, expanded, "section toggled");
                vec![AppEvent::SectionToggled { index, expanded }]
            }
            AppCommand::SetDistance(raw) => {
                self.calculator.set(raw);
                let result = self.contribution();
                debug!(input = self.calculator.as_str(), ?result, "distance changed");
                vec![AppEvent::DistanceChanged(result)]
            }
            AppCommand::ExpandAll => self.set_all_expanded(true),
            AppCommand::CollapseAll => self.set_all_expanded(false),
            AppCommand::ResetProgress => {
                self.completion.clear();
                debug!("progress reset");
                vec![AppEvent::ProgressReset, self.set_status("progress reset")]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        };
        Ok(events)
    }

    pub fn contribution(&self) -> Option<Contribution> {
        self.calculator.contribution(&self.rates)
    }

    pub fn section_progress(&self, index: SectionIndex) -> Progress {
        let keys = self.checklist.section_keys(index);
        Progress {
            done: self.completion.completed_count(&keys),
            total: keys.len(),
        }
    }

    pub fn progress(&self) -> Progress {
        let keys = self.checklist.item_keys();
        Progress {
            done: self.completion.completed_count(&keys),
            total: keys.len(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let sections = self
            .checklist
            .sections()
            .iter()
            .enumerate()
            .map(|(section_position, section)| {
                let index = SectionIndex::new(section_position);
                SectionSnapshot {
                    index,
                    title: section.title.clone(),
                    expanded: self.expansion.is_expanded(index),
                    progress: self.section_progress(index),
                    has_calculator: self.checklist.calculator_section() == Some(index),
                    items: section
                        .items
                        .iter()
                        .enumerate()
                        .map(|(item_position, item)| {
                            let key = ItemKey::new(section_position, item_position);
                            ItemSnapshot {
                                key,
                                label: item.label.clone(),
                                icon: item.icon.clone(),
                                completed: self.completion.is_completed(key),
                            }
                        })
                        .collect(),
                }
            })
            .collect();

        Snapshot {
            title: self.checklist.title().to_owned(),
            progress: self.progress(),
            sections,
            calculator: CalculatorSnapshot {
                input: self.calculator.as_str().to_owned(),
                result: self.contribution(),
            },
            links: self.checklist.links().to_vec(),
        }
    }

    fn set_all_expanded(&mut self, expanded: bool) -> Vec<AppEvent> {
        let mut events = Vec::new();
        for position in 0..self.checklist.section_count() {
            let index = SectionIndex::new(position);
            if self.expansion.is_expanded(index) != expanded {
                self.expansion.set_expanded(index, expanded);
                events.push(AppEvent::SectionToggled { index, expanded });
            }
        }
        events
    }

    fn section_sizes(&self) -> String {
        self.checklist
            .sections()
            .iter()
            .map(|section| section.items.len().to_string())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
