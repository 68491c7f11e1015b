// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::ids::*;

pub const MISSION_TITLE: &str = "Checklist Prima Missione";
pub const MAPS_URL: &str = "https://www.google.com/maps";
pub const MANUAL_URL: &str = "https://manuale-operativo.com";

const MISSION_SECTIONS: [(&str, &[(&str, &str)]); 3] = [
    (
        "Fase 1: Il giorno prima della missione",
        &[
            ("📱", "Verificare le attività previste in app"),
            ("💬", "Controllare i Driver Message"),
            ("⏰", "Verificare orari di apertura e chiusura"),
            ("🖨️", "Stampare il CMR"),
        ],
    ),
    (
        "Fase 2: Svolgimento della Missione",
        &[
            ("📞", "Contattare il centro di ritiro"),
            ("🕒", "Recarsi al centro negli orari indicati"),
            ("🔍", "Identificare il veicolo"),
            ("📝", "Compilare il CMR con i dati della missione"),
            ("🚧", "Controllare eventuali danni al veicolo"),
            ("📸", "Scattare foto e documentare lo stato"),
            ("⛽", "Verificare livello carburante e km percorsi"),
            ("🖊️", "Far firmare il verbale al centro"),
            ("🛣️", "Movimentare il veicolo fino alla destinazione"),
            ("📞", "Contattare il cliente per l'orario di arrivo"),
            ("📝", "Consegna del veicolo e firma del verbale"),
            ("📸", "Scattare foto finali e caricare su app"),
        ],
    ),
    (
        "Fase 3: Dopo la missione",
        &[
            ("💳", "Caricare i giustificativi di spesa rispondendo alla mail"),
            ("📄", "Caricare il verbale"),
        ],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub label: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub url: String,
}

/// Immutable reference data: the ordered sections of a checklist plus the
/// footer links. Built once and validated on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checklist {
    title: String,
    sections: Vec<Section>,
    calculator_section: Option<SectionIndex>,
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct ChecklistFile {
    title: String,
    #[serde(default)]
    calculator_section: Option<usize>,
    sections: Vec<Section>,
    #[serde(default)]
    links: Vec<Link>,
}

impl Checklist {
    pub fn new(
        title: impl Into<String>,
        sections: Vec<Section>,
        calculator_section: Option<SectionIndex>,
        links: Vec<Link>,
    ) -> Result<Self> {
        let checklist = Self {
            title: title.into(),
            sections,
            calculator_section,
            links,
        };
        checklist.validate()?;
        Ok(checklist)
    }

    /// The built-in first-mission checklist.
    pub fn mission() -> Self {
        let sections = MISSION_SECTIONS
            .iter()
            .map(|(title, items)| Section {
                title: (*title).to_owned(),
                items: items
                    .iter()
                    .map(|(icon, label)| ChecklistItem {
                        label: (*label).to_owned(),
                        icon: (*icon).to_owned(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            title: MISSION_TITLE.to_owned(),
            sections,
            calculator_section: Some(SectionIndex::new(0)),
            links: vec![
                Link {
                    label: "Google Maps".to_owned(),
                    url: MAPS_URL.to_owned(),
                },
                Link {
                    label: "Manuale Operativo".to_owned(),
                    url: MANUAL_URL.to_owned(),
                },
            ],
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: ChecklistFile = toml::from_str(raw).context("parse checklist TOML")?;
        Self::new(
            file.title,
            file.sections,
            file.calculator_section.map(SectionIndex::new),
            file.links,
        )
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read checklist file {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("load checklist {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            bail!("checklist title must not be empty");
        }
        if self.sections.is_empty() {
            bail!("checklist must define at least one [[sections]] entry");
        }

        for (index, section) in self.sections.iter().enumerate() {
            if section.title.trim().is_empty() {
                bail!("section {index} has an empty title");
            }
            if section.items.is_empty() {
                bail!(
                    "section {index} ({:?}) has no items; add at least one [[sections.items]]",
                    section.title
                );
            }
            if let Some(position) = section
                .items
                .iter()
                .position(|item| item.label.trim().is_empty())
            {
                bail!("item {index}.{position} has an empty label");
            }
        }

        if let Some(calculator) = self.calculator_section
            && calculator.get() >= self.sections.len()
        {
            bail!(
                "calculator_section {} is out of range; the checklist has {} sections",
                calculator,
                self.sections.len()
            );
        }

        Ok(())
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn section(&self, index: SectionIndex) -> Option<&Section> {
        self.sections.get(index.get())
    }

    pub fn item(&self, key: ItemKey) -> Option<&ChecklistItem> {
        self.section(key.section)?.items.get(key.item.get())
    }

    pub fn contains(&self, key: ItemKey) -> bool {
        self.item(key).is_some()
    }

    pub fn contains_section(&self, index: SectionIndex) -> bool {
        index.get() < self.sections.len()
    }

    pub fn calculator_section(&self) -> Option<SectionIndex> {
        self.calculator_section
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn section_keys(&self, index: SectionIndex) -> Vec<ItemKey> {
        self.section(index)
            .map(|section| {
                (0..section.items.len())
                    .map(|item| ItemKey::new(index.get(), item))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every item key in display order.
    pub fn item_keys(&self) -> Vec<ItemKey> {
        (0..self.sections.len())
            .flat_map(|section| self.section_keys(SectionIndex::new(section)))
            .collect()
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|section| section.items.len()).sum()
    }
}
