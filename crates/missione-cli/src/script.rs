// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use missione_app::{AppCommand, AppState, ItemKey, SectionIndex, Snapshot};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

/// Scripted input events accepted by `--apply`, e.g.
/// `section:0,item:0.3,distance:151`.
pub fn parse_events(raw: &str) -> Result<Vec<AppCommand>> {
    raw.split(',')
        .map(str::trim)
        .filter(|event| !event.is_empty())
        .map(parse_event)
        .collect()
}

fn parse_event(raw: &str) -> Result<AppCommand> {
    let (kind, value) = raw.split_once(':').unwrap_or((raw, ""));
    let command = match kind {
        "item" => AppCommand::ToggleItem(ItemKey::parse(value)?),
        "section" => {
            let index: usize = value
                .trim()
                .parse()
                .with_context(|| format!("invalid section number in event {raw:?}"))?;
            AppCommand::ToggleSection(SectionIndex::new(index))
        }
        "distance" => AppCommand::SetDistance(value.to_owned()),
        "expand-all" => AppCommand::ExpandAll,
        "collapse-all" => AppCommand::CollapseAll,
        "reset" => AppCommand::ResetProgress,
        "" => bail!("empty event in {raw:?}"),
        unknown => {
            return Err(anyhow!(
                "unknown event {unknown:?}; use item:S.I, section:S, distance:KM, expand-all, collapse-all or reset"
            ));
        }
    };
    Ok(command)
}

#[derive(Debug, Serialize)]
pub struct ScriptReport {
    pub generated_at: String,
    pub events_applied: usize,
    pub snapshot: Snapshot,
}

pub fn apply_events(state: &mut AppState, commands: Vec<AppCommand>) -> Result<ScriptReport> {
    let total = commands.len();
    for (position, command) in commands.into_iter().enumerate() {
        state
            .dispatch(command)
            .with_context(|| format!("apply event {} of {total}", position + 1))?;
    }
    let progress = state.progress();
    info!(
        events = total,
        done = progress.done,
        total = progress.total,
        "scripted events applied"
    );

    Ok(ScriptReport {
        generated_at: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .context("format report timestamp")?,
        events_applied: total,
        snapshot: state.snapshot(),
    })
}

pub fn render_report(report: &ScriptReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("serialize snapshot")
}

/// One-line answer for `--distance`.
pub fn describe_distance(state: &AppState, raw: &str) -> String {
    match state.rates().compute(raw) {
        Some(result) => format!(
            "rate: {} €/km\ncontribution: {} €",
            result.rate_label(),
            result.amount_label()
        ),
        None => format!(
            "{raw:?} is not a distance in km or its contribution is too large; nothing to compute"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_events, describe_distance, parse_events, render_report};
    use anyhow::Result;
    use missione_app::{AppCommand, AppState, ItemKey, SectionIndex};

    #[test]
    fn parses_every_event_kind() -> Result<()> {
        let commands = parse_events(
            "section:0, item:0.3,distance:151,expand-all,collapse-all,reset,",
        )?;
        assert_eq!(
            commands,
            vec![
                AppCommand::ToggleSection(SectionIndex::new(0)),
                AppCommand::ToggleItem(ItemKey::new(0, 3)),
                AppCommand::SetDistance("151".to_owned()),
                AppCommand::ExpandAll,
                AppCommand::CollapseAll,
                AppCommand::ResetProgress,
            ]
        );
        Ok(())
    }

    #[test]
    fn unknown_and_malformed_events_fail() {
        let error = parse_events("jump:3").expect_err("unknown kind should fail");
        assert!(error.to_string().contains("unknown event \"jump\""));

        assert!(parse_events("item:7").is_err());
        assert!(parse_events("section:x").is_err());
    }

    #[test]
    fn distance_event_keeps_raw_text() -> Result<()> {
        assert_eq!(
            parse_events("distance:")?,
            vec![AppCommand::SetDistance(String::new())]
        );
        Ok(())
    }

    #[test]
    fn apply_events_returns_updated_snapshot() -> Result<()> {
        let mut state = AppState::default();
        let report = apply_events(
            &mut state,
            parse_events("section:1,item:1.0,item:1.1,distance:300")?,
        )?;
        assert_eq!(report.events_applied, 4);
        assert!(report.snapshot.sections[1].expanded);
        assert_eq!(report.snapshot.sections[1].progress.done, 2);
        assert_eq!(report.snapshot.progress.done, 2);

        let result = report
            .snapshot
            .calculator
            .result
            .expect("300 km computes");
        assert_eq!(result.amount_label(), "75.00");

        let json = render_report(&report)?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        assert_eq!(value["snapshot"]["sections"][1]["items"][0]["completed"], true);
        assert_eq!(value["snapshot"]["calculator"]["result"]["cents_per_km"], 25);
        assert_eq!(value["snapshot"]["calculator"]["result"]["contribution_cents"], 7500);
        assert!(value["generated_at"].as_str().is_some_and(|ts| ts.contains('T')));
        Ok(())
    }

    #[test]
    fn apply_events_names_the_failing_event() -> Result<()> {
        let mut state = AppState::default();
        let error = apply_events(&mut state, parse_events("item:0.0,item:9.9")?)
            .expect_err("item 9.9 does not exist");
        let message = format!("{error:#}");
        assert!(message.contains("apply event 2 of 2"));
        assert!(message.contains("no checklist item 9.9"));
        Ok(())
    }

    #[test]
    fn describe_distance_formats_result_or_explains() {
        let state = AppState::default();
        assert_eq!(
            describe_distance(&state, "100"),
            "rate: 0.20 €/km\ncontribution: 20.00 €"
        );
        assert!(describe_distance(&state, "abc").contains("not a distance"));
        assert!(describe_distance(&state, "1e300").contains("too large"));
    }
}
