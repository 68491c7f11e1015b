// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod script;

use anyhow::{Context, Result};
use config::Config;
use logging::LogSink;
use missione_app::{AppCommand, AppState};
use std::env;
use std::path::PathBuf;
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `missione --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let interactive = options.apply.is_none() && options.distance.is_none() && !options.check_only;
    let log_path = if interactive {
        Some(config.log_path()?)
    } else {
        None
    };
    let sink = match &log_path {
        Some(path) => LogSink::File(path),
        None => LogSink::Stderr,
    };
    logging::init(sink, config.log_level())?;
    info!(config = %options.config_path.display(), "config loaded");

    let checklist = config
        .load_checklist(options.checklist_path.as_deref())
        .context("load checklist; fix the file or drop --checklist / [checklist].path")?;
    let rates = config.rate_table()?;
    let mut state = AppState::new(checklist, rates);
    if config.start_expanded() || options.expanded {
        state.dispatch(AppCommand::ExpandAll)?;
    }

    if options.check_only {
        println!(
            "ok: {} ({} sections, {} tasks)",
            state.checklist().title(),
            state.checklist().section_count(),
            state.checklist().item_count()
        );
        return Ok(());
    }

    if let Some(raw) = &options.distance {
        println!("{}", script::describe_distance(&state, raw));
        return Ok(());
    }

    if let Some(events) = &options.apply {
        let commands = script::parse_events(events)?;
        let report = script::apply_events(&mut state, commands)?;
        println!("{}", script::render_report(&report)?);
        return Ok(());
    }

    missione_tui::run_app(&mut state)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    checklist_path: Option<PathBuf>,
    apply: Option<String>,
    distance: Option<String>,
    expanded: bool,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        checklist_path: None,
        apply: None,
        distance: None,
        expanded: false,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--checklist" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--checklist requires a file path"))?;
                options.checklist_path = Some(PathBuf::from(value.as_ref()));
            }
            "--apply" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--apply requires events, e.g. --apply section:0,item:0.1")
                })?;
                options.apply = Some(value.as_ref().to_owned());
            }
            "--distance" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--distance requires a value in km"))?;
                options.distance = Some(value.as_ref().to_owned());
            }
            "--expanded" => {
                options.expanded = true;
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if options.apply.is_some() && options.distance.is_some() {
        return Err(anyhow::anyhow!(
            "--apply and --distance cannot be combined; use --apply with a distance:KM event instead"
        ));
    }

    Ok(options)
}

fn print_help() {
    println!("missione");
    println!("  --config <path>          Use a specific config path");
    println!("  --checklist <path>       Load a custom checklist TOML file");
    println!("  --expanded               Start with every section expanded");
    println!("  --distance <km>          Print the rate and contribution for a distance");
    println!("  --apply <events>         Apply item:S.I, section:S, distance:KM, expand-all,");
    println!("                           collapse-all, reset and print the JSON snapshot");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and checklist, then exit");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/missione-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                checklist_path: None,
                apply: None,
                distance: None,
                expanded: false,
                print_config_path: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_path_overrides() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--config",
                "/custom/config.toml",
                "--checklist",
                "/custom/checklist.toml",
            ],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        assert_eq!(
            options.checklist_path,
            Some(PathBuf::from("/custom/checklist.toml"))
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        for flag in ["--config", "--checklist", "--apply", "--distance"] {
            let error = parse_cli_args(vec![flag], default_options_path())
                .expect_err("missing value should fail");
            assert!(
                error.to_string().starts_with(&format!("{flag} requires")),
                "unexpected message for {flag}: {error}"
            );
        }
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_collects_scripted_inputs() -> Result<()> {
        let options = parse_cli_args(
            vec!["--apply", "section:0,item:0.1", "--expanded"],
            default_options_path(),
        )?;
        assert_eq!(options.apply.as_deref(), Some("section:0,item:0.1"));
        assert!(options.expanded);

        let options = parse_cli_args(vec!["--distance", "151"], default_options_path())?;
        assert_eq!(options.distance.as_deref(), Some("151"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_rejects_apply_with_distance() {
        let error = parse_cli_args(
            vec!["--apply", "item:0.1", "--distance", "151"],
            default_options_path(),
        )
        .expect_err("combined scripted modes should fail");
        let message = error.to_string();
        assert!(message.contains("--apply and --distance cannot be combined"));
        assert!(message.contains("distance:KM"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }
}
