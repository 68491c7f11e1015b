// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "MISSIONE_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink<'a> {
    /// The terminal UI owns stdout, so interactive sessions log to a file.
    File(&'a Path),
    Stderr,
}

/// `MISSIONE_LOG` takes precedence over the configured level.
pub fn build_filter(env_value: Option<&str>, config_level: &str) -> Result<EnvFilter> {
    match env_value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid {LOG_ENV} value {directives:?}")),
        None => EnvFilter::try_new(config_level)
            .with_context(|| format!("invalid log level {config_level:?}")),
    }
}

pub fn init(sink: LogSink<'_>, config_level: &str) -> Result<()> {
    let env_value = std::env::var(LOG_ENV).ok();
    let filter = build_filter(env_value.as_deref(), config_level)?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match sink {
        LogSink::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| {
                    format!(
                        "open log file {} -- set [log].path to a writable location",
                        path.display()
                    )
                })?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        LogSink::Stderr => builder.with_writer(io::stderr).try_init(),
    };
    installed.map_err(|error| anyhow!("install log subscriber: {error}"))
}
