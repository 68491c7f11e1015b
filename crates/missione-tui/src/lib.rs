// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use missione_app::{
    AppCommand, AppState, ItemKey, MAX_INPUT_CHARS, Progress, PushOutcome, SectionIndex,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

const EXPANDED_MARK: &str = "▼";
const COLLAPSED_MARK: &str = "▶";
const CHECKED_MARK: &str = "[x]";
const UNCHECKED_MARK: &str = "[ ]";
const CALCULATOR_ICON: &str = "🧮";
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const ACCENT: Color = Color::Rgb(0x80, 0x00, 0x20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

/// One selectable line of the checklist body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewRow {
    Section(SectionIndex),
    Item(ItemKey),
    Calculator(SectionIndex),
}

impl ViewRow {
    fn section(self) -> SectionIndex {
        match self {
            Self::Section(index) | Self::Calculator(index) => index,
            Self::Item(key) => key.section,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Nav,
    Distance,
}

#[derive(Debug)]
struct ViewData {
    cursor: usize,
    mode: InputMode,
    help_visible: bool,
    status_token: u64,
}

impl Default for ViewData {
    fn default() -> Self {
        Self {
            cursor: 0,
            mode: InputMode::Nav,
            help_visible: false,
            status_token: 0,
        }
    }
}

pub fn run_app(state: &mut AppState) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();
    info!(
        title = state.checklist().title(),
        sections = state.checklist().section_count(),
        "checklist view started"
    );

    let mut result = Ok(());
    loop {
        process_internal_events(state, &view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    let progress = state.progress();
    info!(done = progress.done, total = progress.total, "checklist view closed");
    result
}

fn process_internal_events(state: &mut AppState, view_data: &ViewData, rx: &Receiver<InternalEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                dispatch(state, AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    dispatch(state, AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn dispatch(state: &mut AppState, command: AppCommand) {
    if let Err(error) = state.dispatch(command) {
        warn!(%error, "command rejected");
        state.status_line = Some(error.to_string());
    }
}

fn visible_rows(state: &AppState) -> Vec<ViewRow> {
    let checklist = state.checklist();
    let mut rows = Vec::new();
    for position in 0..checklist.section_count() {
        let index = SectionIndex::new(position);
        rows.push(ViewRow::Section(index));
        if !state.expansion.is_expanded(index) {
            continue;
        }
        rows.extend(checklist.section_keys(index).into_iter().map(ViewRow::Item));
        if checklist.calculator_section() == Some(index) {
            rows.push(ViewRow::Calculator(index));
        }
    }
    rows
}

fn selected_row(state: &AppState, view_data: &ViewData) -> Option<ViewRow> {
    visible_rows(state).get(view_data.cursor).copied()
}

fn clamp_cursor(state: &AppState, view_data: &mut ViewData) {
    let len = visible_rows(state).len();
    view_data.cursor = view_data.cursor.min(len.saturating_sub(1));
}

fn focus_row(state: &AppState, view_data: &mut ViewData, target: ViewRow) {
    if let Some(position) = visible_rows(state).iter().position(|row| *row == target) {
        view_data.cursor = position;
    } else {
        clamp_cursor(state, view_data);
    }
}

fn move_cursor(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let len = visible_rows(state).len();
    if len == 0 {
        view_data.cursor = 0;
        return;
    }
    let next = (view_data.cursor as isize + delta).clamp(0, len as isize - 1);
    view_data.cursor = next as usize;
}

fn handle_key_event(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
            emit_status(state, view_data, internal_tx, "help hidden");
        }
        return false;
    }

    if view_data.mode == InputMode::Distance {
        handle_distance_key(state, view_data, internal_tx, key);
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('j') | KeyCode::Down => move_cursor(state, view_data, 1),
        KeyCode::Char('k') | KeyCode::Up => move_cursor(state, view_data, -1),
        KeyCode::Char('g') | KeyCode::Home => view_data.cursor = 0,
        KeyCode::Char('G') | KeyCode::End => {
            view_data.cursor = visible_rows(state).len().saturating_sub(1);
        }
        KeyCode::Enter | KeyCode::Char(' ') => activate_selected(state, view_data, internal_tx),
        KeyCode::Char('l') | KeyCode::Right => {
            if let Some(ViewRow::Section(index)) = selected_row(state, view_data)
                && !state.expansion.is_expanded(index)
            {
                dispatch(state, AppCommand::ToggleSection(index));
            }
        }
        KeyCode::Char('h') | KeyCode::Left => {
            if let Some(row) = selected_row(state, view_data) {
                let index = row.section();
                if state.expansion.is_expanded(index) {
                    dispatch(state, AppCommand::ToggleSection(index));
                }
                focus_row(state, view_data, ViewRow::Section(index));
            }
        }
        KeyCode::Char('i') => begin_distance_input(state, view_data, internal_tx),
        KeyCode::Char('E') => {
            let anchor = selected_row(state, view_data);
            dispatch(state, AppCommand::ExpandAll);
            if let Some(anchor) = anchor {
                focus_row(state, view_data, anchor);
            }
            emit_status(state, view_data, internal_tx, "all sections expanded");
        }
        KeyCode::Char('C') => {
            let anchor = selected_row(state, view_data).map(|row| ViewRow::Section(row.section()));
            dispatch(state, AppCommand::CollapseAll);
            if let Some(anchor) = anchor {
                focus_row(state, view_data, anchor);
            }
            emit_status(state, view_data, internal_tx, "all sections collapsed");
        }
        KeyCode::Char('R') => {
            dispatch(state, AppCommand::ResetProgress);
            view_data.status_token = view_data.status_token.saturating_add(1);
            schedule_status_clear(internal_tx, view_data.status_token);
        }
        KeyCode::Char('?') => {
            view_data.help_visible = true;
        }
        _ => {}
    }
    false
}

fn activate_selected(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    match selected_row(state, view_data) {
        Some(ViewRow::Section(index)) => dispatch(state, AppCommand::ToggleSection(index)),
        Some(ViewRow::Item(key)) => {
            dispatch(state, AppCommand::ToggleItem(key));
            let progress = state.section_progress(key.section);
            if progress.is_complete() {
                let title = state
                    .checklist()
                    .section(key.section)
                    .map(|section| section.title.clone())
                    .unwrap_or_default();
                emit_status(state, view_data, internal_tx, format!("{title}: done"));
            }
        }
        Some(ViewRow::Calculator(_)) => begin_distance_input(state, view_data, internal_tx),
        None => {}
    }
}

fn begin_distance_input(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(index) = state.checklist().calculator_section() else {
        emit_status(state, view_data, internal_tx, "this checklist has no calculator");
        return;
    };
    if !state.expansion.is_expanded(index) {
        dispatch(state, AppCommand::ToggleSection(index));
    }
    focus_row(state, view_data, ViewRow::Calculator(index));
    view_data.mode = InputMode::Distance;
}

fn handle_distance_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let mut input = state.calculator.clone();
    let changed = match (key.code, key.modifiers) {
        (KeyCode::Esc, _) | (KeyCode::Enter, _) => {
            view_data.mode = InputMode::Nav;
            return;
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            let had_text = !input.is_empty();
            input.clear();
            had_text
        }
        (KeyCode::Backspace, _) => input.backspace(),
        (KeyCode::Char(ch), _) => match input.push(ch) {
            PushOutcome::Accepted => true,
            PushOutcome::InvalidChar => {
                emit_status(state, view_data, internal_tx, "distance accepts digits, '.' and '-'");
                false
            }
            PushOutcome::Full => {
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("distance is limited to {MAX_INPUT_CHARS} characters"),
                );
                false
            }
        },
        _ => false,
    };

    if changed {
        dispatch(state, AppCommand::SetDistance(input.as_str().to_owned()));
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let header = Paragraph::new(render_header_text(state)).block(
        Block::default()
            .title(state.checklist().title().to_owned())
            .borders(Borders::ALL)
            .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(header, layout[0]);

    let body_area = layout[1];
    let visible_height = usize::from(body_area.height.saturating_sub(2));
    let offset = scroll_offset(view_data.cursor, visible_height);
    let body = Paragraph::new(body_lines(state, view_data))
        .block(Block::default().borders(Borders::ALL))
        .scroll((u16::try_from(offset).unwrap_or(u16::MAX), 0));
    frame.render_widget(body, body_area);

    let footer = Paragraph::new(render_footer_text(state))
        .block(Block::default().borders(Borders::ALL).title("links"));
    frame.render_widget(footer, layout[2]);

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status, layout[3]);

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn scroll_offset(cursor: usize, visible_height: usize) -> usize {
    if visible_height == 0 {
        return cursor;
    }
    cursor.saturating_sub(visible_height - 1)
}

fn render_header_text(state: &AppState) -> String {
    let progress = state.progress();
    let suffix = if progress.is_complete() {
        " | all tasks done"
    } else {
        ""
    };
    format!("progress: {}{suffix}", format_progress(progress))
}

fn format_progress(progress: Progress) -> String {
    format!("{}/{}", progress.done, progress.total)
}

fn body_lines(state: &AppState, view_data: &ViewData) -> Vec<Line<'static>> {
    visible_rows(state)
        .into_iter()
        .enumerate()
        .map(|(position, row)| {
            let selected = position == view_data.cursor;
            let line = match row {
                ViewRow::Section(index) => section_line(state, index),
                ViewRow::Item(key) => item_line(state, key),
                ViewRow::Calculator(_) => calculator_line(state, view_data),
            };
            if selected {
                line.patch_style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                line
            }
        })
        .collect()
}

fn section_line(state: &AppState, index: SectionIndex) -> Line<'static> {
    let title = state
        .checklist()
        .section(index)
        .map(|section| section.title.clone())
        .unwrap_or_default();
    let marker = if state.expansion.is_expanded(index) {
        EXPANDED_MARK
    } else {
        COLLAPSED_MARK
    };
    let progress = state.section_progress(index);
    let progress_style = if progress.is_complete() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Line::from(vec![
        Span::styled(format!("{marker} "), Style::default().fg(Color::DarkGray)),
        Span::styled(
            title,
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {}", format_progress(progress)), progress_style),
    ])
}

fn item_line(state: &AppState, key: ItemKey) -> Line<'static> {
    let Some(item) = state.checklist().item(key) else {
        return Line::default();
    };
    let completed = state.completion.is_completed(key);
    let (mark, label_style) = if completed {
        (
            CHECKED_MARK,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
        )
    } else {
        (UNCHECKED_MARK, Style::default())
    };
    Line::from(vec![
        Span::raw(format!("    {} ", item.icon)),
        Span::styled(format!("{mark} "), Style::default().fg(ACCENT)),
        Span::styled(item.label.clone(), label_style),
    ])
}

fn calculator_line(state: &AppState, view_data: &ViewData) -> Line<'static> {
    Line::from(Span::styled(
        calculator_text(state, view_data.mode == InputMode::Distance),
        Style::default().fg(ACCENT),
    ))
}

fn calculator_text(state: &AppState, editing: bool) -> String {
    let cursor = if editing { "_" } else { "" };
    let input = state.calculator.as_str();
    let mut text = format!("    {CALCULATOR_ICON} mission km: {input}{cursor}");
    if input.is_empty() && !editing {
        text.push_str("(press enter to type)");
    }
    if let Some(result) = state.contribution() {
        text.push_str(&format!(
            " | rate {} €/km | contribution {} €",
            result.rate_label(),
            result.amount_label()
        ));
    }
    text
}

fn render_footer_text(state: &AppState) -> String {
    state
        .checklist()
        .links()
        .iter()
        .map(|link| format!("{}: {}", link.label, link.url))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return String::new();
    }

    let (mode, hints) = match view_data.mode {
        InputMode::Nav => (
            "NAV",
            "j/k move | enter toggle | i km | E/C expand/collapse | R reset | ? help | q quit",
        ),
        InputMode::Distance => ("INPUT", "0-9 . - type | backspace | ctrl+u clear | enter/esc done"),
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help\n\
nav: j/k or up/down move | g/G first/last | h/l collapse/expand\n\
nav: enter/space toggle section or task | i jump to km calculator\n\
nav: E expand all | C collapse all | R reset progress | q quit\n\
km input: digits . - | backspace | ctrl+u clear | enter/esc done"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
