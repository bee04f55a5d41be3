use crate::config::{Config, ConfigError};
use crate::container::ContainerKind;
use crate::controller::{Controller, Effect, Mode, Snapshot, StatusLevel};
use crate::keymap::Keymap;
use crate::model::{Status, Task};
use crate::worker::StoreWorker;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use std::io::{stdout, Stdout};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Colors, symbols and key hints handed to the renderer.
#[derive(Debug, Clone)]
pub struct Theme {
    text: Color,
    selected: Color,
    muted: Color,
    error: Color,
    cursor: String,
    checked: String,
    in_progress: String,
    hints: Vec<(String, &'static str)>,
}

impl Theme {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let binds = &config.keybinds;
        let hints = [
            (&binds.up, "up"),
            (&binds.down, "down"),
            (&binds.focus, "switch pane"),
            (&binds.toggle, "done"),
            (&binds.add, "add"),
            (&binds.delete, "delete"),
            (&binds.quit, "quit"),
        ]
        .into_iter()
        .filter_map(|(keys, label)| keys.first().map(|k| (k.clone(), label)))
        .collect();
        Ok(Theme {
            text: parse_color(&config.colors.text)?,
            selected: parse_color(&config.colors.selected)?,
            muted: parse_color(&config.colors.muted)?,
            error: parse_color(&config.colors.error)?,
            cursor: config.symbols.cursor.clone(),
            checked: config.symbols.checked.clone(),
            in_progress: config.symbols.in_progress.clone(),
            hints,
        })
    }
}

pub fn run(
    controller: Controller,
    worker: StoreWorker,
    keymap: Keymap,
    theme: Theme,
    store_label: String,
) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App {
        controller,
        worker,
        keymap,
        theme,
        store_label,
    };
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    controller: Controller,
    worker: StoreWorker,
    keymap: Keymap,
    theme: Theme,
    store_label: String,
}

impl App {
    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            while let Some(response) = self.worker.try_recv()? {
                let effect = self.controller.complete(response);
                self.apply(effect)?;
            }
            terminal.draw(|f| draw(f, &self.controller.snapshot(), &self.theme, &self.store_label))?;
            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    let Some(input) = self.keymap.resolve(self.controller.mode(), &key) else {
                        continue;
                    };
                    let effect = self.controller.handle(input);
                    if self.apply(effect)? {
                        break;
                    }
                }
            }
        }
        self.worker.shutdown();
        Ok(())
    }

    /// Returns true when the session should end.
    fn apply(&mut self, effect: Effect) -> Result<bool> {
        match effect {
            Effect::Idle => Ok(false),
            Effect::Request(request) => {
                debug!(?request, "submitting store request");
                self.worker.submit(request)?;
                Ok(false)
            }
            Effect::Quit => Ok(true),
        }
    }
}

pub fn draw(f: &mut Frame<'_>, snapshot: &Snapshot<'_>, theme: &Theme, store_label: &str) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.size());

    draw_header(f, layout[0], theme, store_label);
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(layout[1]);
    draw_lists(f, panes[0], snapshot, theme);
    draw_tasks(f, panes[1], snapshot, theme);
    draw_footer(f, layout[2], snapshot, theme);

    if snapshot.mode == Mode::Compose {
        draw_compose(f, snapshot, theme);
    }
}

fn draw_header(f: &mut Frame<'_>, area: Rect, theme: &Theme, store_label: &str) {
    let title = Line::from(vec![
        Span::styled(
            "tasktui ",
            Style::default()
                .fg(theme.selected)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  •  "),
        Span::styled(store_label.to_string(), Style::default().fg(theme.muted)),
    ]);
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(theme.muted));
    let paragraph = Paragraph::new(title)
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(paragraph, area);
}

fn draw_lists(f: &mut Frame<'_>, area: Rect, snapshot: &Snapshot<'_>, theme: &Theme) {
    let cursor = snapshot.lists.cursor();
    let items = snapshot
        .lists
        .items()
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let selected = cursor == Some(idx);
            let text = format!("{} {}", cursor_mark(theme, selected), item.label());
            ListItem::new(text).style(row_style(theme, selected))
        })
        .collect::<Vec<_>>();
    let mut state = ListState::default();
    state.select(cursor);
    let focused = snapshot.focus == ContainerKind::Lists;
    let list = List::new(items).block(pane_block("Lists", focused, theme));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_tasks(f: &mut Frame<'_>, area: Rect, snapshot: &Snapshot<'_>, theme: &Theme) {
    let title = snapshot
        .lists
        .current_item()
        .map(|item| format!("Tasks: {}", item.label()))
        .unwrap_or_else(|_| "Tasks".to_string());
    let focused = snapshot.focus == ContainerKind::Tasks;
    let block = pane_block(&title, focused, theme);

    if snapshot.tasks.is_empty() {
        let empty = Paragraph::new(Span::styled("No tasks", Style::default().fg(theme.muted)))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let mut state = ListState::default();
    let items = snapshot
        .tasks
        .iter()
        .enumerate()
        .map(|(row, (idx, task))| {
            let selected = snapshot.tasks_cursor == Some(*idx);
            if selected {
                state.select(Some(row));
            }
            task_item(task, selected, theme)
        })
        .collect::<Vec<_>>();
    let list = List::new(items).block(block);
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_footer(f: &mut Frame<'_>, area: Rect, snapshot: &Snapshot<'_>, theme: &Theme) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(2)])
        .split(area);

    let status = match snapshot.status {
        Some(message) => {
            let color = match message.level {
                StatusLevel::Info => theme.text,
                StatusLevel::Error => theme.error,
            };
            Line::from(Span::styled(message.text.clone(), Style::default().fg(color)))
        }
        None => Line::from(""),
    };
    f.render_widget(Paragraph::new(status).wrap(Wrap { trim: true }), rows[0]);

    let help = match snapshot.mode {
        Mode::Browse => help_line(theme),
        Mode::Compose => Line::from(vec![
            Span::styled("Enter", Style::default().fg(theme.selected)),
            Span::raw(" confirm  "),
            Span::styled("Esc", Style::default().fg(theme.selected)),
            Span::raw(" cancel"),
        ]),
    };
    let help_bar = Paragraph::new(help).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(theme.muted)),
    );
    f.render_widget(help_bar, rows[1]);
}

fn draw_compose(f: &mut Frame<'_>, snapshot: &Snapshot<'_>, theme: &Theme) {
    let Some(input) = snapshot.input else {
        return;
    };
    let area = centered_rect(60, 25, f.size());
    let value = if input.value().is_empty() {
        Line::from(vec![
            Span::raw("▌"),
            Span::styled(input.placeholder(), Style::default().fg(theme.muted)),
        ])
    } else {
        Line::from(Span::styled(
            input.with_caret(),
            Style::default().fg(theme.text),
        ))
    };
    let body = vec![
        value,
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to confirm, Esc to cancel.",
            Style::default().fg(theme.muted),
        )),
    ];
    let title = format!("Add New {}", snapshot.focus);
    let dialog = Paragraph::new(body).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(Span::styled(
                title,
                Style::default()
                    .fg(theme.selected)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.selected)),
    );
    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

fn help_line(theme: &Theme) -> Line<'static> {
    let mut spans = Vec::new();
    for (key, label) in &theme.hints {
        spans.push(Span::styled(key.clone(), Style::default().fg(theme.selected)));
        spans.push(Span::raw(format!(" {label}  ")));
    }
    Line::from(spans)
}

fn pane_block<'a>(title: &str, focused: bool, theme: &Theme) -> Block<'a> {
    let accent = if focused { theme.selected } else { theme.muted };
    Block::default()
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
}

fn task_item(task: &Task, selected: bool, theme: &Theme) -> ListItem<'static> {
    let mark = match task.status {
        Status::Done => theme.checked.as_str(),
        Status::InProgress => theme.in_progress.as_str(),
        Status::Ready => " ",
    };
    let text = format!("{} [{}] {}", cursor_mark(theme, selected), mark, task.name);
    let mut style = row_style(theme, selected);
    if task.status.is_done() && !selected {
        style = style.fg(theme.muted).add_modifier(Modifier::CROSSED_OUT);
    }
    ListItem::new(text).style(style)
}

fn cursor_mark(theme: &Theme, selected: bool) -> String {
    if selected {
        theme.cursor.clone()
    } else {
        " ".repeat(theme.cursor.chars().count())
    }
}

fn row_style(theme: &Theme, selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(theme.selected)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text)
    }
}

fn parse_color(raw: &str) -> Result<Color, ConfigError> {
    Color::from_str(raw).map_err(|_| ConfigError::InvalidColor(raw.to_string()))
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
