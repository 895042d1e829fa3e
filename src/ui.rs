use crate::{
    game::{
        MAX_NUMBER,
        MIN_NUMBER,
    },
    phase::{
        MAX_CLIMAX_TRIGGER,
        MIN_CLIMAX_TRIGGER,
        Phase,
    },
    reveal::Frame as RevealFrame,
    session::{
        RollerDisplay,
        SessionView,
    },
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        Event,
        EventStream,
        KeyCode,
        KeyEvent,
        KeyEventKind,
        KeyModifiers,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use futures::StreamExt;
use itertools::Itertools;
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::stdout;

const BINGO_LETTERS: [char; 5] = ['B', 'I', 'N', 'G', 'O'];
const COLUMN_SPAN: usize = 15;
const RECENT_COUNT: usize = 10;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UserEvent {
    Quit,
    StartOrStop,
    ToggleClimax,
    ToggleGrid,
    OpenSettings,
    OpenReset,
    ConfirmReset,
    SetClimaxTrigger(i64),
    Redraw,
}

#[derive(Debug)]
pub struct UiState {
    mode: Mode,
    grid_visible: bool,
    climax_trigger: u8,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

impl Default for UiState {
    fn default() -> Self {
        UiState {
            mode: Mode::Normal,
            grid_visible: true,
            climax_trigger: MIN_CLIMAX_TRIGGER,
            terminal: None,
        }
    }
}

impl UiState {
    pub fn is_modal_open(&self) -> bool {
        !matches!(self.mode, Mode::Normal)
    }

    pub fn grid_visible(&self) -> bool {
        self.grid_visible
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
enum Mode {
    #[default]
    Normal,
    Settings(SettingsState),
    ResetConfirm,
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct SettingsState {
    input: u32,
}

pub type InputEventReceiver = EventStream;

pub fn input_event_stream() -> InputEventReceiver {
    EventStream::new()
}

pub async fn next_raw_event(events: &mut InputEventReceiver) -> Result<Event> {
    match events.next().await {
        Some(event) => Ok(event?),
        None => Err(eyre!("terminal input stream closed")),
    }
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    // One persistent Terminal keeps buffers across draws
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

pub fn draw(state: &mut UiState, view: &SessionView) -> Result<()> {
    state.climax_trigger = view.climax_trigger;
    if let Some(mut term) = state.terminal.take() {
        let result = term.draw(|f| ui(f, state, view)).map(|_| ());
        state.terminal = Some(term);
        result?;
    }
    Ok(())
}

pub fn interpret_event(state: &mut UiState, event: Event) -> Option<UserEvent> {
    match event {
        Event::Key(key) => interpret_key(state, key),
        Event::Resize(_, _) => Some(UserEvent::Redraw),
        _ => None,
    }
}

pub fn interpret_key(state: &mut UiState, key: KeyEvent) -> Option<UserEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(UserEvent::Quit);
    }
    match &mut state.mode {
        Mode::Settings(settings) => match key.code {
            KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            KeyCode::Enter => {
                let value = i64::from(settings.input);
                state.mode = Mode::Normal;
                Some(UserEvent::SetClimaxTrigger(value))
            }
            KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('+') => {
                settings.input = (settings.input + 1).min(u32::from(MAX_CLIMAX_TRIGGER));
                Some(UserEvent::Redraw)
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('-') => {
                settings.input = settings
                    .input
                    .saturating_sub(1)
                    .max(u32::from(MIN_CLIMAX_TRIGGER));
                Some(UserEvent::Redraw)
            }
            KeyCode::Backspace => {
                settings.input /= 10;
                Some(UserEvent::Redraw)
            }
            KeyCode::Char(c) => {
                let digit = c.to_digit(10)?;
                // two digits are enough for 1..=74
                settings.input = (settings.input % 10) * 10 + digit;
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::ResetConfirm => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                state.mode = Mode::Normal;
                Some(UserEvent::ConfirmReset)
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::Normal => match key.code {
            KeyCode::Char(' ') => Some(UserEvent::StartOrStop),
            KeyCode::Char('c') => Some(UserEvent::ToggleClimax),
            KeyCode::Char('g') => {
                state.grid_visible = !state.grid_visible;
                Some(UserEvent::ToggleGrid)
            }
            KeyCode::Char('s') => {
                state.mode = Mode::Settings(SettingsState {
                    input: u32::from(state.climax_trigger),
                });
                Some(UserEvent::OpenSettings)
            }
            KeyCode::Char('r') => {
                state.mode = Mode::ResetConfirm;
                Some(UserEvent::OpenReset)
            }
            KeyCode::Char('q') => Some(UserEvent::Quit),
            _ => None,
        },
    }
}

fn ui(f: &mut Frame, state: &UiState, view: &SessionView) {
    f.render_widget(Clear, f.area());
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(12), Constraint::Length(4)])
        .split(f.area());

    if state.grid_visible {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[0]);
        draw_roller(f, columns[0], view);
        draw_grid(f, columns[1], view);
    } else {
        draw_roller(f, rows[0], view);
    }
    draw_bottom(f, rows[1], view);
    draw_modals(f, state);
}

fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Normal => Color::Blue,
        Phase::Climax => Color::Red,
    }
}

fn draw_roller(f: &mut Frame, area: Rect, view: &SessionView) {
    let accent = phase_color(view.phase);
    let flame = if view.is_manual_climax { " 🔥" } else { "" };
    let title = format!(" BINGO CHANCE{flame} ");
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Thick)
        .border_style(Style::default().fg(accent))
        .title(Span::styled(
            title,
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ))
        .title(
            Line::from(format!(" Remaining {} ", view.remaining)).right_aligned(),
        );
    let inner = block.inner(area);
    f.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(5),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let (lines, style) = roller_lines(view);
    let number = Paragraph::new(lines)
        .style(style)
        .alignment(Alignment::Center);
    f.render_widget(number, parts[1]);

    let control = if view.is_over {
        "Game over. Press r to reset"
    } else if view.is_revealing {
        "..."
    } else if view.is_rolling {
        "[space] STOP"
    } else {
        "[space] ROLL"
    };
    f.render_widget(
        Paragraph::new(control)
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::BOLD)),
        parts[3],
    );

    let recent = view.history.iter().rev().take(RECENT_COUNT).join(" ");
    let recent = if recent.is_empty() {
        String::from("No numbers drawn yet")
    } else {
        format!("Recent: {recent}")
    };
    f.render_widget(
        Paragraph::new(recent)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray)),
        parts[4],
    );
}

fn roller_lines(view: &SessionView) -> (Vec<Line<'static>>, Style) {
    let accent = Style::default()
        .fg(phase_color(view.phase))
        .add_modifier(Modifier::BOLD);
    match view.display {
        RollerDisplay::Ready => {
            let label = if view.is_over { "FINISHED" } else { "START" };
            (vec![Line::from(""), Line::from(""), Line::from(label)], accent)
        }
        RollerDisplay::Rolling { tens, ones } => (big_text(&format!("{tens}{ones}")), accent),
        RollerDisplay::Revealing(frame) => match frame {
            RevealFrame::Blank => (big_text(""), accent),
            RevealFrame::Number(n) => (big_text(&n.to_string()), accent),
            RevealFrame::Digits { tens, ones } => (big_text(&format!("{tens}{ones}")), accent),
            RevealFrame::Countdown(n) => (
                big_text(&n.to_string()),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        },
        RollerDisplay::Landed(n) => (big_text(&n.to_string()), accent),
    }
}

const GLYPH_HEIGHT: usize = 5;

fn glyph(digit: char) -> [&'static str; GLYPH_HEIGHT] {
    match digit {
        '0' => ["███", "█ █", "█ █", "█ █", "███"],
        '1' => [" █ ", "██ ", " █ ", " █ ", "███"],
        '2' => ["███", "  █", "███", "█  ", "███"],
        '3' => ["███", "  █", "███", "  █", "███"],
        '4' => ["█ █", "█ █", "███", "  █", "  █"],
        '5' => ["███", "█  ", "███", "  █", "███"],
        '6' => ["███", "█  ", "███", "█ █", "███"],
        '7' => ["███", "  █", "  █", "  █", "  █"],
        '8' => ["███", "█ █", "███", "█ █", "███"],
        '9' => ["███", "█ █", "███", "  █", "███"],
        _ => ["   ", "   ", "   ", "   ", "   "],
    }
}

/// Renders digits five rows tall, each glyph cell doubled in width.
fn big_text(text: &str) -> Vec<Line<'static>> {
    (0..GLYPH_HEIGHT)
        .map(|row| {
            let line = text
                .chars()
                .map(|c| glyph(c)[row].chars().map(|p| format!("{p}{p}")).join(""))
                .join("  ");
            Line::from(line)
        })
        .collect()
}

fn draw_grid(f: &mut Frame, area: Rect, view: &SessionView) {
    let climax = view.phase.is_climax();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(phase_color(view.phase)))
        .title(" Drawn ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 5); 5])
        .split(inner);

    let numbers = (MIN_NUMBER..=MAX_NUMBER).chunks(COLUMN_SPAN);
    for ((letter, column), rect) in BINGO_LETTERS.iter().zip(&numbers).zip(cols.iter()) {
        let header_style = if climax {
            Style::default().fg(Color::White).bg(Color::Red)
        } else {
            Style::default().fg(Color::Blue).bg(Color::Gray)
        };
        let mut lines = vec![
            Line::from(Span::styled(
                format!(" {letter} "),
                header_style.add_modifier(Modifier::BOLD),
            ))
            .centered(),
        ];
        for n in column {
            let style = if Some(n) == view.latest {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else if view.history.contains(&n) {
                let bg = if climax { Color::Red } else { Color::DarkGray };
                Style::default().fg(Color::White).bg(bg)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            lines.push(Line::from(Span::styled(format!("{n:>3} "), style)).centered());
        }
        f.render_widget(Paragraph::new(lines), *rect);
    }
}

fn draw_bottom(f: &mut Frame, area: Rect, view: &SessionView) {
    let phase = match (view.phase, view.is_manual_climax) {
        (Phase::Climax, true) => String::from("CLIMAX (manual)"),
        (Phase::Climax, false) => String::from("CLIMAX"),
        (Phase::Normal, _) => String::from("normal"),
    };
    let lines = vec![
        Line::from(format!(
            "Status: {} | Phase: {} | Climax at {} remaining",
            view.status, phase, view.climax_trigger
        )),
        Line::styled(
            "space roll/stop  c climax  g grid  s settings  r reset  q quit",
            Style::default().fg(Color::DarkGray),
        ),
    ];
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    f.render_widget(p, area);
}

fn draw_modals(f: &mut Frame, state: &UiState) {
    match &state.mode {
        Mode::Normal => {}
        Mode::Settings(settings) => {
            let area = centered_rect(50, 30, f.area());
            let block = Block::default().borders(Borders::ALL).title("Settings");
            let p = Paragraph::new(format!(
                "Climax starts when remaining <= {}\n\
                 (allowed {}..={})\n\n\
                 Enter=confirm Esc=cancel +/- or digits to edit",
                settings.input, MIN_CLIMAX_TRIGGER, MAX_CLIMAX_TRIGGER
            ));
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::ResetConfirm => {
            let area = centered_rect(40, 25, f.area());
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title("Reset game?");
            let p = Paragraph::new(
                "All drawn numbers will be cleared.\n\
                 The climax setting is kept.\n\n\
                 y/Enter=reset  n/Esc=cancel",
            );
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
    }
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1]);

    horizontal[1]
}
