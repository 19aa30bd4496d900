//! Terminal UI for the lottery screen
//!
//! The screen never reads `LotteryState` directly: it renders a
//! [`LotteryView`] projected from the store, and talks back through
//! [`LotteryViewAction`]s that the projection maps onto store actions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use oneway::View;
use ratatui::{
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::action::LotteryAction;
use crate::state::{LotteryState, Phase};

pub const SPINNERS: [&str; 4] = ["◐", "◓", "◑", "◒"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Ready,
    Drawing,
    Failed(String),
}

/// What the lottery screen shows
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LotteryView {
    pub player: String,
    pub coins: u64,
    pub banned: bool,
    pub status: Status,
}

impl LotteryView {
    pub fn project(state: &LotteryState) -> Self {
        let status = match state.phase {
            Phase::Idle => Status::Ready,
            Phase::Loading => Status::Drawing,
            Phase::Error(error) => Status::Failed(error.to_string()),
        };
        Self {
            player: state.player.name.clone(),
            coins: state.coins,
            banned: state.player.banned,
            status,
        }
    }
}

/// Actions the lottery screen can send
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LotteryViewAction {
    Play,
    /// Close the alert on top of the screen; navigation only
    Dismiss,
}

impl LotteryViewAction {
    pub fn into_store_action(self) -> Option<LotteryAction> {
        match self {
            LotteryViewAction::Play => Some(LotteryAction::Play),
            LotteryViewAction::Dismiss => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn lost() -> Self {
        Self {
            title: "Double or nothing".into(),
            message: "Nothing this time. Your balance is gone.".into(),
        }
    }
}

/// Keeps the last projected view for the render loop
#[derive(Debug, Default)]
pub struct LotteryPanel {
    view: Option<LotteryView>,
    renders: u64,
}

impl LotteryPanel {
    pub fn view(&self) -> Option<&LotteryView> {
        self.view.as_ref()
    }

    /// Number of states rendered so far
    pub fn renders(&self) -> u64 {
        self.renders
    }
}

impl View for LotteryPanel {
    type State = LotteryView;

    fn render(&mut self, state: &LotteryView) {
        self.view = Some(state.clone());
        self.renders += 1;
    }
}

/// What a key press asks the host to do
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
    View(LotteryViewAction),
    ToggleBan,
    Grant,
    Quit,
}

pub fn map_key(key: KeyEvent, alert_open: bool) -> Option<KeyCommand> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(KeyCommand::Quit);
    }
    if alert_open {
        return match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                Some(KeyCommand::View(LotteryViewAction::Dismiss))
            }
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char('p') | KeyCode::Enter => Some(KeyCommand::View(LotteryViewAction::Play)),
        KeyCode::Char('b') => Some(KeyCommand::ToggleBan),
        KeyCode::Char('g') => Some(KeyCommand::Grant),
        KeyCode::Char('q') | KeyCode::Esc => Some(KeyCommand::Quit),
        _ => None,
    }
}

/// Render the lottery screen, with `alert` on top when one is presented
pub fn render(frame: &mut Frame, panel: &LotteryPanel, alert: Option<&Alert>, tick: u32) {
    let area = frame.area();
    let Some(view) = panel.view() else {
        frame.render_widget(Paragraph::new("Loading…"), area);
        return;
    };

    let spinner = if view.status == Status::Drawing {
        format!(" {} ", SPINNERS[(tick as usize) % SPINNERS.len()])
    } else {
        String::new()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Rgb(80, 80, 100)))
        .title(format!(" Lottery{spinner}"))
        .title_style(Style::default().fg(Color::Yellow).bold())
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [body, help] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

    let status = match &view.status {
        Status::Ready => Line::from("Press p to play double or nothing").fg(Color::Green),
        Status::Drawing => Line::from("Drawing…").fg(Color::Cyan),
        Status::Failed(message) => Line::from(message.as_str()).fg(Color::Red),
    };
    let mut player = vec![Span::raw("Player: "), Span::raw(view.player.as_str()).bold()];
    if view.banned {
        player.push(Span::raw(" (banned)").fg(Color::Red));
    }
    let lines = vec![
        Line::from(player),
        Line::from(format!("Coins: {}", view.coins)),
        Line::default(),
        status,
    ];
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        body,
    );
    frame.render_widget(
        Paragraph::new("p play  b ban/unban  g +50 coins  q quit")
            .fg(Color::DarkGray)
            .alignment(Alignment::Center),
        help,
    );

    if let Some(alert) = alert {
        render_alert(frame, area, alert);
    }
}

fn render_alert(frame: &mut Frame, area: Rect, alert: &Alert) {
    let [row] = Layout::vertical([Constraint::Length(5)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Percentage(60)])
        .flex(Flex::Center)
        .areas(row);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(format!(" {} ", alert.title))
        .title_alignment(Alignment::Center);
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(alert.message.as_str()),
            Line::from("Enter to dismiss").fg(Color::DarkGray),
        ])
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true }),
        popup,
    );
}
