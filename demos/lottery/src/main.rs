//! Lottery TUI - oneway example
//!
//! The render loop is the delivery context: store notifications are queued
//! on a manual `DeliveryQueue` and run by the same `select!` loop that reads
//! the keyboard and draws frames. Observers therefore never race the
//! renderer.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p lottery-demo
//!
//! # Faster draws, a richer player, logs to a file
//! cargo run -p lottery-demo -- --coins 500 --delay-ms 500 --log-file lottery.log
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use lottery_demo::action::LotteryChange;
use lottery_demo::agent::DrawAgent;
use lottery_demo::config::{ConfigError, LotteryConfig};
use lottery_demo::events::{spawn_event_poller, TermEvent};
use lottery_demo::flow::{LotteryFlow, Screen};
use lottery_demo::navigator::Navigator;
use lottery_demo::reducer::Lottery;
use lottery_demo::state::{LotteryState, Player};
use lottery_demo::ui::{self, KeyCommand, LotteryPanel, LotteryViewAction, Status};
use oneway::{bind, DeliveryContext, Process, Store};
use parking_lot::Mutex;
use ratatui::{backend::Backend, backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Coins added by the grant key
const GRANT_COINS: u64 = 50;

/// Double-or-nothing lottery - oneway example
#[derive(Parser, Debug)]
#[command(name = "lottery")]
#[command(about = "A double-or-nothing lottery demonstrating oneway stores and flows")]
struct Args {
    /// Starting balance
    #[arg(long)]
    coins: Option<u64>,

    /// Start with the player banned
    #[arg(long)]
    banned: bool,

    /// How long a draw takes, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Give up on a draw after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// JSON config file; command-line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to this file (filter with RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn load_config(&self) -> Result<LotteryConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => LotteryConfig::from_file(path)?,
            None => LotteryConfig::default(),
        };
        if let Some(coins) = self.coins {
            config.coins = coins;
        }
        if self.banned {
            config.banned = true;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.delay_ms = delay_ms;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(path) = &args.log_file {
        init_tracing(path)?;
    }

    // ===== Terminal setup =====
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, config).await;

    // ===== Cleanup =====
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn init_tracing(path: &Path) -> io::Result<()> {
    let file = std::fs::File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, config: LotteryConfig) -> io::Result<()> {
    let (delivery, mut queue) = DeliveryContext::manual();

    let mut initial = LotteryState::new(Player::new("player-1", "Player One"), config.coins);
    initial.player.banned = config.banned;
    let store = Store::builder(Lottery, initial)
        .config(config.store.clone())
        .deliver_on(delivery.clone())
        .agent(DrawAgent::new(config.delay(), config.timeout()))
        .build();

    let navigator = Navigator::new();
    let flow = LotteryFlow::new(navigator.clone(), store.clone(), &delivery);
    flow.observe_output(|output| tracing::info!(?output, "Lottery flow output"));
    flow.start(());

    let Some(Screen::Lottery(view)) = navigator.top() else {
        return Err(io::Error::other("lottery screen was not pushed"));
    };
    let panel = Arc::new(Mutex::new(LotteryPanel::default()));
    bind(&panel, &view);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let poller = spawn_event_poller(
        event_tx,
        Duration::from_millis(10),
        Duration::from_millis(16),
        cancel.clone(),
    );
    let mut ticker = tokio::time::interval(Duration::from_millis(120));
    let mut tick: u32 = 0;
    let mut needs_render = true;

    loop {
        if needs_render {
            let alert = match navigator.modal() {
                Some(Screen::Alert(alert)) => Some(alert),
                _ => None,
            };
            terminal.draw(|frame| ui::render(frame, &panel.lock(), alert.as_ref(), tick))?;
            needs_render = false;
        }

        tokio::select! {
            Some(event) = event_rx.recv() => match event {
                TermEvent::Resize(..) => needs_render = true,
                TermEvent::Key(key) => match ui::map_key(key, navigator.modal().is_some()) {
                    Some(KeyCommand::Quit) => break,
                    Some(KeyCommand::View(LotteryViewAction::Dismiss)) => {
                        navigator.dismiss();
                        view.dispatch_action(LotteryViewAction::Dismiss);
                        needs_render = true;
                    }
                    Some(KeyCommand::View(action)) => view.dispatch_action(action),
                    Some(KeyCommand::ToggleBan) => {
                        let change = if store.state().player.banned {
                            LotteryChange::Unban
                        } else {
                            LotteryChange::Ban
                        };
                        store.dispatch_change(change);
                    }
                    Some(KeyCommand::Grant) => store.dispatch_change(LotteryChange::Grant(GRANT_COINS)),
                    None => {}
                },
            },
            delivered = queue.next() => {
                if !delivered {
                    break;
                }
                needs_render = true;
            }
            _ = ticker.tick() => {
                tick = tick.wrapping_add(1);
                let drawing = panel
                    .lock()
                    .view()
                    .is_some_and(|view| view.status == Status::Drawing);
                needs_render |= drawing;
            }
        }
    }

    cancel.cancel();
    let _ = poller.await;
    Ok(())
}
