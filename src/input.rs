use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use tokio::sync::{mpsc, watch};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    SelectNext,
    Quit,
}

pub fn parse_command(key_code: &KeyCode, modifiers: KeyModifiers) -> Option<InputCommand> {
    match key_code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputCommand::Quit)
        }
        KeyCode::Char(' ') | KeyCode::Tab | KeyCode::Right | KeyCode::Enter => {
            Some(InputCommand::SelectNext)
        }
        KeyCode::Esc => Some(InputCommand::Quit),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'n' => Some(InputCommand::SelectNext),
            'q' => Some(InputCommand::Quit),
            _ => None,
        },
        _ => None,
    }
}

/// Accepts at most one trigger per `window`; triggers inside the window are dropped.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    pub fn accept(&mut self, now: Instant) -> bool {
        match self.last_accepted {
            Some(last) if now.saturating_duration_since(last) < self.window => false,
            _ => {
                self.last_accepted = Some(now);
                true
            }
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

/// Blocking key reader. Forwards debounced SelectNext events and raises shutdown on quit.
///
/// `next_event` returns `Ok(None)` when nothing arrived within its poll window.
/// Shutdown is raised on every exit, including a read error, since raw mode
/// swallows Ctrl+C as a key event.
pub fn run_input_loop<E, R>(
    mut next_event: E,
    mut on_resize: R,
    select_tx: mpsc::Sender<()>,
    shutdown_tx: watch::Sender<bool>,
    debounce: Duration,
) -> io::Result<()>
where
    E: FnMut() -> io::Result<Option<Event>>,
    R: FnMut(),
{
    let shutdown_rx = shutdown_tx.subscribe();
    let mut debouncer = Debouncer::new(debounce);

    let result = loop {
        if *shutdown_rx.borrow() {
            break Ok(());
        }
        let event = match next_event() {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => break Err(e),
        };
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                match parse_command(&key.code, key.modifiers) {
                    Some(InputCommand::SelectNext) => {
                        if !debouncer.accept(Instant::now()) {
                            tracing::debug!("Select ignored (debounce)");
                        } else if select_tx.try_send(()).is_err() {
                            tracing::debug!("Select coalesced with pending event");
                        }
                    }
                    Some(InputCommand::Quit) => {
                        tracing::info!("Quit key pressed");
                        break Ok(());
                    }
                    None => {}
                }
            }
            Event::Resize(_, _) => on_resize(),
            _ => {}
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Input reader failed, shutting down");
    }
    let _ = shutdown_tx.send(true);
    result
}
