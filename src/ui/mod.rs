pub mod dashboard;
pub mod lcd;

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::{DefaultTerminal, Frame};

use crate::error::TrackerError;
use crate::mapper::ServoPositions;
use crate::ports::{ActuatorPort, DisplayPort};
use crate::servo::SimulatedServo;

use dashboard::{LcdPanel, ServoGauge, StatusBar};
use lcd::LcdText;

/// Everything the terminal panel draws.
#[derive(Debug, Clone)]
pub struct PanelState {
    pub asset: String,
    pub price: Option<f64>,
    pub delta: Option<f64>,
    pub lcd: LcdText,
    pub pulse_us: Option<u32>,
    pub servo_min_us: u32,
    pub servo_max_us: u32,
    pub servo_stopped: bool,
    pub updated_at: Option<DateTime<Local>>,
}

impl PanelState {
    pub fn new(columns: usize, rows: usize, servo: &ServoPositions) -> Self {
        Self {
            asset: String::new(),
            price: None,
            delta: None,
            lcd: LcdText::from_text(columns, rows, "Waiting for\nprices..."),
            pulse_us: None,
            servo_min_us: servo.min(),
            servo_max_us: servo.max(),
            servo_stopped: false,
            updated_at: None,
        }
    }

    pub fn show_quote(&mut self, asset: &str, price: f64, delta: f64) {
        self.asset = asset.to_string();
        self.price = Some(price);
        self.delta = Some(delta);
        self.lcd = LcdText::quote(self.lcd.columns(), self.lcd.rows(), asset, price, delta);
        self.updated_at = Some(Local::now());
    }
}

pub fn render(frame: &mut Frame, state: &PanelState) {
    let lcd_height = state.lcd.rows() as u16 + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(lcd_height),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(frame.area());

    let lcd_width = (state.lcd.columns() as u16 + 2).min(chunks[0].width);
    let lcd_area = ratatui::layout::Rect {
        width: lcd_width,
        ..chunks[0]
    };
    frame.render_widget(LcdPanel::new(&state.lcd), lcd_area);
    frame.render_widget(
        ServoGauge::new(
            state.pulse_us,
            state.servo_min_us,
            state.servo_max_us,
            state.servo_stopped,
        ),
        chunks[1],
    );
    let updated = state.updated_at.map(|t| t.format("%H:%M:%S").to_string());
    frame.render_widget(
        StatusBar {
            asset: &state.asset,
            price: state.price,
            delta: state.delta,
            updated: updated.as_deref(),
        },
        chunks[2],
    );
}

struct PanelInner {
    terminal: Option<DefaultTerminal>,
    state: PanelState,
    servo: SimulatedServo,
}

impl PanelInner {
    fn redraw(&mut self) {
        let state = &self.state;
        if let Some(terminal) = self.terminal.as_mut() {
            if let Err(e) = terminal.draw(|f| render(f, state)) {
                tracing::warn!(error = %e, "Panel redraw failed");
            }
        }
    }
}

/// Terminal stand-in for the LCD and the cart servo. Implements both output ports;
/// clones share one terminal.
#[derive(Clone)]
pub struct TerminalPanel {
    inner: Arc<Mutex<PanelInner>>,
}

impl TerminalPanel {
    pub fn new(terminal: DefaultTerminal, state: PanelState, servo: SimulatedServo) -> Self {
        Self::build(Some(terminal), state, servo)
    }

    /// Panel without a terminal; state is tracked but nothing is drawn.
    pub fn headless(state: PanelState, servo: SimulatedServo) -> Self {
        Self::build(None, state, servo)
    }

    fn build(terminal: Option<DefaultTerminal>, state: PanelState, servo: SimulatedServo) -> Self {
        let mut inner = PanelInner {
            terminal,
            state,
            servo,
        };
        inner.redraw();
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub fn state(&self) -> Option<PanelState> {
        self.inner.lock().ok().map(|i| i.state.clone())
    }

    pub fn redraw(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.redraw();
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, PanelInner>, TrackerError> {
        self.inner
            .lock()
            .map_err(|_| TrackerError::Hardware("terminal panel poisoned".to_string()))
    }
}

impl DisplayPort for TerminalPanel {
    fn show(&mut self, asset: &str, price: f64, delta: f64) {
        tracing::info!(asset, price, delta, "{} price: {}   {} % change", asset, price, delta);
        if let Ok(mut inner) = self.inner.lock() {
            inner.state.show_quote(asset, price, delta);
            inner.redraw();
        }
    }
}

impl ActuatorPort for TerminalPanel {
    fn set(&mut self, pulse_us: u32) -> Result<(), TrackerError> {
        let mut inner = self.lock()?;
        inner.servo.set(pulse_us)?;
        inner.state.pulse_us = Some(pulse_us);
        inner.state.servo_stopped = false;
        inner.redraw();
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TrackerError> {
        let mut inner = self.lock()?;
        inner.servo.stop()?;
        inner.state.servo_stopped = true;
        inner.redraw();
        Ok(())
    }

    fn release(&mut self) -> Result<(), TrackerError> {
        let mut inner = self.lock()?;
        inner.servo.release()
    }
}
