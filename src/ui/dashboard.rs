use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
};

use super::lcd::LcdText;

pub struct LcdPanel<'a> {
    lcd: &'a LcdText,
}

impl<'a> LcdPanel<'a> {
    pub fn new(lcd: &'a LcdText) -> Self {
        Self { lcd }
    }
}

impl Widget for LcdPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines: Vec<Line> = self
            .lcd
            .padded()
            .into_iter()
            .map(|l| {
                Line::from(Span::styled(
                    l,
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ))
            })
            .collect();

        let block = Block::default()
            .title(format!(" LCD {}x{} ", self.lcd.columns(), self.lcd.rows()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}

pub struct ServoGauge {
    pulse_us: Option<u32>,
    min_us: u32,
    max_us: u32,
    stopped: bool,
}

impl ServoGauge {
    pub fn new(pulse_us: Option<u32>, min_us: u32, max_us: u32, stopped: bool) -> Self {
        Self {
            pulse_us,
            min_us,
            max_us,
            stopped,
        }
    }

    /// Position of the pulse within `[min_us, max_us]`, 0.0..=1.0.
    pub fn ratio(&self) -> f64 {
        let Some(pulse) = self.pulse_us else {
            return 0.0;
        };
        if self.max_us <= self.min_us {
            return 0.0;
        }
        let span = (self.max_us - self.min_us) as f64;
        (pulse.saturating_sub(self.min_us) as f64 / span).clamp(0.0, 1.0)
    }
}

impl Widget for ServoGauge {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let label = match (self.pulse_us, self.stopped) {
            (_, true) => "STOPPED".to_string(),
            (Some(p), false) => format!("{} us", p),
            (None, false) => "--".to_string(),
        };
        let color = if self.stopped {
            Color::DarkGray
        } else {
            Color::Cyan
        };
        let block = Block::default()
            .title(" Cart ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        Gauge::default()
            .block(block)
            .gauge_style(Style::default().fg(color))
            .ratio(self.ratio())
            .label(label)
            .render(area, buf);
    }
}

pub struct StatusBar<'a> {
    pub asset: &'a str,
    pub price: Option<f64>,
    pub delta: Option<f64>,
    pub updated: Option<&'a str>,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let delta_color = match self.delta {
            Some(d) if d > 0.0 => Color::Green,
            Some(d) if d < 0.0 => Color::Red,
            _ => Color::White,
        };
        let line = Line::from(vec![
            Span::styled(
                format!(" {} ", self.asset),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(
                self.price
                    .map(|p| format!("{:.2} ", p))
                    .unwrap_or_default(),
            ),
            Span::styled(
                self.delta
                    .map(|d| format!("{:+.2}% ", d))
                    .unwrap_or_else(|| "--  ".to_string()),
                Style::default().fg(delta_color),
            ),
            Span::styled(
                format!("| updated {} ", self.updated.unwrap_or("never")),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                "| [n] next coin  [q] quit",
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        Paragraph::new(line).render(area, buf);
    }
}
