/// Text laid out for a fixed-size character display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LcdText {
    columns: usize,
    rows: usize,
    lines: Vec<String>,
}

impl LcdText {
    /// `"{asset} Price: {price}"` over `"{delta}% change"`, clipped to the geometry.
    pub fn quote(columns: usize, rows: usize, asset: &str, price: f64, delta: f64) -> Self {
        let text = format!("{} Price: {:.2}\n{:.2}% change", asset, price, delta);
        Self::from_text(columns, rows, &text)
    }

    pub fn from_text(columns: usize, rows: usize, text: &str) -> Self {
        let mut lines: Vec<String> = text
            .lines()
            .take(rows)
            .map(|l| l.chars().take(columns).collect())
            .collect();
        lines.resize(rows, String::new());
        Self {
            columns,
            rows,
            lines,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Lines right-padded with spaces to the full column width.
    pub fn padded(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|l| format!("{:<width$}", l, width = self.columns))
            .collect()
    }
}
