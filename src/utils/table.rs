//! Table rendering utilities for CLI outputs.
//! Column widths grow to fit the widest cell.

pub struct Table {
    headers: Vec<String>,
    widths: Vec<usize>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let widths = headers.iter().map(|h| h.chars().count()).collect();
        Self {
            headers,
            widths,
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        for (w, cell) in self.widths.iter_mut().zip(&row) {
            *w = (*w).max(cell.chars().count());
        }
        self.rows.push(row);
    }

    fn render_line(&self, cells: &[String]) -> String {
        let mut line = String::new();
        for (i, w) in self.widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            line.push_str(&format!("{:<width$}  ", cell, width = w));
        }
        line.trim_end().to_string()
    }

    pub fn render(&self) -> String {
        let mut out = self.render_line(&self.headers);
        out.push('\n');
        let total: usize = self.widths.iter().sum::<usize>() + 2 * self.widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total));
        out.push('\n');

        for row in &self.rows {
            out.push_str(&self.render_line(row));
            out.push('\n');
        }
        out
    }
}
