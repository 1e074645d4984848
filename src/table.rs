//! Bordered, left-aligned text tables.
//!
//! ```text
//! +----------------+------------+------------+
//! | Procedure Name | dev        | prod       |
//! +----------------+------------+------------+
//! | usp_orders     | 4c1d0e9a7b | N/A        |
//! +----------------+------------+------------+
//! ```

/// A text table; every column is left-aligned
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    max_widths: Vec<Option<usize>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let max_widths = vec![None; headers.len()];
        Self {
            headers,
            rows: Vec::new(),
            max_widths,
        }
    }

    /// Wrap cells of column `col` onto extra lines past `width` characters
    pub fn set_max_width(&mut self, col: usize, width: usize) {
        if let Some(slot) = self.max_widths.get_mut(col) {
            *slot = Some(width.max(1));
        }
    }

    /// Append a row; missing cells render empty, extra cells are ignored
    pub fn add_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells
            .into_iter()
            .map(Into::into)
            .take(self.headers.len())
            .collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Render without styling
    pub fn render(&self) -> String {
        self.render_styled(|_, _, text| text.to_string())
    }

    /// Render, passing each padded body cell line through `style(row, col, text)`
    ///
    /// Padding is applied before styling so escape sequences do not skew widths.
    pub fn render_styled<F>(&self, style: F) -> String
    where
        F: Fn(usize, usize, &str) -> String,
    {
        let header_lines: Vec<Vec<String>> = self
            .headers
            .iter()
            .enumerate()
            .map(|(col, h)| self.wrap(col, h))
            .collect();
        let body: Vec<Vec<Vec<String>>> = self
            .rows
            .iter()
            .map(|row| row.iter().enumerate().map(|(col, c)| self.wrap(col, c)).collect())
            .collect();

        let widths: Vec<usize> = (0..self.headers.len())
            .map(|col| {
                let header = header_lines[col].iter().map(|l| l.chars().count()).max().unwrap_or(0);
                let cells = body
                    .iter()
                    .flat_map(|row| row[col].iter())
                    .map(|l| l.chars().count())
                    .max()
                    .unwrap_or(0);
                header.max(cells)
            })
            .collect();

        let border = {
            let mut line = String::from("+");
            for w in &widths {
                line.push_str(&"-".repeat(w + 2));
                line.push('+');
            }
            line
        };

        let mut out = String::new();
        out.push_str(&border);
        out.push('\n');
        push_lines(&mut out, &header_lines, &widths, |_, text| text.to_string());
        out.push_str(&border);
        out.push('\n');
        for (row_idx, row) in body.iter().enumerate() {
            push_lines(&mut out, row, &widths, |col, text| style(row_idx, col, text));
        }
        if !body.is_empty() {
            out.push_str(&border);
            out.push('\n');
        }
        out
    }

    fn wrap(&self, col: usize, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        match self.max_widths.get(col).copied().flatten() {
            Some(width) if chars.len() > width => {
                chars.chunks(width).map(|c| c.iter().collect()).collect()
            }
            _ => vec![text.to_string()],
        }
    }
}

fn push_lines<F>(out: &mut String, cells: &[Vec<String>], widths: &[usize], style: F)
where
    F: Fn(usize, &str) -> String,
{
    let height = cells.iter().map(Vec::len).max().unwrap_or(1);
    for line in 0..height {
        out.push('|');
        for (col, width) in widths.iter().enumerate() {
            let text = cells[col].get(line).map(String::as_str).unwrap_or("");
            let padded = format!("{:<width$}", text, width = *width);
            out.push(' ');
            out.push_str(&style(col, &padded));
            out.push_str(" |");
        }
        out.push('\n');
    }
}
