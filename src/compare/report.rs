//! Diff report rendering

use crate::compare::fetch::ObjectKind;
use crate::compare::matrix::DiffRow;
use crate::table::Table;
use colored::{Color, Colorize};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::{self, Write};

/// Name column is wrapped past this many characters
pub const NAME_COLUMN_WIDTH: usize = 60;

/// Palette for distinct checksums within one row
const PALETTE: [Color; 12] = [
    Color::Green,
    Color::Blue,
    Color::Red,
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
    Color::BrightGreen,
    Color::BrightBlue,
    Color::BrightRed,
    Color::BrightYellow,
    Color::BrightMagenta,
    Color::BrightCyan,
];

/// Result of comparing one object kind across environments
#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub schema: String,
    pub object_kind: ObjectKind,
    pub environments: Vec<String>,
    pub rows: Vec<DiffRow>,
}

/// How a checksum cell is highlighted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Dim,
    Color(Color),
}

/// Highlight for `current` among the checksums of one row
///
/// Absent cells are dimmed. If every present checksum agrees it is green;
/// otherwise each distinct checksum takes a palette color by its position in
/// the sorted set of distinct present checksums.
pub fn checksum_style(checksums: &[Option<String>], current: Option<&str>) -> CellStyle {
    let Some(current) = current else {
        return CellStyle::Dim;
    };
    let distinct: BTreeSet<&str> = checksums.iter().filter_map(|c| c.as_deref()).collect();
    if distinct.len() == 1 {
        return CellStyle::Color(Color::Green);
    }
    let index = distinct.iter().position(|c| *c == current).unwrap_or(0);
    CellStyle::Color(PALETTE[index % PALETTE.len()])
}

impl DiffReport {
    pub fn has_differences(&self) -> bool {
        !self.rows.is_empty()
    }

    /// The diff table, or `None` when nothing differs
    pub fn table(&self) -> Option<Table> {
        if self.rows.is_empty() {
            return None;
        }
        let headers = std::iter::once(self.object_kind.name_header().to_string())
            .chain(self.environments.iter().cloned());
        let mut table = Table::new(headers);
        table.set_max_width(0, NAME_COLUMN_WIDTH);
        for row in &self.rows {
            let cells = std::iter::once(row.name.as_str()).chain(row.cells());
            table.add_row(cells);
        }
        Some(table)
    }

    /// Render the human-readable report
    pub fn render(&self, color: bool) -> String {
        let Some(table) = self.table() else {
            return format!(
                "\nNo {} definition differences found in schema '{}'\n",
                self.object_kind.display_name(),
                self.schema
            );
        };

        let body = if color {
            table.render_styled(|row, col, text| {
                if col == 0 {
                    return text.to_string();
                }
                let checksums = &self.rows[row].checksums;
                let current = checksums[col - 1].as_deref();
                match checksum_style(checksums, current) {
                    CellStyle::Dim => text.dimmed().to_string(),
                    CellStyle::Color(c) => text.color(c).to_string(),
                }
            })
        } else {
            table.render()
        };

        format!(
            "\n{} with Different Definitions in Schema '{}':\n\n{}",
            self.object_kind.report_title(),
            self.schema,
            body
        )
    }

    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W, color: bool) -> io::Result<()> {
        out.write_all(self.render(color).as_bytes())
    }

    /// Number of objects absent from at least one environment
    pub fn missing_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.checksums.iter().any(Option::is_none))
            .count()
    }
}
