use std::io::{self, IsTerminal};

use super::Phase;
use crate::domain::person::Person;

const HEADERS: [&str; 4] = ["#", "Id", "Name", "Age"];
const RESIDENCE: &str = "Residence";

pub fn render_session(rows: &[Person], phase: &Phase, message: &str, palette: &Palette) -> String {
    let mut out = String::new();
    out.push_str(&palette.heading("Persons"));
    out.push('\n');
    out.push_str(&render_table(rows, palette));
    out.push_str(&format!("{} {}\n", palette.phase(phase), message));
    out
}

pub fn render_table(rows: &[Person], palette: &Palette) -> String {
    if rows.is_empty() {
        return format!("{}\n", palette.dim("no rows"));
    }

    let cells = rows
        .iter()
        .enumerate()
        .map(|(index, person)| row_cells(index, person))
        .collect::<Vec<_>>();

    let mut widths = HEADERS
        .iter()
        .map(|header| header.len())
        .chain(std::iter::once(RESIDENCE.len()))
        .collect::<Vec<_>>();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header = HEADERS
        .iter()
        .copied()
        .chain(std::iter::once(RESIDENCE))
        .map(str::to_string)
        .collect::<Vec<_>>();
    let mut out = format!("{}\n", palette.dim(&join_padded(&header, &widths)));
    for (row, person) in cells.iter().zip(rows) {
        let line = join_padded(row, &widths);
        if person.id.is_none() {
            out.push_str(&palette.new_row(&line));
        } else {
            out.push_str(&line);
        }
        out.push('\n');
    }
    out
}

fn row_cells(index: usize, person: &Person) -> Vec<String> {
    vec![
        (index + 1).to_string(),
        person.id.map(|id| id.to_string()).unwrap_or_default(),
        person.name.clone().unwrap_or_default(),
        person.age.map(|age| age.to_string()).unwrap_or_default(),
        person.residence.clone().unwrap_or_default(),
    ]
}

fn join_padded(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn new_row(&self, text: &str) -> String {
        self.paint("33", text)
    }

    fn phase(&self, phase: &Phase) -> String {
        let (code, label) = match phase {
            Phase::Idle => ("37", "IDLE"),
            Phase::Fetching => ("34", "FETCHING"),
            Phase::Editing { dirty: false } => ("32", "CLEAN"),
            Phase::Editing { dirty: true } => ("33", "DIRTY"),
            Phase::Saving => ("35", "SAVING"),
            Phase::Error(_) => ("31", "ERROR"),
        };
        self.paint(code, &format!("[{label}]"))
    }
}
