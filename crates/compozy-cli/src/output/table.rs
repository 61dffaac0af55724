//! Aligned text grid behind `--format table`.

const GAP: &str = "  ";
const MIN_SHRUNK_WIDTH: usize = 8;

/// One rendered cell. The variant decides alignment and colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    /// Right-aligned.
    Number(String),
    /// A workflow status, coloured by how far along it is.
    Status(String),
    /// Missing or null.
    Empty,
}

impl Cell {
    fn plain(&self) -> &str {
        match self {
            Self::Text(text) | Self::Number(text) | Self::Status(text) => text,
            Self::Empty => "-",
        }
    }

    fn width(&self) -> usize {
        self.plain().chars().count()
    }

    fn draw(&self, width: usize, color: bool) -> String {
        let text = fit(self.plain(), width);
        let pad = " ".repeat(width.saturating_sub(text.chars().count()));
        match self {
            Self::Number(_) => format!("{pad}{text}"),
            Self::Status(raw) if color => match Tone::of(raw) {
                Some(tone) => format!("\u{1b}[{}m{text}\u{1b}[0m{pad}", tone.ansi()),
                None => format!("{text}{pad}"),
            },
            Self::Empty if color => format!("\u{1b}[2m{text}\u{1b}[0m{pad}"),
            _ => format!("{text}{pad}"),
        }
    }
}

/// Status families shared by problems, tasks and executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Done,
    AwaitingHuman,
    Working,
    Failed,
    Idle,
}

impl Tone {
    fn of(status: &str) -> Option<Self> {
        Some(match status {
            "completed" => Self::Done,
            "prd_review" | "spec_review" | "task_selection" | "selected" => Self::AwaitingHuman,
            "analyzing" | "prd_generation" | "spec_generation" | "task_creation" | "executing"
            | "testing" | "in_progress" | "running" => Self::Working,
            "failed" | "timeout" => Self::Failed,
            "draft" | "pending" | "cancelled" | "skipped" => Self::Idle,
            _ => return None,
        })
    }

    const fn ansi(self) -> &'static str {
        match self {
            Self::Done => "32",
            Self::AwaitingHuman => "33",
            Self::Working => "36",
            Self::Failed => "31",
            Self::Idle => "2",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GridStyle {
    pub max_width: Option<usize>,
    pub color: bool,
}

/// Rows of cells under fixed headers.
#[derive(Debug, Default)]
pub struct Grid {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    #[must_use]
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    #[must_use]
    pub fn render(&self, style: GridStyle) -> String {
        let mut widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(index, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(index))
                    .map(Cell::width)
                    .max()
                    .unwrap_or(0)
                    .max(header.chars().count())
            })
            .collect();
        if let Some(max_width) = style.max_width {
            self.shrink(&mut widths, max_width);
        }

        let header = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(header, width)| Cell::Text(header.clone()).draw(*width, false))
            .collect::<Vec<_>>()
            .join(GAP);
        let header = header.trim_end();

        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(header.to_string());
        lines.push("-".repeat(header.chars().count()));
        for row in &self.rows {
            let line = widths
                .iter()
                .enumerate()
                .map(|(index, width)| row.get(index).unwrap_or(&Cell::Empty).draw(*width, style.color))
                .collect::<Vec<_>>()
                .join(GAP);
            lines.push(line.trim_end().to_string());
        }
        lines.join("\n")
    }

    /// Narrow the widest columns, one character at a time, until the grid fits.
    fn shrink(&self, widths: &mut [usize], max_width: usize) {
        let gaps = widths.len().saturating_sub(1) * GAP.len();
        while widths.iter().sum::<usize>() + gaps > max_width {
            let widest = widths
                .iter()
                .enumerate()
                .filter(|(index, width)| {
                    let floor = self.headers[*index].chars().count().max(MIN_SHRUNK_WIDTH);
                    **width > floor
                })
                .max_by_key(|(_, width)| **width)
                .map(|(index, _)| index);
            let Some(index) = widest else {
                break;
            };
            widths[index] -= 1;
        }
    }
}

fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
