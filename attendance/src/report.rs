use std::fmt::{self, Display, Formatter, Write};

use unicode_width::UnicodeWidthChar;

use crate::aggregate::Overall;
use crate::extract::SubjectAttendance;
use crate::{Counts, Status};

/// Width budget of the subject-name column in half-width units (15 glyphs).
const NAME_BUDGET: usize = 30;
/// Budget left for the name once a slot code and a space occupy the front.
const SLOTTED_NAME_BUDGET: usize = 24;
/// Half-width units reserved for the `...` marker while accumulating.
const ELLIPSIS_RESERVE: usize = 6;
/// The report never shows more than one half's worth of lesson columns.
const MAX_COLUMNS: usize = 13;

const RULE_WIDTH: usize = 100;
const STATS_RULE_WIDTH: usize = 50;

/// Display width of a string in terminal cells: East-Asian fullwidth and
/// wide glyphs occupy two, everything else one.
#[must_use]
pub fn display_width(text: &str) -> usize {
    text.chars().map(|c| c.width().unwrap_or(0)).sum()
}

/// Keeps as much of the name as fits in `budget` half-width units, leaving
/// room for the `...` marker. Names short enough to never hit the reserve
/// are returned whole.
fn truncate(name: &str, budget: usize) -> String {
    let limit = budget.saturating_sub(ELLIPSIS_RESERVE);
    if display_width(name) <= limit {
        return name.to_owned();
    }
    let mut kept = String::new();
    let mut width = 0;
    for c in name.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > limit {
            break;
        }
        kept.push(c);
        width += w;
    }
    if !kept.is_empty() {
        kept.push_str("...");
    }
    kept
}

fn pad(f: &mut Formatter<'_>, cells: usize) -> fmt::Result {
    for _ in 0..cells {
        f.write_char(' ')?;
    }
    Ok(())
}

/// The finished attendance table plus the overall statistics block. Renders
/// through `Display` so any sink can receive it.
pub struct Report<'a> {
    subjects: &'a [SubjectAttendance],
    overall: Overall,
    columns: usize,
    found: usize,
}

impl<'a> Report<'a> {
    /// `found` is the catalog size, shown next to the number of subjects
    /// that actually produced data.
    #[must_use]
    pub fn new(subjects: &'a [SubjectAttendance], found: usize) -> Self {
        let columns = subjects
            .iter()
            .map(|s| s.lessons.len())
            .max()
            .unwrap_or(0)
            .min(MAX_COLUMNS);
        Self {
            subjects,
            overall: Overall::totals(subjects),
            columns,
            found,
        }
    }

    fn header(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let title = "授業名";
        f.write_str(title)?;
        pad(f, NAME_BUDGET.saturating_sub(display_width(title)))?;
        // The full-width space keeps the lesson columns at a fixed offset.
        f.write_char('　')?;
        for number in 1..=self.columns {
            write!(f, "{number:>3}")?;
        }
        writeln!(f, " 出席 欠席 実施 合計")
    }

    fn row(&self, f: &mut Formatter<'_>, subject: &SubjectAttendance) -> fmt::Result {
        let name = match subject.slot {
            Some(slot) => format!("{slot} {}", truncate(&subject.name, SLOTTED_NAME_BUDGET)),
            None => truncate(&subject.name, NAME_BUDGET),
        };
        f.write_str(&name)?;
        pad(f, NAME_BUDGET.saturating_sub(display_width(&name)))?;
        f.write_char('　')?;

        let mut cells = [None::<Status>; MAX_COLUMNS];
        for lesson in &subject.lessons {
            let Some(column) = subject.display_number(*lesson) else {
                continue;
            };
            let Ok(column) = usize::try_from(column) else {
                continue;
            };
            if (1..=MAX_COLUMNS).contains(&column) {
                cells[column - 1] = Some(lesson.status);
            }
        }
        for cell in &cells[..self.columns] {
            match cell {
                Some(status) => write!(f, "{:>3}", status.symbol())?,
                None => f.write_str("   ")?,
            }
        }

        let Counts {
            attended,
            absent,
            implemented,
            total,
        } = subject.counts;
        writeln!(f, " {attended:>4} {absent:>4} {implemented:>4} {total:>4}")
    }

    fn footer(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Counts {
            attended,
            absent,
            implemented,
            total,
        } = self.overall.0;
        writeln!(f)?;
        writeln!(f, "{}", "=".repeat(STATS_RULE_WIDTH))?;
        writeln!(f, "📈 全体統計")?;
        writeln!(f, "{}", "=".repeat(STATS_RULE_WIDTH))?;
        writeln!(f, "総出席回数: {attended}回")?;
        writeln!(f, "総欠席回数: {absent}回")?;
        writeln!(f, "総実施回数: {implemented}回")?;
        writeln!(f, "総授業回数: {total}回")?;
        if let Some(rate) = self.overall.rate() {
            writeln!(f, "出席率: {rate:.1}%")?;
        }
        writeln!(f)?;
        writeln!(f, "凡例: ○=出席, ✕=欠席, ―=未実施")
    }
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(
            f,
            "📊 全授業の出席情報 ({}/{}件取得成功)",
            self.subjects.len(),
            self.found
        )?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        self.header(f)?;
        writeln!(f, "{}", "-".repeat(RULE_WIDTH))?;
        for subject in self.subjects {
            self.row(f, subject)?;
        }
        writeln!(f, "{}", "-".repeat(RULE_WIDTH))?;
        self.footer(f)
    }
}
