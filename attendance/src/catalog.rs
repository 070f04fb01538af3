use chrono::Weekday;

use crate::{RawRow, Slot, Subject};

fn weekday_from_cell(text: &str) -> Option<Weekday> {
    let mut chars = text.strip_suffix("曜日")?.chars();
    let kanji = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    match kanji {
        '月' => Some(Weekday::Mon),
        '火' => Some(Weekday::Tue),
        '水' => Some(Weekday::Wed),
        '木' => Some(Weekday::Thu),
        '金' => Some(Weekday::Fri),
        '土' => Some(Weekday::Sat),
        '日' => Some(Weekday::Sun),
        _ => None,
    }
}

fn period_from_cell(text: &str) -> Option<u32> {
    let digits = text.strip_suffix("時限")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Periods start at 1; a zero here is not a schedule slot.
    digits.parse().ok().filter(|&period| period >= 1)
}

/// The weekday and period live in separate cells (月曜日, 1時限). Both have
/// to be present for the subject to get a slot.
fn slot_from_cells(cells: &[String]) -> Option<Slot> {
    let weekday = cells.iter().find_map(|c| weekday_from_cell(c.trim()))?;
    let period = cells.iter().find_map(|c| period_from_cell(c.trim()))?;
    Some(Slot { weekday, period })
}

/// Builds the ordered subject catalog from a listing snapshot. Rows missing
/// a semester, name or navigation button are ignored, rows from other
/// semesters are dropped, and slotless subjects keep their listing order at
/// the end.
#[must_use]
pub fn subjects(rows: Vec<RawRow>, semester_label: &str) -> Vec<Subject> {
    let mut subjects: Vec<Subject> = rows
        .into_iter()
        .filter(|row| {
            !row.semester.is_empty() && !row.subject.is_empty() && !row.button_id.is_empty()
        })
        .filter(|row| row.semester == semester_label)
        .map(|row| {
            let slot = slot_from_cells(&row.cells);
            Subject {
                semester: row.semester,
                name: row.subject,
                slot,
                handle: row.button_id,
                index: row.index,
            }
        })
        .collect();
    subjects.sort_by_key(|s| s.slot.map_or(Slot::MISSING_KEY, Slot::key));
    subjects
}

#[cfg(test)]
mod test {
    use chrono::Weekday;

    use crate::catalog::{period_from_cell, slot_from_cells, subjects, weekday_from_cell};
    use crate::{RawRow, Slot};

    fn row(semester: &str, subject: &str, button_id: &str, cells: &[&str], index: usize) -> RawRow {
        RawRow {
            semester: semester.to_owned(),
            subject: subject.to_owned(),
            button_id: button_id.to_owned(),
            cells: cells.iter().map(|&c| c.to_owned()).collect(),
            index,
        }
    }

    #[test]
    fn test_weekday_from_cell() {
        assert_eq!(weekday_from_cell("月曜日"), Some(Weekday::Mon));
        assert_eq!(weekday_from_cell("日曜日"), Some(Weekday::Sun));
        assert_eq!(weekday_from_cell("月"), None);
        assert_eq!(weekday_from_cell("曜日"), None);
        assert_eq!(weekday_from_cell("毎月曜日"), None);
        assert_eq!(weekday_from_cell("祝曜日"), None);
    }

    #[test]
    fn test_period_from_cell() {
        assert_eq!(period_from_cell("1時限"), Some(1));
        assert_eq!(period_from_cell("10時限"), Some(10));
        assert_eq!(period_from_cell("時限"), None);
        assert_eq!(period_from_cell("一時限"), None);
        assert_eq!(period_from_cell("+1時限"), None);
        assert_eq!(period_from_cell("0時限"), None);
        assert_eq!(period_from_cell("3"), None);
    }

    #[test]
    fn test_slot_needs_both_cells() {
        let cells = |texts: &[&str]| texts.iter().map(|&c| c.to_owned()).collect::<Vec<_>>();
        assert_eq!(
            slot_from_cells(&cells(&["2025年度前期", "火曜日", "3時限"])),
            Some(Slot {
                weekday: Weekday::Tue,
                period: 3
            })
        );
        assert_eq!(slot_from_cells(&cells(&["火曜日"])), None);
        assert_eq!(slot_from_cells(&cells(&["3時限"])), None);
        assert_eq!(slot_from_cells(&cells(&[])), None);
    }

    #[test]
    fn test_filters_other_semesters_and_incomplete_rows() {
        let rows = vec![
            row("2025年度前期", "数学", "form-list-0", &["月曜日", "1時限"], 0),
            row("2024年度後期", "物理", "form-list-1", &["火曜日", "2時限"], 1),
            row("", "化学", "form-list-2", &["水曜日", "3時限"], 2),
            row("2025年度前期", "英語", "", &["木曜日", "4時限"], 3),
        ];
        let subjects = subjects(rows, "2025年度前期");
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].name, "数学");
        assert_eq!(subjects[0].handle, "form-list-0");
    }

    #[test]
    fn test_sorted_by_weekday_and_period() {
        let rows = vec![
            row("2025年度前期", "金2", "b0", &["金曜日", "2時限"], 0),
            row("2025年度前期", "予定なしA", "b1", &[], 1),
            row("2025年度前期", "月3", "b2", &["月曜日", "3時限"], 2),
            row("2025年度前期", "予定なしB", "b3", &[], 3),
            row("2025年度前期", "月1", "b4", &["月曜日", "1時限"], 4),
        ];
        let subjects = subjects(rows, "2025年度前期");
        let names: Vec<&str> = subjects.iter().map(|s| s.name.as_str()).collect();
        // Slotless subjects come last and keep their relative order.
        assert_eq!(names, ["月1", "月3", "金2", "予定なしA", "予定なしB"]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let rows = vec![
            row("2025年度前期", "火1", "b0", &["火曜日", "1時限"], 0),
            row("2025年度前期", "予定なし", "b1", &[], 1),
            row("2025年度前期", "月1", "b2", &["月曜日", "1時限"], 2),
        ];
        let mut sorted = subjects(rows, "2025年度前期");
        let names: Vec<String> = sorted.iter().map(|s| s.name.clone()).collect();
        sorted.sort_by_key(|s| s.slot.map_or(Slot::MISSING_KEY, Slot::key));
        let again: Vec<String> = sorted.iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, again);
    }
}
