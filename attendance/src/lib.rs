#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod aggregate;
pub mod catalog;
pub mod extract;
pub mod report;
pub mod semester;

use std::fmt::{self, Display, Formatter};

use chrono::Weekday;
use derive_more::Add;
use serde::Deserialize;

/// Attendance state of a single lesson slot as the portal records it.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Status {
    Attended,
    Absent,
    NotHeld,
}

impl Status {
    /// Maps the raw status text of a lesson cell. Anything the portal does
    /// not mark as 出席 or 欠席 counts as not held, including the ― glyph
    /// and missing or garbled text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "出席" => Status::Attended,
            "欠席" => Status::Absent,
            _ => Status::NotHeld,
        }
    }

    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Status::Attended => '○',
            Status::Absent => '✕',
            Status::NotHeld => '―',
        }
    }
}

/// Weekday and class period of a subject, displayed as e.g. 月1.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct Slot {
    pub weekday: Weekday,
    pub period: u32,
}

impl Slot {
    /// Sort key placing 月=1 through 日=7 first, then the period.
    #[must_use]
    pub fn key(self) -> (u32, u32) {
        (self.weekday.number_from_monday(), self.period)
    }

    /// Subjects without a recognizable slot sort after everything slotted.
    pub const MISSING_KEY: (u32, u32) = (999, 999);
}

impl Display for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let kanji = match self.weekday {
            Weekday::Mon => '月',
            Weekday::Tue => '火',
            Weekday::Wed => '水',
            Weekday::Thu => '木',
            Weekday::Fri => '金',
            Weekday::Sat => '土',
            Weekday::Sun => '日',
        };
        write!(f, "{kanji}{}", self.period)
    }
}

/// One attendance record, numbered as the portal displays it (1..=26).
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct Lesson {
    pub number: u32,
    pub status: Status,
}

/// One subject of the current semester, taken from the listing page.
#[derive(Debug, Eq, PartialEq)]
pub struct Subject {
    pub semester: String,
    pub name: String,
    pub slot: Option<Slot>,
    /// Element id of the button that opens the subject's detail page.
    pub handle: String,
    /// Position in the source listing.
    pub index: usize,
}

/// Snapshot of one listing-table row as returned by the in-page query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRow {
    pub semester: String,
    pub subject: String,
    pub button_id: String,
    pub cells: Vec<String>,
    pub index: usize,
}

/// Snapshot of one attendance container from a subject's detail page.
#[derive(Debug, Deserialize)]
pub struct RawLesson {
    pub lesson: String,
    pub status: String,
}

/// Attendance counts over the lessons in scope for the active half.
#[derive(Debug, Default, Eq, PartialEq, Copy, Clone, Add)]
pub struct Counts {
    pub attended: u32,
    pub absent: u32,
    /// Lessons actually held, attended plus absent.
    pub implemented: u32,
    /// All in-scope lessons, held or not. Never more than 13.
    pub total: u32,
}
