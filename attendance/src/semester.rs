use std::fmt::{self, Display, Formatter};

use chrono::{Datelike, NaiveDate};

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Half {
    First,
    Second,
}

/// The academic term a run targets, fixed once from the wall clock.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct Semester {
    pub year: i32,
    pub half: Half,
}

impl Semester {
    /// April through August belong to the first half, every other month to
    /// the second half. The portal labels January-March terms with the
    /// current calendar year as well, so the year is never shifted.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        let half = if (4..=8).contains(&date.month()) {
            Half::First
        } else {
            Half::Second
        };
        Self {
            year: date.year(),
            half,
        }
    }

    /// The label the listing page uses for this term, e.g. 2025年度前期.
    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl Display for Semester {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let half = match self.half {
            Half::First => "前期",
            Half::Second => "後期",
        };
        write!(f, "{}年度{half}", self.year)
    }
}
