use std::ops::Add;

use crate::extract::SubjectAttendance;
use crate::{Counts, Slot};

/// Demotion key for subjects that have not held a single lesson yet.
const UNIMPLEMENTED_KEY: (u32, u32) = (9999, 9999);

/// Orders subjects for the report. Outside April, subjects whose entire
/// ledger is still unimplemented sink below everything else regardless of
/// their slot; the rest keep the weekday and period order of the catalog.
pub fn sort_for_report(subjects: &mut [SubjectAttendance], month: u32) {
    subjects.sort_by_key(|subject| {
        if month != 4 && subject.fully_unimplemented() {
            return UNIMPLEMENTED_KEY;
        }
        subject.slot.map_or(Slot::MISSING_KEY, Slot::key)
    });
}

/// Run-wide attendance totals.
#[derive(Debug, Default, Eq, PartialEq, Copy, Clone)]
pub struct Overall(pub Counts);

impl Overall {
    #[must_use]
    pub fn totals(subjects: &[SubjectAttendance]) -> Self {
        Self(
            subjects
                .iter()
                .map(|s| s.counts)
                .fold(Counts::default(), Counts::add),
        )
    }

    /// Attendance rate in percent over the lessons actually held.
    #[must_use]
    pub fn rate(&self) -> Option<f64> {
        (self.0.implemented > 0)
            .then(|| f64::from(self.0.attended) / f64::from(self.0.implemented) * 100.0)
    }
}
