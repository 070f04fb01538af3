use crate::semester::{Half, Semester};
use crate::{Counts, Lesson, RawLesson, Slot, Status, Subject};

/// Lesson slots in one half of the year. A ledger with more entries than
/// this belongs to a full-year course spanning both halves.
const HALF_LESSONS: usize = 13;

/// Parses the lesson snapshots of one subject's detail page. Containers
/// whose label is not a lesson number carry no usable record and are
/// skipped.
#[must_use]
pub fn lessons(raw: &[RawLesson]) -> Vec<Lesson> {
    raw.iter()
        .filter_map(|record| {
            let number: u32 = record.lesson.trim().parse().ok()?;
            if number == 0 {
                return None;
            }
            Some(Lesson {
                number,
                status: Status::parse(&record.status),
            })
        })
        .collect()
}

fn in_scope(number: u32, full_year: bool, half: Half) -> bool {
    if !full_year {
        return true;
    }
    match half {
        Half::First => number <= HALF_LESSONS as u32,
        Half::Second => number > HALF_LESSONS as u32,
    }
}

/// Attendance of one subject: the full extracted ledger plus the counts
/// over the lessons in scope for the active half.
#[derive(Debug)]
pub struct SubjectAttendance {
    pub name: String,
    pub slot: Option<Slot>,
    pub lessons: Vec<Lesson>,
    pub counts: Counts,
    half: Half,
}

impl SubjectAttendance {
    /// Combines a subject with its extracted lessons. An empty extraction
    /// means the detail page yielded nothing usable and the subject is
    /// dropped from the report.
    #[must_use]
    pub fn collect(subject: &Subject, lessons: Vec<Lesson>, semester: Semester) -> Option<Self> {
        if lessons.is_empty() {
            return None;
        }
        let full_year = lessons.len() > HALF_LESSONS;
        let mut counts = Counts::default();
        for lesson in lessons
            .iter()
            .filter(|l| in_scope(l.number, full_year, semester.half))
        {
            counts.total += 1;
            match lesson.status {
                Status::Attended => {
                    counts.attended += 1;
                    counts.implemented += 1;
                }
                Status::Absent => {
                    counts.absent += 1;
                    counts.implemented += 1;
                }
                Status::NotHeld => {}
            }
        }
        Some(Self {
            name: subject.name.clone(),
            slot: subject.slot,
            lessons,
            counts,
            half: semester.half,
        })
    }

    /// Column the lesson occupies in the report. Second-half lessons of a
    /// full-year course are renumbered down to 1..=13; lessons belonging to
    /// the other half have no column.
    #[must_use]
    pub fn display_number(&self, lesson: Lesson) -> Option<u32> {
        if self.lessons.len() <= HALF_LESSONS {
            return Some(lesson.number);
        }
        let half_lessons = HALF_LESSONS as u32;
        match self.half {
            Half::First => (lesson.number <= half_lessons).then_some(lesson.number),
            Half::Second => lesson.number.checked_sub(half_lessons).filter(|&n| n >= 1),
        }
    }

    /// True when nothing in the full ledger has been held yet.
    #[must_use]
    pub fn fully_unimplemented(&self) -> bool {
        self.lessons.iter().all(|l| l.status == Status::NotHeld)
    }
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use crate::extract::{lessons, SubjectAttendance};
    use crate::semester::Semester;
    use crate::{Lesson, RawLesson, Status, Subject};

    fn subject(name: &str) -> Subject {
        Subject {
            semester: "2025年度前期".to_owned(),
            name: name.to_owned(),
            slot: None,
            handle: "form-list-0".to_owned(),
            index: 0,
        }
    }

    fn semester(month: u32) -> Semester {
        Semester::from_date(NaiveDate::from_ymd_opt(2025, month, 1).unwrap())
    }

    fn raw(lesson: &str, status: &str) -> RawLesson {
        RawLesson {
            lesson: lesson.to_owned(),
            status: status.to_owned(),
        }
    }

    fn ledger(statuses: &[Status]) -> Vec<Lesson> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, &status)| Lesson {
                number: u32::try_from(i).unwrap() + 1,
                status,
            })
            .collect()
    }

    #[test]
    fn test_lessons_skip_unlabeled_containers() {
        let parsed = lessons(&[
            raw("1", "出席"),
            raw("", "出席"),
            raw("回", "欠席"),
            raw("0", "出席"),
            raw(" 2 ", "欠席"),
            raw("3", "―"),
            raw("4", "公欠"),
        ]);
        assert_eq!(
            parsed,
            vec![
                Lesson {
                    number: 1,
                    status: Status::Attended
                },
                Lesson {
                    number: 2,
                    status: Status::Absent
                },
                Lesson {
                    number: 3,
                    status: Status::NotHeld
                },
                Lesson {
                    number: 4,
                    status: Status::NotHeld
                },
            ]
        );
    }

    #[test]
    fn test_empty_extraction_is_a_failure() {
        assert!(SubjectAttendance::collect(&subject("数学"), Vec::new(), semester(5)).is_none());
    }

    #[test]
    fn test_half_year_course_counts_everything() {
        let lessons = ledger(&[Status::Attended, Status::Absent, Status::NotHeld]);
        let attendance =
            SubjectAttendance::collect(&subject("数学"), lessons, semester(11)).unwrap();
        assert_eq!(attendance.counts.attended, 1);
        assert_eq!(attendance.counts.absent, 1);
        assert_eq!(attendance.counts.implemented, 2);
        assert_eq!(attendance.counts.total, 3);
    }

    #[test]
    fn test_full_year_course_first_half() {
        let mut statuses = vec![Status::Attended; 13];
        statuses.extend(vec![Status::NotHeld; 13]);
        let attendance =
            SubjectAttendance::collect(&subject("英語"), ledger(&statuses), semester(5)).unwrap();
        assert_eq!(attendance.counts.attended, 13);
        assert_eq!(attendance.counts.total, 13);
        // First-half numbering is unchanged, second-half lessons have no column.
        assert_eq!(
            attendance.display_number(attendance.lessons[0]),
            Some(1)
        );
        assert_eq!(
            attendance.display_number(attendance.lessons[12]),
            Some(13)
        );
        assert_eq!(attendance.display_number(attendance.lessons[13]), None);
    }

    #[test]
    fn test_full_year_course_second_half() {
        let mut statuses = vec![Status::Attended; 13];
        statuses.extend(vec![Status::Absent; 2]);
        statuses.extend(vec![Status::NotHeld; 11]);
        let attendance =
            SubjectAttendance::collect(&subject("英語"), ledger(&statuses), semester(10)).unwrap();
        // Only lessons 14..=26 count, renumbered 1..=13 for display.
        assert_eq!(attendance.counts.attended, 0);
        assert_eq!(attendance.counts.absent, 2);
        assert_eq!(attendance.counts.implemented, 2);
        assert_eq!(attendance.counts.total, 13);
        assert_eq!(attendance.display_number(attendance.lessons[12]), None);
        assert_eq!(attendance.display_number(attendance.lessons[13]), Some(1));
        assert_eq!(attendance.display_number(attendance.lessons[25]), Some(13));
    }

    #[test]
    fn test_fully_unimplemented() {
        let held = SubjectAttendance::collect(
            &subject("数学"),
            ledger(&[Status::Attended, Status::NotHeld]),
            semester(5),
        )
        .unwrap();
        assert!(!held.fully_unimplemented());

        let pending = SubjectAttendance::collect(
            &subject("集中講義"),
            ledger(&[Status::NotHeld, Status::NotHeld]),
            semester(5),
        )
        .unwrap();
        assert!(pending.fully_unimplemented());
    }
}
