//! Schedule inspection.

use chrono::NaiveDateTime;
use manor_core::mode::ManorMode;
use manor_core::schedule::ManorSchedule;

/// Mode at `start` and the next `count` transitions after it.
#[must_use]
pub fn upcoming_transitions(
    schedule: &ManorSchedule,
    start: NaiveDateTime,
    count: usize,
) -> (ManorMode, Vec<(NaiveDateTime, ManorMode)>) {
    let initial = schedule.determine_mode(start.time());
    let mut transitions = Vec::with_capacity(count);
    let mut mode = initial;
    let mut now = start;
    for _ in 0..count {
        let Some(at) = schedule.next_transition(mode, now) else {
            break;
        };
        mode = schedule.determine_mode(at.time());
        transitions.push((at, mode));
        now = at;
    }
    (initial, transitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_default_day() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let (initial, transitions) = upcoming_transitions(&ManorSchedule::default(), start, 3);

        assert_eq!(initial, ManorMode::Modifiable);
        let modes: Vec<_> = transitions.iter().map(|(_, m)| *m).collect();
        assert_eq!(
            modes,
            vec![ManorMode::Approved, ManorMode::Maintenance, ManorMode::Modifiable]
        );
        assert_eq!(transitions[0].0, start.date().and_hms_opt(20, 0, 0).unwrap());
        assert_eq!(transitions[2].0.time().to_string(), "06:03:00");
    }
}
