use chrono::{Datelike, NaiveDate, Weekday};

use shared::{ChoreTemplate, Recurrence};

/// Translate a recurrence rule into the concrete day-of-week set used by
/// per-child schedules (0 = Sunday .. 6 = Saturday).
///
/// Weekly chores land on Monday unless the template carries an explicit day
/// set; daily and as-needed chores schedule every day and rely on the
/// periodic generation pass.
pub fn default_days_for(recurrence: Recurrence) -> Vec<u8> {
    match recurrence {
        Recurrence::Weekly => vec![1],
        Recurrence::Weekdays => vec![1, 2, 3, 4, 5],
        Recurrence::Daily | Recurrence::AsNeeded => vec![0, 1, 2, 3, 4, 5, 6],
    }
}

/// The day set a template's schedules should use: the explicit override when
/// present, the recurrence default otherwise.
pub fn schedule_days(template: &ChoreTemplate) -> Vec<u8> {
    match &template.days_of_week {
        Some(days) if !days.is_empty() => days.clone(),
        _ => default_days_for(template.recurrence),
    }
}

/// Check whether a schedule's day set covers a date.
pub fn is_due_on(days_of_week: &[u8], date: NaiveDate) -> bool {
    days_of_week.contains(&weekday_to_u8(date.weekday()))
}

pub fn weekday_to_u8(weekday: Weekday) -> u8 {
    weekday.num_days_from_sunday() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::TimeOfDay;
    use uuid::Uuid;

    fn template(recurrence: Recurrence, days_of_week: Option<Vec<u8>>) -> ChoreTemplate {
        let now = Utc::now();
        ChoreTemplate {
            id: Uuid::new_v4(),
            family_id: Uuid::new_v4(),
            title: "Sweep the kitchen".to_string(),
            description: "".to_string(),
            time_of_day: TimeOfDay::Evening,
            bucks_reward: 2,
            required: false,
            recurrence,
            days_of_week,
            assigned_child_ids: vec![],
            icon_url: None,
            active: true,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_default_days_weekly_is_monday() {
        assert_eq!(default_days_for(Recurrence::Weekly), vec![1]);
    }

    #[test]
    fn test_default_days_weekdays() {
        assert_eq!(default_days_for(Recurrence::Weekdays), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_default_days_daily_and_as_needed_cover_the_week() {
        assert_eq!(default_days_for(Recurrence::Daily).len(), 7);
        assert_eq!(default_days_for(Recurrence::AsNeeded).len(), 7);
    }

    #[test]
    fn test_schedule_days_explicit_override_wins() {
        let t = template(Recurrence::Weekly, Some(vec![3, 6]));
        assert_eq!(schedule_days(&t), vec![3, 6]);
    }

    #[test]
    fn test_schedule_days_empty_override_falls_back() {
        let t = template(Recurrence::Weekdays, Some(vec![]));
        assert_eq!(schedule_days(&t), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_is_due_on() {
        // 2026-03-02 is a Monday.
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        assert!(is_due_on(&[1], monday));
        assert!(!is_due_on(&[1], sunday));
        assert!(is_due_on(&[0, 6], sunday));
    }

    #[test]
    fn test_weekday_to_u8_sunday_is_zero() {
        assert_eq!(weekday_to_u8(Weekday::Sun), 0);
        assert_eq!(weekday_to_u8(Weekday::Mon), 1);
        assert_eq!(weekday_to_u8(Weekday::Sat), 6);
    }
}
