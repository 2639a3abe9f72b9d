use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::{
    Result,
    semester::SemesterIndex,
    sheet::HoursData,
    types::{DAY_LETTERS, DAY_NAMES, DayGroup, DayHours, HoursRange, WeekResult},
    week::week_start,
};

/// 把周一到周日的开放时间压缩为相邻分组
///
/// 只合并相邻且取值相同的天（两个TBA也算相同），不会合并被隔开的相同取值。
pub fn compact(week: &[DayHours; 7]) -> Vec<DayGroup> {
    week.iter()
        .zip(DAY_LETTERS)
        .fold(Vec::new(), |mut groups: Vec<DayGroup>, (hours, letter)| {
            match groups.last_mut() {
                Some(last) if last.hours == *hours => last.days.push(letter),
                _ => groups.push(DayGroup {
                    hours: hours.clone(),
                    days: vec![letter],
                }),
            }
            groups
        })
}

/// 压缩完整周结果中的每个馆
pub fn compact_week(week: &WeekResult) -> BTreeMap<String, Vec<DayGroup>> {
    week.hours
        .iter()
        .map(|(location, days)| {
            let normalized = days.each_ref().map(|day| day.to_day_hours());
            (location.clone(), compact(&normalized))
        })
        .collect()
}

/// 只看学期常规时间（不含节假日）的压缩视图
///
/// 馆的集合取自所有学期表。
pub fn normal_hours(
    data: &HoursData,
    date: NaiveDate,
) -> Result<BTreeMap<String, Vec<DayGroup>>> {
    let start = week_start(date)?;
    let semesters = SemesterIndex::new(&data.semesters).find_week(start);

    tracing::debug!("Building normal hours for the week of {}", start);

    let groups = data
        .schedules
        .locations()
        .map(|location| {
            let week: [DayHours; 7] = std::array::from_fn(|i| {
                semesters[i]
                    .and_then(|semester| {
                        data.schedules
                            .lookup(&semester.name, location, DAY_NAMES[i])
                    })
                    .map_or(DayHours::Tba, |raw| {
                        DayHours::Hours(HoursRange::parse(raw))
                    })
            });
            (location.to_string(), compact(&week))
        })
        .collect();

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(raw: &str) -> DayHours {
        DayHours::Hours(HoursRange::parse(raw))
    }

    #[test]
    fn identical_week_is_one_group() {
        let week: [DayHours; 7] = std::array::from_fn(|_| hours("9:00-17:00"));
        let groups = compact(&week);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].days, vec!['M', 'T', 'W', 'R', 'F', 'S', 'U']);
        assert_eq!(groups[0].hours, hours("9:00-17:00"));
    }

    #[test]
    fn alternating_values_never_cross_merge() {
        let week: [DayHours; 7] = std::array::from_fn(|i| {
            if i % 2 == 0 {
                hours("9:00-17:00")
            } else {
                hours("10:00-14:00")
            }
        });
        let groups = compact(&week);

        assert_eq!(groups.len(), 7);
        for (group, letter) in groups.iter().zip(DAY_LETTERS) {
            assert_eq!(group.days, vec![letter]);
        }
    }

    #[test]
    fn adjacent_tba_days_merge() {
        let week = [
            hours("9:00-17:00"),
            hours("9:00-17:00"),
            hours("9:00-17:00"),
            hours("9:00-17:00"),
            hours("9:00-18:00"),
            DayHours::Tba,
            DayHours::Tba,
        ];
        let groups = compact(&week);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].days, vec!['M', 'T', 'W', 'R']);
        assert_eq!(groups[1].days, vec!['F']);
        assert_eq!(groups[2].hours, DayHours::Tba);
        assert_eq!(groups[2].days, vec!['S', 'U']);
    }

    #[test]
    fn malformed_hours_compare_structurally() {
        // 没有分隔符的值只剩 start，end 为空
        let week = [
            hours("closed"),
            hours("closed"),
            hours("9:00-17:00"),
            hours("9:00-17:00"),
            hours("9:00-17:00"),
            hours("9:00-17:00"),
            hours("9:00-17:00"),
        ];
        let groups = compact(&week);

        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups[0].hours,
            DayHours::Hours(HoursRange {
                start: "closed".to_string(),
                end: None,
            })
        );
        assert_eq!(groups[0].days, vec!['M', 'T']);
    }

    #[test]
    fn compact_is_idempotent() {
        let week = [
            hours("8:00-20:00"),
            DayHours::Tba,
            hours("8:00-20:00"),
            hours("8:00-20:00"),
            DayHours::Tba,
            hours("12:00-18:00"),
            hours("12:00-18:00"),
        ];
        let first = serde_json::to_string(&compact(&week)).unwrap();
        let second = serde_json::to_string(&compact(&week)).unwrap();
        assert_eq!(first, second);
    }
}
