use chrono::NaiveDate;

use crate::types::Semester;

impl Semester {
    /// 日期是否落在学期内（首尾两天都算）
    ///
    /// 首尾分别比较：即使开始晚于结束，首尾当天仍然命中。
    pub fn contains(&self, date: NaiveDate) -> bool {
        date == self.start || date == self.end || (date > self.start && date < self.end)
    }
}

/// 学期查找器
///
/// 学期之间可以相邻、重叠或有空档；重叠时按输入顺序取第一个命中的学期。
#[derive(Debug, Clone, Copy)]
pub struct SemesterIndex<'a> {
    semesters: &'a [Semester],
}

impl<'a> SemesterIndex<'a> {
    pub fn new(semesters: &'a [Semester]) -> Self {
        Self { semesters }
    }

    /// 查找包含 `date` 的学期，找不到时返回 `None`（下游按TBA处理）
    pub fn find(&self, date: NaiveDate) -> Option<&'a Semester> {
        self.semesters.iter().find(|semester| semester.contains(date))
    }

    /// 为一周七天分别查找学期，一周可能跨两个学期
    pub fn find_week(&self, week_start: NaiveDate) -> [Option<&'a Semester>; 7] {
        std::array::from_fn(|offset| {
            week_start
                .checked_add_days(chrono::Days::new(offset as u64))
                .and_then(|date| self.find(date))
        })
    }
}

/// 便捷函数，等价于 `SemesterIndex::new(semesters).find(date)`
pub fn find_semester(semesters: &[Semester], date: NaiveDate) -> Option<&Semester> {
    SemesterIndex::new(semesters).find(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn semester(name: &str, start: NaiveDate, end: NaiveDate) -> Semester {
        Semester {
            name: name.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let semesters = vec![semester("Fall", date(2024, 9, 1), date(2024, 12, 15))];

        assert_eq!(
            find_semester(&semesters, date(2024, 9, 1)).map(|s| s.name.as_str()),
            Some("Fall")
        );
        assert_eq!(
            find_semester(&semesters, date(2024, 12, 15)).map(|s| s.name.as_str()),
            Some("Fall")
        );
        assert_eq!(
            find_semester(&semesters, date(2024, 10, 14)).map(|s| s.name.as_str()),
            Some("Fall")
        );
        assert!(find_semester(&semesters, date(2024, 8, 31)).is_none());
        assert!(find_semester(&semesters, date(2024, 12, 16)).is_none());
    }

    #[test]
    fn test_overlap_first_match_wins() {
        let semesters = vec![
            semester("Fall", date(2024, 9, 1), date(2024, 12, 20)),
            semester("Intersession", date(2024, 12, 16), date(2025, 1, 10)),
        ];

        let found = find_semester(&semesters, date(2024, 12, 18)).unwrap();
        assert_eq!(found.name, "Fall");

        let found = find_semester(&semesters, date(2024, 12, 21)).unwrap();
        assert_eq!(found.name, "Intersession");
    }

    #[test]
    fn test_inverted_range_matches_endpoints_only() {
        let semesters = vec![semester("Odd", date(2024, 5, 10), date(2024, 5, 1))];

        assert!(find_semester(&semesters, date(2024, 5, 10)).is_some());
        assert!(find_semester(&semesters, date(2024, 5, 1)).is_some());
        assert!(find_semester(&semesters, date(2024, 5, 5)).is_none());
    }

    #[test]
    fn test_week_straddles_two_semesters() {
        let semesters = vec![
            semester("Summer", date(2024, 6, 1), date(2024, 8, 28)),
            semester("Fall", date(2024, 8, 29), date(2024, 12, 15)),
        ];

        // 2024-08-26 是周一
        let week = SemesterIndex::new(&semesters).find_week(date(2024, 8, 26));
        let names: Vec<_> = week.iter().map(|s| s.map(|s| s.name.as_str())).collect();
        assert_eq!(
            names,
            vec![
                Some("Summer"),
                Some("Summer"),
                Some("Summer"),
                Some("Fall"),
                Some("Fall"),
                Some("Fall"),
                Some("Fall"),
            ]
        );
    }
}
