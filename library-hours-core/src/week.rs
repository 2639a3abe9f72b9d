use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};

use crate::{
    Error, Result,
    exceptions::{ExceptionTable, date_key},
    semester::SemesterIndex,
    sheet::HoursData,
    types::{DAY_NAMES, ResolvedDay, Semester, WeekResult, weekday_index},
};

/// `date` 所在ISO周的周一
pub fn week_start(date: NaiveDate) -> Result<NaiveDate> {
    date.checked_sub_days(Days::new(weekday_index(date) as u64))
        .ok_or(Error::DateOutOfRange(date))
}

/// 从周一开始的七个日期，超出 chrono 可表示范围时报错
pub fn week_dates(start: NaiveDate) -> Result<[NaiveDate; 7]> {
    let mut dates = [start; 7];
    for (offset, slot) in dates.iter_mut().enumerate().skip(1) {
        *slot = start
            .checked_add_days(Days::new(offset as u64))
            .ok_or(Error::DateOutOfRange(start))?;
    }
    Ok(dates)
}

/// 周开放时间解析器
///
/// 优先级：节假日覆盖 > 学期常规时间 > TBA。
/// 节假日索引在构造时建立一次，可对多个日期重复使用。
pub struct WeekResolver<'a> {
    data: &'a HoursData,
    exceptions: ExceptionTable,
}

impl<'a> WeekResolver<'a> {
    pub fn new(data: &'a HoursData) -> Self {
        Self {
            data,
            exceptions: ExceptionTable::from_sheet(&data.exceptions),
        }
    }

    /// 解析 `date` 所在周所有馆的七天开放时间
    ///
    /// 馆的集合取自节假日表中的各行。
    pub fn resolve(&self, date: NaiveDate) -> Result<WeekResult> {
        let start = week_start(date)?;
        let dates = week_dates(start)?;
        let semesters = SemesterIndex::new(&self.data.semesters).find_week(start);

        for (day, semester) in dates.iter().zip(&semesters) {
            if semester.is_none() {
                tracing::debug!("No semester covers {}, regular hours unavailable", day);
            }
        }

        let mut hours = BTreeMap::new();
        for location in self.data.exceptions.locations() {
            let week: [ResolvedDay; 7] = std::array::from_fn(|i| {
                self.resolve_day(location, dates[i], semesters[i], DAY_NAMES[i])
            });
            hours.insert(location.to_string(), week);
        }

        tracing::debug!("Resolved week of {} for {} locations", start, hours.len());

        Ok(WeekResult {
            week_start: start,
            hours,
        })
    }

    fn resolve_day(
        &self,
        location: &str,
        date: NaiveDate,
        semester: Option<&Semester>,
        day_name: &str,
    ) -> ResolvedDay {
        if let Some(value) = self.exceptions.lookup(location, &date_key(date)) {
            return ResolvedDay::Exception(value.to_string());
        }

        semester
            .and_then(|semester| {
                self.data
                    .schedules
                    .lookup(&semester.name, location, day_name)
            })
            .map_or(ResolvedDay::Tba, |value| {
                ResolvedDay::Regular(value.to_string())
            })
    }
}

/// 解析 `date` 所在周的完整开放时间
pub fn resolve_week(data: &HoursData, date: NaiveDate) -> Result<WeekResult> {
    WeekResolver::new(data).resolve(date)
}

/// 查询单个馆在 `date` 当天的取值，馆不存在时返回 `Error::LocationNotFound`
pub fn single_day<'w>(
    week: &'w WeekResult,
    date: NaiveDate,
    location: &str,
) -> Result<&'w ResolvedDay> {
    week.day(location, date)
}
