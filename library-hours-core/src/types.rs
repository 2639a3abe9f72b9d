use std::{collections::BTreeMap, fmt};

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use crate::{Error, Result};

/// 一周七天的英文名（周一在前），与学期时间表的列名一致
pub const DAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// 一周七天的单字母代码（周一在前）
pub const DAY_LETTERS: [char; 7] = ['M', 'T', 'W', 'R', 'F', 'S', 'U'];

/// 未找到任何时间数据时的占位标记
pub const TBA: &str = "TBA";

/// 节假日表中表示闭馆的取值
pub const CLOSED: &str = "closed";

/// 日期在所属ISO周内的下标，0=周一，6=周日
pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_monday() as usize
}

/// 学期信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Semester {
    pub name: String,
    /// 开始日期（含）
    pub start: NaiveDate,
    /// 结束日期（含）
    pub end: NaiveDate,
}

/// 某个馆在某学期的常规开放时间，下标0=周一
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    pub location: String,
    pub days: [Option<String>; 7],
}

impl ScheduleRow {
    /// 按星期名取值，星期名须为小写英文
    pub fn day(&self, day_name: &str) -> Option<&str> {
        let index = DAY_NAMES.iter().position(|name| *name == day_name)?;
        self.days[index].as_deref()
    }
}

/// 拆分后的开放时间段
///
/// 原始值形如 `9:00-17:00`，按 `-` 拆分且不做校验：
/// 没有分隔符时 `end` 为 `None`，多余的分段被丢弃。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HoursRange {
    pub start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl HoursRange {
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split('-');
        let start = parts.next().unwrap_or_default().to_string();
        let end = parts.next().map(str::to_string);
        Self { start, end }
    }

    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: Some(end.into()),
        }
    }
}

/// 单日开放时间：时间段或TBA
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DayHours {
    Hours(HoursRange),
    Tba,
}

impl Serialize for DayHours {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            DayHours::Hours(range) => range.serialize(serializer),
            DayHours::Tba => serializer.serialize_str(TBA),
        }
    }
}

/// 按优先级解析出的单日取值
///
/// 节假日覆盖值原样透传（可能是 `closed`），不在此处解释。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedDay {
    /// 来自节假日/特殊时间表
    Exception(String),
    /// 来自学期常规时间表
    Regular(String),
    /// 所有来源均无数据
    Tba,
}

impl ResolvedDay {
    pub fn as_str(&self) -> &str {
        match self {
            ResolvedDay::Exception(value) | ResolvedDay::Regular(value) => value,
            ResolvedDay::Tba => TBA,
        }
    }

    pub fn is_tba(&self) -> bool {
        matches!(self, ResolvedDay::Tba)
    }

    /// 转换为压缩视图使用的时间段形式
    pub fn to_day_hours(&self) -> DayHours {
        match self {
            ResolvedDay::Exception(value) | ResolvedDay::Regular(value) => {
                DayHours::Hours(HoursRange::parse(value))
            }
            ResolvedDay::Tba => DayHours::Tba,
        }
    }
}

impl fmt::Display for ResolvedDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ResolvedDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// 某个ISO周（周一至周日）内所有馆的开放时间
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekResult {
    /// 本周周一
    pub week_start: NaiveDate,
    /// 馆名 -> 七天取值，下标0=周一
    pub hours: BTreeMap<String, [ResolvedDay; 7]>,
}

impl WeekResult {
    /// 查询某馆在 `date` 所在星期几的取值
    ///
    /// 只按星期几取下标，不检查 `date` 是否落在本周内。
    pub fn day(&self, location: &str, date: NaiveDate) -> Result<&ResolvedDay> {
        let week = self
            .hours
            .get(location)
            .ok_or_else(|| Error::LocationNotFound(location.to_string()))?;
        Ok(&week[weekday_index(date)])
    }

    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.hours.keys().map(String::as_str)
    }
}

/// 连续几天相同开放时间的分组
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayGroup {
    pub hours: DayHours,
    pub days: Vec<char>,
}

/// 闭区间日期范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }
}

/// 闭馆区间
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosingBlock {
    pub dates: DateRange,
    /// 触发该区间的第一个节假日列名
    pub reason: String,
}

/// 特殊开放时间区间
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionBlock {
    pub dates: DateRange,
    pub reason: String,
    pub hours: HoursRange,
}

/// 某个馆完整的闭馆与特殊时间日历
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CalendarView {
    pub closings: Vec<ClosingBlock>,
    pub exceptions: Vec<ExceptionBlock>,
}
