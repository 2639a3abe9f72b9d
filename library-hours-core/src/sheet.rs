use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Error, Result,
    exceptions::{ExceptionColumn, ExceptionRow, ExceptionSheet},
    schedule::ScheduleTable,
    types::{DAY_NAMES, ScheduleRow, Semester},
};

/// 学期划分表名
pub const SEMESTER_SHEET: &str = "Semester Breakdown";
/// 节假日/特殊时间表名
pub const EXCEPTION_SHEET: &str = "Holidays and Special Hours";

/// 表格中一行：列名 -> 单元格
pub type Row = BTreeMap<String, Value>;

/// 导出的单张表格
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sheet {
    #[serde(default)]
    pub column_names: Vec<String>,
    #[serde(default)]
    pub elements: Vec<Row>,
}

/// 整个表格文件：表名 -> 表格
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workbook(pub BTreeMap<String, Sheet>);

impl Workbook {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.0.get(name)
    }

    fn require(&self, name: &str) -> Result<&Sheet> {
        self.sheet(name)
            .ok_or_else(|| Error::Sheet(format!("missing sheet '{}'", name)))
    }
}

/// 读取单元格文本，空串视为缺失
pub fn cell(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// 解析表格中的日期，支持 `M/D/YYYY` 与 `YYYY-MM-DD`
///
/// 年份必须是四位数字：chrono 的 `%Y` 会把 `10/14/24` 读成公元24年。
pub fn parse_sheet_date(text: &str) -> Result<NaiveDate> {
    let trimmed = text.trim();
    let date = NaiveDate::parse_from_str(trimmed, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .map_err(|err| Error::Sheet(format!("invalid date '{}': {}", text, err)))?;

    if !(1000..=9999).contains(&date.year()) {
        return Err(Error::Sheet(format!(
            "invalid date '{}': expected a four-digit year",
            text
        )));
    }
    Ok(date)
}

/// 校验并类型化后的全部数据
#[derive(Debug, Clone, Default)]
pub struct HoursData {
    /// 按表中顺序排列的学期
    pub semesters: Vec<Semester>,
    pub schedules: ScheduleTable,
    pub exceptions: ExceptionSheet,
}

impl HoursData {
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_workbook(&Workbook::from_json(json)?)
    }

    /// 从表格文件构建，只在加载时校验一次
    pub fn from_workbook(workbook: &Workbook) -> Result<Self> {
        let semesters = parse_semesters(workbook.require(SEMESTER_SHEET)?)?;
        let schedules = parse_schedules(workbook, &semesters);
        let exceptions = parse_exceptions(workbook.require(EXCEPTION_SHEET)?)?;

        tracing::debug!(
            "Loaded {} semesters, {} exception columns, {} locations",
            semesters.len(),
            exceptions.columns.len(),
            exceptions.rows.len()
        );

        Ok(Self {
            semesters,
            schedules,
            exceptions,
        })
    }
}

fn parse_semesters(sheet: &Sheet) -> Result<Vec<Semester>> {
    let mut semesters = Vec::with_capacity(sheet.elements.len());

    for (index, row) in sheet.elements.iter().enumerate() {
        let name = cell(row, "semestername").ok_or_else(|| {
            Error::Sheet(format!("{} row {} has no semestername", SEMESTER_SHEET, index + 1))
        })?;
        let start = required_date(row, "start", &name)?;
        let end = required_date(row, "end", &name)?;

        if start > end {
            tracing::warn!("Semester '{}' starts after it ends ({} > {})", name, start, end);
        }

        semesters.push(Semester { name, start, end });
    }

    Ok(semesters)
}

fn required_date(row: &Row, column: &str, semester: &str) -> Result<NaiveDate> {
    let text = cell(row, column).ok_or_else(|| {
        Error::Sheet(format!("semester '{}' is missing its {} date", semester, column))
    })?;
    parse_sheet_date(&text)
}

fn parse_schedules(workbook: &Workbook, semesters: &[Semester]) -> ScheduleTable {
    let mut table = ScheduleTable::new();
    let mut seen = HashSet::new();

    for semester in semesters {
        if !seen.insert(semester.name.as_str()) {
            continue;
        }
        table.add_semester(semester.name.as_str());

        let Some(sheet) = workbook.sheet(&semester.name) else {
            tracing::debug!("No schedule sheet for semester '{}'", semester.name);
            continue;
        };

        for row in &sheet.elements {
            let Some(location) = cell(row, "location") else {
                tracing::warn!("Skipping schedule row without location in '{}'", semester.name);
                continue;
            };
            let days = DAY_NAMES.map(|day| cell(row, day));
            table.insert(&semester.name, ScheduleRow { location, days });
        }
    }

    table
}

fn parse_exceptions(sheet: &Sheet) -> Result<ExceptionSheet> {
    let Some((header, rows)) = sheet.elements.split_first() else {
        return Err(Error::Sheet(format!("{} has no header row", EXCEPTION_SHEET)));
    };

    // 第一列是供人编辑用的馆名列
    let mut columns = Vec::new();
    for name in sheet.column_names.iter().skip(1) {
        let Some(key) = cell(header, name) else {
            tracing::warn!("Skipping exception column '{}' without a date", name);
            continue;
        };
        let date = parse_sheet_date(&key)?;
        columns.push(ExceptionColumn {
            name: name.clone(),
            key,
            date,
        });
    }

    let mut locations = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(location) = cell(row, "location") else {
            tracing::warn!("Skipping exception row without location");
            continue;
        };
        let values = columns
            .iter()
            .filter_map(|column| cell(row, &column.name).map(|value| (column.name.clone(), value)))
            .collect();
        locations.push(ExceptionRow { location, values });
    }

    Ok(ExceptionSheet {
        columns,
        rows: locations,
    })
}
