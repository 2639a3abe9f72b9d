use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

/// 节假日表的日期键格式，与表头中的日期文本逐字比较
pub const DATE_KEY_FORMAT: &str = "%-m/%-d/%Y";

/// 把日期格式化为节假日表使用的 `M/D/YYYY` 键
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// 节假日表的一列：列名 + 代表日期
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionColumn {
    pub name: String,
    /// 表头中的原始日期文本，查询按该文本精确匹配
    pub key: String,
    /// 解析后的代表日期，用于合并相邻日期
    pub date: NaiveDate,
}

/// 节假日表中一个馆的一行：列名 -> 取值（`closed` 或 `HH:MM-HH:MM`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionRow {
    pub location: String,
    pub values: BTreeMap<String, String>,
}

impl ExceptionRow {
    pub fn value(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

/// 节假日/特殊时间表，列按表中出现顺序保存（不按日期排序）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionSheet {
    pub columns: Vec<ExceptionColumn>,
    pub rows: Vec<ExceptionRow>,
}

impl ExceptionSheet {
    /// 按列顺序遍历某行中有值的单元格
    pub fn entries<'a>(
        &'a self,
        row: &'a ExceptionRow,
    ) -> impl Iterator<Item = (&'a ExceptionColumn, &'a str)> + 'a {
        self.columns
            .iter()
            .filter_map(move |column| row.value(&column.name).map(|value| (column, value)))
    }

    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.location.as_str())
    }
}

/// 按 (馆, 日期键) 查询覆盖值
#[derive(Debug, Clone, Default)]
pub struct ExceptionTable {
    by_location: HashMap<String, HashMap<String, String>>,
}

impl ExceptionTable {
    /// 逐列、逐行建立索引；同一馆同一日期键出现多次时，后面的列覆盖前面的
    pub fn from_sheet(sheet: &ExceptionSheet) -> Self {
        let mut by_location: HashMap<String, HashMap<String, String>> = HashMap::new();

        for row in &sheet.rows {
            by_location.entry(row.location.clone()).or_default();
        }

        for column in &sheet.columns {
            for row in &sheet.rows {
                if let Some(value) = row.value(&column.name) {
                    by_location
                        .entry(row.location.clone())
                        .or_default()
                        .insert(column.key.clone(), value.to_string());
                }
            }
        }

        Self { by_location }
    }

    pub fn lookup(&self, location: &str, date_key: &str) -> Option<&str> {
        self.by_location
            .get(location)?
            .get(date_key)
            .map(String::as_str)
    }

    /// 按日期查询，日期先格式化为 `M/D/YYYY`
    pub fn lookup_date(&self, location: &str, date: NaiveDate) -> Option<&str> {
        self.lookup(location, &date_key(date))
    }
}
