use std::collections::HashMap;

use crate::types::ScheduleRow;

/// 学期常规开放时间表：学期 -> 馆 -> 每日时间
#[derive(Debug, Clone, Default)]
pub struct ScheduleTable {
    semesters: HashMap<String, HashMap<String, ScheduleRow>>,
}

impl ScheduleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个学期（可以没有任何馆）
    pub fn add_semester(&mut self, semester: impl Into<String>) {
        self.semesters.entry(semester.into()).or_default();
    }

    /// 添加一行常规时间，同一学期内同名馆后者覆盖前者
    pub fn insert(&mut self, semester: &str, row: ScheduleRow) {
        self.semesters
            .entry(semester.to_string())
            .or_default()
            .insert(row.location.clone(), row);
    }

    /// 查询 (学期, 馆, 星期名) 的常规时间，任一层缺失返回 `None`
    pub fn lookup(&self, semester: &str, location: &str, day_name: &str) -> Option<&str> {
        self.semesters.get(semester)?.get(location)?.day(day_name)
    }

    /// 所有学期表中出现过的馆名（去重）
    pub fn locations(&self) -> impl Iterator<Item = &str> {
        let mut names: Vec<&str> = self
            .semesters
            .values()
            .flat_map(|rows| rows.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names.into_iter()
    }

    pub fn is_empty(&self) -> bool {
        self.semesters.values().all(HashMap::is_empty)
    }
}
