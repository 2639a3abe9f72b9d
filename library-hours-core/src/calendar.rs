use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};

use crate::{
    exceptions::{ExceptionColumn, ExceptionRow, ExceptionSheet},
    types::{CLOSED, CalendarView, ClosingBlock, DateRange, ExceptionBlock, HoursRange},
};

/// `next` 是否恰好是 `previous` 的下一天
fn is_next_day(previous: NaiveDate, next: NaiveDate) -> bool {
    previous.checked_add_days(Days::new(1)) == Some(next)
}

/// 按列顺序合并一个馆的节假日条目
///
/// 闭馆和特殊时间各自只看同类的上一个区间：新日期恰好是上一区间结束日的下一天
/// （特殊时间还要求起止时间相同）时延长该区间，否则新开一个区间。
/// 合并时保留第一个区间的原因，后来的原因被丢弃。
pub fn coalesce<'a, I>(entries: I) -> CalendarView
where
    I: IntoIterator<Item = (&'a ExceptionColumn, &'a str)>,
{
    entries
        .into_iter()
        .fold(CalendarView::default(), |mut view, (column, value)| {
            if value == CLOSED {
                match view.closings.last_mut() {
                    Some(last) if is_next_day(last.dates.end, column.date) => {
                        last.dates.end = column.date;
                    }
                    _ => view.closings.push(ClosingBlock {
                        dates: DateRange::single(column.date),
                        reason: column.name.clone(),
                    }),
                }
            } else {
                let hours = HoursRange::parse(value);
                match view.exceptions.last_mut() {
                    Some(last)
                        if is_next_day(last.dates.end, column.date) && last.hours == hours =>
                    {
                        last.dates.end = column.date;
                    }
                    _ => view.exceptions.push(ExceptionBlock {
                        dates: DateRange::single(column.date),
                        reason: column.name.clone(),
                        hours,
                    }),
                }
            }
            view
        })
}

/// 单个馆的完整日历
pub fn location_calendar(sheet: &ExceptionSheet, row: &ExceptionRow) -> CalendarView {
    coalesce(sheet.entries(row))
}

/// 所有馆的闭馆/特殊时间日历
pub fn build_calendar_view(sheet: &ExceptionSheet) -> BTreeMap<String, CalendarView> {
    let views: BTreeMap<String, CalendarView> = sheet
        .rows
        .iter()
        .map(|row| (row.location.clone(), location_calendar(sheet, row)))
        .collect();

    tracing::debug!(
        "Built calendar view for {} locations from {} columns",
        views.len(),
        sheet.columns.len()
    );

    views
}
