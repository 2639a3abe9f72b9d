use std::{collections::BTreeMap, time::Duration};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use library_hours_core::{
    cache::CacheManager,
    exceptions::date_key,
    prelude::*,
    sheet::parse_sheet_date,
    week::week_dates,
};
use serde::Serialize;

use crate::{SourceArgs, cache::FileCache};

const DAY_ABBREVIATIONS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// 解析命令行中的日期，缺省为今天
fn resolve_date(date: Option<String>) -> Result<NaiveDate> {
    match date {
        Some(text) => Ok(parse_sheet_date(&text)?),
        None => Ok(Local::now().date_naive()),
    }
}

/// 根据参数构建数据源并加载表格
async fn load(args: &SourceArgs) -> Result<HoursData> {
    if !library_hours_core::source::is_url(&args.data) {
        let source = FileSource::new(&args.data);
        return Ok(load_hours_data(&source).await?);
    }

    let http = HttpSource::new(&args.data)?;
    if args.no_cache {
        return Ok(load_hours_data(&http).await?);
    }

    let cache = FileCache::with_default_dir("library-hours")?;
    let source = CachedSource::new(
        http,
        CacheManager::new(cache),
        Duration::from_secs(args.cache_ttl),
    );
    if args.refresh {
        tracing::info!("丢弃缓存的表格: {}", args.data);
        source.invalidate().await?;
    }
    Ok(load_hours_data(&source).await?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_hours(hours: &DayHours) -> String {
    match hours {
        DayHours::Hours(HoursRange {
            start,
            end: Some(end),
        }) => format!("{}-{}", start, end),
        DayHours::Hours(HoursRange { start, end: None }) => start.clone(),
        DayHours::Tba => TBA.to_string(),
    }
}

/// 完整周视图命令
pub async fn week_command(args: SourceArgs, date: Option<String>) -> Result<()> {
    let date = resolve_date(date)?;
    tracing::info!("查询周开放时间: date={}", date);

    let data = load(&args).await?;
    let week = resolve_week(&data, date)?;

    if args.json {
        return print_json(&week);
    }

    let dates = week_dates(week.week_start)?;
    println!("{} 所在周（周一 {}）:", date, week.week_start);
    for (location, days) in &week.hours {
        println!("{}", location);
        for ((abbr, day), value) in DAY_ABBREVIATIONS.iter().zip(dates).zip(days) {
            println!("  {} {:<10} {}", abbr, date_key(day), value);
        }
    }

    Ok(())
}

fn print_groups(groups: &BTreeMap<String, Vec<DayGroup>>) {
    for (location, groups) in groups {
        let line: Vec<String> = groups
            .iter()
            .map(|group| {
                let days: String = group.days.iter().collect();
                format!("{} {}", days, format_hours(&group.hours))
            })
            .collect();
        println!("{}: {}", location, line.join(", "));
    }
}

/// 压缩周视图命令
pub async fn compact_command(args: SourceArgs, date: Option<String>) -> Result<()> {
    let date = resolve_date(date)?;
    tracing::info!("查询压缩周视图: date={}", date);

    let data = load(&args).await?;
    let groups = compact_week(&resolve_week(&data, date)?);

    if args.json {
        return print_json(&groups);
    }
    print_groups(&groups);
    Ok(())
}

/// 常规时间命令
pub async fn normal_command(args: SourceArgs, date: Option<String>) -> Result<()> {
    let date = resolve_date(date)?;
    tracing::info!("查询常规开放时间: date={}", date);

    let data = load(&args).await?;
    let groups = normal_hours(&data, date)?;

    if args.json {
        return print_json(&groups);
    }
    print_groups(&groups);
    Ok(())
}

/// 单馆单日命令
pub async fn day_command(args: SourceArgs, location: String, date: Option<String>) -> Result<()> {
    let date = resolve_date(date)?;
    tracing::info!("查询单日开放时间: location={}, date={}", location, date);

    let data = load(&args).await?;
    let week = resolve_week(&data, date)?;
    let day = single_day(&week, date, &location)?;

    if args.json {
        return print_json(&day.to_day_hours());
    }
    println!("{} {}: {}", location, date, day);
    Ok(())
}

/// 闭馆/特殊时间日历命令
pub async fn calendar_command(args: SourceArgs, location: Option<String>) -> Result<()> {
    let data = load(&args).await?;
    let mut views = build_calendar_view(&data.exceptions);

    if let Some(ref name) = location {
        views.retain(|key, _| key == name);
        if views.is_empty() {
            return Err(library_hours_core::Error::LocationNotFound(name.clone()).into());
        }
    }

    if args.json {
        return print_json(&views);
    }

    for (location, view) in &views {
        println!("{}", location);
        println!("  闭馆:");
        for closing in &view.closings {
            println!(
                "    {} ~ {}  {}",
                closing.dates.start, closing.dates.end, closing.reason
            );
        }
        println!("  特殊开放时间:");
        for exception in &view.exceptions {
            println!(
                "    {} ~ {}  {}  {}",
                exception.dates.start,
                exception.dates.end,
                format_hours(&DayHours::Hours(exception.hours.clone())),
                exception.reason
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use library_hours_core::Error;

    use super::*;

    fn fixture_args() -> SourceArgs {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .unwrap()
            .join("fixtures")
            .join("hours.json");
        SourceArgs {
            data: path.display().to_string(),
            cache_ttl: 600,
            no_cache: false,
            refresh: false,
            json: true,
        }
    }

    #[test]
    fn format_hours_variants() {
        assert_eq!(
            format_hours(&DayHours::Hours(HoursRange::new("9:00", "17:00"))),
            "9:00-17:00"
        );
        assert_eq!(
            format_hours(&DayHours::Hours(HoursRange::parse("closed"))),
            "closed"
        );
        assert_eq!(format_hours(&DayHours::Tba), "TBA");
    }

    #[test]
    fn resolve_date_accepts_sheet_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 10, 14).unwrap();
        assert_eq!(resolve_date(Some("2024-10-14".to_string())).unwrap(), expected);
        assert_eq!(resolve_date(Some("10/14/2024".to_string())).unwrap(), expected);
        assert!(resolve_date(Some("tomorrow".to_string())).is_err());
    }

    #[tokio::test]
    async fn load_reads_local_fixture() {
        let data = load(&fixture_args()).await.unwrap();
        assert_eq!(data.semesters.len(), 2);
    }

    #[tokio::test]
    async fn calendar_command_filters_location() {
        calendar_command(fixture_args(), Some("Annex".to_string()))
            .await
            .unwrap();

        let err = calendar_command(fixture_args(), Some("Nowhere".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::LocationNotFound(name)) if name == "Nowhere"
        ));
    }

    #[tokio::test]
    async fn day_command_unknown_location() {
        let err = day_command(
            fixture_args(),
            "Nowhere".to_string(),
            Some("2024-10-15".to_string()),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::LocationNotFound(_))
        ));

        day_command(fixture_args(), "Main".to_string(), Some("2024-10-15".to_string()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn week_command_rejects_two_digit_year() {
        let err = week_command(fixture_args(), Some("10/14/24".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Sheet(_))));
    }
}
