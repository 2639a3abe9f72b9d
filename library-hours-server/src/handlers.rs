use std::{collections::BTreeMap, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Local, NaiveDate};
use library_hours_core::{
    cache::CacheManager,
    prelude::*,
    sheet::parse_sheet_date,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cache::RedisCache;

const WORKBOOK_CACHE_TTL: Duration = Duration::from_secs(60 * 10);

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn SheetSource>,
}

/// 健康检查响应
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// 错误响应
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

/// 按日期查询的参数
#[derive(Deserialize)]
struct DateQuery {
    date: Option<String>, // 格式：YYYY-MM-DD 或 M/D/YYYY，默认今天
}

/// 单馆单日查询参数
#[derive(Deserialize)]
struct DayQuery {
    date: Option<String>,
    location: String,
}

/// 日历查询参数
#[derive(Deserialize)]
struct CalendarQuery {
    location: Option<String>,
}

/// 单日查询响应
#[derive(Serialize)]
struct DayResponse {
    location: String,
    date: NaiveDate,
    value: ResolvedDay,
    hours: DayHours,
}

/// 根据环境变量选择数据源
///
/// `HOURS_DATA_PATH` 优先；否则使用 `HOURS_DATA_URL`，配置了 `REDIS_URL` 时缓存下载内容。
pub async fn source_from_env() -> Result<Arc<dyn SheetSource>, library_hours_core::Error> {
    if let Some(path) = env_value("HOURS_DATA_PATH") {
        tracing::info!("从本地文件加载开放时间表格: {}", path);
        return Ok(Arc::new(FileSource::new(path)));
    }

    let url = env_value("HOURS_DATA_URL").ok_or_else(|| {
        library_hours_core::Error::Config(
            "HOURS_DATA_PATH or HOURS_DATA_URL environment variable is required".to_string(),
        )
    })?;
    let http = HttpSource::new(url.as_str())?;

    match env_value("REDIS_URL") {
        Some(redis_url) => {
            tracing::info!("使用 Redis 缓存表格: {}", redis_url);
            let cache = RedisCache::new(&redis_url, Some("library-hours".to_string())).await?;
            Ok(Arc::new(CachedSource::new(
                http,
                CacheManager::new(cache),
                WORKBOOK_CACHE_TTL,
            )))
        }
        None => {
            tracing::warn!("未配置 REDIS_URL，每次请求都会重新下载表格");
            Ok(Arc::new(http))
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn create_app(source: Arc<dyn SheetSource>) -> Router {
    let state = AppState { source };

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/hours/week", get(week_handler))
        .route("/hours/compact", get(compact_handler))
        .route("/hours/normal", get(normal_handler))
        .route("/hours/day", get(day_handler))
        .route("/hours/calendar", get(calendar_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// 根路径处理器
async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Library Hours Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Weekly operating hours for every library location",
        "endpoints": {
            "health": "/health",
            "week": "/hours/week?date=",
            "compact": "/hours/compact?date=",
            "normal": "/hours/normal?date=",
            "day": "/hours/day?date=&location=",
            "calendar": "/hours/calendar?location="
        }
    }))
}

/// 健康检查处理器
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn parse_date(date: Option<&str>) -> Result<NaiveDate, AppError> {
    match date {
        Some(text) => Ok(parse_sheet_date(text)?),
        None => Ok(Local::now().date_naive()),
    }
}

async fn load(state: &AppState) -> Result<HoursData, AppError> {
    Ok(load_hours_data(state.source.as_ref()).await?)
}

/// 完整周视图
async fn week_handler(
    Query(params): Query<DateQuery>,
    State(state): State<AppState>,
) -> Result<Json<WeekResult>, AppError> {
    let date = parse_date(params.date.as_deref())?;
    let data = load(&state).await?;
    Ok(Json(resolve_week(&data, date)?))
}

/// 压缩周视图
async fn compact_handler(
    Query(params): Query<DateQuery>,
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, Vec<DayGroup>>>, AppError> {
    let date = parse_date(params.date.as_deref())?;
    let data = load(&state).await?;
    Ok(Json(compact_week(&resolve_week(&data, date)?)))
}

/// 只含学期常规时间的压缩视图
async fn normal_handler(
    Query(params): Query<DateQuery>,
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, Vec<DayGroup>>>, AppError> {
    let date = parse_date(params.date.as_deref())?;
    let data = load(&state).await?;
    Ok(Json(normal_hours(&data, date)?))
}

/// 单馆单日
async fn day_handler(
    Query(params): Query<DayQuery>,
    State(state): State<AppState>,
) -> Result<Json<DayResponse>, AppError> {
    let date = parse_date(params.date.as_deref())?;
    let data = load(&state).await?;
    let week = resolve_week(&data, date)?;
    let value = single_day(&week, date, &params.location)?.clone();

    Ok(Json(DayResponse {
        hours: value.to_day_hours(),
        value,
        location: params.location,
        date,
    }))
}

/// 闭馆/特殊时间日历
async fn calendar_handler(
    Query(params): Query<CalendarQuery>,
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, CalendarView>>, AppError> {
    let data = load(&state).await?;
    let mut views = build_calendar_view(&data.exceptions);

    if let Some(location) = params.location {
        views.retain(|name, _| *name == location);
        if views.is_empty() {
            return Err(library_hours_core::Error::LocationNotFound(location).into());
        }
    }

    Ok(Json(views))
}

/// 应用错误类型
#[derive(Debug)]
pub struct AppError(library_hours_core::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self.0 {
            library_hours_core::Error::Sheet(_)
            | library_hours_core::Error::Json(_)
            | library_hours_core::Error::DateTime(_)
            | library_hours_core::Error::DateOutOfRange(_) => {
                (StatusCode::BAD_REQUEST, "数据格式错误")
            }
            library_hours_core::Error::LocationNotFound(_) => (StatusCode::NOT_FOUND, "馆不存在"),
            library_hours_core::Error::Source { .. } | library_hours_core::Error::Http(_) => {
                (StatusCode::BAD_GATEWAY, "数据源错误")
            }
            library_hours_core::Error::Timeout => (StatusCode::GATEWAY_TIMEOUT, "请求超时"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "内部服务器错误"),
        };

        if status.is_server_error() {
            tracing::error!("请求处理失败: {}", self.0);
        }

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
            message: self.0.to_string(),
        });

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<library_hours_core::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
