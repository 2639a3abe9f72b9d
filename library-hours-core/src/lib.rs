//! Library Hours Core Library
//!
//! This library resolves the operating hours of every library for a given
//! week from semester schedules and holiday/special-hours exceptions, and
//! derives compact and calendar views of the result.

pub mod cache;
pub mod calendar;
pub mod compact;
pub mod error;
pub mod exceptions;
pub mod schedule;
pub mod semester;
pub mod sheet;
pub mod source;
pub mod types;
pub mod week;

#[cfg(test)]
mod testing;

// Re-export core types and error handling
pub use error::{Error, Result};
pub use types::*;

/// Commonly used items
pub mod prelude {
    pub use crate::{
        calendar::build_calendar_view,
        compact::{compact, compact_week, normal_hours},
        semester::{SemesterIndex, find_semester},
        sheet::{HoursData, Workbook},
        source::{CachedSource, FileSource, HttpSource, SheetSource, load_hours_data},
        types::*,
        week::{WeekResolver, resolve_week, single_day},
    };
}
