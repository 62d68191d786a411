//! Pass-rate charts over execution requests.
//!
//! Filters arrive as a `;`-separated list of `kind:arg1,arg2` items, for
//! example `label:smoke;last:10`. Each kind takes a fixed number of arguments.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{RamError, RamResult};
use crate::model::ExecutionRequestFilter;
use crate::report::{CellColor, PercentColumn};
use crate::service::ExecutionService;

#[derive(Debug, Clone, PartialEq)]
pub enum ChartFilter {
    Last(u32),
    Label(String),
    Environment(String),
    Period {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

impl ChartFilter {
    fn expected_args(kind: &str) -> Option<usize> {
        match kind {
            "last" | "label" | "environment" => Some(1),
            "period" => Some(2),
            _ => None,
        }
    }

    pub fn parse(raw: &str) -> RamResult<Self> {
        let (kind, rest) = raw.split_once(':').unwrap_or((raw, ""));
        let kind = kind.trim();
        let args: Vec<&str> = if rest.trim().is_empty() {
            Vec::new()
        } else {
            rest.split(',').map(str::trim).collect()
        };

        let expected = Self::expected_args(kind)
            .ok_or_else(|| RamError::InvalidRequest(format!("unknown chart filter '{}'", kind)))?;
        if args.len() != expected {
            return Err(RamError::ChartFilterArguments {
                filter: kind.to_string(),
                expected,
                actual: args.len(),
            });
        }

        match kind {
            "last" => {
                let count = args[0].parse::<u32>().map_err(|_| {
                    RamError::InvalidRequest(format!("'{}' is not a count", args[0]))
                })?;
                Ok(ChartFilter::Last(count))
            }
            "label" => Ok(ChartFilter::Label(args[0].to_string())),
            "environment" => Ok(ChartFilter::Environment(args[0].to_string())),
            _ => Ok(ChartFilter::Period {
                from: parse_date(args[0], false)?,
                to: parse_date(args[1], true)?,
            }),
        }
    }

    /// Parse a full filter list; blank input means no filters.
    pub fn parse_list(raw: &str) -> RamResult<Vec<Self>> {
        raw.split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::parse)
            .collect()
    }
}

/// Accepts RFC 3339 timestamps or plain dates. A plain `to` date covers the
/// whole day.
fn parse_date(raw: &str, end_of_day: bool) -> RamResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| RamError::InvalidRequest(format!("'{}' is not a date", raw)))?;
    let time = if end_of_day {
        date.and_hms_micro_opt(23, 59, 59, 999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc())
        .ok_or_else(|| RamError::InvalidRequest(format!("'{}' is not a date", raw)))
}

fn to_request_filter(filters: &[ChartFilter]) -> ExecutionRequestFilter {
    let mut filter = ExecutionRequestFilter::default();
    for f in filters {
        match f {
            ChartFilter::Last(n) => filter.limit = Some(*n),
            ChartFilter::Label(label) => filter.label = Some(label.clone()),
            ChartFilter::Environment(env) => filter.environment = Some(env.clone()),
            ChartFilter::Period { from, to } => {
                filter.from = Some(*from);
                filter.to = Some(*to);
            }
        }
    }
    filter
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub id: Uuid,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub passed_rate: i32,
    pub color: CellColor,
}

/// Pass-rate series, oldest first.
pub fn pass_rate(executions: &ExecutionService, filters: &[ChartFilter]) -> RamResult<Vec<ChartPoint>> {
    let requests = executions.list(&to_request_filter(filters))?;
    Ok(requests
        .into_iter()
        .rev()
        .map(|er| ChartPoint {
            id: er.id,
            name: er.name,
            start_date: er.start_date,
            passed_rate: er.passed_rate,
            color: PercentColumn::color(er.passed_rate),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filters() {
        let filters = ChartFilter::parse_list("label:smoke; last:10 ;environment:staging").unwrap();
        assert_eq!(
            filters,
            vec![
                ChartFilter::Label("smoke".to_string()),
                ChartFilter::Last(10),
                ChartFilter::Environment("staging".to_string()),
            ]
        );
        assert!(ChartFilter::parse_list("  ").unwrap().is_empty());
    }

    #[test]
    fn test_wrong_argument_count_is_ram_8000() {
        let err = ChartFilter::parse("period:2026-01-01").unwrap_err();
        assert_eq!(err.reason(), "RAM-8000");

        let err = ChartFilter::parse("last:1,2").unwrap_err();
        assert_eq!(err.reason(), "RAM-8000");

        let err = ChartFilter::parse("label").unwrap_err();
        assert_eq!(err.reason(), "RAM-8000");
    }

    #[test]
    fn test_unknown_filter_is_invalid_request() {
        let err = ChartFilter::parse("color:red").unwrap_err();
        assert_eq!(err.reason(), "RAM-7000");
    }

    #[test]
    fn test_period_plain_dates_cover_whole_days() {
        match ChartFilter::parse("period:2026-01-01,2026-01-31").unwrap() {
            ChartFilter::Period { from, to } => {
                assert_eq!(from.to_rfc3339(), "2026-01-01T00:00:00+00:00");
                assert!(to > DateTime::parse_from_rfc3339("2026-01-31T23:59:59Z").unwrap());
            }
            other => panic!("unexpected filter {:?}", other),
        }
    }

    #[test]
    fn test_pass_rate_series_is_oldest_first() {
        use crate::model::NewExecutionRequest;
        use chrono::Duration;

        let executions = ExecutionService::new(crate::storage::open_memory_pool().unwrap());
        let now = Utc::now();
        for (name, hours_ago) in [("first", 3), ("second", 2), ("third", 1)] {
            executions
                .create(NewExecutionRequest {
                    name: name.to_string(),
                    start_date: Some(now - Duration::hours(hours_ago)),
                    ..Default::default()
                })
                .unwrap();
        }

        let points = pass_rate(&executions, &[ChartFilter::Last(2)]).unwrap();
        let names: Vec<_> = points.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["second", "third"]);
        assert_eq!(points[0].color, CellColor::Red);
    }
}
