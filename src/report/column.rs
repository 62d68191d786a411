//! Cell formatting for report columns.

use serde::Serialize;

use super::table::Cell;
use crate::model::TestingStatus;

/// Color band of a report cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellColor {
    Green,
    Orange,
    Red,
}

impl CellColor {
    pub fn hex(&self) -> &'static str {
        match self {
            CellColor::Green => "#2e7d32",
            CellColor::Orange => "#ef6c00",
            CellColor::Red => "#c62828",
        }
    }
}

/// Renders an integer percentage as `"<percent>%"` plus an optional suffix,
/// colored by band: at least 75 green, below 25 red, orange in between.
/// Values outside 0..=100 are formatted as given.
#[derive(Debug, Clone, Default)]
pub struct PercentColumn {
    suffix: Option<String>,
}

impl PercentColumn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: Some(suffix.into()),
        }
    }

    pub fn color(percent: i32) -> CellColor {
        if percent >= 75 {
            CellColor::Green
        } else if percent < 25 {
            CellColor::Red
        } else {
            CellColor::Orange
        }
    }

    pub fn label(&self, percent: i32) -> String {
        format!("{}%{}", percent, self.suffix.as_deref().unwrap_or(""))
    }

    pub fn cell(&self, percent: i32) -> Cell {
        Cell {
            text: self.label(percent),
            color: Some(Self::color(percent)),
        }
    }
}

/// Status cell: passed green, failed red, warning orange, others plain.
pub fn status_cell(status: TestingStatus) -> Cell {
    let color = match status {
        TestingStatus::Passed => Some(CellColor::Green),
        TestingStatus::Failed => Some(CellColor::Red),
        TestingStatus::Warning => Some(CellColor::Orange),
        _ => None,
    };
    Cell {
        text: status.to_string(),
        color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_boundaries() {
        assert_eq!(PercentColumn::color(75), CellColor::Green);
        assert_eq!(PercentColumn::color(100), CellColor::Green);
        assert_eq!(PercentColumn::color(74), CellColor::Orange);
        assert_eq!(PercentColumn::color(50), CellColor::Orange);
        assert_eq!(PercentColumn::color(25), CellColor::Orange);
        assert_eq!(PercentColumn::color(24), CellColor::Red);
        assert_eq!(PercentColumn::color(0), CellColor::Red);
    }

    #[test]
    fn test_out_of_range_is_not_rejected() {
        assert_eq!(PercentColumn::color(140), CellColor::Green);
        assert_eq!(PercentColumn::color(-5), CellColor::Red);
        assert_eq!(PercentColumn::new().label(140), "140%");
    }

    #[test]
    fn test_label_with_suffix() {
        let cell = PercentColumn::with_suffix(" (3/4)").cell(75);
        assert_eq!(cell.text, "75% (3/4)");
        assert_eq!(cell.color, Some(CellColor::Green));
        assert_eq!(PercentColumn::new().label(24), "24%");
    }
}
