//! Calendar-derived booking features.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Months treated as holiday periods (July, August, December).
pub const HOLIDAY_MONTHS: [u32; 3] = [7, 8, 12];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub const ALL: [Season; 4] = [
        Season::Winter,
        Season::Spring,
        Season::Summer,
        Season::Autumn,
    ];

    /// Meteorological season of a calendar month (1-12).
    /// Out-of-range months are treated as autumn, the table's catch-all.
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Autumn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Season {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "winter" => Ok(Season::Winter),
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "autumn" | "fall" => Ok(Season::Autumn),
            _ => anyhow::bail!(
                "Invalid season: {}. Must be 'winter', 'spring', 'summer' or 'autumn'",
                s
            ),
        }
    }
}

/// Features that depend only on the booking date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFeatures {
    pub month: u32,
    pub season: Season,
    /// Monday = 0 ... Sunday = 6
    pub day_of_week: u32,
    pub is_weekend: bool,
    pub is_holiday: bool,
}

impl CalendarFeatures {
    pub fn from_date(date: NaiveDate) -> Self {
        let month = date.month();
        let day_of_week = date.weekday().num_days_from_monday();
        Self {
            month,
            season: Season::from_month(month),
            day_of_week,
            is_weekend: day_of_week >= 5,
            is_holiday: HOLIDAY_MONTHS.contains(&month),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_is_function_of_month() {
        let expected = [
            (1, Season::Winter),
            (2, Season::Winter),
            (3, Season::Spring),
            (4, Season::Spring),
            (5, Season::Spring),
            (6, Season::Summer),
            (7, Season::Summer),
            (8, Season::Summer),
            (9, Season::Autumn),
            (10, Season::Autumn),
            (11, Season::Autumn),
            (12, Season::Winter),
        ];
        for (month, season) in expected {
            assert_eq!(Season::from_month(month), season, "month {}", month);
            assert!(Season::ALL.contains(&Season::from_month(month)));
        }
    }

    #[test]
    fn test_calendar_features_saturday_in_july() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 6).unwrap();
        let features = CalendarFeatures::from_date(date);
        assert_eq!(features.month, 7);
        assert_eq!(features.season, Season::Summer);
        assert_eq!(features.day_of_week, 5);
        assert!(features.is_weekend);
        assert!(features.is_holiday);
    }

    #[test]
    fn test_calendar_features_monday_in_march() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let features = CalendarFeatures::from_date(date);
        assert_eq!(features.day_of_week, 0);
        assert!(!features.is_weekend);
        assert!(!features.is_holiday);
        assert_eq!(features.season, Season::Spring);
    }

    #[test]
    fn test_season_parse() {
        assert_eq!("Summer".parse::<Season>().unwrap(), Season::Summer);
        assert_eq!("fall".parse::<Season>().unwrap(), Season::Autumn);
        assert!("monsoon".parse::<Season>().is_err());
    }
}
