//! Comparison periods and collaboration year ranges.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::config::Tuning;
use crate::error::InputError;

/// Three ordered anchors: career start, medium period, short period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearWindow {
    anchors: [i32; 3],
    now: i32,
    margin_years: i32,
}

impl YearWindow {
    /// Anchors are sorted ascending.
    #[must_use]
    pub fn new(mut anchors: [i32; 3], now: i32, margin_years: i32) -> Self {
        anchors.sort_unstable();
        Self { anchors, now, margin_years }
    }

    #[must_use]
    pub const fn anchors(&self) -> [i32; 3] {
        self.anchors
    }

    #[must_use]
    pub const fn career_start(&self) -> i32 {
        self.anchors[0]
    }

    #[must_use]
    pub const fn mid(&self) -> i32 {
        self.anchors[1]
    }

    #[must_use]
    pub const fn short(&self) -> i32 {
        self.anchors[2]
    }

    #[must_use]
    pub const fn now(&self) -> i32 {
        self.now
    }

    /// Per anchor, its years from `now + margin - 1` down to the anchor.
    #[must_use]
    pub fn to_descending_lists(&self) -> [Vec<i32>; 3] {
        let end = self.now + self.margin_years;
        self.anchors.map(|anchor| (anchor..end).rev().collect())
    }
}

/// Derives the comparison periods of one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearWindowPlanner {
    career_start: i32,
    now: i32,
    mid_offset: i32,
    short_offset: i32,
    margin_years: i32,
}

impl YearWindowPlanner {
    #[must_use]
    pub const fn new(career_start: i32, now: i32, tuning: &Tuning) -> Self {
        Self {
            career_start,
            now,
            mid_offset: tuning.default_mid_offset,
            short_offset: tuning.default_short_offset,
            margin_years: tuning.forward_margin_years,
        }
    }

    /// Years an explicit anchor may take: career start to the last forward slot.
    #[must_use]
    pub const fn valid_range(&self) -> RangeInclusive<i32> {
        self.career_start..=self.now + self.margin_years - 1
    }

    /// Career start, `now - 6` and `now - 4` with the default tuning.
    ///
    /// The medium and short anchors never precede the career start.
    #[must_use]
    pub fn plan_default(&self) -> YearWindow {
        let mid = (self.now - self.mid_offset).max(self.career_start);
        let short = (self.now - self.short_offset).max(mid);
        YearWindow::new([self.career_start, mid, short], self.now, self.margin_years)
    }

    /// Parse `a,b` or `a,b,c`; empty input yields the default window.
    ///
    /// # Errors
    ///
    /// Returns `InvalidWindow` on a wrong count, a non-digit token or an
    /// out-of-range year.
    pub fn plan_from_input(&self, text: &str) -> Result<YearWindow, InputError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(self.plan_default());
        }

        let range = self.valid_range();
        let mut years = Vec::with_capacity(3);
        for token in text.split(',').map(str::trim) {
            if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
                return Err(InputError::invalid_window(format!("'{token}' is not a year")));
            }
            let year: i32 = token
                .parse()
                .map_err(|_| InputError::invalid_window(format!("'{token}' is not a year")))?;
            if !range.contains(&year) {
                return Err(InputError::invalid_window(format!(
                    "{year} is outside {}-{}",
                    range.start(),
                    range.end()
                )));
            }
            years.push(year);
        }

        let anchors = match years.as_slice() {
            [a, b] => [self.career_start, *a, *b],
            [a, b, c] => [*a, *b, *c],
            other => {
                return Err(InputError::invalid_window(format!(
                    "expected 2 or 3 years, got {}",
                    other.len()
                )));
            }
        };
        Ok(YearWindow::new(anchors, self.now, self.margin_years))
    }
}

/// Inclusive publication year range of a collaboration query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSpan {
    pub start: i32,
    pub end: i32,
}

impl YearSpan {
    /// Parse `start,end`; empty input yields the last `default_span` years up to `now`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidWindow` unless the input is two years with `start <= end`.
    pub fn parse(text: &str, now: i32, default_span: i32) -> Result<Self, InputError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self { start: now - default_span, end: now });
        }

        let years = text
            .split(',')
            .map(str::trim)
            .map(|token| {
                if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
                    return Err(InputError::invalid_window(format!("'{token}' is not a year")));
                }
                token
                    .parse::<i32>()
                    .map_err(|_| InputError::invalid_window(format!("'{token}' is not a year")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match years.as_slice() {
            [start, end] if start <= end => Ok(Self { start: *start, end: *end }),
            [start, end] => Err(InputError::invalid_window(format!("{start} is after {end}"))),
            other => Err(InputError::invalid_window(format!(
                "expected a start and an end year, got {} values",
                other.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner() -> YearWindowPlanner {
        YearWindowPlanner::new(2008, 2025, &Tuning::default())
    }

    #[test]
    fn test_default_anchors() {
        let window = planner().plan_default();
        assert_eq!(window.anchors(), [2008, 2019, 2021]);
    }

    #[test]
    fn test_young_career_keeps_its_start() {
        let p = YearWindowPlanner::new(2022, 2025, &Tuning::default());
        let window = p.plan_default();
        assert_eq!(window.career_start(), 2022);
        assert_eq!(window.anchors(), [2022, 2022, 2022]);
        assert!(window.anchors().iter().all(|year| p.valid_range().contains(year)));

        let window = YearWindowPlanner::new(2020, 2025, &Tuning::default()).plan_default();
        assert_eq!(window.anchors(), [2020, 2020, 2021]);
    }

    #[test]
    fn test_empty_input_is_default() {
        let p = planner();
        assert_eq!(p.plan_from_input("  ").unwrap(), p.plan_default());
    }

    #[test]
    fn test_two_values_add_career_start_and_sort() {
        let window = planner().plan_from_input("2022, 2015").unwrap();
        assert_eq!(window.anchors(), [2008, 2015, 2022]);
    }

    #[test]
    fn test_rejects_bad_windows() {
        let p = planner();
        assert!(matches!(p.plan_from_input("2015"), Err(InputError::InvalidWindow { .. })));
        assert!(matches!(p.plan_from_input("2015,20x6"), Err(InputError::InvalidWindow { .. })));
        assert!(matches!(p.plan_from_input("2001,2015"), Err(InputError::InvalidWindow { .. })));
        assert!(matches!(p.plan_from_input("2015,2027"), Err(InputError::InvalidWindow { .. })));
        assert!(matches!(
            p.plan_from_input("2010,2012,2014,2016"),
            Err(InputError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn test_descending_lists_include_forward_slot() {
        let window = planner().plan_from_input("2023,2024").unwrap();
        let [_, mid, short] = window.to_descending_lists();
        assert_eq!(mid, vec![2026, 2025, 2024, 2023]);
        assert_eq!(short, vec![2026, 2025, 2024]);
    }

    #[test]
    fn test_year_span() {
        assert_eq!(YearSpan::parse("", 2025, 5).unwrap(), YearSpan { start: 2020, end: 2025 });
        assert_eq!(
            YearSpan::parse("2018, 2022", 2025, 5).unwrap(),
            YearSpan { start: 2018, end: 2022 }
        );
        assert!(YearSpan::parse("2022,2018", 2025, 5).is_err());
        assert!(YearSpan::parse("2018", 2025, 5).is_err());
    }
}
