//! Date-range expansion and the per-day driver loop.

use thiserror::Error;

use crate::collector::{CollectionRun, CollectorError, DailyCollector};
use crate::day::Day;
use crate::sink::PointSink;
use crate::storage::AggregateQueries;

/// Invalid date-range input. Reported before any query runs.
#[derive(Debug, Error)]
pub enum RangeError {
    /// Only one of the two bounds was given.
    #[error("give a starting date ({from}) AND an ending date ({to})")]
    MissingBound {
        /// Start bound as given, empty if absent.
        from: String,
        /// End bound as given, empty if absent.
        to: String,
    },

    /// A bound is not a `YYYYMMDD` date.
    #[error("invalid date '{input}' (expected YYYYMMDD): {source}")]
    InvalidDate {
        /// Raw input.
        input: String,
        /// Parse failure.
        #[source]
        source: chrono::ParseError,
    },

    /// Both bounds are the same day.
    #[error("give a starting date ({0}) and an ending date that are different")]
    SameDay(Day),

    /// The start is after the end.
    #[error("starting date {from} should be before ending date {to}")]
    Inverted {
        /// Start bound.
        from: Day,
        /// End bound.
        to: Day,
    },
}

/// Inclusive, ascending range of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    start: Day,
    end: Day,
}

impl DayRange {
    /// A range covering only `day`.
    pub fn single(day: Day) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Build from optional `YYYYMMDD` bounds; no bounds means `today` only.
    ///
    /// Empty strings count as absent.
    pub fn from_bounds(
        from: Option<&str>,
        to: Option<&str>,
        today: Day,
    ) -> Result<Self, RangeError> {
        let from = from.map(str::trim).filter(|s| !s.is_empty());
        let to = to.map(str::trim).filter(|s| !s.is_empty());

        let (from, to) = match (from, to) {
            (None, None) => return Ok(Self::single(today)),
            (Some(from), Some(to)) => (parse_bound(from)?, parse_bound(to)?),
            (from, to) => {
                return Err(RangeError::MissingBound {
                    from: from.unwrap_or_default().to_string(),
                    to: to.unwrap_or_default().to_string(),
                });
            }
        };

        if from == to {
            return Err(RangeError::SameDay(from));
        }
        if from > to {
            return Err(RangeError::Inverted { from, to });
        }
        Ok(Self {
            start: from,
            end: to,
        })
    }

    /// First day.
    pub fn start(&self) -> Day {
        self.start
    }

    /// Last day, inclusive.
    pub fn end(&self) -> Day {
        self.end
    }

    /// Every day in the range, ascending.
    pub fn days(&self) -> impl Iterator<Item = Day> + use<> {
        let end = self.end;
        std::iter::successors(Some(self.start), |day| day.succ())
            .take_while(move |day| *day <= end)
    }

    /// Number of days in the range.
    pub fn len(&self) -> usize {
        let span = self.end.date().signed_duration_since(self.start.date());
        span.num_days() as usize + 1
    }

    /// Always false; a range holds at least one day.
    pub fn is_empty(&self) -> bool {
        false
    }
}

fn parse_bound(input: &str) -> Result<Day, RangeError> {
    Day::parse_compact(input).map_err(|source| RangeError::InvalidDate {
        input: input.to_string(),
        source,
    })
}

/// Collect every day of `range` in ascending order.
///
/// Stops at the first failing day; days already written stay written.
pub async fn run_range<Q, S>(
    collector: &DailyCollector<Q, S>,
    range: &DayRange,
) -> Result<Vec<CollectionRun>, CollectorError>
where
    Q: AggregateQueries,
    S: PointSink,
{
    let mut runs = Vec::with_capacity(range.len());
    for day in range.days() {
        match collector.collect(day).await {
            Ok(run) => runs.push(run),
            Err(e) => {
                tracing::error!(day = %day, error = %e, "Collection aborted");
                return Err(e);
            }
        }
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> Day {
        Day::from_ymd(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_no_bounds_is_today() {
        let range = DayRange::from_bounds(None, None, today()).unwrap();
        assert_eq!(range.days().collect::<Vec<_>>(), vec![today()]);

        let range = DayRange::from_bounds(Some(""), Some(" "), today()).unwrap();
        assert_eq!(range, DayRange::single(today()));
        assert_eq!(range.len(), 1);
    }

    #[test]
    fn test_inclusive_ascending_expansion() {
        let range = DayRange::from_bounds(Some("20190101"), Some("20190103"), today()).unwrap();
        let days: Vec<_> = range.days().collect();
        assert_eq!(
            days,
            vec![
                Day::from_ymd(2019, 1, 1).unwrap(),
                Day::from_ymd(2019, 1, 2).unwrap(),
                Day::from_ymd(2019, 1, 3).unwrap(),
            ]
        );
        assert!(days.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(range.len(), 3);
    }

    #[test]
    fn test_expansion_across_leap_day() {
        let range = DayRange::from_bounds(Some("20200227"), Some("20200301"), today()).unwrap();
        assert_eq!(range.days().count(), 4);
        assert_eq!(range.len(), 4);
    }

    #[test]
    fn test_missing_bound() {
        let err = DayRange::from_bounds(Some("20190101"), None, today()).unwrap_err();
        assert!(matches!(err, RangeError::MissingBound { .. }));

        let err = DayRange::from_bounds(None, Some("20190101"), today()).unwrap_err();
        assert!(matches!(err, RangeError::MissingBound { .. }));
    }

    #[test]
    fn test_same_day() {
        let err = DayRange::from_bounds(Some("20190101"), Some("20190101"), today()).unwrap_err();
        assert!(matches!(err, RangeError::SameDay(_)));
    }

    #[test]
    fn test_inverted() {
        let err = DayRange::from_bounds(Some("20190103"), Some("20190101"), today()).unwrap_err();
        assert!(matches!(err, RangeError::Inverted { .. }));
        assert!(err.to_string().contains("should be before"));
    }

    #[test]
    fn test_invalid_date() {
        let err =
            DayRange::from_bounds(Some("2019-01-01"), Some("20190103"), today()).unwrap_err();
        assert!(matches!(err, RangeError::InvalidDate { .. }));
    }
}
