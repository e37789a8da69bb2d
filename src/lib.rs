pub mod countries;
pub mod csse;
pub mod dataset;
pub mod error;
pub mod metric;
pub mod region;
pub mod series;
pub mod tabular;

use chrono::naive::NaiveDate;

/// Half-open range of calendar days: yields every date in `[start, end)`.
#[derive(Clone, Debug)]
pub struct NaiveDateRange(pub NaiveDate, pub NaiveDate);

impl Iterator for NaiveDateRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<NaiveDate> {
        match self.0 < self.1 {
            false => None,
            true => {
                let current = self.0;
                self.0 = self.0.succ_opt()?;
                Some(current)
            }
        }
    }
}
