use chrono::NaiveDate;

/// Calendar days from the first date through the second (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl DateRange {
    /// Number of days the range still yields.
    pub fn days(&self) -> usize {
        let span = (self.1 - self.0).num_days();
        if span < 0 {
            0
        } else {
            span as usize + 1
        }
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0 > self.1 {
            return None;
        }
        let current = self.0;
        match current.succ_opt() {
            Some(next) => self.0 = next,
            // NaiveDate::MAX: stop after yielding it
            None => self.1 = current.pred_opt()?,
        }
        Some(current)
    }
}
