use tracing::trace;

use crate::data::display_row::{DisplayRow, DisplaySequence};

/// Measured heights plus a running average for rows not yet rendered.
///
/// Measured rows always report their own height. The average only moves
/// when a render batch is committed, never per row.
#[derive(Debug, Clone)]
pub struct RowHeightModel {
    default_height: u32,
    average: u32,
    measured_total: u64,
    measured_count: u64,
}

impl RowHeightModel {
    pub fn new(default_height: u32) -> Self {
        let default_height = default_height.max(1);
        Self {
            default_height,
            average: default_height,
            measured_total: 0,
            measured_count: 0,
        }
    }

    /// Estimate used for unmeasured rows
    pub fn average(&self) -> u32 {
        self.average
    }

    pub fn measured_count(&self) -> u64 {
        self.measured_count
    }

    pub fn height_of(&self, row: &DisplayRow) -> u32 {
        row.height.unwrap_or(self.average).max(1)
    }

    /// Store a measurement on the row; re-measuring replaces the old value
    pub fn record(&mut self, row: &mut DisplayRow, height: u32) {
        let height = height.max(1);
        match row.height {
            Some(old) => self.measured_total -= old as u64,
            None => self.measured_count += 1,
        }
        self.measured_total += height as u64;
        row.height = Some(height);
    }

    /// Fold the measurements of the finished batch into the average
    pub fn commit_batch(&mut self) {
        if self.measured_count > 0 {
            self.average = ((self.measured_total / self.measured_count) as u32).max(1);
            trace!(target: "viewport", "Row height average now {}", self.average);
        }
    }

    /// Cold start: take the average from just the rows that were walked
    pub fn reset_average_from<'a, I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = &'a DisplayRow>,
    {
        let (sum, count) = rows
            .into_iter()
            .filter_map(|r| r.height)
            .fold((0u64, 0u64), |(s, c), h| (s + h as u64, c + 1));
        if count > 0 {
            self.average = ((sum / count) as u32).max(1);
        }
    }

    /// Recount measurements after the pipeline replaced the sequence
    pub fn rebuild(&mut self, sequence: &DisplaySequence) {
        let (sum, count) = sequence
            .iter()
            .filter_map(|r| r.height)
            .fold((0u64, 0u64), |(s, c), h| (s + h as u64, c + 1));
        self.measured_total = sum;
        self.measured_count = count;
    }

    /// Forget everything (new data set)
    pub fn reset(&mut self) {
        *self = Self::new(self.default_height);
    }
}

impl Default for RowHeightModel {
    fn default() -> Self {
        Self::new(20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::RowId;

    #[test]
    fn test_unmeasured_rows_use_average() {
        let model = RowHeightModel::new(20);
        let row = DisplayRow::data(RowId(0));
        assert_eq!(model.height_of(&row), 20);
    }

    #[test]
    fn test_average_moves_on_commit_only() {
        let mut model = RowHeightModel::new(20);
        let mut a = DisplayRow::data(RowId(0));
        let mut b = DisplayRow::data(RowId(1));
        model.record(&mut a, 30);
        model.record(&mut b, 50);

        assert_eq!(model.average(), 20);
        assert_eq!(model.height_of(&a), 30);
        model.commit_batch();
        assert_eq!(model.average(), 40);
    }

    #[test]
    fn test_remeasure_replaces() {
        let mut model = RowHeightModel::new(20);
        let mut a = DisplayRow::data(RowId(0));
        model.record(&mut a, 30);
        model.record(&mut a, 10);
        model.commit_batch();
        assert_eq!(model.measured_count(), 1);
        assert_eq!(model.average(), 10);
    }

    #[test]
    fn test_zero_height_clamped() {
        let mut model = RowHeightModel::new(0);
        let mut a = DisplayRow::data(RowId(0));
        model.record(&mut a, 0);
        assert_eq!(a.height, Some(1));
        assert_eq!(model.average(), 1);
    }
}
