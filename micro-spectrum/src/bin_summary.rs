use crate::frequency_bin_mapper::ColumnBinRange;
use crate::types::MagnitudeSnapshot;

/// Largest value in `bins[range]`.
///
/// Max, never mean: averaging would smear a transient peak across the
/// column. An empty or inverted range evaluates its start bin alone; a range
/// entirely past the end of the snapshot yields `None`.
pub fn max_over_range(snapshot: &MagnitudeSnapshot<'_>, range: ColumnBinRange) -> Option<f32> {
    let len = snapshot.len();
    if range.start >= len {
        return None;
    }
    let end = if range.is_degenerate() {
        range.start + 1
    } else {
        range.end.min(len)
    };

    let value = match snapshot {
        MagnitudeSnapshot::Byte(bins) => {
            bins[range.start..end].iter().copied().max().map(f32::from)?
        }
        MagnitudeSnapshot::Decibel(bins) => bins[range.start..end]
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max),
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_over_byte_range() {
        let data = [1u8, 9, 3, 200, 5, 6];
        let snapshot = MagnitudeSnapshot::Byte(&data);
        assert_eq!(max_over_range(&snapshot, ColumnBinRange::new(0, 3)), Some(9.0));
        assert_eq!(max_over_range(&snapshot, ColumnBinRange::new(2, 6)), Some(200.0));
    }

    #[test]
    fn test_end_is_exclusive() {
        let data = [1u8, 2, 250];
        let snapshot = MagnitudeSnapshot::Byte(&data);
        assert_eq!(max_over_range(&snapshot, ColumnBinRange::new(0, 2)), Some(2.0));
    }

    #[test]
    fn test_degenerate_range_reads_start_bin() {
        let data = [10u8, 20, 30];
        let snapshot = MagnitudeSnapshot::Byte(&data);
        assert_eq!(max_over_range(&snapshot, ColumnBinRange::new(1, 1)), Some(20.0));
        assert_eq!(max_over_range(&snapshot, ColumnBinRange::new(2, 0)), Some(30.0));
    }

    #[test]
    fn test_out_of_bounds_ranges_never_index_past_the_end() {
        let data = [10u8, 20, 30];
        let snapshot = MagnitudeSnapshot::Byte(&data);
        assert_eq!(max_over_range(&snapshot, ColumnBinRange::new(1, 99)), Some(30.0));
        assert_eq!(max_over_range(&snapshot, ColumnBinRange::new(3, 4)), None);
        assert_eq!(max_over_range(&MagnitudeSnapshot::Byte(&[]), ColumnBinRange::new(0, 0)), None);
    }

    #[test]
    fn test_max_over_decibel_range() {
        let data = [-90.0f32, -42.5, -60.0, f32::NAN];
        let snapshot = MagnitudeSnapshot::Decibel(&data);
        assert_eq!(max_over_range(&snapshot, ColumnBinRange::new(0, 4)), Some(-42.5));
        assert_eq!(max_over_range(&snapshot, ColumnBinRange::single(2)), Some(-60.0));
    }
}
