use std::ops::Range;

/// Splits `0..total` into `workers` contiguous ranges of `ceil(total / workers)`
/// items; trailing ranges may be short or empty.
pub fn partition(total: usize, workers: usize) -> Vec<Range<usize>> {
    if workers == 0 {
        return Vec::new();
    }
    let chunk = total.div_ceil(workers);
    (0..workers)
        .map(|i| (i * chunk).min(total)..((i + 1) * chunk).min(total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_contiguous_and_complete() {
        for total in 0..40 {
            for workers in 1..9 {
                let ranges = partition(total, workers);
                assert_eq!(ranges.len(), workers);
                let mut next = 0;
                for range in &ranges {
                    assert_eq!(range.start, next);
                    next = range.end;
                }
                assert_eq!(next, total);
            }
        }
    }

    #[test]
    fn chunk_is_rounded_up() {
        assert_eq!(partition(10, 3), vec![0..4, 4..8, 8..10]);
        assert_eq!(partition(5, 4), vec![0..2, 2..4, 4..5, 5..5]);
        assert_eq!(partition(2, 1), vec![0..2]);
    }
}
