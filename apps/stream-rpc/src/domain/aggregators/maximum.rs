/// Running maximum that reports only strict increases.
///
/// The current maximum starts at the sentinel `0`, so a sequence made only of
/// non-positive values emits nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningMaximum {
    current: i32,
}

impl RunningMaximum {
    /// Aggregator positioned at the sentinel.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: 0 }
    }

    /// Current maximum.
    #[must_use]
    pub const fn current(&self) -> i32 {
        self.current
    }

    /// Observe one item; returns the new maximum when it strictly increased.
    pub fn observe(&mut self, value: i32) -> Option<i32> {
        if value > self.current {
            self.current = value;
            Some(value)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn emits_only_new_maxima() {
        let mut max = RunningMaximum::new();
        let emitted: Vec<i32> = [4, 7, 2, 19, 4, 6, 32]
            .into_iter()
            .filter_map(|v| max.observe(v))
            .collect();
        assert_eq!(emitted, vec![4, 7, 19, 32]);
    }

    #[test]
    fn ties_emit_nothing() {
        let mut max = RunningMaximum::new();
        assert_eq!(max.observe(5), Some(5));
        assert_eq!(max.observe(5), None);
    }

    #[test]
    fn non_positive_values_stay_below_sentinel() {
        let mut max = RunningMaximum::new();
        assert_eq!(max.observe(-3), None);
        assert_eq!(max.observe(0), None);
        assert_eq!(max.current(), 0);
    }

    proptest! {
        #[test]
        fn output_is_strictly_increasing(values in prop::collection::vec(any::<i32>(), 0..100)) {
            let mut max = RunningMaximum::new();
            let emitted: Vec<i32> = values.iter().filter_map(|&v| max.observe(v)).collect();

            prop_assert!(emitted.windows(2).all(|w| w[0] < w[1]));

            let highest = values.iter().copied().max().unwrap_or(0);
            if highest > 0 {
                prop_assert_eq!(emitted.last().copied(), Some(highest));
            } else {
                prop_assert!(emitted.is_empty());
            }
        }
    }
}
