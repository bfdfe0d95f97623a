use super::AggregateError;

/// Outcome of one bounded slice of factorization work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A prime factor was found.
    Factor(i64),
    /// The work budget ran out before a factor was found.
    Pending,
    /// The remaining value reached 1; no more factors.
    Done,
}

/// Streaming trial-division prime factorization.
///
/// Factors come out in non-decreasing order and their product is the input.
/// Work is handed out in bounded slices through [`PrimeFactors::advance`] so
/// the driving task can yield between slices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimeFactors {
    remaining: i64,
    divisor: i64,
}

impl PrimeFactors {
    /// Start factoring `number`.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::NonPositive`] for `number <= 0`.
    pub const fn new(number: i64) -> Result<Self, AggregateError> {
        if number <= 0 {
            return Err(AggregateError::NonPositive(number));
        }
        Ok(Self {
            remaining: number,
            divisor: 2,
        })
    }

    /// Value still to be factored.
    #[must_use]
    pub const fn remaining(&self) -> i64 {
        self.remaining
    }

    /// Run at most `budget` trial divisions (at least one).
    pub fn advance(&mut self, budget: u32) -> Step {
        for _ in 0..budget.max(1) {
            if self.remaining == 1 {
                return Step::Done;
            }
            if self.remaining % self.divisor == 0 {
                self.remaining /= self.divisor;
                return Step::Factor(self.divisor);
            }
            self.divisor += 1;
        }
        if self.remaining == 1 {
            Step::Done
        } else {
            Step::Pending
        }
    }
}

impl Iterator for PrimeFactors {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        loop {
            match self.advance(u32::MAX) {
                Step::Factor(factor) => return Some(factor),
                Step::Done => return None,
                Step::Pending => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn is_prime(n: i64) -> bool {
        n >= 2 && (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
    }

    #[test]
    fn factors_sample_number() {
        let factors: Vec<i64> = PrimeFactors::new(124_538_982).unwrap().collect();
        assert_eq!(factors, vec![2, 3, 617, 33_641]);
    }

    #[test]
    fn factors_120() {
        let factors: Vec<i64> = PrimeFactors::new(120).unwrap().collect();
        assert_eq!(factors, vec![2, 2, 2, 3, 5]);
    }

    #[test]
    fn one_has_no_factors() {
        assert_eq!(PrimeFactors::new(1).unwrap().next(), None);
    }

    #[test]
    fn non_positive_input_is_rejected() {
        assert_eq!(PrimeFactors::new(0), Err(AggregateError::NonPositive(0)));
        assert_eq!(PrimeFactors::new(-7), Err(AggregateError::NonPositive(-7)));
    }

    #[test]
    fn small_budget_reports_pending() {
        let mut factors = PrimeFactors::new(33_641).unwrap();
        assert_eq!(factors.advance(10), Step::Pending);
        let mut steps = 0;
        let factor = loop {
            steps += 1;
            match factors.advance(10) {
                Step::Factor(f) => break f,
                Step::Pending => {}
                Step::Done => panic!("prime yielded no factor"),
            }
        };
        assert_eq!(factor, 33_641);
        assert!(steps > 1);
        assert_eq!(factors.advance(10), Step::Done);
    }

    proptest! {
        #[test]
        fn product_of_primes_in_order(n in 2i64..200_000) {
            let factors: Vec<i64> = PrimeFactors::new(n).unwrap().collect();
            prop_assert_eq!(factors.iter().product::<i64>(), n);
            prop_assert!(factors.iter().all(|&f| is_prime(f)));
            prop_assert!(factors.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
