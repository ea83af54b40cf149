//! Ordered rule tables.
//!
//! Threshold rules (weather sub-scores, demand level, risk level, price
//! recommendation) are expressed as `(predicate, value)` rows evaluated top to
//! bottom. The first matching row wins; the table's fallback applies otherwise.
//! Most tables read a single number; a table may take any `Copy` input, e.g.
//! a `(base, optimized)` price pair.

/// A single row of a rule table.
#[derive(Debug, Clone, Copy)]
pub struct Tier<T: Copy, I: Copy = f64> {
    pub predicate: fn(I) -> bool,
    pub value: T,
}

/// An ordered rule table with a fallback value.
#[derive(Debug, Clone, Copy)]
pub struct TierTable<T: Copy + 'static, I: Copy + 'static = f64> {
    pub tiers: &'static [Tier<T, I>],
    pub fallback: T,
}

impl<T: Copy + 'static, I: Copy + 'static> TierTable<T, I> {
    pub const fn new(tiers: &'static [Tier<T, I>], fallback: T) -> Self {
        Self { tiers, fallback }
    }

    /// Returns the value of the first tier whose predicate accepts `input`.
    /// NaN inputs fail every comparison and land on the fallback.
    pub fn evaluate(&self, input: I) -> T {
        self.tiers
            .iter()
            .find(|tier| (tier.predicate)(input))
            .map(|tier| tier.value)
            .unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRADE_TIERS: &[Tier<char>] = &[
        Tier {
            predicate: |x| x >= 90.0,
            value: 'A',
        },
        Tier {
            predicate: |x| x >= 80.0,
            value: 'B',
        },
        Tier {
            predicate: |x| x >= 70.0,
            value: 'C',
        },
    ];

    const GRADES: TierTable<char> = TierTable::new(GRADE_TIERS, 'F');

    #[test]
    fn test_first_match_wins() {
        assert_eq!(GRADES.evaluate(95.0), 'A');
        assert_eq!(GRADES.evaluate(90.0), 'A');
        assert_eq!(GRADES.evaluate(85.0), 'B');
        assert_eq!(GRADES.evaluate(70.0), 'C');
    }

    const ORDER_TIERS: &[Tier<&str, (i32, i32)>] = &[
        Tier {
            predicate: |(a, b)| a > b,
            value: "greater",
        },
        Tier {
            predicate: |(a, b)| a < b,
            value: "less",
        },
    ];

    #[test]
    fn test_pair_input() {
        let table = TierTable::new(ORDER_TIERS, "equal");
        assert_eq!(table.evaluate((3, 1)), "greater");
        assert_eq!(table.evaluate((1, 3)), "less");
        assert_eq!(table.evaluate((2, 2)), "equal");
    }

    #[test]
    fn test_fallback() {
        assert_eq!(GRADES.evaluate(10.0), 'F');
        assert_eq!(GRADES.evaluate(f64::NAN), 'F');
    }
}
