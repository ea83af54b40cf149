use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Code assigned to categories absent from the fitted table.
pub const UNSEEN_CATEGORY: f64 = -1.0;

/// Maps category labels to integer codes.
///
/// Codes are the positions of the labels in the sorted set of values seen at
/// fit time. Lookups of unseen labels return [`UNSEEN_CATEGORY`] rather than failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    classes: Vec<String>,
}

impl CategoryEncoder {
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let classes: BTreeSet<&str> = values.into_iter().collect();
        Self {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn encode(&self, value: &str) -> f64 {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .map(|idx| idx as f64)
            .unwrap_or(UNSEEN_CATEGORY)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_sorted_order() {
        let encoder = CategoryEncoder::fit(["summer", "winter", "autumn", "summer"]);
        assert_eq!(encoder.classes(), &["autumn", "summer", "winter"]);
        assert_eq!(encoder.encode("autumn"), 0.0);
        assert_eq!(encoder.encode("summer"), 1.0);
        assert_eq!(encoder.encode("winter"), 2.0);
    }

    #[test]
    fn test_unseen_category_is_minus_one() {
        let encoder = CategoryEncoder::fit(["summer"]);
        assert_eq!(encoder.encode("spring"), UNSEEN_CATEGORY);
        assert_eq!(CategoryEncoder::default().encode("summer"), UNSEEN_CATEGORY);
    }
}
