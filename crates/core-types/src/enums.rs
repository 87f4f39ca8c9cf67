use serde::{Deserialize, Serialize};
use std::fmt;

/// Sampling frequency requested from the time-series provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Monthly,
}

impl Frequency {
    /// The single-letter code the provider expects (`D` or `M`).
    pub fn code(&self) -> &'static str {
        match self {
            Frequency::Daily => "D",
            Frequency::Monthly => "M",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => f.write_str("daily"),
            Frequency::Monthly => f.write_str("monthly"),
        }
    }
}

/// Which of an entity's identifiers a metric is queried against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickerVariant {
    Primary,
    Level,
    Estimate,
}

impl fmt::Display for TickerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickerVariant::Primary => f.write_str("primary"),
            TickerVariant::Level => f.write_str("level"),
            TickerVariant::Estimate => f.write_str("estimate"),
        }
    }
}

/// Reporting category. The declaration order is the order of the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Performance,
    Technicals,
    Cyclicality,
    Earnings,
    Valuation,
    Operations,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Performance,
        Category::Technicals,
        Category::Cyclicality,
        Category::Earnings,
        Category::Valuation,
        Category::Operations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Performance => "Performance",
            Category::Technicals => "Technicals",
            Category::Cyclicality => "Cyclicality",
            Category::Earnings => "Earnings",
            Category::Valuation => "Valuation",
            Category::Operations => "Operations",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a metric relative to its historical reference value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// `Up` only when `current` is strictly greater than `reference`.
    pub fn between<T: PartialOrd>(current: &T, reference: &T) -> Self {
        if current > reference {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

/// How a composite treats missing inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeNullPolicy {
    /// Average the inputs that are present; null only when all inputs are null.
    #[default]
    SkipNull,
    /// Any null input makes the composite null.
    NullIfAnyNull,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_requires_strict_increase() {
        assert_eq!(Direction::between(&2, &1), Direction::Up);
        assert_eq!(Direction::between(&1, &1), Direction::Down);
        assert_eq!(Direction::between(&0, &1), Direction::Down);
    }

    #[test]
    fn categories_are_declared_in_report_order() {
        let mut sorted = Category::ALL;
        sorted.sort();
        assert_eq!(sorted, Category::ALL);
        assert_eq!(Category::ALL[0].as_str(), "Performance");
        assert_eq!(Category::ALL[5].as_str(), "Operations");
    }

    #[test]
    fn null_policy_deserializes_from_snake_case() {
        let policy: CompositeNullPolicy = serde_json::from_str("\"null_if_any_null\"").unwrap();
        assert_eq!(policy, CompositeNullPolicy::NullIfAnyNull);
        assert_eq!(CompositeNullPolicy::default(), CompositeNullPolicy::SkipNull);
    }
}
