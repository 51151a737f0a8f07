//! Time-decayed minimum ROI table
//!
//! Maps "minutes since entry" to "profit fraction required to exit". The
//! default schedule asks for 4% right after entry, 2% after 30 minutes and
//! 1% after an hour.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiStep {
    pub minutes: i64,
    pub profit: f64,
}

/// Breakpoints kept sorted by descending `minutes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct RoiTable {
    steps: Vec<RoiStep>,
}

impl RoiTable {
    /// Steps with the same `minutes` keep the first one given
    pub fn new(steps: impl IntoIterator<Item = RoiStep>) -> Self {
        let mut steps: Vec<RoiStep> = steps.into_iter().collect();
        steps.sort_by(|a, b| b.minutes.cmp(&a.minutes));
        steps.dedup_by_key(|s| s.minutes);
        Self { steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[RoiStep] {
        &self.steps
    }

    /// Profit required by the breakpoint in force after `elapsed_minutes`
    pub fn required_profit(&self, elapsed_minutes: i64) -> Option<f64> {
        self.steps
            .iter()
            .find(|s| s.minutes <= elapsed_minutes)
            .map(|s| s.profit)
    }

    /// First breakpoint, by descending elapsed time, whose time threshold has
    /// passed and whose required profit is met
    pub fn triggered(&self, elapsed_minutes: i64, profit: f64) -> Option<RoiStep> {
        self.steps
            .iter()
            .filter(|s| s.minutes <= elapsed_minutes)
            .find(|s| profit >= s.profit)
            .copied()
    }
}

impl Default for RoiTable {
    fn default() -> Self {
        Self::new([
            RoiStep {
                minutes: 60,
                profit: 0.01,
            },
            RoiStep {
                minutes: 30,
                profit: 0.02,
            },
            RoiStep {
                minutes: 0,
                profit: 0.04,
            },
        ])
    }
}

impl TryFrom<BTreeMap<String, f64>> for RoiTable {
    type Error = ConfigError;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut steps: Vec<RoiStep> = Vec::with_capacity(map.len());
        for (key, profit) in map {
            let minutes: u32 = key
                .trim()
                .parse()
                .map_err(|_| ConfigError::RoiKey(key.clone()))?;
            let minutes = i64::from(minutes);
            // "0" and "00" are different map keys for the same breakpoint
            if steps.iter().any(|s| s.minutes == minutes) {
                return Err(ConfigError::RoiDuplicate(minutes));
            }
            if !profit.is_finite() {
                return Err(ConfigError::Invalid {
                    field: "exits.minimal_roi",
                    reason: format!("profit for {minutes} minutes is not finite"),
                });
            }
            steps.push(RoiStep { minutes, profit });
        }
        Ok(Self::new(steps))
    }
}

impl From<RoiTable> for BTreeMap<String, f64> {
    fn from(table: RoiTable) -> Self {
        table
            .steps
            .into_iter()
            .map(|s| (s.minutes.to_string(), s.profit))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_profit_steps() {
        let table = RoiTable::default();

        assert_eq!(table.required_profit(0), Some(0.04));
        assert_eq!(table.required_profit(29), Some(0.04));
        assert_eq!(table.required_profit(30), Some(0.02));
        assert_eq!(table.required_profit(59), Some(0.02));
        assert_eq!(table.required_profit(60), Some(0.01));
        assert_eq!(table.required_profit(10_000), Some(0.01));
    }

    #[test]
    fn test_negative_elapsed_has_no_breakpoint() {
        let table = RoiTable::default();
        assert_eq!(table.required_profit(-1), None);
        assert!(table.triggered(-1, 1.0).is_none());
    }

    #[test]
    fn test_triggered_after_decay() {
        let table = RoiTable::default();

        // 1.5% is not enough right after entry or at 30 minutes
        assert!(table.triggered(5, 0.015).is_none());
        assert!(table.triggered(45, 0.015).is_none());

        // but it clears the 60 minute breakpoint
        let step = table.triggered(61, 0.015).unwrap();
        assert_eq!(step.minutes, 60);
    }

    #[test]
    fn test_profit_meets_exactly() {
        let table = RoiTable::default();
        let step = table.triggered(30, 0.02).unwrap();
        assert_eq!(step.minutes, 30);
    }

    #[test]
    fn test_non_monotonic_table_uses_first_satisfied_breakpoint() {
        // Later breakpoint demands more profit than an earlier one
        let table = RoiTable::new([
            RoiStep {
                minutes: 0,
                profit: 0.01,
            },
            RoiStep {
                minutes: 60,
                profit: 0.05,
            },
        ]);

        // 60-minute step not met, falls through to the 0-minute step
        let step = table.triggered(90, 0.02).unwrap();
        assert_eq!(step.minutes, 0);
    }

    #[test]
    fn test_from_map() {
        let mut map = BTreeMap::new();
        map.insert("0".to_string(), 0.04);
        map.insert("120".to_string(), 0.0);

        let table = RoiTable::try_from(map).unwrap();
        assert_eq!(table.steps()[0].minutes, 120);
        assert_eq!(table.required_profit(200), Some(0.0));
    }

    #[test]
    fn test_from_map_rejects_non_numeric_key() {
        let mut map = BTreeMap::new();
        map.insert("-5".to_string(), 0.04);

        assert!(matches!(RoiTable::try_from(map), Err(ConfigError::RoiKey(_))));
    }

    #[test]
    fn test_from_map_rejects_duplicate_minutes() {
        let mut map = BTreeMap::new();
        map.insert("0".to_string(), 0.04);
        map.insert("00".to_string(), 0.02);

        assert!(matches!(
            RoiTable::try_from(map),
            Err(ConfigError::RoiDuplicate(0))
        ));
    }

    #[test]
    fn test_empty_table_never_triggers() {
        let table = RoiTable::new([]);
        assert!(table.is_empty());
        assert!(table.triggered(1_000, 10.0).is_none());
    }
}
