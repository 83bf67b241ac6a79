//! Status and severity summaries with their aggregation rules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use verdict_catalog::Severity;

use crate::status::Status;

/// Counts of results per status under a node.
///
/// `Empty` results are membership markers, not outcomes, and are never
/// counted here.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckSummary {
    pub alarm: u32,
    pub ok: u32,
    pub info: u32,
    pub skip: u32,
    pub error: u32,
}

impl CheckSummary {
    /// Count one result status.
    pub fn record(&mut self, status: Status) {
        match status {
            Status::Alarm => self.alarm += 1,
            Status::Ok => self.ok += 1,
            Status::Info => self.info += 1,
            Status::Skip => self.skip += 1,
            Status::Error => self.error += 1,
            Status::Empty => {}
        }
    }

    /// Field-wise addition of a child summary.
    pub fn merge(&mut self, other: &CheckSummary) {
        self.alarm += other.alarm;
        self.ok += other.ok;
        self.info += other.info;
        self.skip += other.skip;
        self.error += other.error;
    }

    /// Total counted results.
    pub fn total(&self) -> u32 {
        self.alarm + self.ok + self.info + self.skip + self.error
    }

    /// Whether the subtree passed: no alarms and no errors.
    pub fn passed(&self) -> bool {
        self.alarm == 0 && self.error == 0
    }
}

/// Alarm counts keyed by severity.
///
/// Only severities that actually occurred among alarms appear; the map is
/// empty when no control declared a severity or no alarms fired.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeveritySummary {
    #[serde(flatten)]
    counts: BTreeMap<Severity, u32>,
}

impl SeveritySummary {
    /// Count one alarm of the given severity.
    pub fn record_alarm(&mut self, severity: Severity) {
        *self.counts.entry(severity).or_insert(0) += 1;
    }

    /// Field-wise addition of a child severity summary.
    pub fn merge(&mut self, other: &SeveritySummary) {
        for (severity, count) in &other.counts {
            *self.counts.entry(*severity).or_insert(0) += count;
        }
    }

    /// Alarm count for one severity.
    pub fn get(&self, severity: Severity) -> u32 {
        self.counts.get(&severity).copied().unwrap_or(0)
    }

    /// Severity/count pairs in ascending severity order.
    pub fn counts(&self) -> impl Iterator<Item = (Severity, u32)> + '_ {
        self.counts.iter().map(|(s, c)| (*s, *c))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_skips_empty() {
        let mut summary = CheckSummary::default();
        summary.record(Status::Alarm);
        summary.record(Status::Ok);
        summary.record(Status::Empty);
        assert_eq!(summary.alarm, 1);
        assert_eq!(summary.ok, 1);
        assert_eq!(summary.total(), 2);
    }

    #[test]
    fn test_merge_is_field_wise() {
        let mut a = CheckSummary {
            alarm: 1,
            ok: 2,
            info: 0,
            skip: 1,
            error: 0,
        };
        let b = CheckSummary {
            alarm: 2,
            ok: 0,
            info: 3,
            skip: 0,
            error: 1,
        };
        a.merge(&b);
        assert_eq!(
            a,
            CheckSummary {
                alarm: 3,
                ok: 2,
                info: 3,
                skip: 1,
                error: 1,
            }
        );
    }

    #[test]
    fn test_severity_summary_merge() {
        let mut a = SeveritySummary::default();
        a.record_alarm(Severity::High);
        let mut b = SeveritySummary::default();
        b.record_alarm(Severity::High);
        b.record_alarm(Severity::Critical);

        a.merge(&b);
        assert_eq!(a.get(Severity::High), 2);
        assert_eq!(a.get(Severity::Critical), 1);
        assert_eq!(a.get(Severity::Low), 0);
    }

    #[test]
    fn test_no_phantom_entries() {
        let summary = SeveritySummary::default();
        assert!(summary.is_empty());
        assert_eq!(summary.counts().count(), 0);
    }
}
