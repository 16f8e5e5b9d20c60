//! Recent-operation ring buffer with glob filtering
//!
//! The fuzzer records every step it executes here. When a run fails the
//! newest entries are printed, which is usually enough to see what led up to
//! the failure without opening the dump file.
//!
//! ```ignore
//! let filter = OperationLogFilter::new(Some("Add*"), Some("*Tab"));
//! let mut log = OperationLog::new(OperationLogConfig::new(50, filter));
//!
//! log.record(&operation, StepOutcome::Executed);
//! for entry in log.recent(10) {
//!     println!("#{} {}", entry.sequence, entry.summary);
//! }
//! ```

use std::collections::VecDeque;
use std::time::Instant;

use crate::operation::{Operation, StepOutcome};

/// Which operation kinds get logged, by kind name.
///
/// Patterns use `*` (any run of characters) and `?` (one character). An
/// empty include list admits every kind; excludes apply afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationLogFilter {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

fn split_patterns(patterns: Option<&str>) -> Vec<String> {
    patterns
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

impl OperationLogFilter {
    /// Build from comma-separated pattern lists
    ///
    /// ```
    /// use dock_fuzz_core::oplog::OperationLogFilter;
    ///
    /// let filter = OperationLogFilter::new(Some("Add*, *Layout"), Some("SaveLayout"));
    /// assert!(filter.matches("AddDockWidgetAsTab"));
    /// assert!(filter.matches("RestoreLayout"));
    /// assert!(!filter.matches("SaveLayout"));
    /// assert!(!filter.matches("ShowViaDockWidgetApi"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            include: split_patterns(include),
            exclude: split_patterns(exclude),
        }
    }

    /// Whether an operation of this kind name passes
    pub fn matches(&self, name: &str) -> bool {
        let included =
            self.include.is_empty() || self.include.iter().any(|p| glob_match(p, name));
        included && !self.exclude.iter().any(|p| glob_match(p, name))
    }
}

/// One logged step
#[derive(Debug, Clone)]
pub struct OperationLogEntry {
    pub name: &'static str,
    /// `type=<Kind>;description=<text>`
    pub summary: String,
    pub timestamp: Instant,
    pub sequence: u64,
    pub outcome: StepOutcome,
}

impl OperationLogEntry {
    /// Time since the entry was recorded, as `150ms` or `2.3s`
    pub fn elapsed_display(&self) -> String {
        let elapsed = self.timestamp.elapsed();
        if elapsed.as_secs() == 0 {
            format!("{}ms", elapsed.as_millis())
        } else {
            format!("{:.1}s", elapsed.as_secs_f64())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationLogConfig {
    /// Entries kept before the oldest is dropped
    pub capacity: usize,
    pub filter: OperationLogFilter,
}

impl Default for OperationLogConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            filter: OperationLogFilter::default(),
        }
    }
}

impl OperationLogConfig {
    pub fn new(capacity: usize, filter: OperationLogFilter) -> Self {
        Self { capacity, filter }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }
}

/// Bounded log of the most recent operations
#[derive(Debug, Clone, Default)]
pub struct OperationLog {
    entries: VecDeque<OperationLogEntry>,
    config: OperationLogConfig,
    next_sequence: u64,
}

impl OperationLog {
    pub fn new(config: OperationLogConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.capacity),
            config,
            next_sequence: 0,
        }
    }

    /// Record a step if the filter admits its kind.
    ///
    /// Sequence numbers count every admitted step, including evicted ones.
    pub fn record(&mut self, operation: &Operation, outcome: StepOutcome) -> Option<&OperationLogEntry> {
        let name = operation.name();
        if !self.config.filter.matches(name) {
            return None;
        }

        let entry = OperationLogEntry {
            name,
            summary: operation.summary(),
            timestamp: Instant::now(),
            sequence: self.next_sequence,
            outcome,
        };
        self.next_sequence += 1;

        tracing::debug!(
            sequence = entry.sequence,
            operation = name,
            outcome = ?outcome,
            summary = %entry.summary,
            "operation"
        );

        if self.config.capacity == 0 {
            return None;
        }
        while self.entries.len() >= self.config.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.entries.back()
    }

    /// Oldest first
    pub fn entries(&self) -> impl Iterator<Item = &OperationLogEntry> {
        self.entries.iter()
    }

    /// Newest first, at most `count`
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &OperationLogEntry> {
        self.entries.iter().rev().take(count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn config(&self) -> &OperationLogConfig {
        &self.config
    }
}

/// Glob match supporting `*` and `?`
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Position of the last `*` and the text index it is currently absorbing up to
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(&'*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, absorbed)) => {
                    backtrack = Some((star, absorbed + 1));
                    p = star + 1;
                    t = absorbed + 1;
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("SaveLayout", "SaveLayout"));
        assert!(!glob_match("SaveLayout", "RestoreLayout"));
        assert!(glob_match("*Layout", "RestoreLayout"));
        assert!(glob_match("Add*", "AddDockWidget"));
        assert!(glob_match("Add*", "Add"));
        assert!(glob_match("*Via*Api", "HideViaDockWidgetApi"));
        assert!(!glob_match("Add*", "ReAdd"));
        assert!(glob_match("?ideViaDockWidgetApi", "HideViaDockWidgetApi"));
        assert!(!glob_match("?", ""));
        assert!(glob_match("*", ""));
    }

    #[test]
    fn test_filter_include_and_exclude() {
        let filter = OperationLogFilter::new(Some("*ViaDockWidgetApi"), Some("Show*"));
        assert!(filter.matches("CloseViaDockWidgetApi"));
        assert!(filter.matches("HideViaDockWidgetApi"));
        assert!(!filter.matches("ShowViaDockWidgetApi"));
        assert!(!filter.matches("AddDockWidget"));
    }

    #[test]
    fn test_filter_default_admits_everything() {
        let filter = OperationLogFilter::new(None, Some(" , "));
        assert!(filter.exclude.is_empty());
        assert!(filter.matches("RestoreLayout"));
    }

    #[test]
    fn test_log_capacity_and_sequence() {
        let mut log = OperationLog::new(OperationLogConfig::with_capacity(2));
        for name in ["A", "B", "C"] {
            log.record(&Operation::close(name), StepOutcome::Executed);
        }

        assert_eq!(log.len(), 2);
        let sequences: Vec<_> = log.entries().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
        assert_eq!(log.recent(1).next().unwrap().sequence, 2);
    }

    #[test]
    fn test_log_filtering() {
        let config =
            OperationLogConfig::new(10, OperationLogFilter::new(None, Some("*Layout")));
        let mut log = OperationLog::new(config);

        assert!(log
            .record(&Operation::save_layout(), StepOutcome::Executed)
            .is_none());
        let entry = log
            .record(&Operation::show("A"), StepOutcome::Skipped)
            .unwrap();
        assert_eq!(entry.name, "ShowViaDockWidgetApi");
        assert_eq!(entry.outcome, StepOutcome::Skipped);
        assert_eq!(entry.summary, "type=ShowViaDockWidgetApi;description=");
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_elapsed_display() {
        let mut log = OperationLog::default();
        let entry = log
            .record(&Operation::close("A"), StepOutcome::Executed)
            .unwrap();
        assert!(entry.elapsed_display().ends_with("ms"));
    }
}
