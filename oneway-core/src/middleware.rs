//! Mutation middleware and logging
//!
//! Middleware hooks run inside the store's mutation lock, so they observe
//! mutations in exactly the order they were applied.
//!
//! # Example
//!
//! ```ignore
//! use oneway_core::{LogFilter, LoggingMiddleware, RecordingMiddleware, Store};
//!
//! // Log everything except Tick, and keep the last 50 records around
//! let recording = RecordingMiddleware::new(50);
//! let log = recording.log();
//!
//! let store = Store::builder(Lottery, LotteryState::default())
//!     .middleware(LoggingMiddleware::new(LogFilter::default()))
//!     .middleware(recording)
//!     .build();
//!
//! for record in log.recent(10) {
//!     println!("#{} {} changed={}", record.sequence, record.name, record.changed);
//! }
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// What kind of mutation was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// An action reduced on the action worker
    Action,
    /// A single change folded on the caller's thread
    Change,
    /// A batch of changes folded as one mutation
    Batch {
        /// Number of changes in the batch
        len: usize,
    },
}

/// Summary of one applied mutation, handed to [`Middleware::after`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// Position of this mutation in the store's serialized order (from 0)
    pub sequence: u64,
    /// Mutation kind
    pub kind: MutationKind,
    /// Action or change name; `"Batch"` for batches
    pub name: &'static str,
    /// Whether a new state was committed
    pub changed: bool,
    /// Name of the emitted output, if any
    pub output: Option<&'static str>,
    /// Number of effects handed to the agent
    pub effects: usize,
}

/// Middleware trait for intercepting mutations
///
/// Implement this trait to add logging, persistence, or other
/// cross-cutting concerns to a store.
pub trait Middleware: Send + 'static {
    /// Called before the reducer or fold runs
    fn before(&mut self, kind: MutationKind, name: &'static str);

    /// Called after the mutation is committed (or found to be a no-op)
    fn after(&mut self, record: &MutationRecord);
}

/// A no-op middleware that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl Middleware for NoopMiddleware {
    fn before(&mut self, _kind: MutationKind, _name: &'static str) {}
    fn after(&mut self, _record: &MutationRecord) {}
}

/// Include/exclude filter for mutation logging, using glob patterns.
///
/// Patterns support:
/// - `*` matches any sequence of characters
/// - `?` matches any single character
/// - Literal text matches exactly
///
/// ```
/// use oneway_core::LogFilter;
///
/// let filter = LogFilter::new(Some("Play*,Ban"), None);
/// assert!(filter.should_log("PlayDidResolve"));
/// assert!(filter.should_log("Ban"));
/// assert!(!filter.should_log("Unban"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogFilter {
    /// If non-empty, only log mutations matching these patterns
    pub include: Vec<String>,
    /// Exclude mutations matching these patterns (applied after include)
    pub exclude: Vec<String>,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            // High-frequency noise
            exclude: vec!["Tick".to_string()],
        }
    }
}

impl LogFilter {
    /// Create a filter from comma-separated pattern strings
    ///
    /// `None` for `exclude` keeps the default excludes.
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        let include = include.map(split_patterns).unwrap_or_default();
        let exclude = exclude
            .map(split_patterns)
            .unwrap_or_else(|| Self::default().exclude);
        Self { include, exclude }
    }

    /// Check if a mutation name passes the filter
    pub fn should_log(&self, name: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|p| glob_match(p, name)) {
            return false;
        }
        !self.exclude.iter().any(|p| glob_match(p, name))
    }
}

fn split_patterns(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Middleware that logs mutations through `tracing`
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    filter: LogFilter,
    label: Option<String>,
}

impl LoggingMiddleware {
    /// Create a logging middleware with the given filter
    pub fn new(filter: LogFilter) -> Self {
        Self {
            filter,
            label: None,
        }
    }

    /// Attach a store label to every log line
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the filter
    pub fn filter(&self) -> &LogFilter {
        &self.filter
    }
}

impl Middleware for LoggingMiddleware {
    fn before(&mut self, kind: MutationKind, name: &'static str) {
        if self.filter.should_log(name) {
            tracing::trace!(
                store = self.label.as_deref().unwrap_or(""),
                ?kind,
                mutation = name,
                "Applying mutation"
            );
        }
    }

    fn after(&mut self, record: &MutationRecord) {
        if self.filter.should_log(record.name) {
            tracing::debug!(
                store = self.label.as_deref().unwrap_or(""),
                sequence = record.sequence,
                kind = ?record.kind,
                mutation = record.name,
                changed = record.changed,
                output = record.output.unwrap_or(""),
                effects = record.effects,
                "Mutation applied"
            );
        }
    }
}

/// Compose multiple middleware into a single middleware
#[derive(Default)]
pub struct ComposedMiddleware {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl std::fmt::Debug for ComposedMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedMiddleware")
            .field("middlewares_count", &self.middlewares.len())
            .finish()
    }
}

impl ComposedMiddleware {
    /// Create a new composed middleware
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a middleware to the composition
    pub fn add<M: Middleware>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }

    /// Number of composed middlewares
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Whether nothing has been composed
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

impl Middleware for ComposedMiddleware {
    fn before(&mut self, kind: MutationKind, name: &'static str) {
        for middleware in &mut self.middlewares {
            middleware.before(kind, name);
        }
    }

    fn after(&mut self, record: &MutationRecord) {
        // Reverse order for proper nesting
        for middleware in self.middlewares.iter_mut().rev() {
            middleware.after(record);
        }
    }
}

/// Shared, bounded log of recent mutation records
#[derive(Debug, Clone)]
pub struct MutationLog {
    inner: Arc<Mutex<VecDeque<MutationRecord>>>,
    capacity: usize,
}

impl MutationLog {
    fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn push(&self, record: MutationRecord) {
        let mut entries = self.inner.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(record);
    }

    /// All stored records, oldest first
    pub fn entries(&self) -> Vec<MutationRecord> {
        self.inner.lock().iter().cloned().collect()
    }

    /// The most recent `count` records, newest first
    pub fn recent(&self, count: usize) -> Vec<MutationRecord> {
        self.inner.lock().iter().rev().take(count).cloned().collect()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no record is stored
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Middleware that keeps the last N mutation records in memory
#[derive(Debug, Clone)]
pub struct RecordingMiddleware {
    log: MutationLog,
}

impl RecordingMiddleware {
    /// Create a recorder keeping at most `capacity` records
    pub fn new(capacity: usize) -> Self {
        Self {
            log: MutationLog::new(capacity.max(1)),
        }
    }

    /// Handle to the recorded log; stays valid after the middleware moves into a store
    pub fn log(&self) -> MutationLog {
        self.log.clone()
    }
}

impl Middleware for RecordingMiddleware {
    fn before(&mut self, _kind: MutationKind, _name: &'static str) {}

    fn after(&mut self, record: &MutationRecord) {
        self.log.push(record.clone());
    }
}

/// Simple glob pattern matching (`*` and `?`)
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let mut pi = 0;
    let mut ti = 0;
    let mut star_pi = None;
    let mut star_ti = 0;

    while ti < text.len() {
        if pi < pattern.len() && (pattern[pi] == '?' || pattern[pi] == text[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < pattern.len() && pattern[pi] == '*' {
            star_pi = Some(pi);
            star_ti = ti;
            pi += 1;
        } else if let Some(spi) = star_pi {
            pi = spi + 1;
            star_ti += 1;
            ti = star_ti;
        } else {
            return false;
        }
    }

    while pi < pattern.len() && pattern[pi] == '*' {
        pi += 1;
    }

    pi == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sequence: u64, name: &'static str) -> MutationRecord {
        MutationRecord {
            sequence,
            kind: MutationKind::Action,
            name,
            changed: true,
            output: None,
            effects: 0,
        }
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("Tick", "Tick"));
        assert!(!glob_match("Tick", "TickTock"));
        assert!(glob_match("Play*", "PlayDidResolve"));
        assert!(glob_match("*Did*", "PlayDidResolve"));
        assert!(glob_match("Ba?", "Ban"));
        assert!(!glob_match("Ba?", "Bank"));
        assert!(glob_match("*", ""));
    }

    #[test]
    fn test_filter_default_excludes_tick() {
        let filter = LogFilter::default();
        assert!(filter.should_log("Play"));
        assert!(!filter.should_log("Tick"));
    }

    #[test]
    fn test_filter_include_then_exclude() {
        let filter = LogFilter::new(Some("Play*"), Some("PlayDid*"));
        assert!(filter.should_log("Play"));
        assert!(!filter.should_log("PlayDidResolve"));
        assert!(!filter.should_log("Ban"));
    }

    #[derive(Clone, Default)]
    struct Trace(Arc<Mutex<Vec<String>>>);

    struct Tagged(&'static str, Trace);

    impl Middleware for Tagged {
        fn before(&mut self, _kind: MutationKind, name: &'static str) {
            self.1.0.lock().push(format!("{}:before:{}", self.0, name));
        }

        fn after(&mut self, record: &MutationRecord) {
            self.1.0.lock().push(format!("{}:after:{}", self.0, record.name));
        }
    }

    #[test]
    fn test_composed_nests_after_in_reverse() {
        let trace = Trace::default();
        let mut composed = ComposedMiddleware::new();
        composed.add(Tagged("a", trace.clone()));
        composed.add(Tagged("b", trace.clone()));
        assert_eq!(composed.len(), 2);

        composed.before(MutationKind::Change, "Grant");
        composed.after(&record(0, "Grant"));

        assert_eq!(
            *trace.0.lock(),
            vec!["a:before:Grant", "b:before:Grant", "b:after:Grant", "a:after:Grant"]
        );
    }

    #[test]
    fn test_recording_is_bounded() {
        let mut recording = RecordingMiddleware::new(2);
        let log = recording.log();

        recording.after(&record(0, "One"));
        recording.after(&record(1, "Two"));
        recording.after(&record(2, "Three"));

        assert_eq!(log.len(), 2);
        let names: Vec<_> = log.entries().iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Two", "Three"]);
        assert_eq!(log.recent(1)[0].name, "Three");
    }
}
