use crate::{Value, printable_values, truncate_long};
use std::{
    collections::HashMap,
    fmt::Write,
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

/// Opaque record of one physical execution, returned by
/// [`Profiler::begin_execution`] and handed back to
/// [`Profiler::end_execution`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileToken {
    id: u64,
    started: Instant,
}

impl ProfileToken {
    pub fn start(id: u64) -> Self {
        Self {
            id,
            started: Instant::now(),
        }
    }
    pub fn id(&self) -> u64 {
        self.id
    }
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Observer of the executions of a [`Database`](crate::Database).
///
/// It is only called when a profiler is attached and profiling was started.
pub trait Profiler: Send + Sync {
    fn begin_execution(&self, db_name: &str, sql: &str, params: &[Value]) -> ProfileToken;
    fn end_execution(&self, token: ProfileToken);
    fn dump_execution_summary(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionStats {
    pub count: u64,
    pub total: Duration,
    pub max: Duration,
}

/// Profiler aggregating count, total and maximum duration per SQL text.
#[derive(Debug, Default)]
pub struct ExecutionProfiler {
    next_id: AtomicU64,
    running: Mutex<HashMap<u64, String>>,
    stats: Mutex<HashMap<String, ExecutionStats>>,
}

impl ExecutionProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self, sql: &str) -> Option<ExecutionStats> {
        self.stats
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(sql)
            .copied()
    }

    /// Executions begun but not ended yet.
    pub fn running(&self) -> usize {
        self.running.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn reset(&self) {
        self.stats.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Profiler for ExecutionProfiler {
    fn begin_execution(&self, db_name: &str, sql: &str, params: &[Value]) -> ProfileToken {
        let token = ProfileToken::start(self.next_id.fetch_add(1, Ordering::Relaxed));
        log::trace!(
            "[{}] #{} {} [{}]",
            db_name,
            token.id,
            truncate_long!(sql),
            printable_values(params)
        );
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(token.id, sql.to_string());
        token
    }

    fn end_execution(&self, token: ProfileToken) {
        let elapsed = token.elapsed();
        let Some(sql) = self
            .running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&token.id)
        else {
            log::warn!("Execution #{} was not begun by this profiler", token.id);
            return;
        };
        log::trace!("#{} took {:?}", token.id, elapsed);
        let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        let entry = stats.entry(sql).or_default();
        entry.count += 1;
        entry.total += elapsed;
        entry.max = entry.max.max(elapsed);
    }

    fn dump_execution_summary(&self) -> String {
        let stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = stats.iter().collect::<Vec<_>>();
        entries.sort_by(|a, b| b.1.total.cmp(&a.1.total).then_with(|| a.0.cmp(b.0)));
        let mut out = String::new();
        for (sql, stat) in entries {
            let _ = writeln!(
                out,
                "{:>6} {:>12.3?} {:>12.3?}  {}",
                stat.count,
                stat.total,
                stat.max,
                truncate_long!(sql)
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_per_sql_text() {
        let profiler = ExecutionProfiler::new();
        for _ in 0..3 {
            let token = profiler.begin_execution("main", "SELECT 1", &[]);
            profiler.end_execution(token);
        }
        let token = profiler.begin_execution("main", "SELECT 2", &[Value::Int32(Some(2))]);
        assert_eq!(profiler.running(), 1);
        profiler.end_execution(token);
        assert_eq!(profiler.running(), 0);
        assert_eq!(profiler.stats("SELECT 1").unwrap().count, 3);
        assert_eq!(profiler.stats("SELECT 2").unwrap().count, 1);
        assert!(profiler.stats("SELECT 3").is_none());
        let stats = profiler.stats("SELECT 1").unwrap();
        assert!(stats.max <= stats.total);
    }

    #[test]
    fn summary_lists_every_statement() {
        let profiler = ExecutionProfiler::new();
        let first = profiler.begin_execution("main", "SELECT a FROM t", &[]);
        let second = profiler.begin_execution("main", "SELECT b FROM t", &[]);
        profiler.end_execution(second);
        profiler.end_execution(first);
        let summary = profiler.dump_execution_summary();
        assert_eq!(summary.lines().count(), 2);
        assert!(summary.contains("SELECT a FROM t"));
        assert!(summary.contains("SELECT b FROM t"));
        profiler.reset();
        assert!(profiler.dump_execution_summary().is_empty());
    }

    #[test]
    fn unknown_token_is_ignored() {
        let profiler = ExecutionProfiler::new();
        profiler.end_execution(ProfileToken::start(42));
        assert!(profiler.dump_execution_summary().is_empty());
    }
}
