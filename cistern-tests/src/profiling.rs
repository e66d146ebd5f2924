use cistern_core::{Database, ExecutionProfiler, Profiler};
use std::sync::Arc;

pub fn profiling(db: &Database) {
    let db = db.clone().with_name("profiled");
    let profiler = Arc::new(ExecutionProfiler::new());

    // Attached but not started
    db.attach_profiler(profiler.clone());
    assert!(!db.is_profiling());
    db.scalar("SELECT 1").expect("Could not select 1");
    assert!(profiler.stats("SELECT 1").is_none());

    db.start_profiling();
    assert!(db.is_profiling());
    for _ in 0..3 {
        db.scalar("SELECT 1").expect("Could not select 1");
    }
    let _ = db.try_scalar("SELECT * FROM profiling_missing", |context| {
        context.handled = true;
        Ok(())
    });
    assert_eq!(profiler.stats("SELECT 1").map(|v| v.count), Some(3));
    assert_eq!(
        profiler
            .stats("SELECT * FROM profiling_missing")
            .map(|v| v.count),
        Some(1),
        "Failed executions are profiled as well"
    );
    assert_eq!(profiler.running(), 0);
    let summary = profiler.dump_execution_summary();
    assert!(summary.contains("SELECT 1"));

    // Stopped
    db.stop_profiling();
    db.scalar("SELECT 1").expect("Could not select 1");
    assert_eq!(profiler.stats("SELECT 1").map(|v| v.count), Some(3));

    // Started but detached
    db.start_profiling();
    assert!(db.detach_profiler().is_some());
    assert!(!db.is_profiling());
    db.scalar("SELECT 1").expect("Could not select 1");
    assert_eq!(profiler.stats("SELECT 1").map(|v| v.count), Some(3));
}
