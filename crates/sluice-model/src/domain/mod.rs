mod task;
pub use task::Task;

mod task_id;
pub use task_id::TaskId;

mod wait_snapshot;
pub use wait_snapshot::WaitSnapshot;

/// Elapsed wall-clock time in milliseconds.
///
/// Used in diagnostic snapshots where an explicit duration is reported.
pub type ElapsedMs = u64;
