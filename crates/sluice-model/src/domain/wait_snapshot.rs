use serde::{Deserialize, Serialize};

use crate::{ElapsedMs, TaskId};

/// Diagnostic record of one blocked synchronous caller.
///
/// Produced by enumerating the await registry; intended for operational
/// monitoring, never for control flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitSnapshot {
    /// Correlation id of the task the caller is blocked on.
    pub task_id: TaskId,
    /// How long the caller has been blocked so far.
    pub waited_ms: ElapsedMs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip() {
        let snap = WaitSnapshot {
            task_id: TaskId::from("t-1"),
            waited_ms: 1500,
        };

        let json = serde_json::to_string(&snap).unwrap();
        assert_eq!(json, r#"{"taskId":"t-1","waitedMs":1500}"#);

        let back: WaitSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
