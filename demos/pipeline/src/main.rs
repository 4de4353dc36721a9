use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;

use sluice_core::prelude::*;
use sluice_model::Task;
use sluice_observe::{LogConfig, init_logger};

/// Simulated unit of work: finishes on a runtime thread after a delay.
async fn enrich(task: Arc<Task>, cancel: CancellationToken) -> Result<(), String> {
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_millis(200)) => {
            let order = task.payload();
            task.set_payload(json!({ "order": order, "enriched": true }));
            Ok(())
        }
        _ = cancel.cancelled() => Err("cancelled during shutdown".to_string()),
    }
}

fn main() -> anyhow::Result<()> {
    init_logger(&LogConfig::default())?;

    let runtime = tokio::runtime::Runtime::new()?;
    let registry = AwaitRegistry::new();

    let unit = SpawnProcessor::new(Arc::new(enrich), runtime.handle().clone()).with_name("enrich");
    let bridge = Bridge::new(Arc::new(unit), registry.clone());
    bridge.start()?;
    info!("bridge started, inner unit: {}", bridge.inner().unwrap().name());

    // a couple of blocking callers, each on its own thread
    let callers: Vec<_> = (0..3)
        .map(|n| {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                let task = Arc::new(Task::new(json!({ "n": n })));
                let id = task.id().clone();
                bridge.process_sync(&task)?;
                info!(task = %id, payload = %task.payload(), "caller unblocked");
                Ok::<_, BridgeError>(())
            })
        })
        .collect();

    // diagnostic snapshot while they are parked
    thread::sleep(Duration::from_millis(50));
    for snap in registry.blocked() {
        info!(task = %snap.task_id, waited_ms = snap.waited_ms, "blocked caller");
    }

    for caller in callers {
        caller.join().expect("caller thread panicked")?;
    }

    // interrupt a caller whose work never finishes in time
    let slow_unit = SpawnProcessor::new(
        Arc::new(|_task: Arc<Task>, cancel: CancellationToken| async move {
            cancel.cancelled().await;
            Err("cancelled".to_string())
        }),
        runtime.handle().clone(),
    );
    let slow_bridge = Bridge::new(Arc::new(slow_unit), registry.clone());
    let task = Arc::new(Task::new(json!("stuck")));
    let id = task.id().clone();

    let stuck = {
        let bridge = Arc::clone(&slow_bridge);
        let task = Arc::clone(&task);
        thread::spawn(move || bridge.process_sync(&task))
    };
    while registry.blocked_count() == 0 {
        thread::sleep(Duration::from_millis(10));
    }
    registry.interrupt(&id);
    match stuck.join().expect("caller thread panicked") {
        Err(BridgeError::Interrupted(id)) => info!(task = %id, "wait interrupted as requested"),
        other => anyhow::bail!("expected an interrupted wait, got {other:?}"),
    }

    bridge.shutdown()?;
    slow_bridge.shutdown()?;
    info!("bridges shut down");
    Ok(())
}
