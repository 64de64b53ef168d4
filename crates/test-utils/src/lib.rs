pub mod builders;
pub mod scripted_manager;

use std::sync::Once;
use std::time::Duration;

use runvisor::manager::RunManager;
use runvisor::types::RunSnapshot;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Upper bound for any single awaited step in a test. Real worker
/// processes are involved, so this is generous.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Initialise tracing for tests.
///
/// Logs are captured per test and only shown for failures (or with
/// `-- --nocapture`). Select levels with `RUST_LOG`, e.g.
/// `RUST_LOG=runvisor=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("runvisor=info,warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("test step timed out after {TEST_TIMEOUT:?}"))
}

/// Poll `manager` until it reports a terminal status, collecting every
/// snapshot seen on the way (the last one is terminal).
pub async fn poll_until_complete(manager: &dyn RunManager) -> Vec<RunSnapshot> {
    with_timeout(async {
        let mut seen = Vec::new();
        loop {
            let snapshot = manager.status();
            let done = snapshot.run_status.is_terminal();
            seen.push(snapshot);
            if done {
                return seen;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
}
