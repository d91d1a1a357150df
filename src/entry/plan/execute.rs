use std::sync::Arc;

use tracing::{info, warn};

use crate::control::{ControlPlane, ControlServer};
use crate::driver::Driver;
use crate::error::AppResult;
use crate::lifecycle::lifecycle_channel;
use crate::state::RunState;
use crate::system::banner;
use crate::system::shutdown_handlers::{setup_signal_shutdown_handler, shutdown_channel};
use crate::work::HttpWork;

use super::types::ServePlan;

pub(in crate::entry) async fn execute_plan(plan: ServePlan) -> AppResult<()> {
    let state = Arc::new(RunState::new());
    let work = Arc::new(HttpWork::new(
        plan.target.clone(),
        plan.request_timeout,
        Arc::clone(&state),
    )?);
    let (lifecycle_tx, lifecycle_rx) = lifecycle_channel();
    let plane = Arc::new(ControlPlane::new(
        Arc::clone(&state),
        Arc::new(lifecycle_tx),
        plan.max_concurrency,
    ));

    let (shutdown_tx, driver_shutdown) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    if !plan.settings.public_dir.is_dir() {
        warn!(
            "Dashboard directory {} does not exist; only /ws will be usable",
            plan.settings.public_dir.display()
        );
    }
    let server = ControlServer::bind(plan.listen, plane, plan.settings).await?;
    let addr = server.local_addr()?;
    banner::print_cli_banner(&addr);
    info!("Target: {}", plan.target);
    let server_handle = server.spawn(&shutdown_tx);

    let report = Driver::new(work, lifecycle_rx, plan.drain_timeout)
        .run(driver_shutdown)
        .await;

    server_handle.await?;
    signal_handle.await?;

    info!(
        "Stopped after {} requests ({} pools, {} dispatches)",
        state.snapshot().num_requests,
        report.pools_started,
        report.dispatched
    );
    Ok(())
}
