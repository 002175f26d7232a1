mod app;
mod config;
mod connection;
mod input;
mod protocol;
mod reconcile;
mod registry;
mod session;
mod style;
mod throttle;
mod transform;

use std::process::ExitCode;

use tracing::error;

fn main() -> ExitCode {
    match app::bootstrap::build_app() {
        Ok(app) => app::loop_runner::run(app),
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
