// ABOUTME: Shared helper for connecting to the container runtime.
// ABOUTME: Used by deploy and status so both fail the same way on a dead endpoint.

use cutover::config::Settings;
use cutover::error::Result;
use cutover::output::Output;
use cutover::runtime::BollardRuntime;

/// Connect to the runtime named by `DOCKER_HOST` and make sure it answers.
pub async fn connect_to_runtime(settings: &Settings, output: &Output) -> Result<BollardRuntime> {
    output.progress(&format!("  → Connecting to {}...", settings.docker_host));
    let runtime = BollardRuntime::connect(&settings.docker_host)?;
    runtime.ping().await?;
    Ok(runtime)
}
