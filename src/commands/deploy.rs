// ABOUTME: Deploy command implementation.
// ABOUTME: Takes the deploy lock, wires real collaborators into the orchestrator, and reports.

use super::runtime_connection::connect_to_runtime;
use cutover::config::Settings;
use cutover::deploy::{DeployLock, Orchestrator};
use cutover::error::Result;
use cutover::output::Output;
use cutover::probe::HttpProbe;
use cutover::proxy::PidFileReloader;
use cutover::types::ReleaseTag;

/// Deploy `tag`, or the configured default tag.
pub async fn deploy(
    settings: Settings,
    tag: Option<String>,
    promote: bool,
    force: bool,
    mut output: Output,
) -> Result<()> {
    let tag = ReleaseTag::new(tag.as_deref().unwrap_or(&settings.tag))?;

    output.start_timer();
    output.progress(&format!(
        "Deploying {}",
        settings.layout.release_image_ref(&tag)
    ));

    let lock = DeployLock::acquire(&settings.layout.lock_file, &tag, force)?;

    let runtime = connect_to_runtime(&settings, &output).await?;
    let probe = HttpProbe::new(settings.layout.health_path.clone());
    let reloader = PidFileReloader::new(settings.layout.nginx_pid_file.clone());
    let orchestrator = Orchestrator::new(settings, runtime, probe, reloader);

    let result = orchestrator.deploy_tag(&tag, promote).await;
    let outcome = lock.release_after(result)?;

    for name in &outcome.retired {
        output.progress(&format!("  → Retired {}", name));
    }

    let message = if outcome.promoted {
        format!("{} is live", outcome.container)
    } else {
        format!("{} staged without promotion", outcome.container)
    };
    output.success_with(&message, &outcome.retired);
    Ok(())
}
