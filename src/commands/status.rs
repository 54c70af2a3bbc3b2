// ABOUTME: Status command implementation.
// ABOUTME: Shows the last promoted tag and every release container the runtime knows.

use super::runtime_connection::connect_to_runtime;
use cutover::config::Settings;
use cutover::deploy::{is_release_container, read_applied_tag, release_tag_of};
use cutover::error::Result;
use cutover::output::Output;
use cutover::runtime::{ContainerManager, ContainerOps};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ReleaseStatus {
    name: String,
    tag: Option<String>,
    state: String,
    production: bool,
}

#[derive(Debug, Serialize)]
struct Status {
    applied_tag: Option<String>,
    releases: Vec<ReleaseStatus>,
}

pub async fn status(settings: Settings, output: Output) -> Result<()> {
    let applied_tag = read_applied_tag(&settings.layout.tag_file)?;
    let runtime = connect_to_runtime(&settings, &output).await?;
    let status = collect(&settings, &ContainerManager::new(runtime), applied_tag).await?;

    output.progress(&format!(
        "Production: {}",
        status.applied_tag.as_deref().unwrap_or("(none)")
    ));
    for release in &status.releases {
        let marker = if release.production { "*" } else { " " };
        output.progress(&format!(
            "{} {:<24} {:<12} {}",
            marker,
            release.name,
            release.tag.as_deref().unwrap_or("?"),
            release.state
        ));
    }

    output.success_with(
        &format!("{} release container(s)", status.releases.len()),
        &status,
    );
    Ok(())
}

async fn collect<R: ContainerOps>(
    settings: &Settings,
    manager: &ContainerManager<R>,
    applied_tag: Option<String>,
) -> Result<Status> {
    let mut releases: Vec<ReleaseStatus> = manager
        .list_all()
        .await?
        .into_iter()
        .filter(|c| is_release_container(c, &settings.layout))
        .map(|c| {
            let tag = release_tag_of(&c, &settings.layout);
            let production = tag.is_some() && tag == applied_tag;
            ReleaseStatus {
                name: c.name,
                tag,
                state: c.state,
                production,
            }
        })
        .collect();
    releases.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Status {
        applied_tag,
        releases,
    })
}
