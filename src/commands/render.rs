// ABOUTME: Render command implementation.
// ABOUTME: Prints an nginx config exactly as a deploy would write it, without touching disk.

use cutover::config::Settings;
use cutover::error::Result;
use cutover::proxy::ConfigSynthesizer;
use cutover::types::ReleaseTag;
use std::net::{IpAddr, SocketAddr};

pub fn render(settings: &Settings, tag: &str, production: bool, ip: IpAddr) -> Result<()> {
    let tag = ReleaseTag::new(tag)?;
    let synth = ConfigSynthesizer::new(settings);

    let rendered = if production {
        synth.render_production(&tag)?
    } else {
        let backend = settings.layout.release_container_name(&tag);
        let address = SocketAddr::new(ip, settings.layout.release_port);
        synth.render_upstream(&tag, &backend, address)?
    };

    print!("{rendered}");
    Ok(())
}
