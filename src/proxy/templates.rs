// ABOUTME: Compile-time checked nginx config templates.
// ABOUTME: One per-release upstream/vhost template and one production vhost template.

use askama::Template;
use std::net::SocketAddr;

/// Cipher list shared by every TLS server block.
pub const CIPHERS: &str = "kEECDH+ECDSA+AES128 kEECDH+ECDSA+AES256 kEECDH+AES128 kEECDH+AES256 \
kEDH+AES128 kEDH+AES256 DES-CBC3-SHA +SHA !aNULL !eNULL !LOW !MD5 !EXP !DSS !PSK !SRP !kECDH \
!CAMELLIA !RC4 !SEED";

/// Upstream block plus HTTP and HTTPS server blocks for one release,
/// served at `<tag>.<suffix>`.
#[derive(Template, Debug)]
#[template(path = "upstream.conf", escape = "none")]
pub struct UpstreamConf<'a> {
    pub backend_name: &'a str,
    pub server_name: &'a str,
    /// Release address; IPv6 addresses render bracketed.
    pub address: SocketAddr,
    pub cert_file: &'a str,
    pub key_file: &'a str,
    pub ciphers: &'a str,
}

/// Bare-domain redirects plus the `www` virtual hosts forwarding to the
/// promoted release's upstream.
#[derive(Template, Debug)]
#[template(path = "production.conf", escape = "none")]
pub struct ProductionConf<'a> {
    pub server_suffix: &'a str,
    pub backend_name: &'a str,
    pub cert_file: &'a str,
    pub key_file: &'a str,
    pub ciphers: &'a str,
}

/// Render a config template as a complete file.
///
/// askama drops the final newline of a template source; nginx config files
/// end with one.
pub fn render_file<T: Template>(template: &T) -> askama::Result<String> {
    let mut out = template.render()?;
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}
