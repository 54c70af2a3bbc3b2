// ABOUTME: nginx integration: config rendering, config files, and reload signalling.
// ABOUTME: Everything cutover does to the reverse proxy goes through this module.

mod error;
mod reload;
mod synth;
mod templates;

pub use error::ProxyError;
pub use reload::{PidFileReloader, Reloader, read_pid};
pub use synth::ConfigSynthesizer;
pub use templates::{CIPHERS, ProductionConf, UpstreamConf};
