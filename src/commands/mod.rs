// ABOUTME: Command module aggregator for the cutover CLI.
// ABOUTME: Re-exports deploy, render, and status command handlers.

mod deploy;
mod render;
mod runtime_connection;
mod status;

pub use deploy::deploy;
pub use render::render;
pub use status::status;
