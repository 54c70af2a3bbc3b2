// ABOUTME: Reader for the release container's KEY=VALUE environment file.
// ABOUTME: Lines are trimmed and blank lines dropped; values pass through verbatim.

use std::io;
use std::path::Path;

/// Split env file contents into `KEY=VALUE` entries.
pub fn parse_env_file(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and parse the env file at `path`.
pub fn read_env_file(path: &Path) -> io::Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(parse_env_file(&contents))
}
