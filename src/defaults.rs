//! Default values for loader configuration.

pub const BASE_URL: &str = "./scripts";
pub const SCRIPT_EXTENSION: &str = ".js";
pub const WAIT_SECONDS: u64 = 0;

/// Environment variable that replaces the configured base URL.
pub const BASE_URL_ENV: &str = "PAGEBOOT_BASE_URL";

pub fn base_url() -> String { BASE_URL.to_string() }
pub fn wait_seconds() -> u64 { WAIT_SECONDS }
