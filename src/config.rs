use std::env;
use std::path::PathBuf;

/// Returns the value of the named environment variable if it exists or panics.
pub fn get_variable(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("must define {} environment variable", name))
}

/// Returns the value of the named environment variable, or `default`
/// when it is unset or blank.
pub fn get_variable_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_owned())
}

#[cfg(feature = "which")]
pub fn get_ffprobe(env: Option<String>) -> Option<PathBuf> {
    use which::which;

    env.map(PathBuf::from).or_else(|| which("ffprobe").ok())
}

#[cfg(not(feature = "which"))]
pub fn get_ffprobe(env: Option<String>) -> Option<PathBuf> {
    env.map(PathBuf::from)
}

/// Splits a comma-separated list of labels, dropping blanks and
/// duplicates while keeping the order.
pub fn parse_labels(raw: &str) -> Vec<String> {
    let mut labels: Vec<String> = vec![];

    for label in raw.split(',').map(crate::normalization::normalize_text) {
        if !label.is_empty() && !labels.contains(&label) {
            labels.push(label);
        }
    }

    labels
}
