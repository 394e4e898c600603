//! Replay source normalization
//!
//! Accepts either a bare replay id (`gen9ou-2000000000`) or a full replay
//! URL, with or without scheme, query string or fragment.

use crate::{RecorderError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySource {
    pub id: String,
    pub url: String,
}

impl ReplaySource {
    /// Normalize `input` against `host`, e.g. `https://replay.pokemonshowdown.com/`
    pub fn parse(input: &str, host: &str) -> Result<Self> {
        let id = normalize_id(input, host);

        if id.is_empty() {
            return Err(RecorderError::InvalidSource(format!(
                "no replay id in {:?}",
                input
            )));
        }

        let base = if host.ends_with('/') {
            host.to_string()
        } else {
            format!("{}/", host)
        };

        Ok(Self {
            url: format!("{}{}", base, id),
            id,
        })
    }
}

fn normalize_id(input: &str, host: &str) -> String {
    let trimmed = input.trim();
    let host = strip_scheme(host).trim_end_matches('/');

    let mut rest = strip_scheme(trimmed);
    if let Some(path) = rest.strip_prefix(host) {
        rest = path;
    }

    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    rest[..end].trim_matches('/').to_string()
}

fn strip_scheme(s: &str) -> &str {
    s.strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
        .unwrap_or(s)
}
