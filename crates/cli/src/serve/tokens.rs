//! Bearer-token registry loading: token -> owner id.
//!
//! Two sources, tried in order: a TOML file passed via `--tokens`, or the
//! `SITELOG_TOKENS` env var in `token=owner,token=owner` form.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

/// Shape of the `--tokens` TOML file:
///
/// ```toml
/// [tokens]
/// "secret-for-ana" = 7
/// "secret-for-rui" = 9
/// ```
#[derive(Deserialize)]
struct TokenFile {
    tokens: HashMap<String, i64>,
}

pub(crate) fn load_token_file(
    path: &Path,
) -> Result<HashMap<String, i64>, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read token file {}: {}", path.display(), e))?;
    let parsed: TokenFile =
        toml::from_str(&text).map_err(|e| format!("malformed token file: {}", e))?;
    if parsed.tokens.is_empty() {
        return Err("token file declares no tokens".into());
    }
    Ok(parsed.tokens)
}

pub(crate) fn parse_token_env(
    raw: &str,
) -> Result<HashMap<String, i64>, Box<dyn std::error::Error>> {
    let mut tokens = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (token, owner) = entry
            .split_once('=')
            .ok_or_else(|| format!("malformed SITELOG_TOKENS entry: {}", entry))?;
        let owner_id = owner
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("malformed owner id in SITELOG_TOKENS entry: {}", entry))?;
        tokens.insert(token.trim().to_string(), owner_id);
    }
    if tokens.is_empty() {
        return Err("SITELOG_TOKENS declares no tokens".into());
    }
    Ok(tokens)
}
