use anyhow::{bail, Context, Result};
use ml_core::models::Candidate;
use std::io::Read;
use std::path::Path;

/// Inline text wins; otherwise read `file`, where `-` means stdin.
pub fn read_text(text: Option<String>, file: Option<&Path>) -> Result<String> {
    match (text, file) {
        (Some(t), None) => Ok(t),
        (None, Some(path)) => read_source(path),
        (Some(_), Some(_)) => bail!("pass either TEXT or --file, not both"),
        (None, None) => bail!("no input: pass TEXT or --file PATH"),
    }
}

/// Candidates as a JSON array of `{id, name, description?}`.
pub fn read_candidates(path: &Path) -> Result<Vec<Candidate>> {
    let raw = read_source(path)?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing candidates from {}", path.display()))
}

fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
