//! Storage for rendered chart files.
//!
//! Files land in `<outputs_dir>/tools/astrology/charts/` and are served from
//! `<OUTPUTS_WEB_BASE_URL>/tools/astrology/charts/`. Names carry a timestamp
//! and a random suffix so concurrent calls never collide, and files are
//! opened with `create_new` so an existing file is never overwritten.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::{Rng, distributions::Alphanumeric};
use tracing::{info, warn};

use crate::core::config::ToolsConfig;
use crate::domains::tools::error::ToolError;

const CHARTS_SUBDIR: &str = "tools/astrology/charts";
const MAX_NAME_CHARS: usize = 20;
const SUFFIX_CHARS: usize = 6;

const BASE_URL_MISSING: &str =
    "Tool outputs base URL not configured (OUTPUTS_WEB_BASE_URL). Cannot provide chart URL.";

/// Where rendered charts are written and how they are addressed.
#[derive(Debug, Clone)]
pub struct ChartStore {
    dir: PathBuf,
    base_url: String,
}

impl ChartStore {
    /// Fails when no public base URL is configured; nothing is touched on disk.
    pub fn from_config(config: &ToolsConfig) -> Result<Self, ToolError> {
        let base_url = config
            .outputs_web_base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ToolError::configuration(BASE_URL_MISSING))?;

        Ok(Self {
            dir: config.outputs_dir.join(CHARTS_SUBDIR),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Write `svg` under a fresh name and return its public URL.
    pub fn save(&self, prefix: &str, names: &[&str], svg: &str) -> Result<String, ToolError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| storage_failure(&self.dir, e))?;

        let filename = file_name(prefix, names);
        let path = self.dir.join(&filename);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| storage_failure(&path, e))?;
        file.write_all(svg.as_bytes())
            .map_err(|e| storage_failure(&path, e))?;

        info!("Saved chart to {}", path.display());
        Ok(format!("{}/{}/{}", self.base_url, CHARTS_SUBDIR, filename))
    }
}

/// Callers only learn the error kind; the local path stays in the log.
fn storage_failure(path: &Path, error: std::io::Error) -> ToolError {
    warn!("Chart storage failed at {}: {}", path.display(), error);
    ToolError::internal(format!("could not store chart file ({})", error.kind()))
}

/// Reduce a display name to a short, filesystem-safe token.
fn sanitize(name: &str) -> String {
    let safe: String = name
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(MAX_NAME_CHARS)
        .collect::<String>()
        .to_lowercase();

    if safe.is_empty() {
        "chart".to_string()
    } else {
        safe
    }
}

fn file_name(prefix: &str, names: &[&str]) -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S_%6f");
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_CHARS)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();

    let mut parts = vec![prefix.to_string()];
    parts.extend(names.iter().map(|n| sanitize(n)));
    parts.push(timestamp.to_string());
    parts.push(suffix);
    format!("{}.svg", parts.join("_"))
}
