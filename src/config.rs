use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::pipeline::extraction::gate::AcquisitionConfig;
use crate::pipeline::extraction::preprocess::PreprocessOptions;

/// Application-level constants
pub const APP_NAME: &str = "lease-extract";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";
pub const DEFAULT_OLLAMA_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TESSERACT_LANG: &str = "eng";
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_RENDER_DPI: u32 = 400;
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_MAX_UPLOAD_MB: usize = 25;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    format!("{}=info,tower_http=info", APP_NAME.replace('-', "_"))
}

/// Runtime settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub ollama_timeout_secs: u64,
    pub tesseract_lang: String,
    pub tessdata_dir: Option<PathBuf>,
    pub ocr_timeout_secs: u64,
    pub ocr_max_dimension: Option<u32>,
    pub render_dpi: u32,
    pub pdfium_library_path: Option<PathBuf>,
    pub bind_addr: String,
    pub max_upload_mb: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ollama_base_url: DEFAULT_OLLAMA_URL.into(),
            ollama_model: DEFAULT_OLLAMA_MODEL.into(),
            ollama_timeout_secs: DEFAULT_OLLAMA_TIMEOUT_SECS,
            tesseract_lang: DEFAULT_TESSERACT_LANG.into(),
            tessdata_dir: None,
            ocr_timeout_secs: DEFAULT_OCR_TIMEOUT_SECS,
            ocr_max_dimension: None,
            render_dpi: DEFAULT_RENDER_DPI,
            pdfium_library_path: None,
            bind_addr: DEFAULT_BIND_ADDR.into(),
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Process environment layered over a dotenv file; the environment wins.
    /// A missing file is not an error.
    pub fn from_env_and_file(path: &Path) -> Self {
        let file_vars = read_env_file(path);
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| file_vars.get(key).cloned()))
    }

    /// Build settings from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Self {
            ollama_base_url: get("OLLAMA_BASE_URL").unwrap_or(defaults.ollama_base_url),
            ollama_model: get("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            ollama_timeout_secs: parse_or_default(
                "OLLAMA_TIMEOUT_SECS",
                get("OLLAMA_TIMEOUT_SECS"),
                defaults.ollama_timeout_secs,
            ),
            tesseract_lang: get("TESSERACT_LANG").unwrap_or(defaults.tesseract_lang),
            tessdata_dir: get("TESSDATA_DIR").map(PathBuf::from),
            ocr_timeout_secs: parse_or_default(
                "OCR_TIMEOUT_SECS",
                get("OCR_TIMEOUT_SECS"),
                defaults.ocr_timeout_secs,
            ),
            ocr_max_dimension: get("OCR_MAX_DIMENSION").and_then(|raw| {
                parse_optional("OCR_MAX_DIMENSION", &raw).filter(|&d: &u32| d > 0)
            }),
            render_dpi: parse_or_default("OCR_RENDER_DPI", get("OCR_RENDER_DPI"), defaults.render_dpi),
            pdfium_library_path: get("PDFIUM_DYNAMIC_LIB_PATH").map(PathBuf::from),
            bind_addr: get("LEASE_EXTRACT_BIND").unwrap_or(defaults.bind_addr),
            max_upload_mb: parse_or_default(
                "LEASE_EXTRACT_MAX_UPLOAD_MB",
                get("LEASE_EXTRACT_MAX_UPLOAD_MB"),
                defaults.max_upload_mb,
            ),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn ollama_timeout(&self) -> Duration {
        Duration::from_secs(self.ollama_timeout_secs)
    }

    /// Acquisition Gate tuning derived from these settings.
    pub fn acquisition_config(&self) -> AcquisitionConfig {
        AcquisitionConfig {
            render_dpi: self.render_dpi,
            ocr_timeout: Duration::from_secs(self.ocr_timeout_secs),
            preprocess: PreprocessOptions {
                max_dimension: self.ocr_max_dimension,
            },
            ..AcquisitionConfig::default()
        }
    }
}

fn read_env_file(path: &Path) -> HashMap<String, String> {
    match dotenvy::from_path_iter(path) {
        Ok(iter) => iter
            .filter_map(|item| match item {
                Ok(pair) => Some(pair),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping malformed env file line");
                    None
                }
            })
            .collect(),
        Err(e) if e.not_found() => HashMap::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read env file");
            HashMap::new()
        }
    }
}

fn parse_optional<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = raw, "Ignoring invalid numeric setting");
            None
        }
    }
}

fn parse_or_default<T: FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    raw.and_then(|r| parse_optional(key, &r)).unwrap_or(default)
}
