//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! core services. The intent is to avoid reading process-wide environment
//! variables during request handling, which can lead to inconsistent
//! behaviour in multi-threaded runtimes and test harnesses.

use crate::error::{TaleError, TaleResult};
use std::path::{Path, PathBuf};

/// Directory name for tale documents under the data root.
pub const TALES_DIR_NAME: &str = "tales";

/// Connection settings for the external narrative generator.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    endpoint: String,
    api_key: String,
    model: String,
}

impl GeneratorConfig {
    /// Create a new `GeneratorConfig`.
    pub fn new(endpoint: String, api_key: String, model: String) -> TaleResult<Self> {
        if endpoint.trim().is_empty() {
            return Err(TaleError::InvalidInput(
                "generator endpoint cannot be empty".into(),
            ));
        }
        if model.trim().is_empty() {
            return Err(TaleError::InvalidInput(
                "generator model cannot be empty".into(),
            ));
        }
        Ok(Self {
            endpoint,
            api_key,
            model,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct FableConfig {
    data_dir: PathBuf,
    generator: Option<GeneratorConfig>,
}

impl FableConfig {
    /// Create a new `FableConfig`.
    ///
    /// `generator` is optional: without it the CRUD surface works normally
    /// and only generation requests fail.
    pub fn new(data_dir: PathBuf, generator: Option<GeneratorConfig>) -> TaleResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(TaleError::InvalidInput("data_dir cannot be empty".into()));
        }
        Ok(Self {
            data_dir,
            generator,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory holding the sharded tale documents.
    pub fn tales_dir(&self) -> PathBuf {
        self.data_dir.join(TALES_DIR_NAME)
    }

    pub fn generator(&self) -> Option<&GeneratorConfig> {
        self.generator.as_ref()
    }
}
