// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! First-run download of the ONNX embedding model.
//!
//! Fetches the quantized multilingual MiniLM export and its tokenizer from
//! HuggingFace and caches them under the data directory.

use std::path::{Path, PathBuf};

use membridge_core::error::MembridgeError;
use tokio::sync::Mutex;
use tracing::info;

const MODEL_URL: &str = "https://huggingface.co/Xenova/paraphrase-multilingual-MiniLM-L12-v2/resolve/main/onnx/model_quantized.onnx";
const TOKENIZER_URL: &str =
    "https://huggingface.co/Xenova/paraphrase-multilingual-MiniLM-L12-v2/resolve/main/tokenizer.json";

/// Manages model download and path resolution.
pub struct ModelManager {
    data_dir: PathBuf,
    model_name: String,
    /// Serializes concurrent `ensure_model` calls.
    download_lock: Mutex<()>,
}

impl ModelManager {
    pub fn new(data_dir: PathBuf, model_name: impl Into<String>) -> Self {
        Self {
            data_dir,
            model_name: model_name.into(),
            download_lock: Mutex::new(()),
        }
    }

    /// Directory holding the model files.
    pub fn model_dir(&self) -> PathBuf {
        self.data_dir.join("models").join(&self.model_name)
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir().join("model.onnx")
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir().join("tokenizer.json")
    }

    /// True if both model and tokenizer are on disk.
    pub fn is_model_available(&self) -> bool {
        self.model_path().exists() && self.tokenizer_path().exists()
    }

    /// Download the model if missing and return the model path.
    pub async fn ensure_model(&self) -> Result<PathBuf, MembridgeError> {
        let _guard = self.download_lock.lock().await;
        if self.is_model_available() {
            return Ok(self.model_path());
        }

        info!(model = %self.model_name, "embedding model not found, downloading from HuggingFace");

        let model_dir = self.model_dir();
        tokio::fs::create_dir_all(&model_dir)
            .await
            .map_err(|e| MembridgeError::Internal(format!("Failed to create model directory: {e}")))?;

        let files = [("model.onnx", MODEL_URL), ("tokenizer.json", TOKENIZER_URL)];

        for (filename, url) in &files {
            let dest = model_dir.join(filename);
            if dest.exists() {
                continue;
            }

            info!("downloading {filename}");
            match download_file(url, &dest).await {
                Ok(size) => info!("downloaded {filename} ({size} bytes)"),
                Err(e) => {
                    let _ = tokio::fs::remove_file(&dest).await;
                    return Err(e);
                }
            }
        }

        info!("embedding model ready at {}", model_dir.display());
        Ok(self.model_path())
    }
}

async fn download_file(url: &str, dest: &Path) -> Result<usize, MembridgeError> {
    let response = reqwest::get(url).await.map_err(|e| {
        MembridgeError::transport(format!("Failed to download {url}: {e}"), Some(Box::new(e)))
    })?;

    if !response.status().is_success() {
        return Err(MembridgeError::transport(
            format!("Download failed with status {}: {url}", response.status()),
            None,
        ));
    }

    let bytes = response.bytes().await.map_err(|e| {
        MembridgeError::transport(
            format!("Failed to read response body from {url}: {e}"),
            Some(Box::new(e)),
        )
    })?;

    let size = bytes.len();
    tokio::fs::write(dest, &bytes)
        .await
        .map_err(|e| MembridgeError::Internal(format!("Failed to write {}: {e}", dest.display())))?;

    Ok(size)
}
