// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ONNX embedding adapter for local multilingual sentence embeddings.
//!
//! Runs paraphrase-multilingual-MiniLM-L12-v2 on CPU and produces
//! 384-dimensional, L2-normalized vectors.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use ndarray::Array2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use membridge_core::error::MembridgeError;
use membridge_core::traits::adapter::PluginAdapter;
use membridge_core::traits::EmbeddingAdapter;
use membridge_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};

use crate::types::l2_normalize;

/// Embedding width of the multilingual MiniLM model.
pub const EMBEDDING_DIM: usize = 384;

/// Sequences longer than this are truncated by the tokenizer.
const MAX_SEQUENCE_LEN: usize = 128;

/// ONNX-based sentence embedder.
pub struct OnnxEmbedder {
    /// Session runs need `&mut`, hence the lock.
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
}

// Safety: Session is only touched through the Mutex; tokenizer encoding is read-only.
unsafe impl Send for OnnxEmbedder {}
unsafe impl Sync for OnnxEmbedder {}

impl OnnxEmbedder {
    /// Load the model and the sibling `tokenizer.json`.
    pub fn new(model_path: &Path) -> Result<Self, MembridgeError> {
        let model_dir = model_path
            .parent()
            .ok_or_else(|| MembridgeError::Internal("Invalid model path".to_string()))?;

        let tokenizer_path = model_dir.join("tokenizer.json");
        let mut tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            MembridgeError::Internal(format!(
                "Failed to load tokenizer from {}: {e}",
                tokenizer_path.display()
            ))
        })?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_SEQUENCE_LEN,
                ..Default::default()
            }))
            .map_err(|e| MembridgeError::Internal(format!("Failed to configure truncation: {e}")))?;

        let session = Session::builder()
            .map_err(|e| MembridgeError::Internal(format!("Failed to create ONNX session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| MembridgeError::Internal(format!("Failed to set optimization level: {e}")))?
            .with_intra_threads(1)
            .map_err(|e| MembridgeError::Internal(format!("Failed to set thread count: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| {
                MembridgeError::Internal(format!(
                    "Failed to load ONNX model from {}: {e}",
                    model_path.display()
                ))
            })?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    /// Embed a single text string.
    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>, MembridgeError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| MembridgeError::Internal(format!("Tokenization failed: {e}")))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let token_type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();

        let seq_len = input_ids.len();
        let shape_err =
            |e: ndarray::ShapeError| MembridgeError::Internal(format!("Failed to shape input tensor: {e}"));
        let input_ids_array = Array2::from_shape_vec((1, seq_len), input_ids).map_err(shape_err)?;
        let attention_mask_array =
            Array2::from_shape_vec((1, seq_len), attention_mask.clone()).map_err(shape_err)?;
        let token_type_ids_array =
            Array2::from_shape_vec((1, seq_len), token_type_ids).map_err(shape_err)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| MembridgeError::Internal(format!("Failed to lock ONNX session: {e}")))?;

        let input_ids_tensor = TensorRef::from_array_view(&input_ids_array).map_err(|e| {
            MembridgeError::Internal(format!("Failed to create input_ids TensorRef: {e}"))
        })?;
        let attention_mask_tensor =
            TensorRef::from_array_view(&attention_mask_array).map_err(|e| {
                MembridgeError::Internal(format!("Failed to create attention_mask TensorRef: {e}"))
            })?;
        let token_type_ids_tensor =
            TensorRef::from_array_view(&token_type_ids_array).map_err(|e| {
                MembridgeError::Internal(format!("Failed to create token_type_ids TensorRef: {e}"))
            })?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor
            ])
            .map_err(|e| MembridgeError::Internal(format!("ONNX inference failed: {e}")))?;

        // Output shape: [1, seq_len, hidden]
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| MembridgeError::Internal(format!("Failed to extract output tensor: {e}")))?;

        let hidden_size = shape[shape.len() - 1] as usize;
        let pooled = mean_pool_with_attention(data, &attention_mask, seq_len, hidden_size);
        Ok(l2_normalize(&pooled))
    }
}

/// Attention-masked mean pooling over token embeddings.
fn mean_pool_with_attention(
    embeddings: &[f32],
    attention_mask: &[i64],
    seq_len: usize,
    hidden_size: usize,
) -> Vec<f32> {
    let mut sum = vec![0.0f32; hidden_size];
    let mut count = 0.0f32;

    for (i, &mask) in attention_mask.iter().enumerate().take(seq_len) {
        if mask > 0 {
            let token = &embeddings[i * hidden_size..(i + 1) * hidden_size];
            for (acc, value) in sum.iter_mut().zip(token) {
                *acc += value;
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        for val in &mut sum {
            *val /= count;
        }
    }

    sum
}

#[async_trait]
impl PluginAdapter for OnnxEmbedder {
    fn name(&self) -> &str {
        "onnx-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MembridgeError> {
        match self.session.lock() {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("Session lock poisoned: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), MembridgeError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for OnnxEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MembridgeError> {
        let mut embeddings = Vec::with_capacity(input.texts.len());
        for text in &input.texts {
            embeddings.push(self.embed_text(text)?);
        }

        Ok(EmbeddingOutput {
            embeddings,
            dimensions: EMBEDDING_DIM,
        })
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}
