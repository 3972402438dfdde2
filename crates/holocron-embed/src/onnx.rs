//! Local ONNX transformer embedder.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ndarray::ArrayViewD;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use holocron_core::{Embedder, HolocronError, Result};

/// Token budget passed to the tokenizer; longer inputs are truncated.
const MAX_INPUT_TOKENS: usize = 8192;

/// Embedder running a sentence-transformer ONNX export locally.
///
/// The indexing pipeline hands this the full contextual input (file header
/// plus chunk content); the model output is mean-pooled over the attention
/// mask and L2-normalized.
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: Arc<Tokenizer>,
    dimensions: usize,
}

impl OnnxEmbedder {
    /// Load a model and its tokenizer from disk.
    pub fn new(
        model_path: impl AsRef<Path>,
        tokenizer_path: impl AsRef<Path>,
        dimensions: usize,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        info!("Loading ONNX model from {:?}", model_path);

        let session = Session::builder()
            .map_err(|e| HolocronError::embedder(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| HolocronError::embedder(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(4)
            .map_err(|e| HolocronError::embedder(format!("Failed to set thread count: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| HolocronError::embedder(format!("Failed to load model: {}", e)))?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| HolocronError::embedder(format!("Failed to load tokenizer: {}", e)))?;

        info!(dimensions, "ONNX embedder ready");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer: Arc::new(tokenizer),
            dimensions,
        })
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| HolocronError::embedder(format!("Tokenization failed: {}", e)))?;

        let len = encoding.get_ids().len().min(MAX_INPUT_TOKENS);
        if len == 0 {
            return Ok(vec![0.0; self.dimensions]);
        }

        let input_ids: Vec<i64> = encoding.get_ids()[..len].iter().map(|&v| v as i64).collect();
        let attention_mask: Vec<i64> = encoding.get_attention_mask()[..len]
            .iter()
            .map(|&v| v as i64)
            .collect();

        let ids_tensor = Tensor::from_array((vec![1usize, len], input_ids))
            .map_err(|e| HolocronError::embedder(format!("Failed to create input tensor: {}", e)))?;
        let mask_tensor = Tensor::from_array((vec![1usize, len], attention_mask.clone()))
            .map_err(|e| HolocronError::embedder(format!("Failed to create mask tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| HolocronError::embedder(format!("Failed to lock session: {}", e)))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor
            ])
            .map_err(|e| HolocronError::embedder(format!("Inference failed: {}", e)))?;

        let (_, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| HolocronError::embedder("No output tensor found"))?;

        let view = output
            .try_extract_array::<f32>()
            .map_err(|e| HolocronError::embedder(format!("Failed to extract tensor: {}", e)))?;

        let shape = view.shape().to_vec();
        debug!(?shape, "model output");

        let vector = match shape.len() {
            // (1, seq_len, hidden): mean-pool over valid positions
            3 => Self::mean_pool(&view, &attention_mask),
            // (1, hidden): already pooled
            2 => (0..shape[1]).map(|j| view[[0, j]]).collect(),
            _ => {
                return Err(HolocronError::embedder(format!(
                    "Unexpected output shape: {:?}",
                    shape
                )))
            }
        };

        Ok(l2_normalize(vector))
    }

    fn mean_pool(view: &ArrayViewD<'_, f32>, attention_mask: &[i64]) -> Vec<f32> {
        let seq_len = view.shape()[1];
        let hidden = view.shape()[2];

        let valid: Vec<usize> = (0..seq_len.min(attention_mask.len()))
            .filter(|&j| attention_mask[j] == 1)
            .collect();
        if valid.is_empty() {
            return vec![0.0; hidden];
        }

        let mut sum = vec![0.0f32; hidden];
        for &j in &valid {
            for (k, s) in sum.iter_mut().enumerate() {
                *s += view[[0, j, k]];
            }
        }
        sum.iter().map(|s| s / valid.len() as f32).collect()
    }
}

fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

#[async_trait]
impl Embedder for OnnxEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        // Session::run is synchronous; inference happens inline on the
        // caller's task, matching the indexer's sequential embed phase.
        self.embed_one(text)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn is_available(&self) -> bool {
        true
    }
}
