//! # Embedding
//!
//! Converts text into fixed-dimension dense vectors using a sentence embedding
//! model run through Candle (pure Rust ML framework). The index build and the
//! query path both go through the same [`Embedder`] so documents and questions
//! land in one shared vector space — mixing models between build and query
//! silently produces meaningless scores, so the whole service holds exactly
//! one embedder for its lifetime.
//!
//! The production implementation is [`MiniLmEmbedder`], wrapping
//! **all-MiniLM-L6-v2** (384 dimensions): tokenize, BERT forward pass,
//! attention-mask mean pooling. Vectors come back *unnormalized*; L2
//! normalization is the index's job (see [`crate::index`]), which turns the
//! dot product used at search time into cosine similarity.
//!
//! ## Quick Example
//! ```no_run
//! use triplerag::embedding::{Embedder, MiniLmEmbedder};
//!
//! # fn main() -> triplerag::error::Result<()> {
//! let model = MiniLmEmbedder::load()?;
//! let vectors = model.embed(&["Hanoi label Hà Nội".to_string()])?;
//! assert_eq!(vectors[0].len(), model.dimension());
//! # Ok(()) }
//! ```

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::{Repo, RepoType, api::sync::Api};
use tokenizers::Tokenizer;
use tracing::info;

use crate::error::{Result, RetrievalError};

/// Hugging Face model id of the sentence embedding model.
const MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Output dimension of all-MiniLM-L6-v2.
const MINILM_DIMENSION: usize = 384;

/// A deterministic text → vector mapping with a fixed output dimension.
///
/// Implementations must be pure: identical input text yields identical
/// vectors, no side effects. The engine relies on this for reproducible
/// builds and for the self-similarity property (a document queried with its
/// own text is its own best match).
pub trait Embedder: Send + Sync {
    /// Fixed length of every vector this embedder produces.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, one vector per input, in input order.
    ///
    /// # Errors
    /// [`RetrievalError::EmbeddingFailure`] if the model cannot process the
    /// input. Callers never receive a partial batch.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Sentence embeddings via all-MiniLM-L6-v2 on CPU.
pub struct MiniLmEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl MiniLmEmbedder {
    /// Load the model and tokenizer from the Hugging Face Hub (cached on disk
    /// after the first download).
    ///
    /// # Errors
    /// [`RetrievalError::EmbeddingFailure`] if any model file cannot be
    /// fetched or parsed.
    pub fn load() -> Result<Self> {
        let device = Device::Cpu;
        info!("Loading sentence embedding model {MODEL_ID}");

        let repo = Repo::with_revision(MODEL_ID.to_string(), RepoType::Model, "main".to_string());
        let api = Api::new().map_err(embedding_failure)?;
        let api_repo = api.repo(repo);

        let config_filename = api_repo.get("config.json").map_err(embedding_failure)?;
        let tokenizer_filename = api_repo.get("tokenizer.json").map_err(embedding_failure)?;
        let weights_filename = api_repo.get("model.safetensors").map_err(embedding_failure)?;

        let config = std::fs::read_to_string(config_filename).map_err(embedding_failure)?;
        let config: Config = serde_json::from_str(&config).map_err(embedding_failure)?;

        let tokenizer = Tokenizer::from_file(tokenizer_filename).map_err(embedding_failure)?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_filename], DTYPE, &device)
                .map_err(embedding_failure)?
        };
        let model = BertModel::load(vb, &config).map_err(embedding_failure)?;

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    /// Encode one text into a mean-pooled sentence vector.
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        // Tokenize with automatic truncation at the model's 512 token limit.
        let tokens = self
            .tokenizer
            .encode(text, true)
            .map_err(embedding_failure)?;

        let token_ids = Tensor::new(tokens.get_ids(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(embedding_failure)?;
        let token_type_ids = Tensor::new(tokens.get_type_ids(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(embedding_failure)?;

        let output = self
            .model
            .forward(&token_ids, &token_type_ids, None)
            .map_err(embedding_failure)?;

        let pooled = self.mean_pooling(&output, tokens.get_attention_mask())?;
        pooled.to_vec1::<f32>().map_err(embedding_failure)
    }

    /// Mean pooling over token embeddings, weighted by the attention mask.
    fn mean_pooling(&self, embeddings: &Tensor, attention_mask: &[u32]) -> Result<Tensor> {
        // embeddings: [1, seq_len, hidden], mask reshaped to [1, seq_len, 1]
        // so broadcasting lines up.
        let mask = Tensor::new(attention_mask, &self.device)
            .and_then(|t| t.to_dtype(DType::F32))
            .and_then(|t| t.unsqueeze(0))
            .and_then(|t| t.unsqueeze(2))
            .map_err(embedding_failure)?;

        let masked = embeddings.broadcast_mul(&mask).map_err(embedding_failure)?;
        let sum = masked.sum(1).map_err(embedding_failure)?;
        let count = mask
            .sum(1)
            .and_then(|t| t.clamp(1f32, f32::INFINITY))
            .map_err(embedding_failure)?;
        sum.broadcast_div(&count)
            .and_then(|t| t.squeeze(0))
            .map_err(embedding_failure)
    }
}

impl Embedder for MiniLmEmbedder {
    fn dimension(&self) -> usize {
        MINILM_DIMENSION
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.encode(text)).collect()
    }
}

fn embedding_failure(err: impl std::fmt::Display) -> RetrievalError {
    RetrievalError::EmbeddingFailure(err.to_string())
}
