use anyhow::{Result, anyhow, bail};
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tokenizers::Tokenizer;

use jobhunt_core::config::{expand_path, EmbeddingSettings};
pub use jobhunt_core::traits::Embedder;

pub mod device;
pub mod pool;
pub mod tokenize;

pub use pool::masked_mean_l2;

/// Sentence-transformer (BERT family, e.g. all-MiniLM-L6-v2) loaded from a
/// local directory holding `tokenizer.json`, `config.json` and
/// `model.safetensors` or `pytorch_model.bin`.
pub struct MiniLmEmbedder { model: BertModel, tokenizer: Tokenizer, device: Device, id: String, dim: usize, max_len: usize, pad_id: u32 }

impl MiniLmEmbedder {
    pub fn from_dir(model_dir: &Path, model_name: &str, max_len: usize) -> Result<Self> {
        let device = device::select_device();
        tracing::info!(model = model_name, dir = %model_dir.display(), "loading embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let safetensors = model_dir.join("model.safetensors");
        let vb = if safetensors.exists() {
            VarBuilder::from_buffered_safetensors(std::fs::read(&safetensors)?, DTYPE, &device)?
        } else {
            VarBuilder::from_pth(model_dir.join("pytorch_model.bin"), DTYPE, &device)?
        };
        let model = BertModel::load(vb, &config)?;
        let pad_id = tokenizer.token_to_id("[PAD]").unwrap_or(0);
        let dim = config.hidden_size;
        tracing::info!(model = model_name, dim, "embedding model loaded");
        Ok(Self { model, tokenizer, device, id: format!("minilm:{}:d{}", model_name, dim), dim, max_len, pad_id })
    }

    fn forward(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize::tokenize_batch(&self.tokenizer, texts, self.max_len, self.pad_id, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled: Tensor = masked_mean_l2(&hidden, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        tracing::debug!(batch = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(vectors)
    }
}

impl Embedder for MiniLmEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?.pop().ok_or_else(|| anyhow!("model returned no embedding"))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        reject_blank(texts)?;
        self.forward(texts)
    }
}

/// Deterministic hashed bag-of-words embedder. No model files; used in tests
/// and when `APP_USE_FAKE_EMBEDDINGS=1`.
pub struct FakeEmbedder { dim: usize, id: String }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim, id: format!("fake:xxh64:d{}", dim) } }
}

impl Embedder for FakeEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        use std::hash::{Hash, Hasher}; use twox_hash::XxHash64;
        if text.trim().is_empty() { bail!("cannot embed blank text"); }
        if self.dim == 0 { bail!("fake embedder dimension must be positive"); }
        let mut v = vec![0f32; self.dim];
        let tokens = text
            .split(|c: char| !c.is_alphanumeric() && c != '+' && c != '#' && c != '.')
            .map(|t| t.trim_matches('.').to_lowercase())
            .filter(|t| !t.is_empty());
        for token in tokens {
            let mut hasher = XxHash64::with_seed(0); token.hash(&mut hasher); let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            v[idx] += 0.5 + (((h >> 32) as u32) as f32) / (u32::MAX as f32);
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm == 0.0 { bail!("text has no embeddable tokens"); }
        for x in &mut v { *x /= norm; }
        Ok(v)
    }
}

fn reject_blank(texts: &[String]) -> Result<()> {
    if let Some(i) = texts.iter().position(|t| t.trim().is_empty()) { bail!("cannot embed blank text (batch index {})", i); }
    Ok(())
}

fn fake_requested(settings: &EmbeddingSettings) -> bool {
    settings.use_fake || std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    if fake_requested(settings) {
        tracing::info!(dim = settings.fake_dim, "using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(settings.fake_dim)));
    }
    let model_dir = resolve_model_dir(settings)?;
    Ok(Box::new(MiniLmEmbedder::from_dir(&model_dir, &settings.model, settings.max_len)?))
}

fn resolve_model_dir(settings: &EmbeddingSettings) -> Result<PathBuf> {
    let mut candidates: Vec<(&str, PathBuf)> = Vec::new();
    if let Some(dir) = &settings.model_dir { candidates.push(("embedding.model_dir", expand_path(dir))); }
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") { candidates.push(("APP_MODEL_DIR", expand_path(dir))); }
    if let Ok(dir) = std::env::var("MODEL_DIR") { candidates.push(("MODEL_DIR", expand_path(dir))); }
    candidates.push(("default", Path::new("models").join(&settings.model)));
    for (origin, p) in &candidates {
        if p.exists() { tracing::info!(origin = *origin, dir = %p.display(), "using model dir"); return Ok(p.clone()); }
        tracing::debug!(origin = *origin, dir = %p.display(), "model dir not found");
    }
    Err(anyhow!("Could not locate model directory for '{}' (set embedding.model_dir or APP_MODEL_DIR)", settings.model))
}
