/// Text embedding capability consumed by the ranker.
///
/// Implementations must return vectors of the same dimensionality (`dim`) for
/// every input and must be deterministic for identical text.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `minilm:all-MiniLM-L6-v2:d384`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality (N).
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// Compute embeddings for a batch of input texts, one vector per text and
    /// in the same order.
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}
