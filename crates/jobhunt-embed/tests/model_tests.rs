use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tempfile::TempDir;

use jobhunt_embed::{Embedder, MiniLmEmbedder};

const TINY_BERT: &str = r#"{
  "vocab_size": 8, "hidden_size": 4, "num_hidden_layers": 1, "num_attention_heads": 1,
  "intermediate_size": 8, "hidden_act": "gelu", "hidden_dropout_prob": 0.0,
  "max_position_embeddings": 16, "type_vocab_size": 2, "initializer_range": 0.02,
  "layer_norm_eps": 1e-12, "pad_token_id": 0, "position_embedding_type": "absolute",
  "use_cache": true, "classifier_dropout": null, "model_type": "bert"
}"#;

const TINY_TOKENIZER: &str = r#"{
  "version": "1.0", "truncation": null, "padding": null, "added_tokens": [],
  "normalizer": null, "pre_tokenizer": {"type": "Whitespace"},
  "post_processor": null, "decoder": null,
  "model": {"type": "WordLevel", "vocab": {"[PAD]": 0, "[UNK]": 1, "rust": 2, "sql": 3, "python": 4}, "unk_token": "[UNK]"}
}"#;

/// Writes a randomly initialised one-layer BERT as `model.safetensors`.
fn tiny_model_dir() -> anyhow::Result<TempDir> {
    let tmp = TempDir::new()?;
    std::fs::write(tmp.path().join("config.json"), TINY_BERT)?;
    std::fs::write(tmp.path().join("tokenizer.json"), TINY_TOKENIZER)?;
    let config: BertConfig = serde_json::from_str(TINY_BERT)?;
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    BertModel::load(vb, &config)?;
    varmap.save(tmp.path().join("model.safetensors"))?;
    Ok(tmp)
}

#[test]
fn loads_safetensors_weights_and_embeds() -> anyhow::Result<()> {
    let dir = tiny_model_dir()?;
    let embedder = MiniLmEmbedder::from_dir(dir.path(), "tiny", 8)?;
    assert_eq!(embedder.dim(), 4);
    assert_eq!(embedder.embedder_id(), "minilm:tiny:d4");

    let texts = vec!["rust sql".to_string(), "python".to_string()];
    let vectors = embedder.embed_batch(&texts)?;
    assert_eq!(vectors.len(), 2);
    for v in &vectors {
        assert_eq!(v.len(), 4);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() <= 1e-3, "pooled output is L2-normalized (norm={norm})");
    }
    assert!(embedder.embed("  ").is_err());
    Ok(())
}
