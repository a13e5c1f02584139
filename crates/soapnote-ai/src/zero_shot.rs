//! Embedding-similarity zero-shot classification over ONNX Runtime.
//!
//! Uses a sentence-transformers model (e.g. all-MiniLM-L6-v2). The model
//! directory must contain `model.onnx` and `tokenizer.json`. Each candidate
//! description is scored by cosine similarity to the input sentence and the
//! scores are softmax-normalised.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use soapnote_core::{CapabilityError, ZeroShotClassifier, ZeroShotOutput};
use tokenizers::Tokenizer;
use tracing::info;

const CAPABILITY: &str = "zero-shot";

/// Softmax temperature applied to cosine similarities, which sit in a
/// narrow band for short clinical sentences.
const TEMPERATURE: f32 = 0.05;

/// Mean-pooled, L2-normalised sentence embeddings.
pub struct SentenceEncoder {
    session: Session,
    tokenizer: Tokenizer,
    dim: usize,
}

impl SentenceEncoder {
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let dim = infer_dim(session.outputs()[0].dtype()).unwrap_or(384);

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: 256,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams::default()));

        info!(dim, model = %model_path.display(), "loaded sentence encoder");
        Ok(Self {
            session,
            tokenizer,
            dim,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// One unit-length vector per input text.
    pub fn encode_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let batch_size = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;
        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];
        for (i, encoding) in encodings.iter().enumerate() {
            let row = i * seq_len;
            let columns = encoding
                .get_ids()
                .iter()
                .zip(encoding.get_attention_mask())
                .zip(encoding.get_type_ids());
            for (j, ((&id, &mask), &type_id)) in columns.enumerate() {
                input_ids[row + j] = id as i64;
                attention_mask[row + j] = mask as i64;
                token_type_ids[row + j] = type_id as i64;
            }
        }

        let shape = [batch_size as i64, seq_len as i64];
        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.clone().into_boxed_slice()))?;
        let type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
            "token_type_ids" => type_tensor,
        ])?;

        // Token embeddings: [batch, seq, dim].
        let (output_shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] as usize == batch_size && dims[2] as usize == self.dim,
            "unexpected output shape: {dims:?}, expected [{batch_size}, {seq_len}, {}]",
            self.dim
        );
        let out_seq = dims[1] as usize;

        let mut vectors = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let mut pooled = vec![0.0f32; self.dim];
            let mut tokens = 0.0f32;
            for j in 0..out_seq.min(seq_len) {
                if attention_mask[i * seq_len + j] == 0 {
                    continue;
                }
                let offset = (i * out_seq + j) * self.dim;
                for (d, p) in pooled.iter_mut().enumerate() {
                    *p += data[offset + d];
                }
                tokens += 1.0;
            }
            if tokens > 0.0 {
                pooled.iter_mut().for_each(|p| *p /= tokens);
            }
            l2_normalize(&mut pooled);
            vectors.push(pooled);
        }
        Ok(vectors)
    }
}

/// [`ZeroShotClassifier`] that ranks candidates by embedding similarity.
///
/// Candidate embeddings are cached; the same four section descriptions are
/// asked for on every sentence.
pub struct EmbeddingZeroShot {
    inner: Mutex<Inner>,
}

struct Inner {
    encoder: SentenceEncoder,
    candidates: HashMap<String, Vec<f32>>,
}

impl EmbeddingZeroShot {
    pub fn new(encoder: SentenceEncoder) -> Self {
        Self {
            inner: Mutex::new(Inner {
                encoder,
                candidates: HashMap::new(),
            }),
        }
    }

    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(SentenceEncoder::load(model_dir)?))
    }

    fn rank(&self, text: &str, labels: &[&str]) -> anyhow::Result<ZeroShotOutput> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("encoder lock poisoned"))?;
        let Inner {
            encoder,
            candidates,
        } = &mut *inner;

        let missing: Vec<&str> = labels
            .iter()
            .copied()
            .filter(|l| !candidates.contains_key(*l))
            .collect();
        if !missing.is_empty() {
            let vectors = encoder.encode_batch(&missing)?;
            for (label, v) in missing.iter().zip(vectors) {
                candidates.insert(label.to_string(), v);
            }
        }

        let sentence = encoder
            .encode_batch(&[text])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("encoder returned no vector"))?;

        let similarities: Vec<f32> = labels
            .iter()
            .map(|l| candidates.get(*l).map_or(0.0, |c| dot(&sentence, c)))
            .collect();
        let scores = softmax(&similarities, TEMPERATURE);

        let mut ranked: Vec<(&str, f32)> = labels.iter().copied().zip(scores).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(ZeroShotOutput {
            labels: ranked.iter().map(|(l, _)| l.to_string()).collect(),
            scores: ranked.iter().map(|(_, s)| *s).collect(),
        })
    }
}

impl ZeroShotClassifier for EmbeddingZeroShot {
    fn classify(
        &self,
        text: &str,
        candidate_labels: &[&str],
    ) -> Result<ZeroShotOutput, CapabilityError> {
        self.rank(text, candidate_labels)
            .map_err(|e| CapabilityError::failed(CAPABILITY, format!("{e:#}")))
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

fn softmax(values: &[f32], temperature: f32) -> Vec<f32> {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = values
        .iter()
        .map(|v| ((v - max) / temperature).exp())
        .collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}
