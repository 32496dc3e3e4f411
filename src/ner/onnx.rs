// Local ONNX named-entity recognizer (BERT token classification).
//
// Model: bert-base-NER exported to ONNX. The model predicts one BIO tag per
// word-piece token (B-PER, I-PER, B-ORG, ...). Tags are read from the model's
// `config.json` (id2label) so any token-classification export with the same
// inputs can be dropped in, including OntoNotes-trained ones.
//
// Word pieces are merged back into entity spans with the tokenizer's byte
// offsets; the first piece of a word decides the word's tag.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::debug;

use super::labels::canonical_label;
use super::traits::{Entity, EntityRecognizer};

/// Subset of the HuggingFace model config we need.
#[derive(Debug, Deserialize)]
struct ModelConfig {
    id2label: HashMap<String, String>,
}

/// ONNX token-classification NER. Session behind Arc<Mutex> because
/// `Session::run` needs `&mut self` and the recognizer is shared across the
/// pipeline worker.
pub struct OnnxEntityRecognizer {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    id2label: Vec<String>,
}

impl OnnxEntityRecognizer {
    /// Load the NER model, tokenizer and label map from `model_dir`.
    ///
    /// Expects `model.onnx`, `tokenizer.json` and `config.json`.
    /// Call `download_model()` first if they don't exist.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let config_path = model_dir.join("config.json");

        for path in [&model_path, &tokenizer_path, &config_path] {
            if !path.exists() {
                anyhow::bail!(
                    "NER model file not found: {}\nRun `kwcluster download-model` to download it.",
                    path.display()
                );
            }
        }

        let config_json = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let id2label = parse_id2label(&config_json)?;

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load NER model from {}", model_path.display()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load NER tokenizer: {}", e))?;

        debug!(
            labels = id2label.len(),
            "Loaded ONNX NER model from {}",
            model_dir.display()
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            id2label,
        })
    }
}

impl EntityRecognizer for OnnxEntityRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        let mut results = self.recognize_batch(&[text.to_string()])?;
        Ok(results.pop().unwrap_or_default())
    }

    /// One forward pass for the whole batch, then per-text span decoding.
    fn recognize_batch(&self, texts: &[String]) -> Result<Vec<Vec<Entity>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings: Vec<_> = texts
            .iter()
            .map(|t| {
                self.tokenizer
                    .encode(t.as_str(), true)
                    .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let batch_size = encodings.len();
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);
        if max_len == 0 {
            return Ok(vec![Vec::new(); batch_size]);
        }

        // Right-pad to max_len (BERT pad token id = 0)
        let mut input_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let mut attention_mask_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let token_type_ids_flat: Vec<i64> = vec![0; batch_size * max_len];

        for enc in &encodings {
            let ids = enc.get_ids();
            let pad_len = max_len - ids.len();
            input_ids_flat.extend(ids.iter().map(|&id| id as i64));
            attention_mask_flat.extend(enc.get_attention_mask().iter().map(|&m| m as i64));
            input_ids_flat.extend(std::iter::repeat_n(0i64, pad_len));
            attention_mask_flat.extend(std::iter::repeat_n(0i64, pad_len));
        }

        let shape = [batch_size as i64, max_len as i64];
        let input_ids_tensor =
            Tensor::from_array((shape, input_ids_flat)).context("Failed to create input_ids tensor")?;
        let attention_mask_tensor = Tensor::from_array((shape, attention_mask_flat))
            .context("Failed to create attention_mask tensor")?;
        let token_type_ids_tensor = Tensor::from_array((shape, token_type_ids_flat))
            .context("Failed to create token_type_ids tensor")?;

        // Output: logits [batch, max_len, num_labels]
        let logits = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

            let outputs = session
                .run(ort::inputs! {
                    "input_ids" => input_ids_tensor,
                    "attention_mask" => attention_mask_tensor,
                    "token_type_ids" => token_type_ids_tensor
                })
                .context("NER ONNX inference failed")?;

            let (_shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Failed to extract NER output tensor")?;

            data.to_vec()
        };

        let num_labels = self.id2label.len();
        if logits.len() != batch_size * max_len * num_labels {
            anyhow::bail!(
                "NER output has {} values, expected {} (batch {} x len {} x labels {})",
                logits.len(),
                batch_size * max_len * num_labels,
                batch_size,
                max_len,
                num_labels
            );
        }

        let mut results = Vec::with_capacity(batch_size);
        for (i, (text, enc)) in texts.iter().zip(&encodings).enumerate() {
            let seq_len = enc.get_ids().len();
            let tokens: Vec<TokenTag> = (0..seq_len)
                .map(|j| {
                    let offset = (i * max_len + j) * num_labels;
                    let best = argmax(&logits[offset..offset + num_labels]);
                    TokenTag {
                        offset: enc.get_offsets()[j],
                        word: enc.get_word_ids()[j],
                        tag: self.id2label[best].as_str(),
                    }
                })
                .collect();

            let entities = decode_entities(text, &tokens);
            debug!(
                entities = entities.len(),
                text_preview = %crate::output::truncate_chars(text, 50),
                "NER tagged text"
            );
            results.push(entities);
        }

        Ok(results)
    }
}

/// Build the index → tag table from a HuggingFace `config.json`.
fn parse_id2label(config_json: &str) -> Result<Vec<String>> {
    let config: ModelConfig =
        serde_json::from_str(config_json).context("NER config.json has no usable id2label")?;

    let mut pairs: Vec<(usize, String)> = config
        .id2label
        .into_iter()
        .map(|(k, v)| {
            k.parse::<usize>()
                .map(|idx| (idx, v))
                .with_context(|| format!("Non-numeric id2label key '{}'", k))
        })
        .collect::<Result<Vec<_>>>()?;
    pairs.sort_by_key(|(idx, _)| *idx);

    for (expected, (idx, _)) in pairs.iter().enumerate() {
        if *idx != expected {
            anyhow::bail!("id2label is not contiguous: missing index {}", expected);
        }
    }
    if pairs.is_empty() {
        anyhow::bail!("id2label is empty");
    }

    Ok(pairs.into_iter().map(|(_, label)| label).collect())
}

fn argmax(row: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }
    best
}

/// One model token with its predicted tag.
#[derive(Debug, Clone, Copy)]
struct TokenTag<'a> {
    /// Byte range in the source text.
    offset: (usize, usize),
    /// Word index; None for special tokens ([CLS], [SEP]).
    word: Option<u32>,
    tag: &'a str,
}

/// Split a BIO tag into (prefix, category). "O" and unknown categories map to
/// None.
fn split_tag(tag: &str) -> Option<(char, String)> {
    let (prefix, category) = match tag.split_once('-') {
        Some((p, c)) => (p.chars().next()?, c),
        None => return None,
    };
    if prefix != 'B' && prefix != 'I' {
        return None;
    }
    canonical_label(category).map(|label| (prefix, label))
}

struct OpenSpan {
    label: String,
    start: usize,
    end: usize,
    word: Option<u32>,
}

fn close_span(text: &str, span: Option<OpenSpan>, entities: &mut Vec<Entity>) {
    let Some(span) = span else {
        return;
    };
    if let Some(surface) = text.get(span.start..span.end) {
        let surface = surface.trim();
        if !surface.is_empty() {
            entities.push(Entity::new(surface, span.label));
        }
    }
}

/// Merge tagged word pieces into entity spans.
fn decode_entities(text: &str, tokens: &[TokenTag]) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut current: Option<OpenSpan> = None;
    let mut last_word: Option<u32> = None;

    for token in tokens {
        if token.word.is_none() {
            continue;
        }

        // Continuation piece: the word's first piece already decided its tag
        if token.word == last_word {
            if let Some(span) = current.as_mut().filter(|s| s.word == token.word) {
                span.end = span.end.max(token.offset.1);
            }
            continue;
        }
        last_word = token.word;

        match split_tag(token.tag) {
            None => close_span(text, current.take(), &mut entities),
            Some(('I', label)) if current.as_ref().is_some_and(|s| s.label == label) => {
                if let Some(span) = current.as_mut() {
                    span.end = token.offset.1;
                    span.word = token.word;
                }
            }
            Some((_, label)) => {
                close_span(text, current.take(), &mut entities);
                current = Some(OpenSpan {
                    label,
                    start: token.offset.0,
                    end: token.offset.1,
                    word: token.word,
                });
            }
        }
    }
    close_span(text, current.take(), &mut entities);

    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(offset: (usize, usize), word: Option<u32>, tag: &str) -> TokenTag<'_> {
        TokenTag { offset, word, tag }
    }

    #[test]
    fn test_parse_id2label_orders_by_index() {
        let json = r#"{"id2label": {"1": "B-PER", "0": "O", "2": "I-PER"}}"#;
        assert_eq!(parse_id2label(json).unwrap(), vec!["O", "B-PER", "I-PER"]);
    }

    #[test]
    fn test_parse_id2label_gap_fails() {
        let json = r#"{"id2label": {"0": "O", "2": "B-PER"}}"#;
        assert!(parse_id2label(json).is_err());
    }

    #[test]
    fn test_argmax_first_max() {
        assert_eq!(argmax(&[0.1, 0.9, 0.9, 0.2]), 1);
    }

    #[test]
    fn test_split_tag() {
        assert_eq!(split_tag("B-PER"), Some(('B', "PERSON".to_string())));
        assert_eq!(split_tag("I-LOC"), Some(('I', "LOC".to_string())));
        assert_eq!(split_tag("O"), None);
    }

    #[test]
    fn test_decode_multi_word_entity() {
        let text = "hotels in New York";
        let tokens = vec![
            tok((0, 0), None, "O"),
            tok((0, 6), Some(0), "O"),
            tok((7, 9), Some(1), "O"),
            tok((10, 13), Some(2), "B-LOC"),
            tok((14, 18), Some(3), "I-LOC"),
            tok((0, 0), None, "O"),
        ];
        assert_eq!(
            decode_entities(text, &tokens),
            vec![Entity::new("New York", "LOC")]
        );
    }

    #[test]
    fn test_decode_word_pieces_follow_first_piece() {
        // "Nikeland" split into "Nike" + "##land", second piece mis-tagged
        let text = "buy Nikeland shoes";
        let tokens = vec![
            tok((0, 3), Some(0), "O"),
            tok((4, 8), Some(1), "B-ORG"),
            tok((8, 12), Some(1), "O"),
            tok((13, 18), Some(2), "O"),
        ];
        assert_eq!(
            decode_entities(text, &tokens),
            vec![Entity::new("Nikeland", "ORG")]
        );
    }

    #[test]
    fn test_decode_continuation_of_plain_word_ignored() {
        let text = "buy sneakers";
        let tokens = vec![
            tok((0, 3), Some(0), "O"),
            tok((4, 9), Some(1), "O"),
            tok((9, 12), Some(1), "B-ORG"),
        ];
        assert!(decode_entities(text, &tokens).is_empty());
    }

    #[test]
    fn test_decode_adjacent_entities_split_on_b() {
        let text = "Paris London";
        let tokens = vec![
            tok((0, 5), Some(0), "B-LOC"),
            tok((6, 12), Some(1), "B-LOC"),
        ];
        assert_eq!(
            decode_entities(text, &tokens),
            vec![Entity::new("Paris", "LOC"), Entity::new("London", "LOC")]
        );
    }

    #[test]
    fn test_decode_stray_inside_tag_starts_entity() {
        let text = "meet Alice";
        let tokens = vec![tok((0, 4), Some(0), "O"), tok((5, 10), Some(1), "I-PER")];
        assert_eq!(
            decode_entities(text, &tokens),
            vec![Entity::new("Alice", "PERSON")]
        );
    }
}
