// Copyright 2022-2023 pyke.io
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// 	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{fs, path::Path};

use anyhow::Context;

use crate::{
	config::ConverterOptions,
	hub::ModelSource,
	layout::ModelLayout,
	tokenizer::{self, build_unigram_tokenizer, save_tokenizer}
};

/// Which kind of tokenizer [`ensure_tokenizers`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerOutcome {
	/// `source_tokenizer.json`, `target_tokenizer.json` and the legacy `tokenizer.json` copy were written.
	Unigram,
	/// Unigram generation failed, so only a word-level `tokenizer.json` was written.
	Fallback {
		/// Why Unigram generation failed.
		reason: String
	}
}

/// Derives tokenizers for the model in `dir` from its `vocab.json`, `source.spm` and `target.spm`.
///
/// Missing inputs abort with [`ConvertError::NotFound`](crate::ConvertError::NotFound). Any other failure while
/// generating the Unigram tokenizers is logged and degrades to the word-level fallback; only a failure to write the
/// fallback itself is returned.
pub fn ensure_tokenizers(dir: impl AsRef<Path>, options: &ConverterOptions) -> anyhow::Result<TokenizerOutcome> {
	let layout = ModelLayout::new(dir.as_ref());
	layout.require_tokenizer_assets()?;

	match write_unigram_tokenizers(&layout, options.missing_token_score) {
		Ok(()) => {
			tracing::info!("  ✓ Tokenizers generated (source_tokenizer.json, target_tokenizer.json)");
			Ok(TokenizerOutcome::Unigram)
		}
		Err(e) => {
			tracing::warn!("  ⚠ Tokenizer generation failed: {e:#}");
			tracing::warn!("  Falling back to basic tokenizer.json from vocab.json (quality will be poor).");
			tokenizer::write_fallback_tokenizer(&layout.vocab(), &layout.legacy_tokenizer())?;
			tracing::info!("  ✓ Created basic tokenizer.json");
			Ok(TokenizerOutcome::Fallback { reason: format!("{e:#}") })
		}
	}
}

fn write_unigram_tokenizers(layout: &ModelLayout, missing_token_score: f64) -> anyhow::Result<()> {
	// build both directions before touching the filesystem
	let source = build_unigram_tokenizer(&layout.vocab(), &layout.source_spm(), missing_token_score).context("source tokenizer")?;
	let target = build_unigram_tokenizer(&layout.vocab(), &layout.target_spm(), missing_token_score).context("target tokenizer")?;

	save_tokenizer(&source, &layout.source_tokenizer())?;
	save_tokenizer(&target, &layout.target_tokenizer())?;

	fs::copy(layout.source_tokenizer(), layout.legacy_tokenizer()).context("failed to write legacy tokenizer.json")?;
	Ok(())
}

/// Fetches `model_id` into `output_dir` and derives its tokenizers.
///
/// If `output_dir` already holds `model.safetensors`, `vocab.json`, `source.spm` and `target.spm`, `source` is never
/// consulted and only the tokenizers are (re)derived, so this works offline once a model has been fetched.
pub fn download_and_convert(model_id: &str, output_dir: impl AsRef<Path>, source: &dyn ModelSource, options: &ConverterOptions) -> anyhow::Result<TokenizerOutcome> {
	let output_dir = output_dir.as_ref();
	fs::create_dir_all(output_dir).with_context(|| format!("failed to create {}", output_dir.display()))?;
	let layout = ModelLayout::new(output_dir);

	if layout.has_existing_model() {
		tracing::info!("  Found existing model files in {}", output_dir.display());
		return ensure_tokenizers(output_dir, options);
	}

	tracing::info!("  Fetching tokenizer files for {model_id}...");
	source.fetch_tokenizer_files(model_id, &layout)?;

	tracing::info!("  Generating tokenizer JSON files...");
	let outcome = ensure_tokenizers(output_dir, options)?;

	tracing::info!("  Saving model as safetensors...");
	source.fetch_weights(model_id, &layout)?;

	tracing::info!("  Done! Model saved to {}", output_dir.display());
	Ok(outcome)
}
