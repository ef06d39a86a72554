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

//! Tokenizer descriptions derived from Marian vocabularies.
//!
//! Marian checkpoints ship one shared `vocab.json` (the id space of the model) and one SentencePiece model per
//! direction (the segmentation scores). The tokenizers crate has no Marian loader, so both are merged into a Unigram
//! tokenizer here. When that is not possible, [`FallbackTokenizer`] gives a degraded word-level tokenizer instead.

use std::path::Path;

use anyhow::Context;
use tokenizers::Tokenizer;

mod fallback;
mod unigram;

pub use self::fallback::{FallbackModel, FallbackNormalizer, FallbackPreTokenizer, FallbackTokenizer, SpecialToken};
pub use self::unigram::{TokenTable, MISSING_TOKEN_SCORE};
use crate::{
	spm::{PieceType, SentencePieceModel},
	vocab::Vocabulary
};

/// Builds the Unigram tokenizer for one translation direction from `vocab.json` and that direction's `.spm` file.
pub fn build_unigram_tokenizer(vocab_path: &Path, spm_path: &Path, missing_token_score: f64) -> anyhow::Result<Tokenizer> {
	let vocab = Vocabulary::from_file(vocab_path).with_context(|| format!("failed to read {}", vocab_path.display()))?;
	let spm = SentencePieceModel::from_file(spm_path).with_context(|| format!("failed to read {}", spm_path.display()))?;

	let table = TokenTable::build(&vocab, &spm.scores(), missing_token_score)?;
	tracing::debug!(
		spm = %spm_path.display(),
		vocab_size = table.len(),
		pieces = spm.len(),
		control_pieces = spm.count(PieceType::Control),
		missing = table.missing(),
		"built unigram table"
	);
	table.into_tokenizer()
}

/// Saves a tokenizer as `tokenizers` JSON.
pub fn save_tokenizer(tokenizer: &Tokenizer, path: &Path) -> anyhow::Result<()> {
	tokenizer.save(path, true).map_err(|e| anyhow::anyhow!("{e:?}")).with_context(|| format!("failed to write {}", path.display()))
}

/// Writes the word-level fallback tokenizer for the vocabulary at `vocab_path` to `output_path`.
pub fn write_fallback_tokenizer(vocab_path: &Path, output_path: &Path) -> crate::error::Result<()> {
	let vocab = Vocabulary::from_file(vocab_path)?;
	FallbackTokenizer::from_vocab(&vocab)?.save(output_path)
}
