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

use tokenizers::{
	decoders::DecoderWrapper,
	models::unigram::Unigram,
	normalizers::{unicode::NFKC, NormalizerWrapper},
	pre_tokenizers::{
		metaspace::{Metaspace, PrependScheme},
		PreTokenizerWrapper
	},
	processors::PostProcessorWrapper,
	ModelWrapper, Tokenizer, TokenizerBuilder
};

use crate::{error::Result, spm::PieceScores, vocab::Vocabulary};

/// Score given to vocabulary tokens that the SentencePiece model does not know. Low enough that Unigram segmentation
/// never picks them.
pub const MISSING_TOKEN_SCORE: f64 = -1.0e9;

const METASPACE_REPLACEMENT: char = '▁';

/// A Unigram lookup table indexed by vocabulary id.
///
/// Ids come from `vocab.json` (they must match the model's embedding rows), scores come from the direction's
/// SentencePiece model.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenTable {
	entries: Vec<(String, f64)>,
	unk_id: usize,
	missing: usize
}

impl TokenTable {
	/// Builds the table. Tokens absent from `scores` get `missing_score`.
	///
	/// Fails before producing anything if the vocabulary is not contiguous from zero or lacks `<unk>`.
	pub fn build(vocab: &Vocabulary, scores: &PieceScores, missing_score: f64) -> Result<Self> {
		let tokens = vocab.tokens_by_id()?;
		let unk_id = vocab.unk_id()? as usize;

		let mut missing = 0;
		let entries: Vec<(String, f64)> = tokens
			.into_iter()
			.map(|token| {
				let score = scores.get(token).copied().unwrap_or_else(|| {
					missing += 1;
					missing_score
				});
				(token.to_string(), score)
			})
			.collect();

		Ok(Self { entries, unk_id, missing })
	}

	/// Returns the number of entries, which equals the vocabulary size.
	#[allow(clippy::len_without_is_empty)]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns the `(token, score)` entry for `id`.
	pub fn get(&self, id: usize) -> Option<(&str, f64)> {
		self.entries.get(id).map(|(token, score)| (token.as_str(), *score))
	}

	/// Returns the id of the unknown token.
	pub fn unk_id(&self) -> usize {
		self.unk_id
	}

	/// Returns how many tokens received the missing-token score.
	pub fn missing(&self) -> usize {
		self.missing
	}

	/// Turns the table into a SentencePiece-style Unigram tokenizer: NFKC normalization, `▁` metaspace
	/// pre-tokenization (always prepended, split on whitespace) and the matching metaspace decoder.
	pub fn into_tokenizer(self) -> anyhow::Result<Tokenizer> {
		let model = Unigram::from(self.entries, Some(self.unk_id), false).map_err(|e| anyhow::anyhow!("{e:?}"))?;
		let metaspace = Metaspace::new(METASPACE_REPLACEMENT, PrependScheme::Always, true);

		let tokenizer = TokenizerBuilder::<ModelWrapper, NormalizerWrapper, PreTokenizerWrapper, PostProcessorWrapper, DecoderWrapper>::new()
			.with_model(ModelWrapper::Unigram(model))
			.with_normalizer(Some(NormalizerWrapper::NFKC(NFKC)))
			.with_pre_tokenizer(Some(PreTokenizerWrapper::Metaspace(metaspace.clone())))
			.with_post_processor(None)
			.with_decoder(Some(DecoderWrapper::Metaspace(metaspace)))
			.build()
			.map_err(|e| anyhow::anyhow!("{e:?}"))?;
		Ok(tokenizer.into())
	}
}
