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

use std::{fs::File, io::BufWriter, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
	error::Result,
	vocab::{Vocabulary, EOS_TOKEN, PAD_TOKEN, UNK_TOKEN}
};

/// An entry of `added_tokens`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpecialToken {
	/// Id from the vocabulary.
	pub id: u32,
	/// The token string, e.g. `<pad>`.
	pub content: String,
	/// Only match the token as a whole word.
	pub single_word: bool,
	/// Strip whitespace to the left of the token.
	pub lstrip: bool,
	/// Strip whitespace to the right of the token.
	pub rstrip: bool,
	/// Match against normalized input.
	pub normalized: bool,
	/// Skip the token when decoding with `skip_special_tokens`.
	pub special: bool
}

impl SpecialToken {
	fn new(vocab: &Vocabulary, content: &str) -> Result<Self> {
		Ok(Self {
			id: vocab.special_id(content)?,
			content: content.to_string(),
			single_word: false,
			lstrip: false,
			rstrip: false,
			normalized: false,
			special: true
		})
	}
}

/// Normalizer of the fallback tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum FallbackNormalizer {
	/// Unicode canonical composition.
	NFC
}

/// Pre-tokenizer of the fallback tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum FallbackPreTokenizer {
	/// Split on whitespace only.
	WhitespaceSplit
}

/// Model of the fallback tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum FallbackModel {
	/// Whole-word lookup in `vocab`, mapping anything else to `unk_token`.
	WordLevel {
		/// The full `vocab.json` mapping.
		vocab: Vocabulary,
		/// Token used for out-of-vocabulary words.
		unk_token: String
	}
}

/// A minimal word-level `tokenizer.json`, written when a Unigram tokenizer cannot be derived.
///
/// Inference runtimes can load it, but it splits on whitespace only, so translation quality with it is poor. It
/// always carries exactly three special tokens: `<pad>`, `</s>` and `<unk>`, with their ids taken from the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FallbackTokenizer {
	/// Serialization format version, always `1.0`.
	pub version: String,
	/// Always `null`.
	pub truncation: Option<()>,
	/// Always `null`.
	pub padding: Option<()>,
	/// `<pad>`, `</s>` and `<unk>`, in that order.
	pub added_tokens: Vec<SpecialToken>,
	/// Unicode normalization applied before splitting.
	pub normalizer: FallbackNormalizer,
	/// Whitespace splitting.
	pub pre_tokenizer: FallbackPreTokenizer,
	/// Always `null`.
	pub post_processor: Option<()>,
	/// Always `null`.
	pub decoder: Option<()>,
	/// The word-level model.
	pub model: FallbackModel
}

impl FallbackTokenizer {
	/// Builds the fallback description. Fails if any of the three special tokens is missing from `vocab`.
	pub fn from_vocab(vocab: &Vocabulary) -> Result<Self> {
		let added_tokens = [PAD_TOKEN, EOS_TOKEN, UNK_TOKEN]
			.into_iter()
			.map(|content| SpecialToken::new(vocab, content))
			.collect::<Result<Vec<_>>>()?;
		Ok(Self {
			version: "1.0".to_string(),
			truncation: None,
			padding: None,
			added_tokens,
			normalizer: FallbackNormalizer::NFC,
			pre_tokenizer: FallbackPreTokenizer::WhitespaceSplit,
			post_processor: None,
			decoder: None,
			model: FallbackModel::WordLevel {
				vocab: vocab.clone(),
				unk_token: UNK_TOKEN.to_string()
			}
		})
	}

	/// Writes the description as pretty-printed JSON.
	pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
		let writer = BufWriter::new(File::create(path)?);
		serde_json::to_writer_pretty(writer, self)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use tokenizers::{ModelWrapper, Tokenizer};

	use super::{FallbackModel, FallbackTokenizer};
	use crate::{error::ConvertError, vocab::Vocabulary};

	fn vocab() -> Vocabulary {
		[("</s>", 0), ("<unk>", 1), ("hola", 2), ("<pad>", 3)].into_iter().collect()
	}

	#[test]
	fn test_exactly_three_specials() {
		let fallback = FallbackTokenizer::from_vocab(&vocab()).unwrap();
		let specials: Vec<(&str, u32)> = fallback.added_tokens.iter().map(|t| (t.content.as_str(), t.id)).collect();
		assert_eq!(specials, vec![("<pad>", 3), ("</s>", 0), ("<unk>", 1)]);
		assert!(fallback.added_tokens.iter().all(|t| t.special && !t.normalized));
		assert!(matches!(&fallback.model, FallbackModel::WordLevel { vocab: v, .. } if v.len() == 4));
	}

	#[test]
	fn test_missing_special() {
		let vocab: Vocabulary = [("</s>", 0), ("<unk>", 1)].into_iter().collect();
		assert!(matches!(FallbackTokenizer::from_vocab(&vocab), Err(ConvertError::MissingToken(t)) if t == "<pad>"));
	}

	#[test]
	fn test_serialized_form() {
		let json = serde_json::to_value(FallbackTokenizer::from_vocab(&vocab()).unwrap()).unwrap();
		assert_eq!(json["version"], "1.0");
		assert!(json["truncation"].is_null());
		assert!(json["decoder"].is_null());
		assert_eq!(json["normalizer"]["type"], "NFC");
		assert_eq!(json["pre_tokenizer"]["type"], "WhitespaceSplit");
		assert_eq!(json["model"]["type"], "WordLevel");
		assert_eq!(json["model"]["unk_token"], "<unk>");
		assert_eq!(json["model"]["vocab"]["hola"], 2);
	}

	#[test]
	fn test_loads_as_tokenizer() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("tokenizer.json");
		FallbackTokenizer::from_vocab(&vocab()).unwrap().save(&path).unwrap();

		let tokenizer = Tokenizer::from_file(&path).unwrap();
		assert!(matches!(tokenizer.get_model(), ModelWrapper::WordLevel(_)));
		assert_eq!(tokenizer.token_to_id("hola"), Some(2));
	}
}
