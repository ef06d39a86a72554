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

//! Marian `vocab.json` handling.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};

/// The unknown token. Every Marian vocabulary must contain it.
pub const UNK_TOKEN: &str = "<unk>";
/// The padding token.
pub const PAD_TOKEN: &str = "<pad>";
/// The end-of-sentence token.
pub const EOS_TOKEN: &str = "</s>";

/// A token-to-id mapping, as stored in a Marian model's `vocab.json`.
///
/// The ids define the embedding rows of the model, so a tokenizer derived from this vocabulary must preserve them
/// exactly. A usable vocabulary is dense: ids run from `0` to `len() - 1` with every id assigned to exactly one token.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary(BTreeMap<String, u32>);

impl Vocabulary {
	/// Reads a vocabulary from a `vocab.json` file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
		let bytes = std::fs::read(path)?;
		Self::from_json(bytes)
	}

	/// Parses a vocabulary from JSON bytes.
	pub fn from_json<B: AsRef<[u8]>>(bytes: B) -> Result<Self> {
		Ok(serde_json::from_slice(bytes.as_ref())?)
	}

	/// Returns the number of tokens in the vocabulary.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` if the vocabulary has no tokens.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns the id of `token`, if present.
	pub fn get(&self, token: &str) -> Option<u32> {
		self.0.get(token).copied()
	}

	/// Returns the id of a token the model requires, failing with [`ConvertError::MissingToken`] if it is absent.
	pub fn special_id(&self, token: &str) -> Result<u32> {
		self.get(token).ok_or_else(|| ConvertError::MissingToken(token.to_string()))
	}

	/// Returns the id of [`UNK_TOKEN`].
	pub fn unk_id(&self) -> Result<u32> {
		self.special_id(UNK_TOKEN)
	}

	/// Returns the largest id in the vocabulary.
	pub fn max_id(&self) -> Option<u32> {
		self.0.values().copied().max()
	}

	/// Iterates over `(token, id)` pairs in token order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
		self.0.iter().map(|(token, id)| (token.as_str(), *id))
	}

	/// Lays the vocabulary out by id, so that `tokens[id]` is the token string for `id`.
	///
	/// Fails if the vocabulary is empty, if its ids are not contiguous from zero, or if an id is shared by more than
	/// one token.
	pub fn tokens_by_id(&self) -> Result<Vec<&str>> {
		let max_id = self.max_id().ok_or(ConvertError::EmptyVocabulary)?;
		let vocab_size = self.len();
		if vocab_size != max_id as usize + 1 {
			return Err(ConvertError::NonContiguous { vocab_size, max_id });
		}

		let mut slots: Vec<Option<&str>> = vec![None; vocab_size];
		for (token, id) in self.iter() {
			let slot = &mut slots[id as usize];
			if let Some(first) = slot {
				return Err(ConvertError::DuplicateId {
					id,
					first: first.to_string(),
					second: token.to_string()
				});
			}
			*slot = Some(token);
		}

		slots
			.into_iter()
			.enumerate()
			.map(|(id, slot)| slot.ok_or(ConvertError::Gap { id: id as u32 }))
			.collect()
	}

	/// Checks that the vocabulary can back a tokenizer: ids must be contiguous from zero and [`UNK_TOKEN`] must be
	/// present.
	pub fn validate(&self) -> Result<()> {
		self.tokens_by_id()?;
		self.unk_id()?;
		Ok(())
	}
}

impl FromIterator<(String, u32)> for Vocabulary {
	fn from_iter<T: IntoIterator<Item = (String, u32)>>(iter: T) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl<'s> FromIterator<(&'s str, u32)> for Vocabulary {
	fn from_iter<T: IntoIterator<Item = (&'s str, u32)>>(iter: T) -> Self {
		Self(iter.into_iter().map(|(token, id)| (token.to_string(), id)).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::{Vocabulary, UNK_TOKEN};
	use crate::error::ConvertError;

	fn vocab(entries: &[(&str, u32)]) -> Vocabulary {
		entries.iter().copied().collect()
	}

	#[test]
	fn test_tokens_by_id() {
		let v = vocab(&[("</s>", 0), ("<unk>", 1), ("▁hola", 2), ("<pad>", 3)]);
		assert_eq!(v.tokens_by_id().unwrap(), vec!["</s>", "<unk>", "▁hola", "<pad>"]);
		assert!(v.validate().is_ok());
	}

	#[test]
	fn test_parse_vocab_json() {
		let v = Vocabulary::from_json(r#"{"</s>": 0, "<unk>": 1, "<pad>": 2}"#).unwrap();
		assert_eq!(v.len(), 3);
		assert_eq!(v.unk_id().unwrap(), 1);
		assert!(Vocabulary::from_json(r#"{"</s>": "zero"}"#).is_err());
	}

	#[test]
	fn test_non_contiguous() {
		let v = vocab(&[("<unk>", 0), ("a", 1), ("b", 5)]);
		assert!(matches!(v.tokens_by_id(), Err(ConvertError::NonContiguous { vocab_size: 3, max_id: 5 })));
	}

	#[test]
	fn test_shared_id() {
		let v = vocab(&[("a", 0), ("b", 0), ("c", 2)]);
		match v.tokens_by_id() {
			Err(ConvertError::DuplicateId { id, first, second }) => {
				assert_eq!(id, 0);
				assert_eq!(first, "a");
				assert_eq!(second, "b");
			}
			other => panic!("expected DuplicateId, got {other:?}")
		}
	}

	#[test]
	fn test_empty() {
		assert!(matches!(Vocabulary::default().validate(), Err(ConvertError::EmptyVocabulary)));
	}

	#[test]
	fn test_missing_unk() {
		let v = vocab(&[("</s>", 0), ("<pad>", 1)]);
		assert!(v.tokens_by_id().is_ok());
		assert!(matches!(v.validate(), Err(ConvertError::MissingToken(t)) if t == UNK_TOKEN));
	}
}
