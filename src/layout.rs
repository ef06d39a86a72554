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

//! File names inside a converted model directory.

use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};

/// Vocabulary shared by both directions, mapping token to id.
pub const VOCAB_FILE: &str = "vocab.json";
/// SentencePiece model of the source language.
pub const SOURCE_SPM_FILE: &str = "source.spm";
/// SentencePiece model of the target language.
pub const TARGET_SPM_FILE: &str = "target.spm";
/// Model weights.
pub const WEIGHTS_FILE: &str = "model.safetensors";
/// PyTorch checkpoint, converted to [`WEIGHTS_FILE`] when the hub has no safetensors.
pub const PYTORCH_WEIGHTS_FILE: &str = "pytorch_model.bin";
/// Marian model config.
pub const CONFIG_FILE: &str = "config.json";

/// Unigram tokenizer for source text.
pub const SOURCE_TOKENIZER_FILE: &str = "source_tokenizer.json";
/// Unigram tokenizer for target text.
pub const TARGET_TOKENIZER_FILE: &str = "target_tokenizer.json";
/// Shared tokenizer kept for older tooling. Holds a copy of the source tokenizer, or the fallback tokenizer.
pub const LEGACY_TOKENIZER_FILE: &str = "tokenizer.json";

/// Tokenizer assets a model source must provide.
pub const TOKENIZER_ASSETS: [&str; 3] = [VOCAB_FILE, SOURCE_SPM_FILE, TARGET_SPM_FILE];
/// Assets copied alongside the tokenizer when the hub has them.
pub const OPTIONAL_ASSETS: [&str; 4] = [CONFIG_FILE, "tokenizer_config.json", "special_tokens_map.json", "generation_config.json"];

/// Paths of a model directory, e.g. `models/opus-mt-en-es`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLayout {
	root: PathBuf
}

impl ModelLayout {
	/// Creates a layout rooted at `root`. Nothing is touched on disk.
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// The model directory.
	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Path of `name` inside the model directory.
	pub fn file(&self, name: &str) -> PathBuf {
		self.root.join(name)
	}

	/// Path of [`VOCAB_FILE`].
	pub fn vocab(&self) -> PathBuf {
		self.file(VOCAB_FILE)
	}

	/// Path of [`SOURCE_SPM_FILE`].
	pub fn source_spm(&self) -> PathBuf {
		self.file(SOURCE_SPM_FILE)
	}

	/// Path of [`TARGET_SPM_FILE`].
	pub fn target_spm(&self) -> PathBuf {
		self.file(TARGET_SPM_FILE)
	}

	/// Path of [`WEIGHTS_FILE`].
	pub fn weights(&self) -> PathBuf {
		self.file(WEIGHTS_FILE)
	}

	/// Path of [`CONFIG_FILE`].
	pub fn config(&self) -> PathBuf {
		self.file(CONFIG_FILE)
	}

	/// Path of [`SOURCE_TOKENIZER_FILE`].
	pub fn source_tokenizer(&self) -> PathBuf {
		self.file(SOURCE_TOKENIZER_FILE)
	}

	/// Path of [`TARGET_TOKENIZER_FILE`].
	pub fn target_tokenizer(&self) -> PathBuf {
		self.file(TARGET_TOKENIZER_FILE)
	}

	/// Path of [`LEGACY_TOKENIZER_FILE`].
	pub fn legacy_tokenizer(&self) -> PathBuf {
		self.file(LEGACY_TOKENIZER_FILE)
	}

	/// Returns `true` if the weights and all tokenizer assets are already present, in which case nothing needs to be
	/// fetched.
	pub fn has_existing_model(&self) -> bool {
		self.weights().exists() && TOKENIZER_ASSETS.iter().all(|name| self.file(name).exists())
	}

	/// Fails with [`ConvertError::NotFound`] for the first tokenizer asset that is missing.
	pub fn require_tokenizer_assets(&self) -> Result<()> {
		for name in TOKENIZER_ASSETS {
			if !self.file(name).exists() {
				return Err(ConvertError::NotFound { file: name, dir: self.root.clone() });
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use std::fs;

	use super::{ModelLayout, TOKENIZER_ASSETS, WEIGHTS_FILE};
	use crate::error::ConvertError;

	#[test]
	fn test_existing_model_needs_all_four() {
		let dir = tempfile::tempdir().unwrap();
		let layout = ModelLayout::new(dir.path());
		for name in TOKENIZER_ASSETS {
			fs::write(layout.file(name), b"").unwrap();
		}
		assert!(!layout.has_existing_model());
		assert!(layout.require_tokenizer_assets().is_ok());

		fs::write(layout.file(WEIGHTS_FILE), b"").unwrap();
		assert!(layout.has_existing_model());
	}

	#[test]
	fn test_reports_missing_asset() {
		let dir = tempfile::tempdir().unwrap();
		let layout = ModelLayout::new(dir.path());
		fs::write(layout.vocab(), b"{}").unwrap();
		match layout.require_tokenizer_assets() {
			Err(ConvertError::NotFound { file, .. }) => assert_eq!(file, "source.spm"),
			other => panic!("expected NotFound, got {other:?}")
		}
	}
}
