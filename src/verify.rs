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

//! Load-time checks for converted model directories.

use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use tokenizers::{ModelWrapper, Tokenizer};

use crate::layout::ModelLayout;

const SELF_CHECK_TEXT: &str = "tokenizer self-check";

/// Special token ids from a Marian `config.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SpecialTokenIds {
	/// Id of `<pad>`.
	pub pad_token_id: u32,
	/// Id of `</s>`.
	pub eos_token_id: u32,
	/// First token fed to the decoder; `<pad>` for Marian.
	pub decoder_start_token_id: u32
}

/// The result of [`verify_model_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
	/// Whether separate source/target tokenizers were found (rather than only the legacy `tokenizer.json`).
	pub per_direction: bool,
	/// Model type of the source tokenizer, e.g. `Unigram`.
	pub source_model: &'static str,
	/// Model type of the target tokenizer.
	pub target_model: &'static str,
	/// Vocabulary size of the source tokenizer.
	pub vocab_size: usize,
	/// Whether special token ids from `config.json` were decoded.
	pub config_checked: bool
}

fn model_kind(tokenizer: &Tokenizer) -> &'static str {
	match tokenizer.get_model() {
		ModelWrapper::Unigram(_) => "Unigram",
		ModelWrapper::WordLevel(_) => "WordLevel",
		ModelWrapper::BPE(_) => "BPE",
		ModelWrapper::WordPiece(_) => "WordPiece"
	}
}

fn load(path: &Path) -> anyhow::Result<Tokenizer> {
	Tokenizer::from_file(path).map_err(|e| anyhow::anyhow!("{e}")).with_context(|| format!("failed to load {}", path.display()))
}

fn check_tokenizer(name: &str, tokenizer: &Tokenizer, specials: Option<&SpecialTokenIds>) -> anyhow::Result<()> {
	if matches!(tokenizer.get_model(), ModelWrapper::WordLevel(_)) {
		anyhow::bail!("{name} is WordLevel (fallback) and is not compatible with Marian OPUS-MT; re-run the download to regenerate it");
	}

	let encoding = tokenizer.encode(SELF_CHECK_TEXT, true).map_err(|e| anyhow::anyhow!("{name}: encode failed: {e}"))?;
	if encoding.get_ids().is_empty() {
		anyhow::bail!("{name} produced an empty encoding");
	}

	if let Some(specials) = specials {
		let ids = [specials.eos_token_id, specials.pad_token_id, specials.decoder_start_token_id];
		let decoded = tokenizer.decode(&ids, false).map_err(|e| anyhow::anyhow!("{name}: decode failed: {e}"))?;
		if decoded.trim().is_empty() {
			anyhow::bail!("{name} appears incompatible with the model's special token ids {ids:?} (decoded to nothing)");
		}
	}

	Ok(())
}

/// Checks that a converted model directory holds tokenizers an inference runtime can use.
///
/// Prefers `source_tokenizer.json` + `target_tokenizer.json`, falling back to the legacy `tokenizer.json` for both
/// directions. Word-level fallback tokenizers are rejected. If `config.json` is present, the model's special token ids
/// must decode to something.
pub fn verify_model_dir(dir: impl AsRef<Path>) -> anyhow::Result<VerifyReport> {
	let layout = ModelLayout::new(dir.as_ref());

	let (per_direction, source, target) = if layout.source_tokenizer().exists() && layout.target_tokenizer().exists() {
		(true, load(&layout.source_tokenizer())?, load(&layout.target_tokenizer())?)
	} else if layout.legacy_tokenizer().exists() {
		let shared = load(&layout.legacy_tokenizer())?;
		(false, shared.clone(), shared)
	} else {
		anyhow::bail!(
			"no tokenizers found in {}; expected source_tokenizer.json + target_tokenizer.json or tokenizer.json",
			layout.root().display()
		);
	};

	let specials = if layout.config().exists() {
		let raw = fs::read(layout.config()).context("failed to read config.json")?;
		Some(serde_json::from_slice::<SpecialTokenIds>(&raw).context("failed to parse config.json")?)
	} else {
		None
	};

	check_tokenizer("source tokenizer", &source, specials.as_ref())?;
	check_tokenizer("target tokenizer", &target, specials.as_ref())?;

	Ok(VerifyReport {
		per_direction,
		source_model: model_kind(&source),
		target_model: model_kind(&target),
		vocab_size: source.get_vocab_size(true),
		config_checked: specials.is_some()
	})
}
