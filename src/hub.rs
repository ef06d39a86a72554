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

//! Remote model sources.

use std::{fs, path::Path};

use anyhow::Context;
use hf_hub::api::sync::{Api, ApiBuilder, ApiRepo};

use crate::{
	config::ConverterOptions,
	layout::{ModelLayout, OPTIONAL_ASSETS, PYTORCH_WEIGHTS_FILE, TOKENIZER_ASSETS, WEIGHTS_FILE},
	weights
};

/// Somewhere model artifacts can be fetched from.
///
/// Fetching is split in two so that tokenizers can be derived before the (much larger) weights are stored.
pub trait ModelSource {
	/// Stores `vocab.json`, `source.spm`, `target.spm` and any available auxiliary files in `dest`.
	fn fetch_tokenizer_files(&self, model_id: &str, dest: &ModelLayout) -> anyhow::Result<()>;

	/// Stores the model weights in `dest` as `model.safetensors`.
	fn fetch_weights(&self, model_id: &str, dest: &ModelLayout) -> anyhow::Result<()>;
}

/// Fetches models from the Hugging Face hub.
///
/// Files are downloaded into the hub cache, then copied into the model directory. Each file is requested once; there
/// are no retries.
pub struct HubSource {
	api: Api
}

impl HubSource {
	/// Creates a hub client configured from `options`.
	pub fn new(options: &ConverterOptions) -> anyhow::Result<Self> {
		let mut builder = ApiBuilder::new().with_progress(options.progress);
		// keep the token saved by `huggingface-cli login` unless one is given
		if let Some(token) = &options.token {
			builder = builder.with_token(Some(token.clone()));
		}
		if let Some(cache_dir) = &options.cache_dir {
			builder = builder.with_cache_dir(cache_dir.clone());
		}
		let api = builder.build().context("failed to initialize the Hugging Face hub client")?;
		Ok(Self { api })
	}

	fn copy_into(repo: &ApiRepo, name: &str, dest: &ModelLayout) -> anyhow::Result<()> {
		let cached = repo.get(name)?;
		fs::copy(&cached, dest.file(name)).with_context(|| format!("failed to copy {name} into {}", dest.root().display()))?;
		Ok(())
	}
}

impl ModelSource for HubSource {
	fn fetch_tokenizer_files(&self, model_id: &str, dest: &ModelLayout) -> anyhow::Result<()> {
		let repo = self.api.model(model_id.to_string());
		for name in TOKENIZER_ASSETS {
			Self::copy_into(&repo, name, dest).with_context(|| format!("failed to fetch {name} from {model_id}"))?;
		}
		for name in OPTIONAL_ASSETS {
			if let Err(e) = Self::copy_into(&repo, name, dest) {
				tracing::debug!("skipping {name} for {model_id}: {e:#}");
			}
		}
		Ok(())
	}

	fn fetch_weights(&self, model_id: &str, dest: &ModelLayout) -> anyhow::Result<()> {
		let repo = self.api.model(model_id.to_string());
		match Self::copy_into(&repo, WEIGHTS_FILE, dest) {
			Ok(()) => return Ok(()),
			Err(e) => tracing::debug!("{WEIGHTS_FILE} unavailable for {model_id}: {e:#}")
		}

		if !weights::can_convert_pytorch() {
			return Err(weights::missing_torch_convert(Path::new(PYTORCH_WEIGHTS_FILE)).into());
		}

		tracing::info!("  {model_id} has no {WEIGHTS_FILE}; converting {PYTORCH_WEIGHTS_FILE}...");
		let checkpoint = repo.get(PYTORCH_WEIGHTS_FILE).with_context(|| format!("failed to fetch weights from {model_id}"))?;
		store_pytorch_weights(&checkpoint, dest)
	}
}

fn store_pytorch_weights(checkpoint: &Path, dest: &ModelLayout) -> anyhow::Result<()> {
	let n_tensors = weights::convert_pytorch_checkpoint(checkpoint, &dest.weights())?;
	tracing::debug!("wrote {n_tensors} tensors to {}", dest.weights().display());
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::HubSource;
	use crate::config::ConverterOptions;

	#[test]
	fn test_client_without_token() {
		let cache = tempfile::tempdir().unwrap();
		let options = ConverterOptions { cache_dir: Some(cache.path().to_path_buf()), progress: false, ..Default::default() };
		assert!(options.token.is_none());
		assert!(HubSource::new(&options).is_ok());
	}

	#[test]
	fn test_client_with_token() {
		let cache = tempfile::tempdir().unwrap();
		let options = ConverterOptions {
			cache_dir: Some(cache.path().to_path_buf()),
			token: Some("hf_example".to_string()),
			progress: false,
			..Default::default()
		};
		assert!(HubSource::new(&options).is_ok());
	}
}
