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

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::tokenizer::MISSING_TOKEN_SCORE;

/// A translation model to fetch, and the directory name it is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationModel {
	/// Human-readable direction, e.g. `EN->ES`.
	pub direction: &'static str,
	/// Model identifier on the Hugging Face hub.
	pub model_id: &'static str,
	/// Directory name below the models root.
	pub dir_name: &'static str
}

impl TranslationModel {
	/// Returns this model's directory below `models_dir`.
	pub fn output_dir(&self, models_dir: &Path) -> PathBuf {
		models_dir.join(self.dir_name)
	}
}

/// The models converted by a default run, in processing order.
pub const DEFAULT_MODELS: [TranslationModel; 2] = [
	TranslationModel {
		direction: "EN->ES",
		model_id: "Helsinki-NLP/opus-mt-en-es",
		dir_name: "opus-mt-en-es"
	},
	TranslationModel {
		direction: "ES->EN",
		model_id: "Helsinki-NLP/opus-mt-es-en",
		dir_name: "opus-mt-es-en"
	}
];

/// Options for fetching and converting models.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConverterOptions {
	/// Root directory for the default model pair.
	pub models_dir: PathBuf,
	/// Hub cache directory. Uses the hub's default cache when unset.
	pub cache_dir: Option<PathBuf>,
	/// Hub access token, for gated or private repositories.
	#[serde(skip_serializing)]
	pub token: Option<String>,
	/// Score given to vocabulary tokens that a direction's SentencePiece model doesn't know.
	pub missing_token_score: f64,
	/// Whether to show download progress bars.
	pub progress: bool
}

impl Default for ConverterOptions {
	fn default() -> Self {
		Self {
			models_dir: PathBuf::from("models"),
			cache_dir: None,
			token: None,
			missing_token_score: MISSING_TOKEN_SCORE,
			progress: true
		}
	}
}

#[cfg(test)]
mod tests {
	use std::path::Path;

	use super::{ConverterOptions, DEFAULT_MODELS};

	#[test]
	fn test_default_pair() {
		let dirs: Vec<_> = DEFAULT_MODELS.iter().map(|m| m.output_dir(Path::new("models"))).collect();
		assert_eq!(dirs, vec![Path::new("models/opus-mt-en-es"), Path::new("models/opus-mt-es-en")]);
		assert_eq!(DEFAULT_MODELS[0].model_id, "Helsinki-NLP/opus-mt-en-es");
	}

	#[test]
	fn test_partial_options() {
		let options: ConverterOptions = serde_json::from_str(r#"{ "models-dir": "/srv/models" }"#).unwrap();
		assert_eq!(options.models_dir, Path::new("/srv/models"));
		assert_eq!(options.missing_token_score, -1.0e9);
		assert!(options.progress);
	}
}
