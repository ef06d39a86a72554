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

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use pyke_opus_mt::{download_and_convert, tokenizer::MISSING_TOKEN_SCORE, verify_model_dir, ConvertError, ConverterOptions, HubSource, DEFAULT_MODELS};
use tracing_subscriber::EnvFilter;

/// Download Helsinki-NLP OPUS-MT models and convert their tokenizers for Rust inference.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	#[command(subcommand)]
	command: Option<Command>,

	/// Root directory for the default EN<->ES model pair.
	#[arg(long, global = true, default_value = "models")]
	models_dir: PathBuf,

	/// Hugging Face hub cache directory.
	#[arg(long, global = true, env = "HF_HUB_CACHE")]
	cache_dir: Option<PathBuf>,

	/// Hugging Face access token.
	#[arg(long, global = true, env = "HF_TOKEN", hide_env_values = true)]
	token: Option<String>,

	/// Score given to vocabulary tokens missing from a direction's SentencePiece model.
	#[arg(long, global = true, default_value_t = MISSING_TOKEN_SCORE, allow_negative_numbers = true)]
	missing_token_score: f64,

	/// Don't show download progress bars.
	#[arg(long, global = true)]
	no_progress: bool
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Download and convert the EN->ES and ES->EN models (the default).
	Download,
	/// Download and convert a single model.
	Convert {
		/// Model identifier on the hub, e.g. `Helsinki-NLP/opus-mt-en-de`.
		model_id: String,
		/// Directory to store the model in.
		output_dir: PathBuf
	},
	/// Check that a converted model directory has usable tokenizers.
	Verify {
		/// The model directory.
		dir: PathBuf
	}
}

impl Args {
	fn options(&self) -> ConverterOptions {
		ConverterOptions {
			models_dir: self.models_dir.clone(),
			cache_dir: self.cache_dir.clone(),
			token: self.token.clone(),
			missing_token_score: self.missing_token_score,
			progress: !self.no_progress
		}
	}
}

fn download_default_pair(options: &ConverterOptions) -> anyhow::Result<()> {
	tracing::info!("Downloading Helsinki-NLP OPUS-MT models...");
	let hub = HubSource::new(options)?;
	for model in DEFAULT_MODELS {
		tracing::info!("Downloading {} model...", model.direction);
		download_and_convert(model.model_id, model.output_dir(&options.models_dir), &hub, options)?;
	}
	tracing::info!("✓ All models downloaded successfully!");
	tracing::info!("  License: Apache 2.0 (commercial use allowed)");
	Ok(())
}

fn run(args: Args) -> anyhow::Result<()> {
	let options = args.options();
	match args.command.unwrap_or(Command::Download) {
		Command::Download => download_default_pair(&options),
		Command::Convert { model_id, output_dir } => {
			let hub = HubSource::new(&options)?;
			download_and_convert(&model_id, output_dir, &hub, &options)?;
			Ok(())
		}
		Command::Verify { dir } => {
			let report = verify_model_dir(&dir)?;
			tracing::info!(
				"✓ {} ok: source={} target={} vocab_size={} per_direction={} config_checked={}",
				dir.display(),
				report.source_model,
				report.target_model,
				report.vocab_size,
				report.per_direction,
				report.config_checked
			);
			Ok(())
		}
	}
}

fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with_target(false)
		.without_time()
		.with_writer(std::io::stdout)
		.init();

	let args = Args::parse();
	match run(args) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			if let Some(ConvertError::MissingDependency { what, hint }) = e.downcast_ref::<ConvertError>() {
				tracing::error!("Error: Missing dependency - {what}");
				tracing::error!("Please {hint}");
			} else {
				tracing::error!("Error: {e:#}");
			}
			ExitCode::FAILURE
		}
	}
}
