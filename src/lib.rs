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

//! `pyke-opus-mt` fetches [OPUS-MT] translation models from the [Hugging Face hub] and converts their tokenizers into
//! [tokenizers] JSON, so that Marian models can be run from Rust without Python.
//!
//! Marian checkpoints ship a shared `vocab.json` plus one SentencePiece model per direction (`source.spm` and
//! `target.spm`). This crate merges them into a pair of Unigram tokenizers (`source_tokenizer.json` and
//! `target_tokenizer.json`) whose ids match the model's embeddings:
//! ```ignore
//! use pyke_opus_mt::{download_and_convert, ConverterOptions, HubSource};
//!
//! let options = ConverterOptions::default();
//! let hub = HubSource::new(&options)?;
//! download_and_convert("Helsinki-NLP/opus-mt-en-es", "models/opus-mt-en-es", &hub, &options)?;
//! ```
//!
//! If the model directory already contains the weights and tokenizer assets, nothing is downloaded.
//!
//! [OPUS-MT]: https://github.com/Helsinki-NLP/Opus-MT
//! [Hugging Face hub]: https://huggingface.co/Helsinki-NLP
//! [tokenizers]: https://github.com/huggingface/tokenizers

#![warn(missing_docs)]
#![warn(rustdoc::all)]
#![warn(clippy::correctness, clippy::suspicious, clippy::complexity, clippy::perf, clippy::style)]
#![allow(clippy::tabs_in_doc_comments)]

pub mod config;
mod convert;
pub mod error;
pub mod hub;
pub mod layout;
pub mod spm;
pub mod tokenizer;
pub mod verify;
pub mod vocab;
pub mod weights;

pub use self::config::{ConverterOptions, TranslationModel, DEFAULT_MODELS};
pub use self::convert::{download_and_convert, ensure_tokenizers, TokenizerOutcome};
pub use self::error::ConvertError;
pub use self::hub::{HubSource, ModelSource};
pub use self::layout::ModelLayout;
pub use self::verify::{verify_model_dir, VerifyReport};
pub use self::vocab::Vocabulary;
