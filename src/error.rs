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

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading model artifacts or deriving tokenizers from them.
#[derive(Error, Debug)]
pub enum ConvertError {
	/// A required input file is not present in the model directory.
	#[error("{file} not found in {}", dir.display())]
	NotFound {
		/// Name of the missing file, e.g. `vocab.json`.
		file: &'static str,
		/// The model directory that was searched.
		dir: PathBuf
	},
	/// `vocab.json` contains no entries.
	#[error("vocab.json is empty")]
	EmptyVocabulary,
	/// The number of vocabulary entries does not match the largest id.
	#[error("vocab.json ids are not contiguous: vocab_size={vocab_size}, max_id={max_id}")]
	NonContiguous {
		/// Number of entries in the vocabulary.
		vocab_size: usize,
		/// Largest id found in the vocabulary.
		max_id: u32
	},
	/// Two tokens map to the same id, so the id space cannot be resolved to a single token.
	#[error("vocab.json maps both {first:?} and {second:?} to id {id}")]
	DuplicateId {
		/// The shared id.
		id: u32,
		/// First token mapped to `id` (in lexicographic order).
		first: String,
		/// Second token mapped to `id`.
		second: String
	},
	/// An id below `vocab_size` has no token assigned.
	#[error("vocab.json contains gaps; id {id} is unassigned")]
	Gap {
		/// The first unassigned id.
		id: u32
	},
	/// A token that must be present in the vocabulary is missing.
	#[error("missing required token '{0}' in vocab.json")]
	MissingToken(String),
	/// A capability was compiled out of this build.
	#[error("missing dependency: {what}")]
	MissingDependency {
		/// What could not be done.
		what: String,
		/// How to get a build that can do it.
		hint: String
	},
	/// Failed to decode a SentencePiece model file.
	#[error("failed to decode SentencePiece model: {0}")]
	SentencePiece(#[from] prost::DecodeError),
	/// Failed to (de)serialize JSON.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
	/// I/O error.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error)
}

/// Result type for fallible operations on model artifacts.
pub type Result<T> = std::result::Result<T, ConvertError>;
