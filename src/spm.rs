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

//! SentencePiece model files (`source.spm` / `target.spm`).
//!
//! A `.spm` file is a serialized `sentencepiece.ModelProto`. Only the piece list is decoded here; trainer and
//! normalizer specs are skipped as unknown fields.

use std::{collections::HashMap, path::Path};

use prost::Message;

use crate::error::Result;

/// Piece scores keyed by piece string.
pub type PieceScores = HashMap<String, f64>;

/// The kind of a SentencePiece piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum PieceType {
	/// A regular piece.
	Normal = 1,
	/// The unknown piece.
	Unknown = 2,
	/// A control symbol such as `<s>` or `</s>`.
	Control = 3,
	/// A user-defined symbol.
	UserDefined = 4,
	/// A piece that is never emitted.
	Unused = 5,
	/// A byte-fallback piece.
	Byte = 6
}

/// A single entry of [`ModelProto::pieces`].
#[derive(Clone, PartialEq, Message)]
pub struct SentencePiece {
	/// The piece string, e.g. `▁hola`.
	#[prost(string, optional, tag = "1")]
	pub piece: Option<String>,
	/// Log probability of the piece.
	#[prost(float, optional, tag = "2")]
	pub score: Option<f32>,
	/// Raw [`PieceType`] value.
	#[prost(enumeration = "PieceType", optional, tag = "3")]
	pub r#type: Option<i32>
}

/// The subset of `sentencepiece.ModelProto` needed to read piece scores.
#[derive(Clone, PartialEq, Message)]
pub struct ModelProto {
	/// Pieces in model order.
	#[prost(message, repeated, tag = "1")]
	pub pieces: Vec<SentencePiece>
}

/// A decoded SentencePiece model.
#[derive(Debug, Clone)]
pub struct SentencePieceModel {
	proto: ModelProto
}

impl SentencePieceModel {
	/// Loads a SentencePiece model from a `.spm` file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
		let bytes = std::fs::read(path)?;
		Self::from_bytes(bytes)
	}

	/// Decodes a SentencePiece model from its protobuf bytes.
	pub fn from_bytes<B: AsRef<[u8]>>(bytes: B) -> Result<Self> {
		let proto = ModelProto::decode(bytes.as_ref())?;
		Ok(Self { proto })
	}

	/// Returns the number of pieces in the model.
	#[allow(clippy::len_without_is_empty)]
	pub fn len(&self) -> usize {
		self.proto.pieces.len()
	}

	/// Iterates over `(piece, score, type)` in model order.
	pub fn pieces(&self) -> impl Iterator<Item = (&str, f32, PieceType)> {
		self.proto.pieces.iter().map(|p| {
			let kind = p.r#type.and_then(|t| PieceType::try_from(t).ok()).unwrap_or(PieceType::Normal);
			(p.piece.as_deref().unwrap_or_default(), p.score.unwrap_or_default(), kind)
		})
	}

	/// Counts the pieces of the given type.
	pub fn count(&self, kind: PieceType) -> usize {
		self.pieces().filter(|(_, _, k)| *k == kind).count()
	}

	/// Collects every piece's score. When a piece appears more than once, the later entry wins.
	pub fn scores(&self) -> PieceScores {
		self.pieces().map(|(piece, score, _)| (piece.to_string(), score as f64)).collect()
	}
}

#[cfg(test)]
mod tests {
	use prost::Message;

	use super::{ModelProto, PieceType, SentencePiece, SentencePieceModel};

	fn encode_model(pieces: &[(&str, f32, PieceType)]) -> Vec<u8> {
		ModelProto {
			pieces: pieces
				.iter()
				.map(|(piece, score, kind)| SentencePiece {
					piece: Some(piece.to_string()),
					score: Some(*score),
					r#type: Some(*kind as i32)
				})
				.collect()
		}
		.encode_to_vec()
	}

	#[test]
	fn test_decode_scores() {
		let bytes = encode_model(&[("<unk>", 0.0, PieceType::Unknown), ("</s>", 0.0, PieceType::Control), ("▁hola", -3.5, PieceType::Normal)]);
		let model = SentencePieceModel::from_bytes(bytes).unwrap();
		assert_eq!(model.len(), 3);
		assert_eq!(model.count(PieceType::Control), 1);

		let scores = model.scores();
		assert_eq!(scores["▁hola"], -3.5);
		assert_eq!(scores["<unk>"], 0.0);
	}

	#[test]
	fn test_later_piece_wins() {
		let bytes = encode_model(&[("a", -1.0, PieceType::Normal), ("a", -2.0, PieceType::Normal)]);
		let scores = SentencePieceModel::from_bytes(bytes).unwrap().scores();
		assert_eq!(scores.len(), 1);
		assert_eq!(scores["a"], -2.0);
	}

	#[test]
	fn test_missing_fields_default() {
		let bytes = ModelProto { pieces: vec![SentencePiece { piece: Some("x".to_string()), score: None, r#type: None }] }.encode_to_vec();
		let model = SentencePieceModel::from_bytes(bytes).unwrap();
		assert_eq!(model.pieces().next(), Some(("x", 0.0, PieceType::Normal)));
	}

	#[test]
	fn test_garbage_is_rejected() {
		assert!(SentencePieceModel::from_bytes([0xff, 0xff, 0xff]).is_err());
	}
}
