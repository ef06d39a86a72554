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

//! Storing model weights as `model.safetensors`.

use std::path::Path;

use crate::error::ConvertError;

/// Install hint for builds without PyTorch checkpoint conversion.
pub const TORCH_CONVERT_HINT: &str = "rebuild with: cargo install pyke-opus-mt --features torch-convert";

/// Whether this build can convert PyTorch checkpoints.
pub const fn can_convert_pytorch() -> bool {
	cfg!(feature = "torch-convert")
}

cfg_if::cfg_if! {
	if #[cfg(feature = "torch-convert")] {
		/// Converts a PyTorch `pytorch_model.bin` checkpoint into a safetensors file.
		///
		/// Returns the number of tensors written.
		pub fn convert_pytorch_checkpoint(checkpoint: &Path, output: &Path) -> anyhow::Result<usize> {
			use std::collections::HashMap;

			use anyhow::Context;

			let tensors = candle_core::pickle::read_all(checkpoint).with_context(|| format!("failed to read {}", checkpoint.display()))?;
			let tensors = tensors
				.into_iter()
				.map(|(name, tensor)| Ok((name, tensor.contiguous()?)))
				.collect::<candle_core::Result<HashMap<String, candle_core::Tensor>>>()?;
			candle_core::safetensors::save(&tensors, output).with_context(|| format!("failed to write {}", output.display()))?;
			Ok(tensors.len())
		}
	} else {
		/// Converts a PyTorch `pytorch_model.bin` checkpoint into a safetensors file.
		///
		/// This build was compiled without the `torch-convert` feature, so this always fails with
		/// [`ConvertError::MissingDependency`].
		pub fn convert_pytorch_checkpoint(checkpoint: &Path, _output: &Path) -> anyhow::Result<usize> {
			Err(missing_torch_convert(checkpoint).into())
		}
	}
}

/// The error returned when a PyTorch checkpoint must be converted but this build cannot.
pub(crate) fn missing_torch_convert(checkpoint: &Path) -> ConvertError {
	ConvertError::MissingDependency {
		what: format!("converting {} to safetensors requires the `torch-convert` feature", checkpoint.display()),
		hint: TORCH_CONVERT_HINT.to_string()
	}
}

#[cfg(test)]
mod tests {
	use std::path::Path;

	use super::missing_torch_convert;
	use crate::error::ConvertError;

	#[test]
	fn test_missing_dependency_hint() {
		match missing_torch_convert(Path::new("pytorch_model.bin")) {
			ConvertError::MissingDependency { hint, .. } => assert!(hint.contains("--features torch-convert")),
			other => panic!("unexpected error {other:?}")
		}
	}

	#[cfg(not(feature = "torch-convert"))]
	#[test]
	fn test_conversion_unavailable() {
		let err = super::convert_pytorch_checkpoint(Path::new("pytorch_model.bin"), Path::new("model.safetensors")).unwrap_err();
		assert!(matches!(err.downcast_ref::<ConvertError>(), Some(ConvertError::MissingDependency { .. })));
	}
}
