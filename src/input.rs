// 该文件是 Beifeng （北风） 项目的一部分。
// src/input.rs - 特征输入
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use thiserror::Error;

#[cfg(any(feature = "builtin_sample", feature = "features_file"))]
use crate::{FromUrl, signal::FeatureBuffer};

#[cfg(feature = "builtin_sample")]
mod builtin_sample;
#[cfg(feature = "builtin_sample")]
pub use self::builtin_sample::{BuiltinSampleInput, BuiltinSampleInputError, SAMPLE_FEATURES};

#[cfg(feature = "features_file")]
mod features_file;
#[cfg(feature = "features_file")]
pub use self::features_file::{FeaturesFileInput, FeaturesFileInputError};

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "builtin_sample")]
  #[error("Builtin sample input error: {0}")]
  BuiltinSampleInputError(#[from] BuiltinSampleInputError),
  #[cfg(feature = "features_file")]
  #[error("Features file input error: {0}")]
  FeaturesFileInputError(#[from] FeaturesFileInputError),
  #[error("URI scheme mismatch")]
  SchemeMismatch,
}

/// 按 URL 方案选择输入来源，至少需要启用一种输入特性
#[cfg(any(feature = "builtin_sample", feature = "features_file"))]
pub enum InputWrapper {
  #[cfg(feature = "builtin_sample")]
  BuiltinSample(BuiltinSampleInput),
  #[cfg(feature = "features_file")]
  FeaturesFile(FeaturesFileInput),
}

#[cfg(any(feature = "builtin_sample", feature = "features_file"))]
impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "builtin_sample")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == BuiltinSampleInput::SCHEME {
        let input = BuiltinSampleInput::from_url(url)?;
        return Ok(InputWrapper::BuiltinSample(input));
      }
    }
    #[cfg(feature = "features_file")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == FeaturesFileInput::SCHEME {
        let input = FeaturesFileInput::from_url(url)?;
        return Ok(InputWrapper::FeaturesFile(input));
      }
    }
    Err(InputError::SchemeMismatch)
  }
}

#[cfg(any(feature = "builtin_sample", feature = "features_file"))]
impl Iterator for InputWrapper {
  type Item = FeatureBuffer;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      #[cfg(feature = "builtin_sample")]
      InputWrapper::BuiltinSample(input) => input.next(),
      #[cfg(feature = "features_file")]
      InputWrapper::FeaturesFile(input) => input.next(),
    }
  }
}
