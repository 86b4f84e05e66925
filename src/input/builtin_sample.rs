// 该文件是 Beifeng （北风） 项目的一部分。
// src/input/builtin_sample.rs - 内置测试样本
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
use tracing::error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, signal::FeatureBuffer};

/// 从测试样本复制的原始特征
#[rustfmt::skip]
pub const SAMPLE_FEATURES: [f32; 300] = [
  -127.0, 144.0, 157.0, -144.0, 184.0, 178.0, -156.0, 235.0, 205.0, -139.0, 304.0, 226.0,
  -87.0, 355.0, 198.0, -24.0, 388.0, 109.0, 10.0, 385.0, 7.0, 16.0, 337.0, -84.0,
  4.0, 280.0, -160.0, -49.0, 226.0, -198.0, -97.0, 195.0, -186.0, -112.0, 180.0, -189.0,
  -124.0, 172.0, -204.0, -127.0, 162.0, -210.0, -112.0, 139.0, -205.0, -108.0, 118.0, -186.0,
  -97.0, 88.0, -177.0, -70.0, 60.0, -157.0, -52.0, 43.0, -148.0, -37.0, 31.0, -159.0,
  -24.0, 28.0, -156.0, -25.0, 27.0, -166.0, -39.0, 12.0, -172.0, -49.0, -3.0, -160.0,
  -64.0, -19.0, -151.0, -78.0, -30.0, -124.0, -85.0, -33.0, -91.0, -96.0, -33.0, -63.0,
  -100.0, -19.0, -31.0, -97.0, -24.0, -3.0, -102.0, -37.0, 30.0, -97.0, -21.0, 51.0,
  -82.0, 0.0, 60.0, -67.0, 10.0, 67.0, -63.0, 24.0, 81.0, -58.0, 33.0, 82.0,
  -43.0, 54.0, 72.0, -27.0, 79.0, 64.0, -6.0, 78.0, 48.0, 18.0, 78.0, 24.0,
  31.0, 87.0, 1.0, 46.0, 90.0, -16.0, 64.0, 100.0, -55.0, 78.0, 99.0, -111.0,
  67.0, 84.0, -154.0, 34.0, 60.0, -169.0, 10.0, 24.0, -162.0, 3.0, 3.0, -142.0,
  6.0, 3.0, -121.0, 15.0, 7.0, -123.0, 25.0, 12.0, -141.0, 34.0, 19.0, -165.0,
  36.0, 22.0, -192.0, 34.0, 7.0, -208.0, 12.0, -4.0, -223.0, -34.0, -12.0, -241.0,
  -72.0, -27.0, -240.0, -97.0, -54.0, -213.0, -118.0, -78.0, -181.0, -133.0, -85.0, -153.0,
  -127.0, -79.0, -117.0, -111.0, -75.0, -82.0, -97.0, -67.0, -70.0, -88.0, -57.0, -51.0,
  -81.0, -51.0, -27.0, -72.0, -49.0, -22.0, -73.0, -42.0, -15.0, -67.0, -34.0, -3.0,
  -52.0, -42.0, 0.0, -48.0, -36.0, -6.0, -46.0, -30.0, -6.0, -24.0, -28.0, 1.0,
  -24.0, -15.0, 1.0, -40.0, -9.0, 3.0, -22.0, -13.0, 4.0, -22.0, -4.0, 0.0,
  0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
  0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
  0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
  0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
  0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
  0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

#[derive(Error, Debug)]
pub enum BuiltinSampleInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
}

/// 只产出一次内置样本的输入
pub struct BuiltinSampleInput {
  sample: Option<FeatureBuffer>,
}

impl Default for BuiltinSampleInput {
  fn default() -> Self {
    Self {
      sample: Some(FeatureBuffer::from(&SAMPLE_FEATURES[..])),
    }
  }
}

impl FromUrlWithScheme for BuiltinSampleInput {
  const SCHEME: &'static str = "builtin";
}

impl FromUrl for BuiltinSampleInput {
  type Error = BuiltinSampleInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(BuiltinSampleInputError::SchemaMismatch);
    }
    Ok(Self::default())
  }
}

impl Iterator for BuiltinSampleInput {
  type Item = FeatureBuffer;

  fn next(&mut self) -> Option<Self::Item> {
    self.sample.take()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn yields_sample_once() {
    let mut input = BuiltinSampleInput::from_url(&Url::parse("builtin:").unwrap()).unwrap();
    let sample = input.next().unwrap();

    assert_eq!(sample.len(), 300);
    assert_eq!(&sample.as_ref()[..3], &[-127.0, 144.0, 157.0]);
    assert!(input.next().is_none());
  }
}
