// 该文件是 Beifeng （北风） 项目的一部分。
// src/input/features_file.rs - 原始特征文本文件输入
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

//! 每行一个样本，样本内用逗号分隔，空行与 `#` 开头的行被忽略。

use std::collections::VecDeque;

use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, signal::FeatureBuffer};

#[derive(Error, Debug)]
pub enum FeaturesFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Invalid sample value '{value}' at line {line}")]
  ParseError { line: usize, value: String },
}

pub struct FeaturesFileInput {
  samples: VecDeque<FeatureBuffer>,
}

impl FromUrlWithScheme for FeaturesFileInput {
  const SCHEME: &'static str = "features";
}

impl FromUrl for FeaturesFileInput {
  type Error = FeaturesFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(FeaturesFileInputError::SchemaMismatch);
    }

    let text = std::fs::read_to_string(url.path())?;
    let input = Self::parse(&text)?;
    info!("读取到 {} 个样本: {}", input.samples.len(), url.path());
    Ok(input)
  }
}

impl FeaturesFileInput {
  pub fn parse(text: &str) -> Result<Self, FeaturesFileInputError> {
    let mut samples = VecDeque::new();

    for (index, line) in text.lines().enumerate() {
      let line = line.trim();
      if line.is_empty() || line.starts_with('#') {
        continue;
      }

      let values = line
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
          v.parse::<f32>()
            .map_err(|_| FeaturesFileInputError::ParseError {
              line: index + 1,
              value: v.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

      debug!("第 {} 行: {} 个值", index + 1, values.len());
      samples.push_back(FeatureBuffer::from(values));
    }

    Ok(FeaturesFileInput { samples })
  }
}

impl Iterator for FeaturesFileInput {
  type Item = FeatureBuffer;

  fn next(&mut self) -> Option<Self::Item> {
    self.samples.pop_front()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_one_sample_per_line() {
    let text = "# exported raw features\n1, 2, 3.5\n\n-4,5e-1,6,\n";
    let samples: Vec<_> = FeaturesFileInput::parse(text).unwrap().collect();

    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].as_ref(), &[1.0, 2.0, 3.5]);
    assert_eq!(samples[1].as_ref(), &[-4.0, 0.5, 6.0]);
  }

  #[test]
  fn reports_line_of_bad_value() {
    let err = FeaturesFileInput::parse("1,2\n3,abc\n").err().unwrap();
    match err {
      FeaturesFileInputError::ParseError { line, value } => {
        assert_eq!(line, 2);
        assert_eq!(value, "abc");
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn reads_file_from_url() {
    let path = std::env::temp_dir().join(format!("beifeng-features-{}.txt", std::process::id()));
    std::fs::write(&path, "0.5,0.25\n").unwrap();
    let url = Url::parse(&format!("features://{}", path.display())).unwrap();

    let samples: Vec<_> = FeaturesFileInput::from_url(&url).unwrap().collect();
    assert_eq!(samples, vec![FeatureBuffer::from(vec![0.5, 0.25])]);
    let _ = std::fs::remove_file(&path);
  }
}
