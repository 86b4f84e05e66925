// 该文件是 Beifeng （北风） 项目的一部分。
// src/output/text_output.rs - 标准输出与文本文件输出
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

use std::{
  fs::{File, OpenOptions},
  io::Write,
  sync::Mutex,
};

use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  capability::Capabilities,
  invoke::Invocation,
  output::{Render, report::report_lines},
};

#[derive(Error, Debug)]
pub enum TextOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

fn write_lines<W: Write>(
  writer: &mut W,
  capabilities: &Capabilities,
  invocation: &Invocation,
) -> std::io::Result<()> {
  for line in report_lines(capabilities, invocation) {
    writeln!(writer, "{}", line)?;
  }
  writer.flush()
}

/// 输出到标准输出
#[derive(Debug, Default)]
pub struct StdoutOutput;

impl FromUrlWithScheme for StdoutOutput {
  const SCHEME: &'static str = "stdout";
}

impl FromUrl for StdoutOutput {
  type Error = TextOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(TextOutputError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }
    Ok(StdoutOutput)
  }
}

impl Render for StdoutOutput {
  type Error = TextOutputError;

  fn render_result(
    &self,
    capabilities: &Capabilities,
    invocation: &Invocation,
  ) -> Result<(), Self::Error> {
    let mut stdout = std::io::stdout().lock();
    write_lines(&mut stdout, capabilities, invocation)?;
    Ok(())
  }
}

/// 追加写入文本文件
#[derive(Debug)]
pub struct TextFileOutput {
  file: Mutex<File>,
}

impl FromUrlWithScheme for TextFileOutput {
  const SCHEME: &'static str = "file";
}

impl FromUrl for TextFileOutput {
  type Error = TextOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(TextOutputError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    debug!("打开报告文件: {}", url.path());
    let file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(url.path())
      .inspect_err(|e| error!("无法打开报告文件 {}: {}", url.path(), e))?;
    Ok(TextFileOutput {
      file: Mutex::new(file),
    })
  }
}

impl Render for TextFileOutput {
  type Error = TextOutputError;

  fn render_result(
    &self,
    capabilities: &Capabilities,
    invocation: &Invocation,
  ) -> Result<(), Self::Error> {
    let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
    write_lines(&mut *file, capabilities, invocation)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{ImpulseResult, StatusCode};

  #[test]
  fn writes_one_line_per_report_line() {
    let invocation = Invocation {
      status: StatusCode::Ok,
      result: Some(ImpulseResult::default()),
    };
    let mut buffer = Vec::new();
    write_lines(&mut buffer, &Capabilities::CLASSIFICATION, &invocation).unwrap();

    let text = String::from_utf8(buffer).unwrap();
    assert_eq!(
      text,
      "run_classifier returned: 0 (OK)\nTiming: DSP 0 ms, inference 0 ms, anomaly 0 ms\nPredictions:\n"
    );
  }

  #[test]
  fn file_output_appends_reports() {
    let path = std::env::temp_dir().join(format!("beifeng-report-{}.txt", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let url = Url::from_file_path(&path).unwrap();

    let output = TextFileOutput::from_url(&url).unwrap();
    let invocation = Invocation {
      status: StatusCode::Canceled,
      result: None,
    };
    output
      .render_result(&Capabilities::CLASSIFICATION, &invocation)
      .unwrap();
    output
      .render_result(&Capabilities::CLASSIFICATION, &invocation)
      .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.lines().all(|l| l == "run_classifier returned: -2 (CANCELED)"));
    let _ = std::fs::remove_file(&path);
  }

  #[test]
  fn stdout_requires_scheme() {
    assert!(StdoutOutput::from_url(&Url::parse("stdout:").unwrap()).is_ok());
    assert!(matches!(
      StdoutOutput::from_url(&Url::parse("file:///tmp/x").unwrap()),
      Err(TextOutputError::SchemeMismatch(_))
    ));
  }
}
