// 该文件是 Beifeng （北风） 项目的一部分。
// src/model/replay.rs - 回放引擎
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

//! 按 JSON 描述回放推理结果的引擎。
//!
//! 它以固定窗口遍历整个信号（计为 DSP 耗时），然后按能力填充记录的输出，
//! 用于在没有真实分类引擎的环境中驱动整个流程。

use std::time::Instant;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  capability::{Capabilities, ImpulseMetadata},
  model::{BoundingBox, Classification, Classifier, ImpulseResult, StatusCode},
  signal::Signal,
};

const REPLAY_DEFAULT_WINDOW: usize = 64;

#[derive(Error, Debug)]
pub enum ReplayError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("描述文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("描述文件解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
  #[error("描述无效: {0}")]
  Invalid(String),
}

impl ReplayError {
  fn invalid(msg: impl Into<String>) -> Self {
    ReplayError::Invalid(msg.into())
  }
}

fn default_window() -> usize {
  REPLAY_DEFAULT_WINDOW
}

#[derive(Deserialize, Debug)]
struct ReplayDescription {
  frame_size: usize,
  labels: Vec<String>,
  #[serde(default)]
  capabilities: Capabilities,
  #[serde(default = "default_window")]
  window: usize,
  #[serde(default)]
  status: i32,
  #[serde(default)]
  classification: Vec<f32>,
  #[serde(default)]
  bounding_boxes: Vec<BoundingBox>,
  #[serde(default)]
  anomaly: f32,
  #[serde(default)]
  visual_anomaly_grid: Vec<BoundingBox>,
}

pub struct ReplayEngine {
  metadata: ImpulseMetadata,
  window: usize,
  status: StatusCode,
  scores: Box<[f32]>,
  bounding_boxes: Box<[BoundingBox]>,
  anomaly: f32,
  visual_ad_grid_cells: Box<[BoundingBox]>,
}

impl FromUrlWithScheme for ReplayEngine {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayEngine {
  type Error = ReplayError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ReplayError::SchemeMismatch(format!(
        "模型路径必须使用 {} 方案，实际为 {}",
        Self::SCHEME,
        url.scheme()
      )));
    }

    info!("加载回放描述文件: {}", url.path());
    let text = std::fs::read_to_string(url.path())?;
    debug!("描述文件大小: {} 字节", text.len());
    Self::from_json_str(&text)
  }
}

impl ReplayEngine {
  pub fn from_json_str(text: &str) -> Result<Self, ReplayError> {
    let desc: ReplayDescription = serde_json::from_str(text)?;
    Self::from_description(desc)
  }

  fn from_description(desc: ReplayDescription) -> Result<Self, ReplayError> {
    if desc.window == 0 {
      return Err(ReplayError::invalid("窗口大小必须大于 0"));
    }

    let status = StatusCode::from_code(desc.status)
      .ok_or_else(|| ReplayError::invalid(format!("未知的返回码 {}", desc.status)))?;

    let capabilities = desc.capabilities;
    if capabilities.classification() && desc.classification.len() != desc.labels.len() {
      error!(
        "预期分类结果数量为 {}, 实际为 {}",
        desc.labels.len(),
        desc.classification.len()
      );
      return Err(ReplayError::invalid(format!(
        "预期分类结果数量为 {}, 实际为 {}",
        desc.labels.len(),
        desc.classification.len()
      )));
    }
    if capabilities.object_detection && !desc.classification.is_empty() {
      warn!("目标检测模型不输出分类结果，忽略记录的分类结果");
    }
    if !capabilities.object_detection && !desc.bounding_boxes.is_empty() {
      warn!("分类模型不输出边界框，忽略记录的边界框");
    }
    if !capabilities.visual_anomaly && !desc.visual_anomaly_grid.is_empty() {
      warn!("模型未启用视觉异常检测，忽略记录的网格");
    }

    debug!("模型帧大小: {}", desc.frame_size);
    debug!("模型标签: {:?}", desc.labels);
    debug!("模型能力: {:?}", capabilities);

    Ok(ReplayEngine {
      metadata: ImpulseMetadata {
        frame_size: desc.frame_size,
        labels: desc.labels.into_boxed_slice(),
        capabilities,
      },
      window: desc.window,
      status,
      scores: desc.classification.into_boxed_slice(),
      bounding_boxes: desc.bounding_boxes.into_boxed_slice(),
      anomaly: desc.anomaly,
      visual_ad_grid_cells: desc.visual_anomaly_grid.into_boxed_slice(),
    })
  }

  pub fn window(&self) -> usize {
    self.window
  }

  /// 以固定窗口遍历信号，工作内存只与窗口大小相关
  fn stream_signal(&self, signal: &dyn Signal, enable_debug: bool) {
    let total = signal.total_length();
    let mut window = vec![0.0f32; self.window.min(total)];
    let mut offset = 0;

    while offset < total {
      let length = self.window.min(total - offset);
      let chunk = &mut window[..length];
      signal.read_into(offset, chunk);
      trace!("读取窗口 offset={} length={}", offset, length);

      if enable_debug {
        let (min, max, sum) = chunk.iter().fold(
          (f32::INFINITY, f32::NEG_INFINITY, 0.0f32),
          |(min, max, sum), &v| (min.min(v), max.max(v), sum + v),
        );
        debug!(
          "窗口 [{}, {}): min={:.3} max={:.3} mean={:.3}",
          offset,
          offset + length,
          min,
          max,
          sum / length as f32
        );
      }

      offset += length;
    }
  }
}

impl Classifier for ReplayEngine {
  fn metadata(&self) -> &ImpulseMetadata {
    &self.metadata
  }

  fn run(&self, signal: &dyn Signal, result: &mut ImpulseResult, enable_debug: bool) -> StatusCode {
    if signal.total_length() != self.metadata.frame_size {
      error!(
        "信号长度 {} 与帧大小 {} 不一致",
        signal.total_length(),
        self.metadata.frame_size
      );
      return StatusCode::ShapesDontMatch;
    }

    let now = Instant::now();
    self.stream_signal(signal, enable_debug);
    result.timing.dsp = now.elapsed();

    if !self.status.is_ok() {
      warn!("回放记录的返回码: {}", self.status);
      return self.status;
    }

    let capabilities = self.metadata.capabilities;

    let now = Instant::now();
    if capabilities.object_detection {
      result.classification.clear();
      result.bounding_boxes = self.bounding_boxes.to_vec();
    } else {
      result.bounding_boxes.clear();
      result.classification = self
        .metadata
        .labels
        .iter()
        .zip(self.scores.iter())
        .map(|(label, &value)| Classification {
          label: label.clone(),
          value,
        })
        .collect();
    }
    result.timing.classification = now.elapsed();

    let now = Instant::now();
    if capabilities.anomaly {
      result.anomaly = self.anomaly;
    }
    if capabilities.visual_anomaly {
      result.visual_ad_grid_cells = self.visual_ad_grid_cells.to_vec();
    }
    result.timing.anomaly = now.elapsed();

    StatusCode::Ok
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;

  use super::*;
  use crate::signal::{FeatureBuffer, FnSignal};

  const CLASSIFIER_JSON: &str = r#"{
    "frame_size": 10,
    "labels": ["a", "b", "c"],
    "capabilities": { "anomaly": true },
    "window": 4,
    "classification": [0.1, 0.7, 0.2],
    "anomaly": 0.25
  }"#;

  const DETECTOR_JSON: &str = r#"{
    "frame_size": 6,
    "labels": ["x", "y"],
    "capabilities": { "object_detection": true, "visual_anomaly": true },
    "bounding_boxes": [
      { "label": "x", "value": 0.0, "x": 0, "y": 0, "width": 0, "height": 0 },
      { "label": "y", "value": 0.9, "x": 1, "y": 2, "width": 3, "height": 4 }
    ],
    "visual_anomaly_grid": [
      { "label": "anomaly", "value": 0.4, "x": 8, "y": 8, "width": 8, "height": 8 }
    ]
  }"#;

  #[test]
  fn streams_whole_signal_in_windows() {
    let engine = ReplayEngine::from_json_str(CLASSIFIER_JSON).unwrap();
    let reads = RefCell::new(Vec::new());
    let signal = FnSignal::new(10, |offset, out: &mut [f32]| {
      reads.borrow_mut().push((offset, out.len()));
      out.fill(1.0);
    });

    let mut result = ImpulseResult::default();
    let status = engine.run(&signal, &mut result, true);

    assert_eq!(status, StatusCode::Ok);
    assert_eq!(reads.into_inner(), vec![(0, 4), (4, 4), (8, 2)]);
  }

  #[test]
  fn fills_classification_in_label_order() {
    let engine = ReplayEngine::from_json_str(CLASSIFIER_JSON).unwrap();
    let buffer = FeatureBuffer::from(vec![0.0; 10]);
    let mut result = ImpulseResult::default();

    assert_eq!(engine.run(&buffer.as_signal(), &mut result, false), StatusCode::Ok);
    let labels: Vec<_> = result.classification.iter().map(|c| c.label.as_str()).collect();
    let values: Vec<_> = result.classification.iter().map(|c| c.value).collect();
    assert_eq!(labels, ["a", "b", "c"]);
    assert_eq!(values, [0.1, 0.7, 0.2]);
    assert_eq!(result.anomaly, 0.25);
    assert!(result.bounding_boxes.is_empty());
  }

  #[test]
  fn fills_boxes_and_grid_for_detector() {
    let engine = ReplayEngine::from_json_str(DETECTOR_JSON).unwrap();
    assert!(engine.metadata().capabilities.object_detection);
    assert_eq!(engine.window(), REPLAY_DEFAULT_WINDOW);

    let buffer = FeatureBuffer::from(vec![0.0; 6]);
    let mut result = ImpulseResult::default();
    assert_eq!(engine.run(&buffer.as_signal(), &mut result, false), StatusCode::Ok);
    assert_eq!(result.bounding_boxes.len(), 2);
    assert_eq!(result.visual_ad_grid_cells.len(), 1);
    assert!(result.classification.is_empty());
  }

  #[test]
  fn recorded_failure_status_is_returned() {
    let json = CLASSIFIER_JSON.replace("\"window\": 4", "\"window\": 4, \"status\": -5");
    let engine = ReplayEngine::from_json_str(&json).unwrap();
    let buffer = FeatureBuffer::from(vec![0.0; 10]);
    let mut result = ImpulseResult::default();

    assert_eq!(engine.run(&buffer.as_signal(), &mut result, false), StatusCode::DspError);
    assert!(result.classification.is_empty());
  }

  #[test]
  fn engine_rejects_mismatched_signal() {
    let engine = ReplayEngine::from_json_str(CLASSIFIER_JSON).unwrap();
    let buffer = FeatureBuffer::from(vec![0.0; 9]);
    let mut result = ImpulseResult::default();

    assert_eq!(
      engine.run(&buffer.as_signal(), &mut result, false),
      StatusCode::ShapesDontMatch
    );
  }

  #[test]
  fn invalid_descriptions_are_rejected() {
    let zero_window = CLASSIFIER_JSON.replace("\"window\": 4", "\"window\": 0");
    assert!(matches!(
      ReplayEngine::from_json_str(&zero_window),
      Err(ReplayError::Invalid(_))
    ));

    let unknown_status = CLASSIFIER_JSON.replace("\"window\": 4", "\"window\": 4, \"status\": 7");
    assert!(matches!(
      ReplayEngine::from_json_str(&unknown_status),
      Err(ReplayError::Invalid(_))
    ));

    let short_scores = CLASSIFIER_JSON.replace("[0.1, 0.7, 0.2]", "[0.1, 0.7]");
    assert!(matches!(
      ReplayEngine::from_json_str(&short_scores),
      Err(ReplayError::Invalid(_))
    ));

    assert!(matches!(
      ReplayEngine::from_json_str("{"),
      Err(ReplayError::ParseError(_))
    ));
  }

  #[test]
  fn from_url_checks_scheme() {
    let url = Url::parse("file:///tmp/impulse.json").unwrap();
    assert!(matches!(
      ReplayEngine::from_url(&url),
      Err(ReplayError::SchemeMismatch(_))
    ));
  }
}
