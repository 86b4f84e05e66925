// 该文件是 Beifeng （北风） 项目的一部分。
// src/output/report.rs - 推理结果文本报告
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

use std::time::Duration;

use crate::{
  capability::Capabilities,
  invoke::{Invocation, InvokeError},
  model::{BoundingBox, ImpulseResult},
};

/// 按模型能力渲染报告
///
/// 引擎返回失败时只输出返回码一行，推理结果不做解释。
pub fn report_lines(capabilities: &Capabilities, invocation: &Invocation) -> Vec<String> {
  let mut lines = vec![format!("run_classifier returned: {}", invocation.status)];

  let result = match (&invocation.result, invocation.status.is_ok()) {
    (Some(result), true) => result,
    _ => return lines,
  };

  lines.push(format!(
    "Timing: DSP {} ms, inference {} ms, anomaly {} ms",
    millis(result.timing.dsp),
    millis(result.timing.classification),
    millis(result.timing.anomaly)
  ));

  if capabilities.object_detection {
    lines.push("Object detection bounding boxes:".to_string());
    push_boxes(&mut lines, &result.bounding_boxes);
  } else {
    lines.push("Predictions:".to_string());
    push_classification(&mut lines, result);
  }

  if capabilities.anomaly {
    lines.push(format!("Anomaly prediction: {:.3}", result.anomaly));
  }

  if capabilities.visual_anomaly {
    lines.push("Visual anomalies:".to_string());
    push_boxes(&mut lines, &result.visual_ad_grid_cells);
  }

  lines
}

/// 输入缓冲区大小与模型帧大小不一致时的提示
pub fn invoke_error_lines(err: &InvokeError) -> Vec<String> {
  match err {
    InvokeError::FrameSizeMismatch { expected, actual } => vec![
      "ERROR: The size of the input buffer is not correct.".to_string(),
      format!("Expected {} items, but got {}", expected, actual),
    ],
  }
}

fn millis(duration: Duration) -> u128 {
  duration.as_millis()
}

// 分类结果不过滤零值
fn push_classification(lines: &mut Vec<String>, result: &ImpulseResult) {
  for item in &result.classification {
    lines.push(format!("  {}: {:.5}", item.label, item.value));
  }
}

fn push_boxes(lines: &mut Vec<String>, boxes: &[BoundingBox]) {
  for bb in boxes.iter().filter(|bb| bb.is_used()) {
    lines.push(format!(
      "  {} ({}) [x:{},y:{},width:{},height:{}]",
      bb.label, bb.value, bb.x, bb.y, bb.width, bb.height
    ));
  }
}
