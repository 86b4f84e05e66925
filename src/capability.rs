// 该文件是 Beifeng （北风） 项目的一部分。
// src/capability.rs - 模型能力与元数据
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

/// 模型输出能力
///
/// 由模型编译时决定，每次推理都不变。分类与目标检测互斥，
/// 异常检测与视觉异常检测与前两者正交。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "model_replay", derive(serde::Deserialize))]
#[cfg_attr(feature = "model_replay", serde(default))]
pub struct Capabilities {
  pub object_detection: bool,
  pub anomaly: bool,
  pub visual_anomaly: bool,
}

impl Capabilities {
  pub const CLASSIFICATION: Self = Self {
    object_detection: false,
    anomaly: false,
    visual_anomaly: false,
  };

  pub const OBJECT_DETECTION: Self = Self {
    object_detection: true,
    anomaly: false,
    visual_anomaly: false,
  };

  pub fn with_anomaly(mut self, anomaly: bool) -> Self {
    self.anomaly = anomaly;
    self
  }

  pub fn with_visual_anomaly(mut self, visual_anomaly: bool) -> Self {
    self.visual_anomaly = visual_anomaly;
    self
  }

  /// 是否为分类模式（未启用目标检测时即为分类）
  pub fn classification(&self) -> bool {
    !self.object_detection
  }
}

/// 模型元数据：帧大小、标签与能力
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseMetadata {
  /// 预处理输入帧大小（样本数）
  pub frame_size: usize,
  /// 按标签序号排列的分类标签
  pub labels: Box<[String]>,
  pub capabilities: Capabilities,
}

impl ImpulseMetadata {
  pub fn label_count(&self) -> usize {
    self.labels.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detection_and_classification_are_exclusive() {
    assert!(Capabilities::CLASSIFICATION.classification());
    assert!(!Capabilities::OBJECT_DETECTION.classification());
  }

  #[test]
  fn anomaly_flags_are_orthogonal() {
    let caps = Capabilities::OBJECT_DETECTION
      .with_anomaly(true)
      .with_visual_anomaly(true);
    assert!(caps.object_detection);
    assert!(caps.anomaly);
    assert!(caps.visual_anomaly);
    assert_eq!(
      caps.with_anomaly(false).with_visual_anomaly(false),
      Capabilities::OBJECT_DETECTION
    );
  }
}
