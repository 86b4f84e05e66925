// 该文件是 Beifeng （北风） 项目的一部分。
// src/model.rs - 模型（分类引擎）接口与推理结果
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

use std::{fmt, time::Duration};

use crate::{capability::ImpulseMetadata, signal::Signal};

/// 分类引擎
///
/// 特征提取、模型执行与内存管理都在引擎内部完成。
/// 引擎在 `run` 的调用栈内同步地回调 `signal` 读取数据，并通过 `result` 输出结果。
pub trait Classifier {
  fn metadata(&self) -> &ImpulseMetadata;

  fn run(&self, signal: &dyn Signal, result: &mut ImpulseResult, debug: bool) -> StatusCode;
}

impl<C: Classifier + ?Sized> Classifier for &C {
  fn metadata(&self) -> &ImpulseMetadata {
    (**self).metadata()
  }

  fn run(&self, signal: &dyn Signal, result: &mut ImpulseResult, debug: bool) -> StatusCode {
    (**self).run(signal, result, debug)
  }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
  fn metadata(&self) -> &ImpulseMetadata {
    (**self).metadata()
  }

  fn run(&self, signal: &dyn Signal, result: &mut ImpulseResult, debug: bool) -> StatusCode {
    (**self).run(signal, result, debug)
  }
}

/// 引擎返回码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
  Ok,
  ShapesDontMatch,
  Canceled,
  TfliteError,
  DspError,
  ArenaAllocFailed,
  AllocFailed,
  OnlySupportedForImages,
  UnsupportedInferencingEngine,
  OutOfMemory,
  InputTensorWasNull,
  OutputTensorWasNull,
  InferenceError,
  InvalidSize,
}

impl StatusCode {
  pub const ALL: [StatusCode; 14] = [
    StatusCode::Ok,
    StatusCode::ShapesDontMatch,
    StatusCode::Canceled,
    StatusCode::TfliteError,
    StatusCode::DspError,
    StatusCode::ArenaAllocFailed,
    StatusCode::AllocFailed,
    StatusCode::OnlySupportedForImages,
    StatusCode::UnsupportedInferencingEngine,
    StatusCode::OutOfMemory,
    StatusCode::InputTensorWasNull,
    StatusCode::OutputTensorWasNull,
    StatusCode::InferenceError,
    StatusCode::InvalidSize,
  ];

  pub fn code(&self) -> i32 {
    match self {
      StatusCode::Ok => 0,
      StatusCode::ShapesDontMatch => -1,
      StatusCode::Canceled => -2,
      StatusCode::TfliteError => -3,
      StatusCode::DspError => -5,
      StatusCode::ArenaAllocFailed => -6,
      StatusCode::AllocFailed => -8,
      StatusCode::OnlySupportedForImages => -9,
      StatusCode::UnsupportedInferencingEngine => -10,
      StatusCode::OutOfMemory => -11,
      StatusCode::InputTensorWasNull => -13,
      StatusCode::OutputTensorWasNull => -14,
      StatusCode::InferenceError => -22,
      StatusCode::InvalidSize => -24,
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      StatusCode::Ok => "OK",
      StatusCode::ShapesDontMatch => "SHAPES_DONT_MATCH",
      StatusCode::Canceled => "CANCELED",
      StatusCode::TfliteError => "TFLITE_ERROR",
      StatusCode::DspError => "DSP_ERROR",
      StatusCode::ArenaAllocFailed => "TFLITE_ARENA_ALLOC_FAILED",
      StatusCode::AllocFailed => "ALLOC_FAILED",
      StatusCode::OnlySupportedForImages => "ONLY_SUPPORTED_FOR_IMAGES",
      StatusCode::UnsupportedInferencingEngine => "UNSUPPORTED_INFERENCING_ENGINE",
      StatusCode::OutOfMemory => "OUT_OF_MEMORY",
      StatusCode::InputTensorWasNull => "INPUT_TENSOR_WAS_NULL",
      StatusCode::OutputTensorWasNull => "OUTPUT_TENSOR_WAS_NULL",
      StatusCode::InferenceError => "INFERENCE_ERROR",
      StatusCode::InvalidSize => "INVALID_SIZE",
    }
  }

  pub fn from_code(code: i32) -> Option<Self> {
    Self::ALL.into_iter().find(|status| status.code() == code)
  }

  pub fn is_ok(&self) -> bool {
    *self == StatusCode::Ok
  }
}

impl fmt::Display for StatusCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({})", self.code(), self.name())
  }
}

/// 单个分类标签的置信度
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
  pub label: String,
  pub value: f32,
}

/// 边界框，坐标位于输入缓冲区坐标系
///
/// `value` 恰好为 0 表示该槽位未使用，消费方必须跳过。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "model_replay", derive(serde::Deserialize))]
pub struct BoundingBox {
  pub label: String,
  pub value: f32,
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}

impl BoundingBox {
  pub fn is_used(&self) -> bool {
    self.value != 0.0
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timing {
  pub dsp: Duration,
  pub classification: Duration,
  pub anomaly: Duration,
}

/// 推理结果
///
/// 分类结果与边界框按模型能力只填充其一；异常分数与视觉异常网格各自可选。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImpulseResult {
  pub classification: Vec<Classification>,
  pub bounding_boxes: Vec<BoundingBox>,
  pub anomaly: f32,
  pub visual_ad_grid_cells: Vec<BoundingBox>,
  pub timing: Timing,
}

impl ImpulseResult {
  /// 比较除耗时以外的预测内容
  pub fn same_prediction(&self, other: &Self) -> bool {
    self.classification == other.classification
      && self.bounding_boxes == other.bounding_boxes
      && self.anomaly.to_bits() == other.anomaly.to_bits()
      && self.visual_ad_grid_cells == other.visual_ad_grid_cells
  }
}

#[cfg(feature = "model_replay")]
mod replay;
#[cfg(feature = "model_replay")]
pub use self::replay::{ReplayEngine, ReplayError};
