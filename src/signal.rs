// 该文件是 Beifeng （北风） 项目的一部分。
// src/signal.rs - 信号提供者（按窗口拉取的特征数据）
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

use std::fmt;

/// 特征缓冲区
///
/// 由调用方持有，构造后不再修改。长度在构造时确定，
/// 是否与模型的帧大小一致由推理调用负责检查。
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBuffer {
  data: Box<[f32]>,
}

impl From<Vec<f32>> for FeatureBuffer {
  fn from(data: Vec<f32>) -> Self {
    Self {
      data: data.into_boxed_slice(),
    }
  }
}

impl From<&[f32]> for FeatureBuffer {
  fn from(data: &[f32]) -> Self {
    Self { data: data.into() }
  }
}

impl AsRef<[f32]> for FeatureBuffer {
  fn as_ref(&self) -> &[f32] {
    &self.data
  }
}

impl FeatureBuffer {
  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  /// 以该缓冲区为后备存储创建信号提供者
  pub fn as_signal(&self) -> SliceSignal<'_> {
    SliceSignal::new(&self.data)
  }
}

/// 信号提供者
///
/// 引擎通过 [`Signal::read_into`] 按窗口拉取数据，读取的顺序和分块方式完全由引擎决定。
/// 每次调用都必须满足 `offset + out.len() <= total_length()`，
/// 该前提由推理调用前的帧大小检查保证，越界属于编程错误。
pub trait Signal {
  /// 信号总长度（样本数）
  fn total_length(&self) -> usize;

  /// 将从 `offset` 开始的 `out.len()` 个样本写入 `out`
  fn read_into(&self, offset: usize, out: &mut [f32]);

  /// 读取一个窗口，只分配与 `length` 成正比的内存
  fn read(&self, offset: usize, length: usize) -> Vec<f32> {
    let mut window = vec![0.0; length];
    self.read_into(offset, &mut window);
    window
  }
}

impl<S: Signal + ?Sized> Signal for &S {
  fn total_length(&self) -> usize {
    (**self).total_length()
  }

  fn read_into(&self, offset: usize, out: &mut [f32]) {
    (**self).read_into(offset, out)
  }
}

/// 借用切片的信号提供者
#[derive(Debug, Clone, Copy)]
pub struct SliceSignal<'a> {
  samples: &'a [f32],
}

impl<'a> SliceSignal<'a> {
  pub fn new(samples: &'a [f32]) -> Self {
    Self { samples }
  }
}

impl Signal for SliceSignal<'_> {
  fn total_length(&self) -> usize {
    self.samples.len()
  }

  fn read_into(&self, offset: usize, out: &mut [f32]) {
    debug_assert!(
      offset + out.len() <= self.samples.len(),
      "窗口越界: offset {} + length {} > {}",
      offset,
      out.len(),
      self.samples.len()
    );
    out.copy_from_slice(&self.samples[offset..offset + out.len()]);
  }
}

/// 由闭包提供数据的信号提供者
///
/// 适用于后备存储不是连续切片的情形，例如环形缓冲区或按需换算的原始数据。
pub struct FnSignal<F> {
  total_length: usize,
  get_data: F,
}

impl<F: Fn(usize, &mut [f32])> FnSignal<F> {
  pub fn new(total_length: usize, get_data: F) -> Self {
    Self {
      total_length,
      get_data,
    }
  }
}

impl<F> fmt::Debug for FnSignal<F> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FnSignal")
      .field("total_length", &self.total_length)
      .finish_non_exhaustive()
  }
}

impl<F: Fn(usize, &mut [f32])> Signal for FnSignal<F> {
  fn total_length(&self) -> usize {
    self.total_length
  }

  fn read_into(&self, offset: usize, out: &mut [f32]) {
    debug_assert!(offset + out.len() <= self.total_length);
    (self.get_data)(offset, out)
  }
}
