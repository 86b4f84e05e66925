// 该文件是 Beifeng （北风） 项目的一部分。
// src/invoke.rs - 推理调用
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
use tracing::{debug, error, info, warn};

use crate::{
  model::{Classifier, ImpulseResult, StatusCode},
  signal::Signal,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
  #[error("输入缓冲区大小不正确: 期望 {expected} 个样本, 实际为 {actual}")]
  FrameSizeMismatch { expected: usize, actual: usize },
}

/// 一次推理调用的结果
///
/// 只有引擎返回成功时才携带推理结果，失败时结果内容未定义，不对外暴露。
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
  pub status: StatusCode,
  pub result: Option<ImpulseResult>,
}

impl Invocation {
  pub fn is_ok(&self) -> bool {
    self.status.is_ok()
  }
}

/// 检查信号长度与模型帧大小一致后执行推理
///
/// 长度不一致时直接返回 [`InvokeError::FrameSizeMismatch`]，不会调用引擎，也不会读取信号。
pub fn invoke<C, S>(
  classifier: &C,
  signal: &S,
  enable_debug: bool,
) -> Result<Invocation, InvokeError>
where
  C: Classifier + ?Sized,
  S: Signal,
{
  let expected = classifier.metadata().frame_size;
  let actual = signal.total_length();
  if actual != expected {
    error!("输入缓冲区大小不正确: 期望 {}, 实际 {}", expected, actual);
    return Err(InvokeError::FrameSizeMismatch { expected, actual });
  }

  debug!("绑定信号并执行推理 (长度 {}, debug={})", actual, enable_debug);
  let mut result = ImpulseResult::default();
  let status = classifier.run(signal, &mut result, enable_debug);

  if status.is_ok() {
    info!(
      "推理完成: DSP {:.2?}, 推理 {:.2?}, 异常 {:.2?}",
      result.timing.dsp, result.timing.classification, result.timing.anomaly
    );
    Ok(Invocation {
      status,
      result: Some(result),
    })
  } else {
    warn!("引擎返回错误: {}", status);
    Ok(Invocation {
      status,
      result: None,
    })
  }
}

#[cfg(test)]
mod tests {
  use std::cell::{Cell, RefCell};

  use super::*;
  use crate::{
    capability::{Capabilities, ImpulseMetadata},
    model::Classification,
    signal::{FeatureBuffer, FnSignal},
  };

  /// 按固定步长读取信号的脚本化引擎
  struct ScriptedEngine {
    metadata: ImpulseMetadata,
    chunks: Vec<(usize, usize)>,
    status: StatusCode,
    calls: Cell<usize>,
    debug_flags: RefCell<Vec<bool>>,
  }

  impl ScriptedEngine {
    fn new(frame_size: usize, chunks: Vec<(usize, usize)>, status: StatusCode) -> Self {
      Self {
        metadata: ImpulseMetadata {
          frame_size,
          labels: vec!["a".to_string(), "b".to_string()].into_boxed_slice(),
          capabilities: Capabilities::CLASSIFICATION,
        },
        chunks,
        status,
        calls: Cell::new(0),
        debug_flags: RefCell::new(Vec::new()),
      }
    }
  }

  impl Classifier for ScriptedEngine {
    fn metadata(&self) -> &ImpulseMetadata {
      &self.metadata
    }

    fn run(&self, signal: &dyn Signal, result: &mut ImpulseResult, enable_debug: bool) -> StatusCode {
      self.calls.set(self.calls.get() + 1);
      self.debug_flags.borrow_mut().push(enable_debug);
      let mut sum = 0.0;
      for &(offset, length) in &self.chunks {
        sum += signal.read(offset, length).iter().sum::<f32>();
      }
      result.classification = vec![
        Classification {
          label: "a".into(),
          value: sum,
        },
        Classification {
          label: "b".into(),
          value: -sum,
        },
      ];
      self.status
    }
  }

  fn recording_signal<'a>(
    samples: &'a [f32],
    reads: &'a RefCell<Vec<(usize, usize)>>,
  ) -> FnSignal<impl Fn(usize, &mut [f32]) + 'a> {
    FnSignal::new(samples.len(), move |offset, out: &mut [f32]| {
      reads.borrow_mut().push((offset, out.len()));
      out.copy_from_slice(&samples[offset..offset + out.len()]);
    })
  }

  #[test]
  fn mismatched_length_short_circuits_without_reads() {
    let engine = ScriptedEngine::new(297, vec![(0, 297)], StatusCode::Ok);
    let samples = vec![0.0; 200];
    let reads = RefCell::new(Vec::new());
    let signal = recording_signal(&samples, &reads);

    let err = invoke(&engine, &signal, false).unwrap_err();

    assert_eq!(
      err,
      InvokeError::FrameSizeMismatch {
        expected: 297,
        actual: 200
      }
    );
    assert_eq!(engine.calls.get(), 0);
    assert!(reads.borrow().is_empty());
  }

  #[test]
  fn reads_stay_within_declared_length() {
    let chunks = vec![(200, 100), (0, 64), (64, 64), (128, 72), (299, 1)];
    let engine = ScriptedEngine::new(300, chunks.clone(), StatusCode::Ok);
    let samples: Vec<f32> = (0..300).map(|i| i as f32).collect();
    let reads = RefCell::new(Vec::new());
    let signal = recording_signal(&samples, &reads);

    let invocation = invoke(&engine, &signal, false).unwrap();

    assert!(invocation.is_ok());
    let reads = reads.borrow().clone();
    assert_eq!(reads, chunks);
    assert!(reads.iter().all(|&(offset, length)| offset + length <= 300));
  }

  #[test]
  fn engine_failure_hides_result() {
    let engine = ScriptedEngine::new(4, vec![(0, 4)], StatusCode::InferenceError);
    let buffer = FeatureBuffer::from(vec![1.0; 4]);

    let invocation = invoke(&engine, &buffer.as_signal(), true).unwrap();

    assert_eq!(invocation.status, StatusCode::InferenceError);
    assert!(invocation.result.is_none());
    assert!(!invocation.is_ok());
  }

  #[test]
  fn repeated_invocations_are_identical() {
    let engine = ScriptedEngine::new(8, vec![(0, 3), (3, 5)], StatusCode::Ok);
    let buffer = FeatureBuffer::from(vec![0.5, 1.5, -2.0, 4.0, 0.0, 0.25, 8.0, -1.0]);

    let first = invoke(&engine, &buffer.as_signal(), false).unwrap();
    let second = invoke(&engine, &buffer.as_signal(), false).unwrap();

    assert_eq!(first, second);
    assert_eq!(engine.calls.get(), 2);
    assert_eq!(first.result.unwrap().classification[0].value, 11.25);
  }

  #[test]
  fn debug_flag_reaches_engine_without_changing_result() {
    let engine = ScriptedEngine::new(4, vec![(0, 4)], StatusCode::Ok);
    let buffer = FeatureBuffer::from(vec![1.0, 2.0, 3.0, 4.0]);

    let quiet = invoke(&engine, &buffer.as_signal(), false).unwrap();
    let verbose = invoke(&engine, &buffer.as_signal(), true).unwrap();

    assert_eq!(quiet, verbose);
    assert_eq!(*engine.debug_flags.borrow(), vec![false, true]);
  }
}
