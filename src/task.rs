// 该文件是 Beifeng （北风） 项目的一部分。
// src/task.rs - 推理任务
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
  sync::{
    Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
  },
  thread,
  time::Duration,
};

use thiserror::Error;
use tracing::{info, warn};

use crate::{
  invoke::{InvokeError, invoke},
  model::{Classifier, ImpulseResult, StatusCode},
  output::Render,
  signal::FeatureBuffer,
};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum TaskError {
  #[error("没有输入样本")]
  NoInput,
  #[error("配置错误: {0}")]
  Invoke(#[from] InvokeError),
  #[error("引擎返回错误: {0}")]
  Engine(StatusCode),
  #[error("渲染错误: {0}")]
  Render(BoxError),
  #[error("无法设置中断处理: {0}")]
  SignalHandler(#[from] ctrlc::Error),
}

impl TaskError {
  /// 进程退出码：配置错误为 1，引擎错误为 2
  pub fn exit_code(&self) -> u8 {
    match self {
      TaskError::Engine(_) => 2,
      _ => 1,
    }
  }
}

pub trait Task<I, C, O>: Sized {
  type Error;
  fn run_task(self, input: I, classifier: C, output: O) -> Result<(), Self::Error>;
}

/// 执行一次推理并渲染，引擎失败时先渲染返回码再返回错误
fn run_once<C, O>(
  sample: &FeatureBuffer,
  classifier: &C,
  output: &O,
  enable_debug: bool,
) -> Result<Option<ImpulseResult>, TaskError>
where
  C: Classifier,
  O: Render,
  O::Error: std::error::Error + Send + Sync + 'static,
{
  let invocation = invoke(classifier, &sample.as_signal(), enable_debug)?;
  output
    .render_result(&classifier.metadata().capabilities, &invocation)
    .map_err(|e| TaskError::Render(Box::new(e)))?;

  if !invocation.is_ok() {
    return Err(TaskError::Engine(invocation.status));
  }
  Ok(invocation.result)
}

#[derive(Default, Debug)]
pub struct OneShotTask {
  debug: bool,
}

impl OneShotTask {
  pub fn with_debug(mut self, debug: bool) -> Self {
    self.debug = debug;
    self
  }
}

impl<I, C, O> Task<I, C, O> for OneShotTask
where
  I: Iterator<Item = FeatureBuffer>,
  C: Classifier,
  O: Render,
  O::Error: std::error::Error + Send + Sync + 'static,
{
  type Error = TaskError;

  fn run_task(self, mut input: I, classifier: C, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let sample = input.next().ok_or(TaskError::NoInput)?;
    info!("输入样本获取成功 ({} 个值)，开始推理...", sample.len());
    let now = std::time::Instant::now();
    run_once(&sample, &classifier, &output, self.debug)?;
    info!("推理与渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

#[derive(Debug)]
pub struct RepeatShotTask {
  debug: bool,
  repeat_times: usize,
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self {
      debug: false,
      repeat_times: 10,
    }
  }
}

impl RepeatShotTask {
  pub fn with_debug(mut self, debug: bool) -> Self {
    self.debug = debug;
    self
  }

  pub fn with_repeat_times(mut self, repeat_times: usize) -> Self {
    self.repeat_times = repeat_times.max(1);
    self
  }
}

/// 重复推理的统计
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatSummary {
  pub runs: usize,
  /// 与第一次成功推理结果不一致的次数
  pub diverged: usize,
  pub average: Duration,
}

impl RepeatShotTask {
  /// 对第一个样本重复推理，返回耗时与结果一致性统计
  pub fn run_repeat<I, C, O>(
    &self,
    mut input: I,
    classifier: &C,
    output: &O,
  ) -> Result<RepeatSummary, TaskError>
  where
    I: Iterator<Item = FeatureBuffer>,
    C: Classifier,
    O: Render,
    O::Error: std::error::Error + Send + Sync + 'static,
  {
    info!("开始任务...");
    let sample = input.next().ok_or(TaskError::NoInput)?;
    info!("输入样本获取成功，重复推理 {} 次...", self.repeat_times);

    let mut first: Option<ImpulseResult> = None;
    let mut diverged = 0usize;
    let mut times = Vec::with_capacity(self.repeat_times);
    for i in 0..self.repeat_times {
      let now = std::time::Instant::now();
      let result = run_once(&sample, classifier, output, self.debug)?;
      let elapsed = now.elapsed();
      info!("({})推理完成，耗时: {:.2?}", i, elapsed);
      times.push(elapsed);

      if let Some(result) = result {
        match &first {
          Some(expected) if !expected.same_prediction(&result) => {
            warn!("({})推理结果与第一次不一致", i);
            diverged += 1;
          }
          Some(_) => {}
          None => first = Some(result),
        }
      }
    }

    // 前两次包含预热，样本足够时跳过
    let skip = if times.len() > 2 { 2 } else { 0 };
    let average = times.iter().skip(skip).sum::<Duration>() / (times.len() - skip) as u32;
    warn!("平均推理时间: {:.2?}", average);
    if diverged > 0 {
      warn!("{} 次推理结果与第一次不一致", diverged);
    }

    Ok(RepeatSummary {
      runs: times.len(),
      diverged,
      average,
    })
  }
}

impl<I, C, O> Task<I, C, O> for RepeatShotTask
where
  I: Iterator<Item = FeatureBuffer>,
  C: Classifier,
  O: Render,
  O::Error: std::error::Error + Send + Sync + 'static,
{
  type Error = TaskError;

  fn run_task(self, input: I, classifier: C, output: O) -> Result<(), Self::Error> {
    self.run_repeat(input, &classifier, &output).map(|_| ())
  }
}

#[derive(Default, Debug)]
pub struct ContinuousTask {
  debug: bool,
  frame_number: Option<usize>,
}

impl ContinuousTask {
  pub fn with_debug(mut self, debug: bool) -> Self {
    self.debug = debug;
    self
  }

  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }
}

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// 安装进程级的中断处理，重复调用不会再次注册
fn install_interrupt_handler() -> Result<(), ctrlc::Error> {
  static INSTALLED: Mutex<bool> = Mutex::new(false);

  let mut installed = INSTALLED.lock().unwrap_or_else(PoisonError::into_inner);
  if *installed {
    return Ok(());
  }

  ctrlc::set_handler(|| {
    if INTERRUPTED.swap(true, Ordering::SeqCst) {
      return;
    }
    info!("收到中断信号，准备退出...");
    thread::spawn(|| {
      thread::sleep(Duration::from_secs(30));
      warn!("强制退出程序");
      std::process::exit(1);
    });
  })?;
  *installed = true;
  Ok(())
}

impl<I, C, O> Task<I, C, O> for ContinuousTask
where
  I: Iterator<Item = FeatureBuffer>,
  C: Classifier,
  O: Render,
  O::Error: std::error::Error + Send + Sync + 'static,
{
  type Error = TaskError;

  fn run_task(self, input: I, classifier: C, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    install_interrupt_handler()?;
    INTERRUPTED.store(false, Ordering::SeqCst);

    let mut frame_index = 0usize;
    for sample in input {
      frame_index = frame_index.wrapping_add(1);
      info!("处理第 {} 个样本", frame_index);
      let now = std::time::Instant::now();
      run_once(&sample, &classifier, &output, self.debug)?;
      info!("推理完成，耗时: {:.2?}", now.elapsed());
      if self.frame_number.is_some_and(|n| frame_index >= n) {
        info!("达到指定样本数 {}, 退出任务循环", frame_index);
        break;
      }
      if INTERRUPTED.load(Ordering::SeqCst) {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!("任务完成，退出");
    Ok(())
  }
}
