// 该文件是 Beifeng （北风） 项目的一部分。
// src/bin/classify_oneshot.rs - 单次推理
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

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use url::Url;

use beifeng::{
  FromUrl,
  input::InputWrapper,
  model::ReplayEngine,
  output::{OutputWrapper, report::invoke_error_lines},
  task::{OneShotTask, Task, TaskError},
};
use tracing::{error, info};

/// Beifeng 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型描述路径
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入来源
  #[arg(long, value_name = "SOURCE", default_value = "builtin:")]
  pub input: Url,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT", default_value = "stdout:")]
  pub output: Url,
  /// 引擎调试输出
  #[arg(long)]
  pub debug: bool,
}

fn main() -> Result<ExitCode> {
  tracing_subscriber::fmt().with_writer(std::io::stderr).init();

  let args = Args::parse();

  info!("模型描述路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let input = InputWrapper::from_url(&args.input)?;
  let model = ReplayEngine::from_url(&args.model)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let result = OneShotTask::default()
    .with_debug(args.debug)
    .run_task(input, model, output);

  match result {
    Ok(()) => Ok(ExitCode::SUCCESS),
    Err(e) => {
      if let TaskError::Invoke(err) = &e {
        for line in invoke_error_lines(err) {
          println!("{}", line);
        }
      } else {
        error!("任务失败: {}", e);
      }
      Ok(ExitCode::from(e.exit_code()))
    }
  }
}
