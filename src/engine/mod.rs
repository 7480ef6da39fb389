// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
//! 检测引擎统一接口
//!
//! # 架构说明
//!
//! 模型结构、训练循环、导出序列化、NMS 等全部由外部引擎负责,
//! 本模块只定义调用边界:
//!
//! - **Backend**: 加载权重, 得到一个 `Model`
//! - **Model**: 训练 / 导出 / 推理 三种调用
//!
//! ## 实现
//! - **YoloCli**: 以子进程方式驱动 `yolo` 命令行 (`yolo <mode> key=value ...`)
//!   - 参数渲染: `args.rs`
//!   - 子进程输出转发: `process.rs`
//!   - 输出解析 (保存目录/导出文件/逐帧检测): `output.rs`
//!
//! ## 使用示例
//! ```no_run
//! use lixo_yolo::engine::{Backend, Model, YoloCli};
//! use lixo_yolo::config::PredictConfig;
//!
//! let cli = YoloCli::new("yolo");
//! let config = PredictConfig::default();
//! let mut model = cli.load(&config.weights)?;
//! let output = model.predict(&config)?;
//! println!("{} 帧", output.frames.len());
//! # Ok::<(), lixo_yolo::EngineError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::config::{ExportConfig, PredictConfig, TrainConfig};
use crate::error::EngineError;

pub mod args;
pub mod output;
mod process;
pub mod yolo_cli;

#[cfg(test)]
pub(crate) mod stub;

pub use args::Overrides;
pub use output::{ClassCount, FrameResult, OutputScanner};
pub use yolo_cli::YoloCli;

/// 训练调用的返回
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainOutput {
    /// 引擎报告的实际保存目录
    pub save_dir: Option<PathBuf>,
}

/// 导出调用的返回
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportOutput {
    /// 引擎报告的导出文件
    pub exported: Option<PathBuf>,
}

/// 推理调用的返回
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictOutput {
    pub save_dir: Option<PathBuf>,
    pub frames: Vec<FrameResult>,
}

/// 检测引擎: 负责加载权重
pub trait Backend {
    /// 加载模型权重 (不做任何校验, 由引擎在调用时报错)
    fn load(&self, weights: &Path) -> Result<Box<dyn Model>, EngineError>;
}

/// 已加载的模型
pub trait Model {
    /// 训练: 阻塞直到完成
    fn train(&mut self, config: &TrainConfig) -> Result<TrainOutput, EngineError>;

    /// 导出为可移植的推理格式
    fn export(&mut self, config: &ExportConfig) -> Result<ExportOutput, EngineError>;

    /// 推理: 对媒体源执行检测
    fn predict(&mut self, config: &PredictConfig) -> Result<PredictOutput, EngineError>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn load(&self, weights: &Path) -> Result<Box<dyn Model>, EngineError> {
        (**self).load(weights)
    }
}
