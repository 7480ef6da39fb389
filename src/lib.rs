// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod cli; // 命令行公共参数
pub mod config; // 训练/导出/推理配置参数
pub mod engine; // 检测引擎接口与 yolo 命令行实现
pub mod error; // 错误类型
pub mod logging; // 日志初始化
pub mod pipeline; // 训练/导出/推理流程

pub use crate::config::{
    Device, EngineConfig, ExportConfig, ExportFormat, PredictConfig, RunConfig, TrainConfig,
};
pub use crate::engine::{Backend, FrameResult, Model, YoloCli};
pub use crate::error::{ConfigError, EngineError, InferenceError};
pub use crate::pipeline::{
    ExportReport, Exporter, FailurePolicy, InferenceReport, Inferencer, TrainReport, Trainer,
};
