// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
//! 流程编排 (Pipeline)
//!
//! 三个互相独立的入口, 只通过文件路径约定衔接:
//! - Trainer:    数据集 + 超参数 → `<project>/<name>/weights/best.pt`
//! - Exporter:   best.pt → ONNX 等可移植格式
//! - Inferencer: best.pt + 媒体源 → `<project>/<name>/` 下的标注结果

pub mod export;
pub mod predict;
pub mod train;

use std::time::Duration;

pub use export::{ExportReport, Exporter};
pub use predict::{conclude, ensure_output_dir, FailurePolicy, InferenceReport, Inferencer};
pub use train::{TrainReport, Trainer};

/// 耗时格式化: `2h 05m 09s` / `3m 07s` / `12.4s`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 3600 {
        format!("{}h {:02}m {:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}
