// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
//! 导出器 (Exporter): 加载权重 → 转换为可移植推理格式, 不做任何前后校验

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::info;

use super::format_elapsed;
use crate::config::{ExportConfig, ExportFormat};
use crate::engine::Backend;
use crate::error::EngineError;

#[derive(Debug, Clone)]
pub struct ExportReport {
    pub weights: PathBuf,
    pub format: ExportFormat,
    /// 引擎报告的导出文件, 未报告时为约定的同目录路径
    pub exported: PathBuf,
    pub elapsed: Duration,
}

impl ExportReport {
    pub fn render_summary(&self) -> String {
        format!(
            "✅ 导出完成 ({}): {} → {} ({})",
            self.format,
            self.weights.display(),
            self.exported.display(),
            format_elapsed(self.elapsed)
        )
    }

    pub fn print_summary(&self) {
        println!("{}", self.render_summary());
    }
}

pub struct Exporter<B: Backend> {
    backend: B,
    config: ExportConfig,
}

impl<B: Backend> Exporter<B> {
    pub fn new(backend: B, config: ExportConfig) -> Self {
        Self { backend, config }
    }

    pub fn run(&self) -> Result<ExportReport, EngineError> {
        let config = &self.config;
        println!(
            "📦 导出模型: {} (格式: {})",
            config.weights.display(),
            config.format
        );
        let t = Instant::now();

        let mut model = self.backend.load(&config.weights)?;
        let output = model.export(config)?;

        let exported = output
            .exported
            .unwrap_or_else(|| config.format.artifact_path(&config.weights));
        info!("导出文件: {}", exported.display());

        Ok(ExportReport {
            weights: config.weights.clone(),
            format: config.format,
            exported,
            elapsed: t.elapsed(),
        })
    }
}
