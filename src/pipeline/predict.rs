// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
//! 推理器 (Inferencer)
//! 职责: 创建输出目录 → 加载模型 → 检测并保存标注结果
//!
//! 失败以 `InferenceError` 返回, 是否影响退出码由调用方通过 `FailurePolicy` 决定

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::{debug, error, info};

use super::format_elapsed;
use crate::config::PredictConfig;
use crate::engine::{Backend, FrameResult};
use crate::error::InferenceError;

const RULE: &str = "---------------------------------------------------------";

/// 推理失败时的退出码策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// 打印诊断后仍以成功退出
    #[default]
    Tolerant,
    /// 失败时以非零退出
    Strict,
}

impl FailurePolicy {
    pub fn exit_status<T, E>(&self, result: &Result<T, E>) -> u8 {
        match (self, result) {
            (_, Ok(_)) => 0,
            (FailurePolicy::Tolerant, Err(_)) => 0,
            (FailurePolicy::Strict, Err(_)) => 1,
        }
    }
}

/// 创建输出目录 (已存在时不报错)
pub fn ensure_output_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// 推理结果
#[derive(Debug, Clone)]
pub struct InferenceReport {
    /// 约定的输出目录 `<project>/<name>`
    pub output_dir: PathBuf,
    /// 引擎报告的实际保存目录
    pub save_dir: Option<PathBuf>,
    pub source: String,
    pub frames: Vec<FrameResult>,
    pub started: DateTime<Local>,
    pub elapsed: Duration,
}

impl InferenceReport {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// 按类别汇总的检测数量
    pub fn class_totals(&self) -> BTreeMap<String, u64> {
        let mut totals = BTreeMap::new();
        for d in self.frames.iter().flat_map(|f| f.detections.iter()) {
            *totals.entry(d.class.clone()).or_insert(0) += u64::from(d.count);
        }
        totals
    }

    pub fn render_summary(&self) -> String {
        let mut s = String::new();
        if !self.frames.is_empty() {
            let totals = self.class_totals();
            let detected: u64 = totals.values().sum();
            s.push_str(&format!(
                "📊 处理 {} 帧, 检测到 {} 个目标 (耗时 {})\n",
                self.frame_count(),
                detected,
                format_elapsed(self.elapsed)
            ));
            for (class, count) in &totals {
                s.push_str(&format!("   - {}: {}\n", class, count));
            }
        }
        s.push_str(&format!(
            "\n{RULE}\n✅ 检测完成! 结果保存在: {}\n{RULE}",
            self.output_dir.display()
        ));
        if let Some(actual) = self.save_dir.as_ref().filter(|d| **d != self.output_dir) {
            s.push_str(&format!("\n⚠️  引擎实际保存位置: {}", actual.display()));
        }
        s
    }

    pub fn print_summary(&self) {
        println!("{}", self.render_summary());
    }
}

pub struct Inferencer<B: Backend> {
    backend: B,
    config: PredictConfig,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(backend: B, config: PredictConfig) -> Self {
        Self { backend, config }
    }

    /// 执行一次检测
    pub fn run(&self) -> Result<InferenceReport, InferenceError> {
        let config = &self.config;
        let started = Local::now();
        let t = Instant::now();

        println!("✅ 加载模型: {}...", config.weights.display());
        let mut model = self
            .backend
            .load(&config.weights)
            .map_err(InferenceError::Load)?;

        let output_dir = config.output_dir();
        ensure_output_dir(&output_dir).map_err(|source| InferenceError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;
        debug!("输出目录: {}", output_dir.display());

        println!("🚀 开始检测: {}...", config.source);
        info!(
            "conf={}, device={}, save={}",
            config.confidence, config.device, config.save
        );
        let output = model.predict(config).map_err(InferenceError::Predict)?;

        Ok(InferenceReport {
            output_dir,
            save_dir: output.save_dir,
            source: config.source.clone(),
            frames: output.frames,
            started,
            elapsed: t.elapsed(),
        })
    }
}

/// 打印结果或诊断信息, 返回退出码
pub fn conclude(result: &Result<InferenceReport, InferenceError>, policy: FailurePolicy) -> u8 {
    match result {
        Ok(report) => report.print_summary(),
        Err(e) => {
            error!("推理失败: {}", e);
            println!("{}", e.diagnostic());
        }
    }
    policy.exit_status(result)
}
