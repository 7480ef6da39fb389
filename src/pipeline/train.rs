// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
//! 训练器 (Trainer)
//! 职责: 加载基础模型 → 调用引擎训练 → 报告最佳权重位置

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::{info, warn};

use super::format_elapsed;
use crate::config::TrainConfig;
use crate::engine::Backend;
use crate::error::EngineError;

/// 训练结果
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// 约定的权重路径 `<project>/<name>/weights/best.pt`
    pub artifact: PathBuf,
    /// 引擎报告的实际保存目录 (目录已存在时引擎会追加序号)
    pub save_dir: Option<PathBuf>,
    pub started: DateTime<Local>,
    pub elapsed: Duration,
}

impl TrainReport {
    /// 按引擎实际保存目录推出的权重路径
    pub fn reported_artifact(&self) -> Option<PathBuf> {
        self.save_dir
            .as_ref()
            .map(|dir| dir.join("weights").join("best.pt"))
    }

    pub fn render_summary(&self) -> String {
        let mut s = format!(
            "✅ 训练完成! 模型保存在: {}\n⏱️  开始于 {}, 耗时 {}",
            self.artifact.display(),
            self.started.format("%Y-%m-%d %H:%M:%S"),
            format_elapsed(self.elapsed)
        );
        if let Some(actual) = self.reported_artifact().filter(|a| *a != self.artifact) {
            s.push_str(&format!("\n⚠️  引擎实际保存位置: {}", actual.display()));
        }
        s
    }

    pub fn print_summary(&self) {
        println!("{}", self.render_summary());
    }
}

pub struct Trainer<B: Backend> {
    backend: B,
    config: TrainConfig,
}

impl<B: Backend> Trainer<B> {
    pub fn new(backend: B, config: TrainConfig) -> Self {
        Self { backend, config }
    }

    /// 执行一次训练, 阻塞直到完成; 任何失败原样返回
    pub fn run(&self) -> Result<TrainReport, EngineError> {
        let config = &self.config;
        println!(
            "🚀 开始训练 (设备: {}), 过程可能需要较长时间...",
            config.device
        );
        info!(
            "数据集: {}, 基础模型: {}, epochs={}, batch={}, imgsz={}",
            config.dataset_path.display(),
            config.base_model.display(),
            config.epochs,
            config.batch_size,
            config.image_size
        );

        let started = Local::now();
        let t = Instant::now();

        let mut model = self.backend.load(&config.base_model)?;
        let output = model.train(config)?;

        let report = TrainReport {
            artifact: config.best_weights(),
            save_dir: output.save_dir,
            started,
            elapsed: t.elapsed(),
        };
        if let Some(actual) = report.reported_artifact() {
            if actual != report.artifact {
                warn!(
                    "引擎保存目录与约定不一致: {} (约定 {})",
                    actual.display(),
                    report.artifact.display()
                );
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stub::{Call, FailAt, StubBackend};

    #[test]
    fn test_train_passes_config_unchanged() {
        let stub = StubBackend::new();
        let config = TrainConfig::default();
        let trainer = Trainer::new(stub.clone(), config.clone());

        let report = trainer.run().unwrap();

        assert_eq!(
            stub.calls(),
            vec![
                Call::Load(PathBuf::from("yolov8n.pt")),
                Call::Train(config.clone()),
            ]
        );
        assert_eq!(
            report.artifact,
            PathBuf::from("runs/detect/identificador_lixo_cpu/weights/best.pt")
        );
        assert!(report
            .render_summary()
            .contains("runs/detect/identificador_lixo_cpu/weights/best.pt"));
    }

    #[test]
    fn test_train_failure_propagates() {
        let stub = StubBackend::failing(FailAt::Call, "CUDA out of memory");
        let trainer = Trainer::new(stub.clone(), TrainConfig::default());

        match trainer.run() {
            Err(EngineError::Failed { mode, tail, .. }) => {
                assert_eq!(mode, "train");
                assert_eq!(tail, "CUDA out of memory");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let stub = StubBackend::failing(FailAt::Load, "weights not found");
        let trainer = Trainer::new(stub.clone(), TrainConfig::default());
        assert!(matches!(
            trainer.run(),
            Err(EngineError::Failed { ref mode, .. }) if mode == "load"
        ));
        // 加载失败后不再调用训练
        assert_eq!(stub.calls().len(), 1);
    }

    #[test]
    fn test_summary_mentions_suffixed_save_dir() {
        let stub = StubBackend::new().with_train_dir("runs/detect/identificador_lixo_cpu2");
        let report = Trainer::new(&stub, TrainConfig::default()).run().unwrap();

        let summary = report.render_summary();
        assert!(summary.contains("runs/detect/identificador_lixo_cpu/weights/best.pt"));
        assert!(summary.contains("identificador_lixo_cpu2"));
    }
}
