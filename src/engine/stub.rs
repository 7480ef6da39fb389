// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
//! 测试用的记录型后端: 记录每次调用的参数, 可注入失败

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{Backend, ExportOutput, Model, PredictOutput, TrainOutput};
use crate::config::{ExportConfig, PredictConfig, TrainConfig};
use crate::error::EngineError;

/// 记录到的调用
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Load(PathBuf),
    Train(TrainConfig),
    Export(ExportConfig),
    Predict(PredictConfig),
}

/// 注入失败的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailAt {
    Load,
    Call,
}

#[derive(Clone, Default)]
pub(crate) struct StubBackend {
    calls: Arc<Mutex<Vec<Call>>>,
    fail: Option<(FailAt, &'static str)>,
    canned: PredictOutput,
    export_path: Option<PathBuf>,
    train_dir: Option<PathBuf>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(at: FailAt, message: &'static str) -> Self {
        Self {
            fail: Some((at, message)),
            ..Self::default()
        }
    }

    pub fn with_predict(mut self, canned: PredictOutput) -> Self {
        self.canned = canned;
        self
    }

    pub fn with_export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = Some(path.into());
        self
    }

    pub fn with_train_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.train_dir = Some(path.into());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// 模拟引擎以非零退出码结束
    fn failed(mode: &str, message: &str) -> EngineError {
        EngineError::Failed {
            mode: mode.to_string(),
            code: Some(1),
            tail: message.to_string(),
        }
    }
}

impl Backend for StubBackend {
    fn load(&self, weights: &Path) -> Result<Box<dyn Model>, EngineError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Load(weights.to_path_buf()));
        if let Some((FailAt::Load, message)) = self.fail {
            return Err(Self::failed("load", message));
        }
        Ok(Box::new(StubModel {
            backend: self.clone(),
        }))
    }
}

struct StubModel {
    backend: StubBackend,
}

impl StubModel {
    fn record(&self, call: Call) -> Result<(), EngineError> {
        let mode = match &call {
            Call::Load(_) => "load",
            Call::Train(_) => "train",
            Call::Export(_) => "export",
            Call::Predict(_) => "predict",
        };
        self.backend.calls.lock().unwrap().push(call);
        match self.backend.fail {
            Some((FailAt::Call, message)) => Err(StubBackend::failed(mode, message)),
            _ => Ok(()),
        }
    }
}

impl Model for StubModel {
    fn train(&mut self, config: &TrainConfig) -> Result<TrainOutput, EngineError> {
        self.record(Call::Train(config.clone()))?;
        Ok(TrainOutput {
            save_dir: self.backend.train_dir.clone(),
        })
    }

    fn export(&mut self, config: &ExportConfig) -> Result<ExportOutput, EngineError> {
        self.record(Call::Export(config.clone()))?;
        Ok(ExportOutput {
            exported: self.backend.export_path.clone(),
        })
    }

    fn predict(&mut self, config: &PredictConfig) -> Result<PredictOutput, EngineError> {
        self.record(Call::Predict(config.clone()))?;
        Ok(self.backend.canned.clone())
    }
}
