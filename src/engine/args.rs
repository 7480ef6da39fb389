// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
//! 命令行覆盖参数 (`key=value`) 的组装

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;

use crate::config::{ExportConfig, PredictConfig, TrainConfig};

/// 有序的 `key=value` 参数表, 同名键后写覆盖先写
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pairs: Vec<(String, String)>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Display) -> &mut Self {
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key.to_string(), value)),
        }
        self
    }

    /// 布尔值按引擎习惯写成 `True` / `False`
    pub fn flag(&mut self, key: &str, value: bool) -> &mut Self {
        self.set(key, if value { "True" } else { "False" })
    }

    pub fn path(&mut self, key: &str, value: &Path) -> &mut Self {
        self.set(key, value.to_string_lossy())
    }

    /// 合并用户提供的额外覆盖项
    pub fn extend(&mut self, extra: &BTreeMap<String, String>) -> &mut Self {
        for (key, value) in extra {
            self.set(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 渲染为命令行参数
    pub fn to_args(&self) -> Vec<String> {
        self.pairs.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }

    /// 训练参数
    pub fn for_train(model: &Path, config: &TrainConfig) -> Self {
        let mut o = Self::new();
        o.path("model", model)
            .path("data", &config.dataset_path)
            .set("epochs", config.epochs)
            .set("imgsz", config.image_size)
            .set("batch", config.batch_size)
            .path("project", &config.project)
            .set("name", &config.run_name)
            .set("device", &config.device)
            .flag("exist_ok", config.exist_ok)
            .extend(&config.extra);
        o
    }

    /// 导出参数
    pub fn for_export(model: &Path, config: &ExportConfig) -> Self {
        let mut o = Self::new();
        o.path("model", model).set("format", config.format);
        if let Some(imgsz) = config.image_size {
            o.set("imgsz", imgsz);
        }
        o.extend(&config.extra);
        o
    }

    /// 推理参数
    pub fn for_predict(model: &Path, config: &PredictConfig) -> Self {
        let mut o = Self::new();
        o.path("model", model)
            .set("source", &config.source)
            .set("conf", config.confidence)
            .set("device", &config.device)
            .flag("save", config.save)
            .path("project", &config.project)
            .set("name", &config.run_name)
            .flag("exist_ok", config.exist_ok)
            .extend(&config.extra);
        o
    }
}
