// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
//! 运行配置 - 训练/导出/推理参数, 可通过JSON文件调整

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;

/// 计算设备
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Device {
    /// 通用处理器
    Cpu,
    /// CUDA 设备编号 (支持多卡: "0,1")
    Cuda(Vec<u32>),
    /// Apple Metal
    Mps,
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Mps => write!(f, "mps"),
            Device::Cuda(ids) => {
                let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                write!(f, "{}", ids.join(","))
            }
        }
    }
}

impl FromStr for Device {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "cpu" => return Ok(Device::Cpu),
            "mps" => return Ok(Device::Mps),
            "cuda" | "gpu" => return Ok(Device::Cuda(vec![0])),
            _ => {}
        }

        let ids = s.strip_prefix("cuda:").unwrap_or(&s);
        let parsed: Result<Vec<u32>, _> = ids.split(',').map(|id| id.trim().parse()).collect();
        match parsed {
            Ok(ids) if !ids.is_empty() => Ok(Device::Cuda(ids)),
            _ => Err(ConfigError::Device(s)),
        }
    }
}

impl TryFrom<String> for Device {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Device> for String {
    fn from(device: Device) -> Self {
        device.to_string()
    }
}

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Onnx,
    TorchScript,
    OpenVino,
    /// TensorRT
    Engine,
    CoreMl,
    TfLite,
    Ncnn,
}

impl Default for ExportFormat {
    fn default() -> Self {
        Self::Onnx
    }
}

impl ExportFormat {
    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Onnx => "onnx",
            ExportFormat::TorchScript => "torchscript",
            ExportFormat::OpenVino => "openvino",
            ExportFormat::Engine => "engine",
            ExportFormat::CoreMl => "coreml",
            ExportFormat::TfLite => "tflite",
            ExportFormat::Ncnn => "ncnn",
        }
    }

    /// 约定的导出产物路径 (与权重文件同目录)
    pub fn artifact_path(&self, weights: &Path) -> PathBuf {
        let stem = weights
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        let dir = weights.parent().unwrap_or_else(|| Path::new(""));
        match self {
            ExportFormat::Onnx => dir.join(format!("{stem}.onnx")),
            ExportFormat::TorchScript => dir.join(format!("{stem}.torchscript")),
            ExportFormat::Engine => dir.join(format!("{stem}.engine")),
            ExportFormat::CoreMl => dir.join(format!("{stem}.mlpackage")),
            ExportFormat::OpenVino => dir.join(format!("{stem}_openvino_model")),
            ExportFormat::Ncnn => dir.join(format!("{stem}_ncnn_model")),
            ExportFormat::TfLite => dir
                .join(format!("{stem}_saved_model"))
                .join(format!("{stem}_float32.tflite")),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "onnx" => Ok(ExportFormat::Onnx),
            "torchscript" => Ok(ExportFormat::TorchScript),
            "openvino" => Ok(ExportFormat::OpenVino),
            "engine" | "tensorrt" => Ok(ExportFormat::Engine),
            "coreml" => Ok(ExportFormat::CoreMl),
            "tflite" => Ok(ExportFormat::TfLite),
            "ncnn" => Ok(ExportFormat::Ncnn),
            other => Err(ConfigError::Format(other.to_string())),
        }
    }
}

/// 训练输出的约定路径 (`<project>/<name>/weights/best.pt`)
pub const DEFAULT_WEIGHTS: &str = "runs/detect/identificador_lixo_cpu/weights/best.pt";

/// 训练参数
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub dataset_path: PathBuf, // 数据集描述文件 data.yaml
    pub base_model: PathBuf,   // 预训练基础模型
    pub epochs: u32,
    pub batch_size: i32, // -1 表示自动批量
    pub image_size: u32,
    pub device: Device,
    pub project: PathBuf, // 输出目录
    pub run_name: String, // 运行名称
    pub exist_ok: bool,
    pub extra: BTreeMap<String, String>, // 额外的 key=value 覆盖项, 原样传递
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("E:/Aulas/projetos/Lixo.v3i.yolov8/data.yaml"),
            base_model: PathBuf::from("yolov8n.pt"),
            epochs: 50,
            batch_size: 4,
            image_size: 640,
            device: Device::Cpu,
            project: PathBuf::from("runs/detect"),
            run_name: "identificador_lixo_cpu".to_string(),
            exist_ok: false,
            extra: BTreeMap::new(),
        }
    }
}

impl TrainConfig {
    pub fn run_dir(&self) -> PathBuf {
        self.project.join(&self.run_name)
    }

    /// 训练完成后最佳权重的约定路径
    pub fn best_weights(&self) -> PathBuf {
        self.run_dir().join("weights").join("best.pt")
    }
}

/// 导出参数
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub weights: PathBuf,
    pub format: ExportFormat,
    pub image_size: Option<u32>,
    pub extra: BTreeMap<String, String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            weights: PathBuf::from(DEFAULT_WEIGHTS),
            format: ExportFormat::Onnx,
            image_size: None,
            extra: BTreeMap::new(),
        }
    }
}

/// 推理参数
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictConfig {
    pub weights: PathBuf,
    pub source: String, // 图片/视频路径, 也可以是流地址
    pub confidence: f32,
    pub device: Device,
    pub save: bool, // 保存带检测框的结果
    pub project: PathBuf,
    pub run_name: String,
    pub exist_ok: bool,
    pub extra: BTreeMap<String, String>,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            weights: PathBuf::from(DEFAULT_WEIGHTS),
            source: "test_imagens/WhatsApp Video 2026-01-17 at 11.48.03.mp4".to_string(),
            confidence: 0.50,
            device: Device::Cpu,
            save: true,
            project: PathBuf::from("runs/predict"),
            run_name: "lixo_detectado".to_string(),
            exist_ok: true,
            extra: BTreeMap::new(),
        }
    }
}

impl PredictConfig {
    /// 结果输出目录 (`<project>/<name>`)
    pub fn output_dir(&self) -> PathBuf {
        self.project.join(&self.run_name)
    }
}

/// 检测引擎配置
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// yolo 可执行文件, 为空时自动查找
    pub program: Option<PathBuf>,
    /// 前置参数, 例如 program = "conda", args = ["run", "-n", "lixo", "yolo"]
    pub args: Vec<String>,
    /// 不回显引擎输出
    pub quiet: bool,
}

/// 完整运行配置
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub engine: EngineConfig,
    pub train: TrainConfig,
    pub export: ExportConfig,
    pub predict: PredictConfig,
}

impl RunConfig {
    /// 从JSON文件加载配置, 文件不存在时写出默认配置
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(json) => {
                let config = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
                info!("✅ 配置已从 {} 加载", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("📝 配置文件不存在,创建默认配置: {}", path.display());
                let config = Self::default();
                config.save(path)?;
                Ok(config)
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_err)?;
        debug!("💾 配置已保存到 {}", path.display());
        Ok(())
    }
}
