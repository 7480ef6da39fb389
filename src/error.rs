// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 错误处理模块

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// 检测引擎调用错误 (训练/导出/推理共用)
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("无法启动 {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),

    #[error("yolo {mode} 执行失败 (退出码 {code:?}): {tail}")]
    Failed {
        mode: String,
        code: Option<i32>,
        tail: String,
    },
}

/// 推理流程错误
///
/// 推理入口不再吞掉异常, 而是把失败原因交给调用方,
/// 由调用方决定日志与退出码策略 (见 `FailurePolicy`)
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("无法创建输出目录 {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("模型加载失败: {0}")]
    Load(#[source] EngineError),

    #[error("检测失败: {0}")]
    Predict(#[source] EngineError),
}

impl InferenceError {
    /// 通用的排查提示
    pub fn hint(&self) -> &'static str {
        match self {
            InferenceError::OutputDir { .. } => "请确认输出目录所在位置可写。",
            InferenceError::Load(_) | InferenceError::Predict(_) => {
                "请确认模型路径和测试源路径正确。"
            }
        }
    }

    /// 诊断信息: 错误文本 + 排查提示
    pub fn diagnostic(&self) -> String {
        format!("❌ 推理过程中发生错误: {}\n{}", self, self.hint())
    }
}

/// 配置文件错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("读取配置失败 {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("配置解析失败 {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("无效的计算设备: {0}")]
    Device(String),

    #[error("不支持的导出格式: {0}")]
    Format(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_contains_error_and_hint() {
        let err = InferenceError::Predict(EngineError::Failed {
            mode: "predict".into(),
            code: Some(1),
            tail: "FileNotFoundError: source not found".into(),
        });
        let text = err.diagnostic();
        assert!(text.contains("source not found"));
        assert!(text.contains("模型路径"));
    }

    #[test]
    fn test_output_dir_hint() {
        let err = InferenceError::OutputDir {
            path: PathBuf::from("/readonly/out"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/readonly/out"));
        assert!(err.hint().contains("输出目录"));
    }
}
