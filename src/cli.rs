// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
//! 三个入口共用的命令行参数

use std::path::PathBuf;

use clap::Args;

use crate::config::RunConfig;
use crate::error::ConfigError;

/// 公共参数
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// JSON 配置文件 (不存在时写出默认配置)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// yolo 可执行文件 (默认读取 LIXO_YOLO_BIN 或在 PATH 中查找)
    #[arg(long)]
    pub yolo: Option<PathBuf>,

    /// 不回显引擎输出
    #[arg(short, long)]
    pub quiet: bool,

    /// 输出调试日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommonArgs {
    /// 读取配置文件 (未指定时使用默认值), 再叠加公共参数
    pub fn load(&self) -> Result<RunConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        if let Some(program) = &self.yolo {
            config.engine.program = Some(program.clone());
        }
        if self.quiet {
            config.engine.quiet = true;
        }
        Ok(config)
    }
}

/// 解析 `--set key=value`
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("需要 key=value 格式: {s}")),
    }
}
