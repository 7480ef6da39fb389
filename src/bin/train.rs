// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 垃圾检测模型训练
///
/// 不带参数运行即使用默认配置: cargo run --bin lixo-train --release
/// 训练失败时以非零退出码结束
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use lixo_yolo::cli::{parse_key_value, CommonArgs};
use lixo_yolo::{logging, Device, TrainConfig, Trainer, YoloCli};

/// 训练参数 (未指定的项使用配置文件/默认值)
#[derive(Parser, Debug)]
#[command(author, version, about = "训练垃圾检测模型", long_about = None)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// 数据集描述文件 data.yaml
    #[arg(long)]
    data: Option<PathBuf>,

    /// 预训练基础模型
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// 训练轮数
    #[arg(short, long)]
    epochs: Option<u32>,

    /// 批量大小 (-1 自动)
    #[arg(short, long, allow_negative_numbers = true)]
    batch: Option<i32>,

    /// 输入图片尺寸
    #[arg(long)]
    imgsz: Option<u32>,

    /// 计算设备: cpu / 0 / 0,1 / mps
    #[arg(short, long)]
    device: Option<Device>,

    /// 输出目录
    #[arg(long)]
    project: Option<PathBuf>,

    /// 运行名称
    #[arg(short, long)]
    name: Option<String>,

    /// 允许覆盖已存在的运行目录
    #[arg(long)]
    exist_ok: bool,

    /// 额外的引擎参数, 可重复: --set patience=10
    #[arg(long = "set", value_parser = parse_key_value)]
    set: Vec<(String, String)>,
}

impl Args {
    fn apply(self, config: &mut TrainConfig) {
        if let Some(data) = self.data {
            config.dataset_path = data;
        }
        if let Some(model) = self.model {
            config.base_model = model;
        }
        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(batch) = self.batch {
            config.batch_size = batch;
        }
        if let Some(imgsz) = self.imgsz {
            config.image_size = imgsz;
        }
        if let Some(device) = self.device {
            config.device = device;
        }
        if let Some(project) = self.project {
            config.project = project;
        }
        if let Some(name) = self.name {
            config.run_name = name;
        }
        if self.exist_ok {
            config.exist_ok = true;
        }
        config.extra.extend(self.set);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.common.verbose);

    let mut config = args.common.load()?;
    args.apply(&mut config.train);

    println!("📦 数据集: {}", config.train.dataset_path.display());
    println!("🧠 基础模型: {}", config.train.base_model.display());

    let trainer = Trainer::new(YoloCli::from_config(&config.engine), config.train);
    let report = trainer.run()?;
    report.print_summary();
    Ok(())
}
