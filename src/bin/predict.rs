// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 垃圾检测推理
///
/// 直接运行: cargo run --bin lixo-predict
/// 默认推理失败时只打印诊断信息并以 0 退出, --strict 时以 1 退出
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use lixo_yolo::cli::{parse_key_value, CommonArgs};
use lixo_yolo::pipeline::conclude;
use lixo_yolo::{logging, Device, FailurePolicy, Inferencer, YoloCli};

#[derive(Parser, Debug)]
#[command(author, version, about = "使用训练好的模型检测垃圾", long_about = None)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// 训练好的权重 best.pt
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// 图片/视频/流地址
    #[arg(short, long)]
    source: Option<String>,

    /// 最小置信度 (0.0 ~ 1.0)
    #[arg(short, long)]
    conf: Option<f32>,

    /// 计算设备: cpu / 0 / mps
    #[arg(short, long)]
    device: Option<Device>,

    /// 结果输出目录
    #[arg(long)]
    project: Option<PathBuf>,

    /// 结果子目录名称
    #[arg(short, long)]
    name: Option<String>,

    /// 不保存带检测框的结果
    #[arg(long)]
    no_save: bool,

    /// 推理失败时以非零退出码结束
    #[arg(long)]
    strict: bool,

    /// 额外的引擎参数, 可重复: --set line_width=2
    #[arg(long = "set", value_parser = parse_key_value)]
    set: Vec<(String, String)>,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    logging::init(args.common.verbose);

    let mut config = args.common.load()?;
    let predict = &mut config.predict;
    if let Some(model) = args.model {
        predict.weights = model;
    }
    if let Some(source) = args.source {
        predict.source = source;
    }
    if let Some(conf) = args.conf {
        predict.confidence = conf;
    }
    if let Some(device) = args.device {
        predict.device = device;
    }
    if let Some(project) = args.project {
        predict.project = project;
    }
    if let Some(name) = args.name {
        predict.run_name = name;
    }
    if args.no_save {
        predict.save = false;
    }
    predict.extra.extend(args.set);

    let policy = if args.strict {
        FailurePolicy::Strict
    } else {
        FailurePolicy::Tolerant
    };

    let inferencer = Inferencer::new(YoloCli::from_config(&config.engine), config.predict);
    let result = inferencer.run();
    Ok(ExitCode::from(conclude(&result, policy)))
}
