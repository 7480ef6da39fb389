// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 模型导出 (默认 ONNX)
///
/// 直接运行: cargo run --bin lixo-export
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use lixo_yolo::cli::{parse_key_value, CommonArgs};
use lixo_yolo::{logging, ExportFormat, Exporter, YoloCli};

#[derive(Parser, Debug)]
#[command(author, version, about = "导出训练好的模型", long_about = None)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// 训练好的权重 best.pt
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// 导出格式: onnx / torchscript / openvino / engine / coreml / tflite / ncnn
    #[arg(short, long)]
    format: Option<ExportFormat>,

    /// 导出的输入尺寸
    #[arg(long)]
    imgsz: Option<u32>,

    /// 额外的引擎参数, 可重复: --set opset=12
    #[arg(long = "set", value_parser = parse_key_value)]
    set: Vec<(String, String)>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.common.verbose);

    let mut config = args.common.load()?;
    let export = &mut config.export;
    if let Some(model) = args.model {
        export.weights = model;
    }
    if let Some(format) = args.format {
        export.format = format;
    }
    if let Some(imgsz) = args.imgsz {
        export.image_size = Some(imgsz);
    }
    export.extra.extend(args.set);

    let exporter = Exporter::new(YoloCli::from_config(&config.engine), config.export);
    let report = exporter.run()?;
    report.print_summary();
    Ok(())
}
