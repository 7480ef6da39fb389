// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
//! 引擎输出解析
//!
//! 从 `yolo` 命令行的控制台输出中提取:
//! - 保存目录: `Results saved to runs/predict/lixo_detectado`
//! - 导出文件: `ONNX: export success ✅ 1.2s, saved as 'best.onnx' (12.2 MB)`
//! - 逐帧检测: `video 1/1 (frame 3/120) /x.mp4: 384x640 2 garrafas, 1 lata, 45.3ms`

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

static ANSI: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").unwrap());

static SAVED_TO: Lazy<Regex> = Lazy::new(|| Regex::new(r"Results saved to\s+(.+?)\s*$").unwrap());

static SAVED_AS: Lazy<Regex> = Lazy::new(|| Regex::new(r"saved as '([^']+)'").unwrap());

static FRAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<kind>image|video)\s+(?P<index>\d+)/(?P<total>\d+)\s+(?:\(frame\s+(?P<frame>\d+)/(?P<frames>\d+)\)\s+)?(?P<source>.+):\s+(?P<h>\d+)x(?P<w>\d+)\s+(?P<dets>.*?)(?P<ms>\d+(?:\.\d+)?)ms\s*$",
    )
    .unwrap()
});

static COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\s+(.+)$").unwrap());

/// 去掉终端颜色控制码
pub fn strip_ansi(line: &str) -> std::borrow::Cow<'_, str> {
    ANSI.replace_all(line, "")
}

/// 单个类别的检测数量
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCount {
    pub class: String,
    pub count: u32,
}

/// 单帧(或单张图片)的检测摘要
#[derive(Debug, Clone, PartialEq)]
pub struct FrameResult {
    pub source: String,
    /// 视频帧序号 (frame, total); 图片为 None
    pub frame: Option<(u64, u64)>,
    /// 推理输入尺寸 (height, width)
    pub shape: (u32, u32),
    pub detections: Vec<ClassCount>,
    pub inference_ms: f32,
}

impl FrameResult {
    /// 解析一行逐帧输出
    pub fn parse(line: &str) -> Option<Self> {
        let line = strip_ansi(line);
        let caps = FRAME.captures(line.trim())?;

        let frame = match (caps.name("frame"), caps.name("frames")) {
            (Some(f), Some(n)) => Some((f.as_str().parse().ok()?, n.as_str().parse().ok()?)),
            _ => None,
        };

        let detections = caps["dets"]
            .split(',')
            .map(str::trim)
            .filter_map(|part| {
                let c = COUNT.captures(part)?;
                let count: u32 = c[1].parse().ok()?;
                let mut class = c[2].to_string();
                // 引擎对数量大于1的类别名追加复数 's'
                if count > 1 && class.ends_with('s') {
                    class.pop();
                }
                Some(ClassCount { class, count })
            })
            .collect();

        Some(Self {
            source: caps["source"].to_string(),
            frame,
            shape: (caps["h"].parse().ok()?, caps["w"].parse().ok()?),
            detections,
            inference_ms: caps["ms"].parse().ok()?,
        })
    }

    pub fn total(&self) -> u32 {
        self.detections.iter().map(|d| d.count).sum()
    }
}

/// 输出扫描器: 逐行喂入, 累积关心的信息
#[derive(Debug, Default)]
pub struct OutputScanner {
    pub save_dir: Option<PathBuf>,
    pub exported: Option<PathBuf>,
    pub frames: Vec<FrameResult>,
}

impl OutputScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, line: &str) {
        let clean = strip_ansi(line);
        if let Some(c) = SAVED_TO.captures(&clean) {
            self.save_dir = Some(PathBuf::from(&c[1]));
        } else if let Some(c) = SAVED_AS.captures(&clean) {
            self.exported = Some(PathBuf::from(&c[1]));
        } else if let Some(frame) = FrameResult::parse(&clean) {
            self.frames.push(frame);
        }
    }
}
