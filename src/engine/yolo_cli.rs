// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// yolo 命令行后端
//
// 命令解析优先级:
// 1. 配置文件 engine.program
// 2. 环境变量 LIXO_YOLO_BIN
// 3. 系统 PATH: yolo
// 4. 用户目录: ~/.local/bin/yolo (pip --user 安装)

use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, error, info};

use super::process::{self, Line, Stream};
use super::{Backend, ExportOutput, Model, Overrides, OutputScanner, PredictOutput, TrainOutput};
use crate::config::{EngineConfig, ExportConfig, PredictConfig, TrainConfig};
use crate::error::EngineError;

/// 指定 yolo 可执行文件的环境变量
pub const ENV_PROGRAM: &str = "LIXO_YOLO_BIN";

/// 检测任务
const TASK: &str = "detect";

/// 以子进程方式驱动 `yolo` 命令行
#[derive(Debug, Clone)]
pub struct YoloCli {
    program: PathBuf,
    args: Vec<String>, // 前置参数, 例如 `conda run -n lixo yolo`
    quiet: bool,
}

impl YoloCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            quiet: false,
        }
    }

    /// 根据配置创建 (未指定程序时自动查找)
    pub fn from_config(config: &EngineConfig) -> Self {
        let program = config
            .program
            .clone()
            .or_else(|| env::var_os(ENV_PROGRAM).map(PathBuf::from))
            .unwrap_or_else(locate_program);
        info!("yolo 程序: {}", program.display());
        Self {
            program,
            args: config.args.clone(),
            quiet: config.quiet,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// 组装命令: `<program> [args..] [task] <mode> key=value ...`
    pub fn command(&self, task: Option<&str>, mode: &str, overrides: &Overrides) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(task) = task {
            cmd.arg(task);
        }
        cmd.arg(mode).args(overrides.to_args());
        cmd
    }

    fn invoke(
        &self,
        task: Option<&str>,
        mode: &str,
        overrides: &Overrides,
    ) -> Result<OutputScanner, EngineError> {
        info!("yolo {} {}", mode, overrides.to_args().join(" "));
        let cmd = self.command(task, mode, overrides);

        let mut scanner = OutputScanner::new();
        let mut echo = ConsoleEcho::default();
        let quiet = self.quiet;
        let finished = process::run_streaming(cmd, |line| {
            if !quiet {
                echo.write(line);
            }
            debug!("[yolo] {}", line.text);
            scanner.feed(&line.text);
        })?;
        echo.finish();

        if !finished.status.success() {
            error!("yolo {} 失败, 退出码: {:?}", mode, finished.status.code());
            return Err(EngineError::Failed {
                mode: mode.to_string(),
                code: finished.status.code(),
                tail: finished.tail_text(),
            });
        }
        Ok(scanner)
    }
}

impl Backend for YoloCli {
    fn load(&self, weights: &Path) -> Result<Box<dyn Model>, EngineError> {
        debug!("加载模型: {}", weights.display());
        Ok(Box::new(YoloModel {
            cli: self.clone(),
            weights: weights.to_path_buf(),
        }))
    }
}

/// 由 `YoloCli` 加载的模型, 每次调用启动一个 yolo 子进程
struct YoloModel {
    cli: YoloCli,
    weights: PathBuf,
}

impl Model for YoloModel {
    fn train(&mut self, config: &TrainConfig) -> Result<TrainOutput, EngineError> {
        let overrides = Overrides::for_train(&self.weights, config);
        let scanner = self.cli.invoke(Some(TASK), "train", &overrides)?;
        Ok(TrainOutput {
            save_dir: scanner.save_dir,
        })
    }

    fn export(&mut self, config: &ExportConfig) -> Result<ExportOutput, EngineError> {
        let overrides = Overrides::for_export(&self.weights, config);
        let scanner = self.cli.invoke(None, "export", &overrides)?;
        Ok(ExportOutput {
            exported: scanner.exported,
        })
    }

    fn predict(&mut self, config: &PredictConfig) -> Result<PredictOutput, EngineError> {
        let overrides = Overrides::for_predict(&self.weights, config);
        let scanner = self.cli.invoke(Some(TASK), "predict", &overrides)?;
        Ok(PredictOutput {
            save_dir: scanner.save_dir,
            frames: scanner.frames,
        })
    }
}

/// 在 PATH 和用户目录中查找 yolo
fn locate_program() -> PathBuf {
    let exe = if cfg!(windows) { "yolo.exe" } else { "yolo" };

    if let Some(paths) = env::var_os("PATH") {
        if let Some(found) = env::split_paths(&paths)
            .map(|dir| dir.join(exe))
            .find(|candidate| candidate.is_file())
        {
            return found;
        }
    }

    if let Some(home) = dirs::home_dir() {
        let candidate = home.join(".local").join("bin").join(exe);
        if candidate.is_file() {
            return candidate;
        }
    }

    // 交给 spawn 报告 "未找到"
    PathBuf::from(exe)
}

/// 把引擎输出原样回显到终端, `\r` 结尾的进度行原地刷新
#[derive(Default)]
struct ConsoleEcho {
    dangling_out: bool,
    dangling_err: bool,
}

impl ConsoleEcho {
    fn write(&mut self, line: &Line) {
        match line.stream {
            Stream::Stdout => {
                let mut out = std::io::stdout().lock();
                Self::emit(&mut out, &mut self.dangling_out, line);
            }
            Stream::Stderr => {
                let mut err = std::io::stderr().lock();
                Self::emit(&mut err, &mut self.dangling_err, line);
            }
        }
    }

    fn emit(w: &mut impl Write, dangling: &mut bool, line: &Line) {
        let result = if line.overwrite {
            *dangling = true;
            write!(w, "\r{}", line.text).and_then(|_| w.flush())
        } else if std::mem::take(dangling) {
            writeln!(w, "\r{}", line.text)
        } else {
            writeln!(w, "{}", line.text)
        };
        // 终端关闭时忽略回显失败
        let _ = result;
    }

    fn finish(&mut self) {
        if std::mem::take(&mut self.dangling_out) {
            println!();
        }
        if std::mem::take(&mut self.dangling_err) {
            eprintln!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Device;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_command_layout() {
        let cli = YoloCli::new("conda").with_args(["run", "-n", "lixo", "yolo"]);
        let config = PredictConfig::default();
        let overrides = Overrides::for_predict(&config.weights, &config);
        let cmd = cli.command(Some("detect"), "predict", &overrides);

        assert_eq!(cmd.get_program(), "conda");
        let args = args_of(&cmd);
        assert_eq!(args[..6], ["run", "-n", "lixo", "yolo", "detect", "predict"]);
        assert!(args.contains(&"conf=0.5".to_string()));
        assert!(args.contains(&"device=cpu".to_string()));
        assert!(args.contains(&"save=True".to_string()));
        assert!(args.contains(&"project=runs/predict".to_string()));
        assert!(args.contains(&"name=lixo_detectado".to_string()));
    }

    #[test]
    fn test_export_has_no_task() {
        let cli = YoloCli::new("yolo");
        let config = ExportConfig::default();
        let overrides = Overrides::for_export(&config.weights, &config);
        let args = args_of(&cli.command(None, "export", &overrides));
        assert_eq!(
            args,
            vec![
                "export",
                "model=runs/detect/identificador_lixo_cpu/weights/best.pt",
                "format=onnx"
            ]
        );
    }

    #[test]
    fn test_from_config_prefers_explicit_program() {
        let config = EngineConfig {
            program: Some(PathBuf::from("/opt/yolo/bin/yolo")),
            args: vec!["--flag".into()],
            quiet: true,
        };
        let cli = YoloCli::from_config(&config);
        assert_eq!(cli.program(), Path::new("/opt/yolo/bin/yolo"));
        assert_eq!(cli.args, vec!["--flag".to_string()]);
        assert!(cli.quiet);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let cli = YoloCli::new("/nonexistent/yolo-7f3a").quiet(true);
        let mut model = cli.load(Path::new("best.pt")).unwrap();
        let err = model.export(&ExportConfig::default()).err().unwrap();
        assert!(matches!(err, EngineError::Spawn { .. }));
    }

    #[test]
    fn test_echo_refreshes_progress_then_breaks_line() {
        let line = |text: &str, overwrite| Line {
            stream: Stream::Stdout,
            text: text.to_string(),
            overwrite,
        };
        let mut out = Vec::new();
        let mut dangling = false;
        for l in [line("10%", true), line("20%", false), line("done", false)] {
            ConsoleEcho::emit(&mut out, &mut dangling, &l);
        }
        assert_eq!(String::from_utf8(out).unwrap(), "\r10%\r20%\ndone\n");
        assert!(!dangling);
    }

    /// 用 shell 脚本模拟 yolo 命令行
    #[cfg(unix)]
    fn fake_yolo(dir: &Path, body: &str) -> YoloCli {
        let script = dir.join("fake_yolo.sh");
        std::fs::write(&script, body).unwrap();
        YoloCli::new("sh")
            .with_args([script.to_string_lossy().into_owned()])
            .quiet(true)
    }

    #[cfg(unix)]
    #[test]
    fn test_predict_through_fake_cli() {
        let dir = tempfile::tempdir().unwrap();
        let cli = fake_yolo(
            dir.path(),
            r#"
echo "Ultralytics 8.3.0 CPU"
echo "video 1/1 (frame 1/2) /tmp/a.mp4: 384x640 1 lata, 40.0ms"
echo "video 1/1 (frame 2/2) /tmp/a.mp4: 384x640 2 garrafas, 41.0ms"
printf 'Results saved to \033[1mruns/predict/lixo_detectado\033[0m\n'
"#,
        );

        let config = PredictConfig {
            device: Device::Cpu,
            ..PredictConfig::default()
        };
        let mut model = cli.load(&config.weights).unwrap();
        let output = model.predict(&config).unwrap();

        assert_eq!(output.frames.len(), 2);
        assert_eq!(output.frames[1].total(), 2);
        assert_eq!(
            output.save_dir,
            Some(PathBuf::from("runs/predict/lixo_detectado"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_exit_keeps_crlf_tail() {
        let dir = tempfile::tempdir().unwrap();
        let cli = fake_yolo(
            dir.path(),
            "printf 'Traceback\\r\\nFileNotFoundError: best.pt\\r\\n' 1>&2\nexit 1\n",
        );

        let config = PredictConfig::default();
        let mut model = cli.load(&config.weights).unwrap();
        match model.predict(&config) {
            Err(EngineError::Failed { tail, .. }) => {
                assert!(tail.contains("FileNotFoundError: best.pt"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_exit_keeps_tail() {
        let dir = tempfile::tempdir().unwrap();
        let cli = fake_yolo(
            dir.path(),
            "echo 'FileNotFoundError: data.yaml does not exist' 1>&2\nexit 1\n",
        );

        let config = TrainConfig::default();
        let mut model = cli.load(&config.base_model).unwrap();
        match model.train(&config) {
            Err(EngineError::Failed { mode, code, tail }) => {
                assert_eq!(mode, "train");
                assert_eq!(code, Some(1));
                assert!(tail.contains("data.yaml does not exist"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
