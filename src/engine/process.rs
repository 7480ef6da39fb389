// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
//! 子进程输出转发
//!
//! stdout / stderr 各由一个读取线程按行切分, 通过 channel 汇总到调用线程,
//! 两路都关闭后回收子进程
//!
//! `\n` 与 `\r\n` 是普通行尾; 单独的 `\r` 是进度条的原地刷新

use std::collections::VecDeque;
use std::io::{self, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Sender};
use tracing::{debug, warn};

use crate::error::EngineError;

/// 失败时保留的末尾输出行数
const TAIL_LINES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stream {
    Stdout,
    Stderr,
}

/// 子进程输出的一行
#[derive(Debug, Clone)]
pub(crate) struct Line {
    pub stream: Stream,
    pub text: String,
    /// 以单独的 `\r` 结尾 (进度条刷新)
    pub overwrite: bool,
}

/// 子进程结束状态
pub(crate) struct Finished {
    pub status: ExitStatus,
    pub tail: VecDeque<String>,
}

impl Finished {
    pub fn tail_text(&self) -> String {
        self.tail.iter().cloned().collect::<Vec<_>>().join("\n")
    }
}

/// 启动子进程并逐行回调, 阻塞直到子进程退出
pub(crate) fn run_streaming(
    mut cmd: Command,
    mut on_line: impl FnMut(&Line),
) -> Result<Finished, EngineError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("启动子进程: {:?}", cmd);
    let mut child = cmd
        .spawn()
        .map_err(|source| EngineError::Spawn { program, source })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "无法获取子进程标准输出"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "无法获取子进程错误输出"))?;

    let (tx, rx) = unbounded::<Line>();
    let readers = [
        spawn_reader(stdout, Stream::Stdout, tx.clone()),
        spawn_reader(stderr, Stream::Stderr, tx),
    ];

    let mut tail = VecDeque::with_capacity(TAIL_LINES);
    // 两个发送端都释放后迭代结束
    for line in rx.iter() {
        on_line(&line);
        if !line.overwrite {
            if tail.len() == TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line.text);
        }
    }

    for reader in readers {
        if reader.join().is_err() {
            warn!("输出读取线程异常退出");
        }
    }

    let status = child.wait()?;
    debug!("子进程退出: {:?}", status.code());
    Ok(Finished { status, tail })
}

fn spawn_reader<R: Read + Send + 'static>(
    reader: R,
    stream: Stream,
    tx: Sender<Line>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        if let Err(e) = pump(reader, stream, &tx) {
            warn!("读取子进程输出失败 ({:?}): {}", stream, e);
        }
    })
}

fn pump<R: Read>(mut reader: R, stream: Stream, tx: &Sender<Line>) -> io::Result<()> {
    let mut buf = [0u8; 4096];
    let mut pending: Vec<u8> = Vec::new();

    let emit = |pending: &mut Vec<u8>, overwrite: bool| -> bool {
        if pending.is_empty() {
            return true;
        }
        let text = String::from_utf8_lossy(pending).into_owned();
        pending.clear();
        tx.send(Line {
            stream,
            text,
            overwrite,
        })
        .is_ok()
    };

    // 上一个字节是 `\r`, 要看下一个字节才知道是 CRLF 还是原地刷新
    let mut after_cr = false;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        for &b in &buf[..n] {
            let mut alive = true;
            if std::mem::take(&mut after_cr) {
                if b == b'\n' {
                    if !emit(&mut pending, false) {
                        return Ok(());
                    }
                    continue;
                }
                alive = emit(&mut pending, true);
            }
            match b {
                b'\n' => alive = alive && emit(&mut pending, false),
                b'\r' => after_cr = true,
                _ => pending.push(b),
            }
            // 接收端已关闭
            if !alive {
                return Ok(());
            }
        }
    }
    emit(&mut pending, false);
    Ok(())
}
