// crates/mf_control/src/logger.rs

//! 控制状态日志
//!
//! 按输出节奏把控制器状态（当前体力、误差、积分误差）追加到
//! 纯文本日志，供离线绘图分析。追加写入，绝不改写已有行。
//!
//! 写入失败只通过 `log::warn!` 上报（带步号上下文），不会中断
//! 模拟——丢一行日志绝不能扰动物理结果。

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use glam::DVec3;

/// 追加式控制状态日志写出器
#[derive(Debug)]
pub struct ControlLogWriter {
    /// 目标文件路径
    path: PathBuf,
    /// 打开的文件；打开失败时为 None，记录调用全部降级为警告
    writer: Option<BufWriter<File>>,
}

impl ControlLogWriter {
    /// 日志列头
    const HEADER: &'static str = "# step fx fy fz ex ey ez ix iy iz";

    /// 打开（或创建）日志文件
    ///
    /// 打开失败不致命：警告后返回降级实例，后续 `record` 成为空操作。
    pub fn create(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let writer = match Self::open_append(&path) {
            Ok(mut w) => {
                if let Err(e) = writeln!(w, "{}", Self::HEADER) {
                    log::warn!("控制日志 '{}' 写入表头失败: {}", path.display(), e);
                }
                Some(w)
            }
            Err(e) => {
                log::warn!(
                    "控制日志 '{}' 打开失败: {}, 状态记录将被丢弃",
                    path.display(),
                    e
                );
                None
            }
        };
        Self { path, writer }
    }

    fn open_append(path: &Path) -> std::io::Result<BufWriter<File>> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(BufWriter::new(file))
    }

    /// 日志路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 日志是否可写
    pub fn is_active(&self) -> bool {
        self.writer.is_some()
    }

    /// 追加一条状态记录
    ///
    /// 每条记录一行：步号、力、误差、积分误差，space 分隔。
    /// 立即刷出，保证外部绘图工具能看到最新状态。
    pub fn record(&mut self, step: u64, force: DVec3, error: DVec3, integral_error: DVec3) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };

        let result = writeln!(
            writer,
            "{} {:e} {:e} {:e} {:e} {:e} {:e} {:e} {:e} {:e}",
            step,
            force.x,
            force.y,
            force.z,
            error.x,
            error.y,
            error.z,
            integral_error.x,
            integral_error.y,
            integral_error.z,
        )
        .and_then(|_| writer.flush());

        if let Err(e) = result {
            log::warn!(
                "控制日志 '{}' 第 {} 步写入失败: {}",
                self.path.display(),
                step,
                e
            );
        }
    }
}
