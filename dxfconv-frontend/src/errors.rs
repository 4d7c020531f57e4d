use std::path::PathBuf;

use dxfconv_io::DxfError;
use dxfconv_render::RenderError;
use thiserror::Error;

/// 一次转换调用的错误，区分输入侧（读取、解析）与输出侧（渲染、写出）问题。
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("读取输入失败: {0}")]
    Read(#[source] std::io::Error),
    #[error("解析 DXF 失败: {0}")]
    Parse(#[source] DxfError),
    #[error("渲染输出失败: {0}")]
    Render(#[from] RenderError),
    #[error("打开输入文件 {path:?} 失败: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("创建输出文件 {path:?} 失败: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    /// 错误是否来自输入一侧。
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ConvertError::Read(_) | ConvertError::Parse(_) | ConvertError::Open { .. }
        )
    }
}

impl From<DxfError> for ConvertError {
    fn from(err: DxfError) -> Self {
        match err {
            DxfError::Read(source) => ConvertError::Read(source),
            other => ConvertError::Parse(other),
        }
    }
}
