use std::io::{BufReader, Read};

use dxfconv_core::document::Drawing;
use thiserror::Error;

mod parser;
mod scanner;

pub use parser::DxfParser;
pub use scanner::{Tag, TagScanner};

/// DXF 读取阶段的错误。结构错误与字段转换错误都携带源文件行号（从 1 开始），
/// 底层读取错误则原样保留 `std::io::Error`，便于调用方区分 I/O 故障与格式问题。
#[derive(Debug, Error)]
pub enum DxfError {
    #[error("第 {line} 行：无效的组码 {raw:?}")]
    InvalidGroupCode { line: usize, raw: String },
    #[error("第 {line} 行：组码 {code} 之后缺少值行，输入意外结束")]
    UnexpectedEof { line: usize, code: i32 },
    #[error("第 {line} 行：组码 {code} 的值 {value:?} 不是有效的{expected}")]
    FieldConversion {
        line: usize,
        code: i32,
        value: String,
        expected: &'static str,
    },
    #[error("读取 DXF 输入失败: {0}")]
    Read(#[source] std::io::Error),
}

impl DxfError {
    /// 出错位置所在的源文件行号；读取错误没有位置信息。
    pub fn line(&self) -> Option<usize> {
        match self {
            DxfError::InvalidGroupCode { line, .. }
            | DxfError::UnexpectedEof { line, .. }
            | DxfError::FieldConversion { line, .. } => Some(*line),
            DxfError::Read(_) => None,
        }
    }

    /// 组码/值配对层面的结构性错误。
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            DxfError::InvalidGroupCode { .. } | DxfError::UnexpectedEof { .. }
        )
    }
}

/// 从任意字节流解析 DXF，返回按文件顺序排列的实体场景。
pub fn parse_drawing<R: Read>(reader: R) -> Result<Drawing, DxfError> {
    DxfParser::new(BufReader::new(reader)).parse()
}
