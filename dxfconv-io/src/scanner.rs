use std::io::BufRead;

use crate::DxfError;

/// 单个 DXF 标签：组码、原始值以及组码所在的行号。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub code: i32,
    pub value: String,
    pub line: usize,
}

impl Tag {
    pub fn new(code: i32, value: impl Into<String>, line: usize) -> Self {
        Self {
            code,
            value: value.into(),
            line,
        }
    }

    /// 值所在行，即组码行的下一行。
    #[inline]
    pub fn value_line(&self) -> usize {
        self.line + 1
    }

    /// 用于比较 SECTION/ENDSEC/实体名等关键字，忽略行尾空白。
    #[inline]
    pub fn keyword(&self) -> &str {
        self.value.trim_end()
    }

    #[inline]
    pub fn is(&self, code: i32, keyword: &str) -> bool {
        self.code == code && self.keyword() == keyword
    }

    /// 严格转换：失败即返回带行号的字段转换错误。`inf`、`NaN` 等非有限值同样视为失败。
    pub fn parse_f64(&self) -> Result<f64, DxfError> {
        self.try_f64().ok_or_else(|| self.conversion_error("浮点数"))
    }

    /// 宽松转换：失败或非有限值时返回 `None`，由调用方跳过该字段。
    pub fn try_f64(&self) -> Option<f64> {
        self.value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
    }

    pub fn parse_i32(&self) -> Result<i32, DxfError> {
        self.value
            .trim()
            .parse::<i32>()
            .map_err(|_| self.conversion_error("整数"))
    }

    pub fn try_i32(&self) -> Option<i32> {
        self.value.trim().parse::<i32>().ok()
    }

    fn conversion_error(&self, expected: &'static str) -> DxfError {
        DxfError::FieldConversion {
            line: self.value_line(),
            code: self.code,
            value: self.value.clone(),
            expected,
        }
    }
}

/// 按行读取的标签扫描器。
///
/// 每个标签由两行组成：组码行（去除两端空白后按整数解析）与值行（只去除
/// 前导空白，文字末尾的空格有意义）。扫描器只提供一个标签的回退缓冲。
pub struct TagScanner<R> {
    reader: R,
    line: usize,
    pending: Option<Tag>,
    buffer: Vec<u8>,
}

impl<R: BufRead> TagScanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            pending: None,
            buffer: Vec::new(),
        }
    }

    /// 已读取的物理行数。
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    /// 读取下一个标签。两个标签之间的正常结束返回 `Ok(None)`；
    /// 读到组码却没有值行时返回 `UnexpectedEof`。
    pub fn next_tag(&mut self) -> Result<Option<Tag>, DxfError> {
        if let Some(tag) = self.pending.take() {
            return Ok(Some(tag));
        }

        let Some(code_line) = self.read_line()? else {
            return Ok(None);
        };
        let line = self.line;
        let raw = code_line.trim();
        let code = raw.parse::<i32>().map_err(|_| DxfError::InvalidGroupCode {
            line,
            raw: raw.to_string(),
        })?;

        let Some(value_line) = self.read_line()? else {
            return Err(DxfError::UnexpectedEof { line, code });
        };
        let value = value_line.trim_start_matches([' ', '\t']).to_string();
        Ok(Some(Tag { code, value, line }))
    }

    /// 退回刚读取的标签，下一次 `next_tag` 会再次返回它。
    /// 两次退回之间必须有一次成功读取。
    pub fn push_back(&mut self, tag: Tag) {
        debug_assert!(self.pending.is_none(), "标签回退缓冲只有一个槽位");
        self.pending = Some(tag);
    }

    fn read_line(&mut self) -> Result<Option<String>, DxfError> {
        self.buffer.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buffer)
            .map_err(DxfError::Read)?;
        if read == 0 {
            return Ok(None);
        }
        self.line += 1;

        if self.buffer.last() == Some(&b'\n') {
            self.buffer.pop();
        }
        if self.buffer.last() == Some(&b'\r') {
            self.buffer.pop();
        }
        // 非 UTF-8 内容（旧版本代码页）按有损方式解码，不中断解析。
        Ok(Some(String::from_utf8_lossy(&self.buffer).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, BufReader, Cursor, Read};

    fn scanner(data: &str) -> TagScanner<Cursor<&[u8]>> {
        TagScanner::new(Cursor::new(data.as_bytes()))
    }

    #[test]
    fn reads_code_value_pairs_with_line_numbers() {
        let mut scanner = scanner("  0\nSECTION\n  2\nENTITIES\n");
        let first = scanner.next_tag().unwrap().unwrap();
        assert_eq!(first, Tag::new(0, "SECTION", 1));
        let second = scanner.next_tag().unwrap().unwrap();
        assert_eq!(second, Tag::new(2, "ENTITIES", 3));
        assert!(scanner.next_tag().unwrap().is_none());
        assert_eq!(scanner.line(), 4);
    }

    #[test]
    fn value_keeps_trailing_whitespace() {
        let mut scanner = scanner("1\n  Hello World  \r\n");
        let tag = scanner.next_tag().unwrap().unwrap();
        assert_eq!(tag.value, "Hello World  ");
        assert_eq!(tag.keyword(), "Hello World");
    }

    #[test]
    fn last_value_without_newline_is_accepted() {
        let mut scanner = scanner("0\nEOF");
        let tag = scanner.next_tag().unwrap().unwrap();
        assert!(tag.is(0, "EOF"));
        assert!(scanner.next_tag().unwrap().is_none());
    }

    #[test]
    fn push_back_replays_the_same_tag() {
        let mut scanner = scanner("0\nLINE\n8\nWALLS\n");
        let tag = scanner.next_tag().unwrap().unwrap();
        scanner.push_back(tag.clone());
        assert_eq!(scanner.next_tag().unwrap().unwrap(), tag);
        let layer = scanner.next_tag().unwrap().unwrap();
        assert_eq!(layer.code, 8);
    }

    #[test]
    fn invalid_group_code_reports_its_line() {
        let mut scanner = scanner("0\nSECTION\nabc\nENTITIES\n");
        scanner.next_tag().unwrap();
        let err = scanner.next_tag().unwrap_err();
        assert!(matches!(err, DxfError::InvalidGroupCode { line: 3, .. }));
        assert!(err.is_structural());
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn missing_value_line_is_unexpected_eof() {
        let mut scanner = scanner("0\nSECTION\n  0\n");
        scanner.next_tag().unwrap();
        let err = scanner.next_tag().unwrap_err();
        assert!(matches!(err, DxfError::UnexpectedEof { line: 3, code: 0 }));
    }

    #[test]
    fn numeric_conversion_cites_value_line() {
        let tag = Tag::new(10, "abc", 7);
        let err = tag.parse_f64().unwrap_err();
        assert_eq!(err.line(), Some(8));
        assert!(tag.try_f64().is_none());
        assert_eq!(Tag::new(70, "  1 ", 1).parse_i32().unwrap(), 1);
        assert_eq!(Tag::new(10, "1.5e2", 1).try_f64(), Some(150.0));
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        for raw in ["inf", "-infinity", "NaN", "1e400"] {
            let tag = Tag::new(51, raw, 11);
            let err = tag.parse_f64().unwrap_err();
            assert!(
                matches!(err, DxfError::FieldConversion { line: 12, code: 51, .. }),
                "{raw} should fail strictly: {err}"
            );
            assert!(tag.try_f64().is_none(), "{raw} should be skipped leniently");
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("simulated read error"))
        }
    }

    #[test]
    fn read_failure_is_propagated_verbatim() {
        let mut scanner = TagScanner::new(BufReader::new(FailingReader));
        let err = scanner.next_tag().unwrap_err();
        match &err {
            DxfError::Read(source) => assert_eq!(source.to_string(), "simulated read error"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("simulated read error"));
    }
}
