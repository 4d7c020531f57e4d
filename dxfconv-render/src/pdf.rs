use std::io::Write;

use dxfconv_core::geometry::Point2;
use tracing::debug;

use crate::errors::RenderError;
use crate::renderer::Renderer;

/// 四段三次贝塞尔近似圆时的控制点系数。
const KAPPA: f64 = 0.552_284_749_8;
/// 圆弧折线化的角度步长（度）。
const ARC_STEP_DEGREES: f64 = 5.0;
const PDF_HEADER: &str = "%PDF-1.4\n";
const OBJECT_FOOTER: &str = "\nendobj\n";
const DEFAULT_FONT: &str = "Helvetica";

/// 最小化的单页 PDF 文档。
///
/// 绘图操作以文本路径操作符累积在内容缓冲区中；输出时先把五个对象
/// （目录、页面树、页面、内容流、字体）构造成字符串，再顺序计算每个对象的
/// 字节偏移并生成交叉引用表。
#[derive(Debug, Clone)]
pub struct PdfDocument {
    width: f64,
    height: f64,
    font: String,
    content: String,
}

impl PdfDocument {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            font: DEFAULT_FONT.to_string(),
            content: String::new(),
        }
    }

    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self
    }

    /// 开始新页面。当前实现只有一页，会清空内容缓冲并更新页面尺寸。
    pub fn add_page(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.content.clear();
    }

    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    // PDF 原点在左下角，传入的页面坐标原点在左上角，这里做坐标系换算。
    #[inline]
    fn flip(&self, y: f64) -> f64 {
        self.height - y
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.content.push_str(&format!(
            "{:.2} {:.2} m {:.2} {:.2} l S\n",
            x1,
            self.flip(y1),
            x2,
            self.flip(y2)
        ));
    }

    pub fn polyline(&mut self, points: &[Point2], closed: bool) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.content
            .push_str(&format!("{:.2} {:.2} m\n", first.x(), self.flip(first.y())));
        for point in rest {
            self.content
                .push_str(&format!("{:.2} {:.2} l\n", point.x(), self.flip(point.y())));
        }
        self.content.push_str(if closed { "h S\n" } else { "S\n" });
    }

    pub fn circle(&mut self, x: f64, y: f64, r: f64) {
        let k = KAPPA * r;
        let cx = x;
        let cy = self.flip(y);

        self.content
            .push_str(&format!("{:.2} {:.2} m\n", cx + r, cy));
        let quadrants = [
            (cx + r, cy + k, cx + k, cy + r, cx, cy + r),
            (cx - k, cy + r, cx - r, cy + k, cx - r, cy),
            (cx - r, cy - k, cx - k, cy - r, cx, cy - r),
            (cx + k, cy - r, cx + r, cy - k, cx + r, cy),
        ];
        for (x1, y1, x2, y2, x3, y3) in quadrants {
            self.content.push_str(&format!(
                "{x1:.2} {y1:.2} {x2:.2} {y2:.2} {x3:.2} {y3:.2} c\n"
            ));
        }
        self.content.push_str("S\n");
    }

    /// 以固定角度步长折线化圆弧。终止角小于起始角时向前补 360°，保证扫掠为正；
    /// 扫掠最多一整圈。
    pub fn arc(&mut self, x: f64, y: f64, r: f64, start_angle: f64, end_angle: f64) {
        let cx = x;
        let cy = self.flip(y);
        let start = start_angle;
        let mut sweep = end_angle - start_angle;
        if sweep < 0.0 {
            sweep += 360.0;
        }
        let end = start + sweep.clamp(0.0, 360.0);
        let point_at = |degrees: f64| {
            let angle = degrees.to_radians();
            (cx + r * angle.cos(), cy + r * angle.sin())
        };

        let (sx, sy) = point_at(start);
        self.content.push_str(&format!("{sx:.2} {sy:.2} m\n"));

        let segments = ((end - start) / ARC_STEP_DEGREES).ceil() as usize;
        for index in 1..segments {
            let (px, py) = point_at(start + index as f64 * ARC_STEP_DEGREES);
            self.content.push_str(&format!("{px:.2} {py:.2} l\n"));
        }

        let (ex, ey) = point_at(end);
        self.content.push_str(&format!("{ex:.2} {ey:.2} l S\n"));
    }

    pub fn text(&mut self, x: f64, y: f64, size: f64, text: &str) {
        self.content.push_str(&format!(
            "BT /F1 {:.2} Tf {:.2} {:.2} Td ({}) Tj ET\n",
            size,
            x,
            self.flip(y),
            escape_string(text)
        ));
    }

    fn build_objects(&self) -> Vec<String> {
        let stream = &self.content;
        vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>",
                self.width, self.height
            ),
            format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                stream.len(),
                stream
            ),
            format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} >>",
                escape_name(&self.font)
            ),
        ]
    }

    /// 序列化整个文档。对象编号从 1 开始按顺序分配，偏移从文件头长度起累加
    /// `len(对象头) + len(对象体) + len("\nendobj\n")`。
    pub fn to_bytes(&self) -> Vec<u8> {
        let objects = self.build_objects();
        let mut out = Vec::with_capacity(
            PDF_HEADER.len() + objects.iter().map(|body| body.len() + 32).sum::<usize>() + 256,
        );
        out.extend_from_slice(PDF_HEADER.as_bytes());

        let mut offsets = Vec::with_capacity(objects.len());
        let mut offset = PDF_HEADER.len();
        for (index, body) in objects.iter().enumerate() {
            let header = format!("{} 0 obj\n", index + 1);
            offsets.push(offset);
            out.extend_from_slice(header.as_bytes());
            out.extend_from_slice(body.as_bytes());
            out.extend_from_slice(OBJECT_FOOTER.as_bytes());
            offset += header.len() + body.len() + OBJECT_FOOTER.len();
        }
        debug_assert_eq!(offset, out.len());

        let xref_offset = offset;
        let size = objects.len() + 1;
        out.extend_from_slice(format!("xref\n0 {size}\n").as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for object_offset in &offsets {
            out.extend_from_slice(format!("{object_offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!("trailer\n<< /Size {size} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n")
                .as_bytes(),
        );
        out
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), RenderError> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// 字符串对象中的 `\`、`(`、`)` 需要转义。
fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(ch);
            }
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}

/// 名称对象中的空白与分隔符按 `#xx` 编码。
fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'!'..=b'~' if !b"#()<>[]{}/%".contains(&byte) => out.push(byte as char),
            _ => out.push_str(&format!("#{byte:02X}")),
        }
    }
    out
}

/// PDF 后端：绘制期间只写内存缓冲，`finish` 时一次性写入输出。
pub struct PdfRenderer<W> {
    document: PdfDocument,
    sink: W,
}

impl<W: Write> PdfRenderer<W> {
    pub fn new(sink: W, width: f64, height: f64, font: Option<&str>) -> Self {
        let mut document = PdfDocument::new(width, height);
        if let Some(font) = font {
            document = document.with_font(font);
        }
        Self { document, sink }
    }

    pub fn document(&self) -> &PdfDocument {
        &self.document
    }
}

impl<W: Write> Renderer for PdfRenderer<W> {
    fn init(&mut self, width: f64, height: f64) -> Result<(), RenderError> {
        self.document.add_page(width, height);
        Ok(())
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<(), RenderError> {
        self.document.line(x1, y1, x2, y2);
        Ok(())
    }

    fn circle(&mut self, x: f64, y: f64, radius: f64) -> Result<(), RenderError> {
        self.document.circle(x, y, radius);
        Ok(())
    }

    fn arc(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    ) -> Result<(), RenderError> {
        self.document.arc(x, y, radius, start_angle, end_angle);
        Ok(())
    }

    fn polyline(&mut self, points: &[Point2], closed: bool) -> Result<(), RenderError> {
        if points.len() >= 2 {
            self.document.polyline(points, closed);
        }
        Ok(())
    }

    fn text(&mut self, x: f64, y: f64, height: f64, value: &str) -> Result<(), RenderError> {
        self.document.text(x, y, height, value);
        Ok(())
    }

    fn finish(mut self) -> Result<(), RenderError> {
        debug!(
            content_bytes = self.document.content().len(),
            "输出 PDF 文档"
        );
        self.document.write_to(&mut self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 解析输出中的交叉引用表，逐项校验对象偏移。
    fn assert_xref_offsets_match(bytes: &[u8]) {
        let text = std::str::from_utf8(bytes).expect("ASCII output");
        let startxref = text.rfind("startxref\n").expect("startxref present");
        let xref_offset: usize = text[startxref + "startxref\n".len()..]
            .lines()
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert!(text[xref_offset..].starts_with("xref\n"));

        let mut lines = text[xref_offset..].lines().skip(1);
        let header = lines.next().unwrap();
        let count: usize = header.split(' ').nth(1).unwrap().parse().unwrap();
        assert_eq!(lines.next().unwrap(), "0000000000 65535 f ");
        for id in 1..count {
            let entry = lines.next().unwrap();
            assert_eq!(entry.len() + 1, 20, "xref entries are 20 bytes");
            let offset: usize = entry[..10].parse().unwrap();
            let expected = format!("{id} 0 obj\n");
            assert!(
                text[offset..].starts_with(&expected),
                "object {id} not found at offset {offset}"
            );
        }
        assert!(text.contains(&format!("/Size {count} /Root 1 0 R")));
        assert!(text.ends_with("%%EOF\n"));
    }

    #[test]
    fn line_flips_to_pdf_origin() {
        let mut pdf = PdfDocument::new(100.0, 100.0);
        pdf.line(10.0, 10.0, 90.0, 90.0);
        assert_eq!(pdf.content(), "10.00 90.00 m 90.00 10.00 l S\n");
    }

    #[test]
    fn circle_uses_four_bezier_quadrants() {
        let mut pdf = PdfDocument::new(100.0, 100.0);
        pdf.circle(50.0, 50.0, 10.0);
        let content = pdf.content();
        assert!(content.starts_with("60.00 50.00 m\n"));
        assert_eq!(content.matches(" c\n").count(), 4);
        assert!(content.contains("60.00 55.52 55.52 60.00 50.00 60.00 c"));
        assert!(content.ends_with("S\n"));
    }

    #[test]
    fn arc_is_flattened_between_start_and_end() {
        let mut pdf = PdfDocument::new(100.0, 100.0);
        pdf.arc(50.0, 50.0, 10.0, 0.0, 90.0);
        let content = pdf.content();
        assert!(content.starts_with("60.00 50.00 m\n"));
        assert!(content.ends_with("50.00 60.00 l S\n"));
        // 90° / 5° = 18 段：17 个中间点加终点
        assert_eq!(content.matches(" l").count(), 18);
    }

    #[test]
    fn arc_wraps_end_angle_forward() {
        let mut pdf = PdfDocument::new(100.0, 100.0);
        pdf.arc(50.0, 50.0, 10.0, 270.0, 0.0);
        let content = pdf.content();
        assert!(content.starts_with("50.00 40.00 m\n"));
        assert!(content.ends_with("60.00 50.00 l S\n"));
        assert_eq!(content.matches(" l").count(), 18);
    }

    #[test]
    fn oversized_sweep_is_limited_to_full_turn() {
        let mut pdf = PdfDocument::new(100.0, 100.0);
        pdf.arc(50.0, 50.0, 10.0, 0.0, 3.6e6);
        let content = pdf.content();
        assert!(content.starts_with("60.00 50.00 m\n"));
        assert!(content.ends_with("60.00 50.00 l S\n"));
        // 360° / 5° = 72 段
        assert_eq!(content.matches(" l").count(), 72);
    }

    #[test]
    fn text_is_escaped() {
        let mut pdf = PdfDocument::new(100.0, 100.0);
        pdf.text(10.0, 20.0, 12.0, "f(x) = a\\b");
        assert_eq!(
            pdf.content(),
            "BT /F1 12.00 Tf 10.00 80.00 Td (f\\(x\\) = a\\\\b) Tj ET\n"
        );
    }

    #[test]
    fn closed_polyline_uses_single_path() {
        let mut pdf = PdfDocument::new(10.0, 10.0);
        pdf.polyline(
            &[
                Point2::new(0.0, 0.0),
                Point2::new(5.0, 0.0),
                Point2::new(5.0, 5.0),
            ],
            true,
        );
        assert_eq!(
            pdf.content(),
            "0.00 10.00 m\n5.00 10.00 l\n5.00 5.00 l\nh S\n"
        );
    }

    #[test]
    fn output_has_consistent_xref_table() {
        let mut pdf = PdfDocument::new(100.0, 200.0);
        pdf.line(0.0, 0.0, 100.0, 200.0);
        pdf.text(5.0, 5.0, 4.0, "Größe (mm)");
        let bytes = pdf.to_bytes();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("%PDF-1.4\n"));
        assert!(text.contains("/MediaBox [0 0 100.00 200.00]"));
        assert!(text.contains("/BaseFont /Helvetica"));
        assert!(text.contains("/Size 6 /Root 1 0 R"));
        assert_xref_offsets_match(&bytes);
    }

    #[test]
    fn stream_length_matches_content() {
        let mut pdf = PdfDocument::new(50.0, 50.0);
        pdf.circle(25.0, 25.0, 5.0);
        let expected = format!("<< /Length {} >>", pdf.content().len());
        let text = String::from_utf8(pdf.to_bytes()).unwrap();
        assert!(text.contains(&expected));
    }

    #[test]
    fn font_name_is_escaped() {
        let pdf = PdfDocument::new(10.0, 10.0).with_font("Times Roman");
        let text = String::from_utf8(pdf.to_bytes()).unwrap();
        assert!(text.contains("/BaseFont /Times#20Roman"));
    }

    #[test]
    fn renderer_writes_only_on_finish() {
        let mut sink = Vec::new();
        {
            let mut renderer = PdfRenderer::new(&mut sink, 100.0, 100.0, Some("Courier"));
            renderer.init(100.0, 100.0).unwrap();
            renderer.line(0.0, 0.0, 10.0, 10.0).unwrap();
            renderer
                .polyline(&[Point2::new(1.0, 1.0)], false)
                .unwrap();
            assert!(renderer.document().content().starts_with("0.00 100.00 m"));
            renderer.finish().unwrap();
        }
        let text = String::from_utf8(sink.clone()).unwrap();
        assert!(text.contains("/BaseFont /Courier"));
        assert_xref_offsets_match(&sink);
    }
}
