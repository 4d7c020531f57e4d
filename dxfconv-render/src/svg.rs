use std::io::Write;

use dxfconv_core::geometry::Point2;

use crate::errors::RenderError;
use crate::renderer::Renderer;

const STROKE_STYLE: &str = "fill:none;stroke:black;stroke-width:1";
const DEFAULT_FONT_FAMILY: &str = "Arial";

/// SVG 后端：每次绘制调用直接写出一个元素，坐标统一四舍五入为整数。
///
/// 输出在 `finish` 追加 `</svg>` 之前是不完整的文档。
pub struct SvgRenderer<W> {
    sink: W,
    font_family: String,
}

#[inline]
fn px(value: f64) -> i64 {
    value.round() as i64
}

impl<W: Write> SvgRenderer<W> {
    /// 页面尺寸在 `init` 时给出。
    pub fn new(sink: W, font: Option<&str>) -> Self {
        Self {
            sink,
            font_family: font.unwrap_or(DEFAULT_FONT_FAMILY).to_string(),
        }
    }

    fn points_attr(points: &[Point2]) -> String {
        points
            .iter()
            .map(|p| format!("{},{}", px(p.x()), px(p.y())))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<W: Write> Renderer for SvgRenderer<W> {
    fn init(&mut self, width: f64, height: f64) -> Result<(), RenderError> {
        let (w, h) = (px(width), px(height));
        writeln!(self.sink, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            self.sink,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        )?;
        writeln!(
            self.sink,
            r#"<rect x="0" y="0" width="{w}" height="{h}" style="fill:none;stroke:none" />"#
        )?;
        Ok(())
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<(), RenderError> {
        writeln!(
            self.sink,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" style="{STROKE_STYLE}" />"#,
            px(x1),
            px(y1),
            px(x2),
            px(y2)
        )?;
        Ok(())
    }

    fn circle(&mut self, x: f64, y: f64, radius: f64) -> Result<(), RenderError> {
        writeln!(
            self.sink,
            r#"<circle cx="{}" cy="{}" r="{}" style="{STROKE_STYLE}" />"#,
            px(x),
            px(y),
            px(radius)
        )?;
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
        // 页面坐标 Y 向下，端点取 cy − r·sin θ，扫掠标志为 0 保持逆时针方向。
        let (start, end) = (start_angle.to_radians(), end_angle.to_radians());
        let sx = x + radius * start.cos();
        let sy = y - radius * start.sin();
        let ex = x + radius * end.cos();
        let ey = y - radius * end.sin();

        let mut sweep = end_angle - start_angle;
        if sweep < 0.0 {
            sweep += 360.0;
        }
        let large_arc = u8::from(sweep > 180.0);
        let r = px(radius);

        writeln!(
            self.sink,
            r#"<path d="M{},{} A{r},{r} 0 {large_arc},0 {},{}" style="{STROKE_STYLE}" />"#,
            px(sx),
            px(sy),
            px(ex),
            px(ey)
        )?;
        Ok(())
    }

    fn polyline(&mut self, points: &[Point2], closed: bool) -> Result<(), RenderError> {
        let element = if closed { "polygon" } else { "polyline" };
        writeln!(
            self.sink,
            r#"<{element} points="{}" style="{STROKE_STYLE}" />"#,
            Self::points_attr(points)
        )?;
        Ok(())
    }

    fn text(&mut self, x: f64, y: f64, height: f64, value: &str) -> Result<(), RenderError> {
        writeln!(
            self.sink,
            r#"<text x="{}" y="{}" style="font-family:{};font-size:{}">{}</text>"#,
            px(x),
            px(y),
            escape_xml(&self.font_family),
            px(height),
            escape_xml(value)
        )?;
        Ok(())
    }

    fn finish(mut self) -> Result<(), RenderError> {
        writeln!(self.sink, "</svg>")?;
        self.sink.flush()?;
        Ok(())
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(draw: impl FnOnce(&mut SvgRenderer<&mut Vec<u8>>)) -> String {
        let mut sink = Vec::new();
        {
            let mut renderer = SvgRenderer::new(&mut sink, None);
            renderer.init(210.0, 297.0).unwrap();
            draw(&mut renderer);
            renderer.finish().unwrap();
        }
        String::from_utf8(sink).unwrap()
    }

    #[test]
    fn document_has_header_background_and_closing_tag() {
        let svg = render(|_| {});
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(svg.contains(r#"width="210" height="297" viewBox="0 0 210 297""#));
        assert!(svg.contains(r#"<rect x="0" y="0" width="210" height="297""#));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn coordinates_are_rounded_to_integers() {
        let svg = render(|r| {
            r.line(10.4, 10.6, 20.5, 99.49).unwrap();
            r.circle(50.2, 60.7, 4.5).unwrap();
        });
        assert!(svg.contains(r#"<line x1="10" y1="11" x2="21" y2="99""#));
        assert!(svg.contains(r#"<circle cx="50" cy="61" r="5""#));
    }

    #[test]
    fn quarter_arc_goes_up_on_page() {
        let svg = render(|r| r.arc(100.0, 100.0, 10.0, 0.0, 90.0).unwrap());
        assert!(svg.contains(r#"d="M110,100 A10,10 0 0,0 100,90""#), "{svg}");
    }

    #[test]
    fn wide_arc_sets_large_arc_flag() {
        let svg = render(|r| r.arc(100.0, 100.0, 10.0, 0.0, 270.0).unwrap());
        assert!(svg.contains(r#"d="M110,100 A10,10 0 1,0 100,110""#), "{svg}");

        let wrapped = render(|r| r.arc(100.0, 100.0, 10.0, 300.0, 30.0).unwrap());
        assert!(wrapped.contains(" 0 0,0 "), "{wrapped}");
    }

    #[test]
    fn closed_polyline_becomes_polygon() {
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
        ];
        let svg = render(|r| {
            r.polyline(&points, true).unwrap();
            r.polyline(&points, false).unwrap();
        });
        assert!(svg.contains(r#"<polygon points="0,0 10,0 10,10""#));
        assert!(svg.contains(r#"<polyline points="0,0 10,0 10,10""#));
    }

    #[test]
    fn text_is_escaped_and_uses_font_family() {
        let mut sink = Vec::new();
        {
            let mut renderer = SvgRenderer::new(&mut sink, Some("DejaVu Sans"));
            renderer.init(100.0, 100.0).unwrap();
            renderer.text(5.0, 6.0, 3.5, "a < b & \"c\"").unwrap();
            renderer.finish().unwrap();
        }
        let svg = String::from_utf8(sink).unwrap();
        assert!(svg.contains(
            r#"<text x="5" y="6" style="font-family:DejaVu Sans;font-size:4">a &lt; b &amp; &quot;c&quot;</text>"#
        ));
    }
}
