use dxfconv_core::geometry::{BoundingBox, Point2, Point3};

/// 从绘图坐标到页面坐标的统一变换：等比缩放、居中并翻转 Y 轴。
///
/// `X' = x·scale + offset_x`，`Y' = page_height − (y·scale + offset_y)`。
/// 翻转只在这里做一次，渲染后端收到的都是最终页面坐标。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub page_height: f64,
}

impl PageTransform {
    /// 根据范围、页面尺寸（已考虑方向）、边距与可选固定比例计算变换。
    ///
    /// `fixed_scale` 为 0 时自动适配：宽或高为 0 的轴比例退化为 1.0，
    /// 取两轴较小者以保持纵横比。固定比例原样使用，仍然居中，但可能超出页面。
    pub fn plan(
        bounds: &BoundingBox,
        page_width: f64,
        page_height: f64,
        margin: f64,
        fixed_scale: f64,
    ) -> Self {
        // 空文档按原点处的退化范围处理，避免哨兵值参与运算。
        let bounds = if bounds.is_empty() {
            BoundingBox {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 0.0,
                max_y: 0.0,
            }
        } else {
            *bounds
        };

        let avail_w = page_width - 2.0 * margin;
        let avail_h = page_height - 2.0 * margin;
        let width = bounds.width();
        let height = bounds.height();

        let scale = if fixed_scale == 0.0 {
            let scale_x = if width == 0.0 { 1.0 } else { avail_w / width };
            let scale_y = if height == 0.0 { 1.0 } else { avail_h / height };
            scale_x.min(scale_y)
        } else {
            fixed_scale
        };

        Self {
            scale,
            offset_x: -bounds.min_x * scale + margin + (avail_w - width * scale) / 2.0,
            offset_y: -bounds.min_y * scale + margin + (avail_h - height * scale) / 2.0,
            page_height,
        }
    }

    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> Point2 {
        Point2::new(
            x * self.scale + self.offset_x,
            self.page_height - (y * self.scale + self.offset_y),
        )
    }

    /// Z 分量被忽略。
    #[inline]
    pub fn apply_point(&self, point: Point3) -> Point2 {
        self.apply(point.x(), point.y())
    }

    #[inline]
    pub fn scale_length(&self, length: f64) -> f64 {
        length * self.scale
    }
}
