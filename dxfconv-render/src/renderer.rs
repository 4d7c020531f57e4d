use dxfconv_core::geometry::Point2;

use crate::errors::RenderError;

/// 渲染后端能力集合。
///
/// 所有坐标都已经是最终页面坐标（原点在左上角，Y 向下），后端不再推导比例或偏移。
/// 角度保持角度制，由后端自行换算为路径。
pub trait Renderer {
    fn init(&mut self, width: f64, height: f64) -> Result<(), RenderError>;

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<(), RenderError>;

    fn circle(&mut self, x: f64, y: f64, radius: f64) -> Result<(), RenderError>;

    fn arc(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    ) -> Result<(), RenderError>;

    fn polyline(&mut self, points: &[Point2], closed: bool) -> Result<(), RenderError>;

    /// 文字只锚定在一个点上，不做字形度量。
    fn text(&mut self, x: f64, y: f64, height: f64, value: &str) -> Result<(), RenderError>;

    /// 完成文档并写入输出。
    fn finish(self) -> Result<(), RenderError>
    where
        Self: Sized;
}
