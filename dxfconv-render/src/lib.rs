pub mod drawer;
pub mod pdf;
pub mod renderer;
pub mod svg;
pub mod transform;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum RenderError {
        #[error("failed to write output document: {0}")]
        Write(#[from] std::io::Error),
    }
}

use dxfconv_core::{document::Drawing, options::RenderOptions};
use tracing::{debug, info};

pub use errors::RenderError;
pub use pdf::{PdfDocument, PdfRenderer};
pub use renderer::Renderer;
pub use svg::SvgRenderer;
pub use transform::PageTransform;

/// 完整的渲染流程：计算范围、规划变换、逐个绘制实体，最后由后端输出文档。
pub fn render_drawing<R: Renderer>(
    mut renderer: R,
    drawing: &Drawing,
    options: &RenderOptions,
) -> Result<(), RenderError> {
    let (page_width, page_height) = options.page_dimensions();
    let bounds = drawing.bounding_box();
    let transform = PageTransform::plan(
        &bounds,
        page_width,
        page_height,
        options.margin,
        options.scale,
    );
    debug!(
        min_x = bounds.min_x,
        min_y = bounds.min_y,
        max_x = bounds.max_x,
        max_y = bounds.max_y,
        scale = transform.scale,
        "已规划页面变换"
    );

    renderer.init(page_width, page_height)?;
    let drawn = drawer::draw_drawing(&mut renderer, drawing, &transform)?;
    renderer.finish()?;
    info!(
        entity_count = drawing.len(),
        drawn,
        format = ?options.format,
        "渲染完成"
    );
    Ok(())
}
