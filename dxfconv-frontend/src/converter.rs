use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use dxfconv_core::{
    document::Drawing,
    options::{OutputFormat, RenderOptions},
};
use dxfconv_render::{PdfRenderer, SvgRenderer, render_drawing};
use tracing::info;

use crate::errors::ConvertError;

/// 把 DXF 字节流转换为目标文档写入 `output`。
///
/// 解析失败时不会向 `output` 写入任何内容。
pub fn convert<R: Read, W: Write>(
    input: R,
    output: W,
    options: &RenderOptions,
) -> Result<(), ConvertError> {
    let drawing = parse(input, options)?;
    render(&drawing, output, options)
}

/// 文件级便捷入口。输入解析成功后才创建输出文件。
pub fn convert_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    options: &RenderOptions,
) -> Result<(), ConvertError> {
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();

    let input = File::open(input_path).map_err(|source| ConvertError::Open {
        path: input_path.to_path_buf(),
        source,
    })?;
    let drawing = parse(input, options)?;

    let output = File::create(output_path).map_err(|source| ConvertError::Create {
        path: output_path.to_path_buf(),
        source,
    })?;
    render(&drawing, BufWriter::new(output), options)?;
    info!(
        input = %input_path.display(),
        output = %output_path.display(),
        "转换完成"
    );
    Ok(())
}

fn parse<R: Read>(input: R, options: &RenderOptions) -> Result<Drawing, ConvertError> {
    let drawing = dxfconv_io::parse_drawing(input)?;
    info!(entity_count = drawing.len(), format = ?options.format, "DXF 解析完成");
    Ok(drawing)
}

fn render<W: Write>(
    drawing: &Drawing,
    output: W,
    options: &RenderOptions,
) -> Result<(), ConvertError> {
    let (width, height) = options.page_dimensions();
    let font = options.font.as_deref();
    match options.format {
        OutputFormat::Pdf => {
            render_drawing(PdfRenderer::new(output, width, height, font), drawing, options)?
        }
        OutputFormat::Svg => {
            render_drawing(SvgRenderer::new(output, font), drawing, options)?
        }
    }
    Ok(())
}
