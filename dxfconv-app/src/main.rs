use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use dxfconv_config::{AppConfig, ConfigError, OutputConfig, PageSizeSetting};
use dxfconv_core::options::{Orientation, OutputFormat, RenderOptions};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// 将 DXF 图纸转换为 PDF 或 SVG。
#[derive(Debug, Parser)]
#[command(name = "dxfconv", version, about)]
struct Args {
    /// 输入 DXF 文件
    input: PathBuf,
    /// 输出文件，未指定 --format 时按扩展名推断格式
    output: PathBuf,
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
    /// 页面尺寸预设：a3、a4、a5、letter
    #[arg(long)]
    page_size: Option<String>,
    #[arg(long, conflicts_with = "portrait")]
    landscape: bool,
    #[arg(long)]
    portrait: bool,
    /// 固定比例，0 表示自动适配页面
    #[arg(long)]
    scale: Option<f64>,
    #[arg(long)]
    margin: Option<f64>,
    #[arg(long)]
    font: Option<String>,
    /// 配置文件路径，默认读取 DXFCONV_CONFIG 或 ./config/default.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Pdf,
    Svg,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Pdf => OutputFormat::Pdf,
            FormatArg::Svg => OutputFormat::Svg,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let (config, config_error) = load_configuration(args.config.as_deref());
    init_logging(&config);
    if let Some(err) = config_error {
        match &err {
            ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                warn!(path = %path.display(), error = %err, "加载配置失败，使用内建默认值");
            }
            _ => warn!(error = %err, "加载配置失败，使用内建默认值"),
        }
    }

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "转换失败");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, config: &AppConfig) -> anyhow::Result<()> {
    let options = resolve_options(args, &config.output)?;
    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        format = ?options.format,
        "开始转换"
    );
    dxfconv_frontend::convert_file(&args.input, &args.output, &options)
        .with_context(|| format!("无法转换 {}", args.input.display()))
}

/// 命令行参数逐项覆盖配置中的输出参数。
fn resolve_options(args: &Args, defaults: &OutputConfig) -> anyhow::Result<RenderOptions> {
    let mut output = defaults.clone();
    if let Some(name) = &args.page_size {
        output.page_size = PageSizeSetting::Named(name.clone());
    }
    if args.landscape {
        output.orientation = Orientation::Landscape;
    } else if args.portrait {
        output.orientation = Orientation::Portrait;
    }
    if let Some(scale) = args.scale {
        output.scale = scale;
    }
    if let Some(margin) = args.margin {
        output.margin = margin;
    }
    if let Some(font) = &args.font {
        output.font = Some(font.clone());
    }
    output.format = match args.format {
        Some(format) => format.into(),
        None => infer_format(&args.output).unwrap_or(output.format),
    };

    Ok(output.to_render_options()?)
}

fn infer_format(path: &Path) -> Option<OutputFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(OutputFormat::from_extension)
}

fn load_configuration(override_path: Option<&Path>) -> (AppConfig, Option<ConfigError>) {
    let loaded = match override_path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::discover(),
    };
    match loaded {
        Ok(cfg) => (cfg, None),
        Err(err) => (AppConfig::default(), Some(err)),
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
