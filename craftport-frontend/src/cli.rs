use std::path::PathBuf;

use craftport_engine::ConversionSummary;
use craftport_engine::options::ConversionOptions;
use tracing::info;

use crate::errors::FrontendError;
use crate::output_path::default_output_path;

/// 一次命令行转换的输入。
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub input: PathBuf,
    /// 未指定时由 [`default_output_path`] 推导。
    pub output: Option<PathBuf>,
    pub output_suffix: String,
    pub options: ConversionOptions,
}

#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    pub output: PathBuf,
    pub summary: ConversionSummary,
}

/// 执行转换并在标准输出打印概要。
pub fn run(request: &ConvertRequest) -> Result<ConvertOutcome, FrontendError> {
    let output = match &request.output {
        Some(path) => path.clone(),
        None => default_output_path(&request.input, &request.output_suffix)?,
    };
    info!(input = %request.input.display(), output = %output.display(), scale = request.options.scale, "开始转换");

    let summary = crate::convert_file(&request.input, &output, &request.options)?;
    let outcome = ConvertOutcome { output, summary };
    print_summary(&outcome);
    Ok(outcome)
}

fn print_summary(outcome: &ConvertOutcome) {
    let summary = &outcome.summary;
    println!("已写出：{}", outcome.output.display());
    println!(
        "  零件：转换 {} 个，丢弃 {} 个",
        summary.parts_converted,
        summary.parts_dropped()
    );
    println!(
        "  移除连接 {} 条，移除刚体组 {} 个",
        summary.graph.connections_removed, summary.graph.bodies_removed
    );
    if !summary.theme_relocated {
        println!("  源文档没有主题");
    }
}
