pub mod cli;
pub mod errors;
pub mod loader;
pub mod output_path;

use std::path::Path;

use craftport_engine::ConversionSummary;
use craftport_engine::options::ConversionOptions;
use craftport_io::{CraftXmlFacade, DocumentSaver};
use errors::FrontendError;
use tracing::info;

/// 读取、转换并写出一个载具文件。转换失败时不会写出任何内容。
pub fn convert_file(
    input: &Path,
    output: &Path,
    options: &ConversionOptions,
) -> Result<ConversionSummary, FrontendError> {
    let mut craft = loader::load_source(input)?;
    let summary = craftport_engine::convert_craft(&mut craft, options)?;
    CraftXmlFacade::new().save(&craft, output)?;
    info!(output = %output.display(), "写出目标文档");
    Ok(summary)
}
