use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use craftport_config::AppConfig;
use craftport_engine::options::ConversionOptions;
use craftport_frontend::cli::{ConvertRequest, run as run_conversion};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

/// 把 SimplePlanes 载具文件转换为 SimpleRockets 2 格式。
#[derive(Debug, Parser)]
#[command(name = "craftport", version)]
struct Cli {
    /// 源载具 XML 文件
    input: PathBuf,
    /// 输出文件；默认在当前目录生成 `<输入主干>_SR.xml`
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// 位置与尺寸的整体缩放倍率
    #[arg(short, long)]
    scale: Option<f64>,
    /// 只转换这些零件 id
    #[arg(long, value_delimiter = ',', num_args = 1.., conflicts_with = "exclude_ids")]
    only_ids: Option<Vec<String>>,
    /// 跳过这些零件 id
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    exclude_ids: Vec<String>,
    /// 只转换这些零件类型
    #[arg(long, value_delimiter = ',', num_args = 1.., conflicts_with = "exclude_types")]
    only_types: Option<Vec<String>>,
    /// 跳过这些零件类型
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    exclude_types: Vec<String>,
    /// 配置文件路径
    #[arg(long)]
    config: Option<PathBuf>,
    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let config = craftport_frontend::loader::load_app_config(cli.config.as_deref());
    init_logging(&config, cli.verbose);
    info!("启动 craftport");

    if let Err(err) = run(cli, &config) {
        error!(error = %err, "转换失败");
        eprintln!("错误：{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: &AppConfig) -> Result<()> {
    let request = build_request(cli, config);
    run_conversion(&request)
        .with_context(|| format!("无法转换 {}", request.input.display()))?;
    Ok(())
}

/// 合并命令行参数与配置，命令行优先。
fn build_request(cli: Cli, config: &AppConfig) -> ConvertRequest {
    let conversion = &config.conversion;
    let mut options =
        ConversionOptions::default().with_scale(cli.scale.unwrap_or(conversion.scale));

    if let Some(ids) = cli.only_ids {
        options = options.only_ids(ids);
    }
    options = options.exclude_ids(cli.exclude_ids);

    match cli.only_types {
        Some(types) => options = options.only_types(types),
        None if cli.exclude_types.is_empty() => {
            options = options.exclude_types(conversion.exclude_types.iter().cloned());
        }
        None => options = options.exclude_types(cli.exclude_types),
    }

    ConvertRequest {
        input: cli.input,
        output: cli.output,
        output_suffix: conversion.output_suffix.clone(),
        options,
    }
}

fn init_logging(config: &AppConfig, verbose: bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("craftport").chain(args.iter().copied()))
            .expect("parse arguments")
    }

    #[test]
    fn cli_flags_override_configuration() {
        let mut config = AppConfig::default();
        config.conversion.scale = 3.0;
        config.conversion.exclude_types = vec!["Block-2".to_string()];

        let request = build_request(parse(&["a.xml", "-s", "2", "--exclude-types", "Wing-3"]), &config);
        assert_eq!(request.options.scale, 2.0);
        assert!(request.options.exclude_types.contains("Wing-3"));
        assert!(!request.options.exclude_types.contains("Block-2"));
    }

    #[test]
    fn configuration_fills_unset_flags() {
        let mut config = AppConfig::default();
        config.conversion.scale = 3.0;
        config.conversion.exclude_types = vec!["Block-2".to_string()];

        let request = build_request(parse(&["a.xml", "--only-ids", "1,2"]), &config);
        assert_eq!(request.options.scale, 3.0);
        assert!(request.options.exclude_types.contains("Block-2"));
        assert_eq!(request.options.only_ids.as_ref().map(|ids| ids.len()), Some(2));
        assert!(request.output.is_none());
        assert_eq!(request.output_suffix, "_SR");
    }

    #[test]
    fn only_types_ignores_configured_exclusions() {
        let mut config = AppConfig::default();
        config.conversion.exclude_types = vec!["Block-2".to_string()];

        let request = build_request(parse(&["a.xml", "--only-types", "Wing-3"]), &config);
        assert!(request.options.exclude_types.is_empty());
        assert!(request.options.validate().is_ok());
    }

    #[test]
    fn conflicting_flags_are_rejected_by_parser() {
        let result = Cli::try_parse_from(["craftport", "a.xml", "--only-ids", "1", "--exclude-ids", "2"]);
        assert!(result.is_err());
    }
}
