pub mod assembler;
pub mod converters;
pub mod graph;
pub mod options;
pub mod registry;

pub mod errors {
    use craftport_core::craft::ModelError;
    use craftport_core::numeric::NumericError;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum ConvertError {
        #[error(transparent)]
        Model(#[from] ModelError),
        #[error("part {part_id}: missing <{block}> block")]
        MissingBlock {
            part_id: String,
            block: &'static str,
        },
        #[error("part {part_id}: <{block}> is missing attribute `{attribute}`")]
        MissingAttribute {
            part_id: String,
            block: String,
            attribute: &'static str,
        },
        #[error("part {part_id}: attribute `{attribute}`: {source}")]
        InvalidNumber {
            part_id: String,
            attribute: String,
            #[source]
            source: NumericError,
        },
        #[error("part {part_id}: corner type code {code} is out of range")]
        InvalidCornerCode { part_id: String, code: f64 },
        #[error("craft is missing attribute `{0}`")]
        MissingCraftAttribute(&'static str),
        #[error("craft attribute `{attribute}`: {source}")]
        InvalidCraftNumber {
            attribute: &'static str,
            #[source]
            source: NumericError,
        },
        #[error("scale must be a positive finite number, got {0}")]
        InvalidScale(f64),
        #[error("`only_{axis}` and `exclude_{axis}` cannot be combined")]
        ConflictingFilters { axis: &'static str },
    }
}

use std::collections::HashSet;

use craftport_core::craft::{Craft, Part};
use tracing::{debug, info, warn};

use crate::converters::ROOT_PART_ID;
use crate::errors::ConvertError;
use crate::graph::GraphReport;
use crate::options::ConversionOptions;
use crate::registry::ConverterRegistry;

/// 一次转换的统计信息。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub parts_seen: usize,
    pub parts_converted: usize,
    pub graph: GraphReport,
    pub theme_relocated: bool,
}

impl ConversionSummary {
    #[inline]
    pub fn parts_dropped(&self) -> usize {
        self.parts_seen - self.parts_converted
    }
}

/// 转换整个文档并返回转换后的根节点。失败时不产生部分结果。
pub fn convert_document(
    mut craft: Craft,
    options: &ConversionOptions,
) -> Result<Craft, ConvertError> {
    options.validate()?;
    run_pipeline(&mut craft, options, ConverterRegistry::global())?;
    Ok(craft)
}

/// 原地转换文档，使用进程级的标准转换器注册表。出错时 `craft` 保持原样。
pub fn convert_craft(
    craft: &mut Craft,
    options: &ConversionOptions,
) -> Result<ConversionSummary, ConvertError> {
    convert_craft_with(craft, options, ConverterRegistry::global())
}

/// 使用指定注册表原地转换文档。转换在副本上进行，全部成功后才写回 `craft`。
pub fn convert_craft_with(
    craft: &mut Craft,
    options: &ConversionOptions,
    registry: &ConverterRegistry,
) -> Result<ConversionSummary, ConvertError> {
    options.validate()?;

    let mut staged = craft.clone();
    let summary = run_pipeline(&mut staged, options, registry)?;
    *craft = staged;
    Ok(summary)
}

fn run_pipeline(
    craft: &mut Craft,
    options: &ConversionOptions,
    registry: &ConverterRegistry,
) -> Result<ConversionSummary, ConvertError> {
    assembler::normalize_craft(craft)?;

    let parts_seen = craft.assembly.parts.len();
    let retained = convert_parts(&mut craft.assembly.parts, options, registry)?;
    craft.assembly.parts.insert(0, assembler::command_pod());

    let graph = graph::filter_assembly(&mut craft.assembly, &retained);
    let theme_relocated = assembler::relocate_theme(craft);

    let summary = ConversionSummary {
        parts_seen,
        parts_converted: retained.len(),
        graph,
        theme_relocated,
    };
    info!(
        parts_seen = summary.parts_seen,
        parts_converted = summary.parts_converted,
        connections_removed = summary.graph.connections_removed,
        bodies_removed = summary.graph.bodies_removed,
        "文档转换完成"
    );
    Ok(summary)
}

/// 逐个转换零件，移除不支持或被过滤的零件，返回保留下来的零件 id 集合。
///
/// 出错时 `parts` 已被清空，调用方应只在副本上使用。
fn convert_parts(
    parts: &mut Vec<Part>,
    options: &ConversionOptions,
    registry: &ConverterRegistry,
) -> Result<HashSet<String>, ConvertError> {
    let mut retained = HashSet::with_capacity(parts.len());
    let mut kept = Vec::with_capacity(parts.len());

    for mut part in parts.drain(..) {
        let converter = registry
            .get(&part.part_type)
            .filter(|_| options.admits(&part.part_type, &part.id));
        let Some(converter) = converter else {
            debug!(id = %part.id, part_type = %part.part_type, "跳过零件");
            continue;
        };

        if part.id == ROOT_PART_ID {
            warn!(id = %part.id, "零件 id 与根控制零件冲突");
        }
        converter.convert(&mut part, options.scale)?;
        retained.insert(part.id.clone());
        kept.push(part);
    }

    *parts = kept;
    Ok(retained)
}
