//! 按零件类型划分的转换规则。
//!
//! 每个转换器由三部分组成：所有类型共用的通用阶段、类型专属阶段，以及最后的属性白名单裁剪。

mod actuator;
mod block;
mod fuselage;
mod wing;

use craftport_core::craft::Part;
use craftport_core::numeric::{self, NumericError};
use craftport_core::rotation::{self, RowMatrix};
use craftport_core::tree::Element;
use glam::DVec3;

use crate::errors::ConvertError;

pub use actuator::{HINGE_ROTATOR, PISTON, SMALL_ROTATOR};
pub use block::BLOCK;
pub use fuselage::{FUSELAGE, INLET, NOSE_CONE};
pub use wing::WING;

/// 目标格式中唯一根控制零件的保留 id。
pub const ROOT_PART_ID: &str = "0";
/// 目标格式的材质槽数量。
pub const MATERIAL_SLOTS: usize = 5;
/// 缺省阻力：六个分量全为零。
pub const DEFAULT_DRAG: &str = "0,0,0,0,0,0";
/// 阻力面积 = 阻力系数 × 1.5。
pub const DRAG_AREA_FACTOR: f64 = 1.5;

pub(crate) const CONFIG: &str = "Config";
pub(crate) const DRAG: &str = "Drag";
const DEFAULT_MATERIAL: &str = "0";

/// 所有转换器都保留的属性。
pub const BASE_ATTRIBUTES: &[&str] = &[
    "id",
    "partType",
    "position",
    "rotation",
    "commandPodId",
    "materials",
];

/// 转换器变体。集合封闭，由 [`PartConverter::convert`] 统一分派。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConverterKind {
    Fuselage,
    NoseCone,
    Inlet,
    Wing,
    Block,
    Piston,
    SmallRotator,
    HingeRotator,
}

/// 单个零件类别的转换描述：目标类型、可选的预旋转矩阵与属性白名单。
#[derive(Debug)]
pub struct PartConverter {
    kind: ConverterKind,
    target_type: &'static str,
    prerotation: Option<RowMatrix>,
    allowed_attributes: &'static [&'static str],
}

impl PartConverter {
    pub const fn new(
        kind: ConverterKind,
        target_type: &'static str,
        prerotation: Option<RowMatrix>,
        allowed_attributes: &'static [&'static str],
    ) -> Self {
        Self {
            kind,
            target_type,
            prerotation,
            allowed_attributes,
        }
    }

    #[inline]
    pub fn kind(&self) -> ConverterKind {
        self.kind
    }

    #[inline]
    pub fn target_type(&self) -> &'static str {
        self.target_type
    }

    /// 原地转换零件。`scale` 为正数倍率。
    pub fn convert(&self, part: &mut Part, scale: f64) -> Result<(), ConvertError> {
        self.convert_common(part, scale)?;
        match self.kind {
            ConverterKind::Fuselage => fuselage::convert_fuselage(part, scale)?,
            ConverterKind::NoseCone => fuselage::convert_nose_cone(part, scale)?,
            ConverterKind::Inlet => fuselage::convert_inlet(part, scale)?,
            ConverterKind::Wing => wing::convert_wing(part, scale)?,
            ConverterKind::Block => block::convert_block(part),
            ConverterKind::Piston => actuator::convert_piston(part)?,
            ConverterKind::SmallRotator => actuator::convert_small_rotator(part)?,
            ConverterKind::HingeRotator => actuator::convert_hinge_rotator(part)?,
        }
        part.retain_attributes(self.allowed_attributes);
        Ok(())
    }

    /// 数值属性只在需要改写时解析；倍率为 1 且无预旋转时源文本逐字保留。
    fn convert_common(&self, part: &mut Part, scale: f64) -> Result<(), ConvertError> {
        part.command_pod_id = Some(ROOT_PART_ID.to_string());
        part.part_type = self.target_type.to_string();

        if scale != 1.0 {
            let position = part_vec3(&part.id, "position", &part.position)?;
            part.position = numeric::format_vec3(position * scale);
        }
        if let Some(rows) = &self.prerotation {
            let angles = part_vec3(&part.id, "rotation", &part.rotation)?;
            let rotated = rotation::prerotate(angles, &rotation::matrix_from_rows(rows));
            part.rotation = numeric::format_vec3(rotated);
        }

        let material = part
            .materials
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_MATERIAL.to_string());
        part.materials = vec![material; MATERIAL_SLOTS];

        let mut config = Element::new(CONFIG);
        let part_scale = match part.scale.take() {
            Some(declared) if scale == 1.0 => Some(declared),
            Some(declared) => {
                let declared = part_vec3(&part.id, "scale", &declared)?;
                Some(numeric::format_vec3(declared * scale))
            }
            None if scale != 1.0 => Some(numeric::format_vec3(DVec3::splat(scale))),
            None => None,
        };
        if let Some(part_scale) = part_scale {
            config.set_attr("partScale", part_scale);
        }
        part.children.push(config);

        let drag = part
            .drag
            .take()
            .unwrap_or_else(|| DEFAULT_DRAG.to_string());
        let area: Vec<f64> = numeric::parse_list(&drag)
            .map_err(|source| invalid_number(&part.id, "drag", source))?
            .iter()
            .map(|value| value * DRAG_AREA_FACTOR)
            .collect();
        part.children.push(
            Element::new(DRAG)
                .with_attr("drag", drag)
                .with_attr("area", numeric::format_list(&area)),
        );
        Ok(())
    }
}

fn invalid_number(part_id: &str, attribute: &str, source: NumericError) -> ConvertError {
    ConvertError::InvalidNumber {
        part_id: part_id.to_string(),
        attribute: attribute.to_string(),
        source,
    }
}

/// 解析零件上的三维向量属性。
fn part_vec3(part_id: &str, attribute: &str, raw: &str) -> Result<DVec3, ConvertError> {
    numeric::parse_vec3(raw).map_err(|source| invalid_number(part_id, attribute, source))
}

/// 零件子块的编辑视图，出错时附带零件 id 与属性名。
pub(crate) struct BlockEditor<'a> {
    part_id: &'a str,
    element: &'a mut Element,
}

impl<'a> BlockEditor<'a> {
    pub(crate) fn wrap(part_id: &'a str, element: &'a mut Element) -> Self {
        Self { part_id, element }
    }

    /// 打开必需的子块，缺失时视为结构错误。
    pub(crate) fn open(part: &'a mut Part, block: &'static str) -> Result<Self, ConvertError> {
        let Part { id, children, .. } = part;
        let part_id = id.as_str();
        children
            .iter_mut()
            .find(|child| child.name == block)
            .map(|element| Self { part_id, element })
            .ok_or_else(|| ConvertError::MissingBlock {
                part_id: part_id.to_string(),
                block,
            })
    }

    pub(crate) fn open_optional(part: &'a mut Part, block: &str) -> Option<Self> {
        let Part { id, children, .. } = part;
        let part_id = id.as_str();
        children
            .iter_mut()
            .find(|child| child.name == block)
            .map(|element| Self { part_id, element })
    }

    #[inline]
    pub(crate) fn rename(&mut self, name: &str) {
        self.element.name = name.to_string();
    }

    #[inline]
    pub(crate) fn get(&self, attribute: &str) -> Option<&str> {
        self.element.attr(attribute)
    }

    #[inline]
    pub(crate) fn set(&mut self, attribute: &str, value: impl Into<String>) {
        self.element.set_attr(attribute, value);
    }

    #[inline]
    pub(crate) fn remove(&mut self, attribute: &str) -> Option<String> {
        self.element.remove_attr(attribute)
    }

    /// 布尔属性，仅字面量 `true` 视为真。
    #[inline]
    pub(crate) fn flag(&self, attribute: &str) -> bool {
        self.get(attribute) == Some("true")
    }

    pub(crate) fn take_children(&mut self, name: &str) -> Vec<Element> {
        self.element.take_children(name)
    }

    fn require(&self, attribute: &'static str) -> Result<&str, ConvertError> {
        self.get(attribute)
            .ok_or_else(|| ConvertError::MissingAttribute {
                part_id: self.part_id.to_string(),
                block: self.element.name.clone(),
                attribute,
            })
    }

    fn numeric_error(&self, attribute: &str, source: NumericError) -> ConvertError {
        let qualified = format!("{}.{}", self.element.name, attribute);
        invalid_number(self.part_id, &qualified, source)
    }

    pub(crate) fn list(&self, attribute: &'static str) -> Result<Vec<f64>, ConvertError> {
        numeric::parse_list(self.require(attribute)?)
            .map_err(|source| self.numeric_error(attribute, source))
    }

    pub(crate) fn fixed<const N: usize>(
        &self,
        attribute: &'static str,
    ) -> Result<[f64; N], ConvertError> {
        numeric::parse_fixed::<N>(self.require(attribute)?)
            .map_err(|source| self.numeric_error(attribute, source))
    }

    pub(crate) fn set_list(&mut self, attribute: &str, values: &[f64]) {
        self.element
            .set_attr(attribute, numeric::format_list(values));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn part(id: &str, part_type: &str) -> Part {
        let mut part = Part::new(id, part_type);
        part.materials = vec!["3".to_string(), "1".to_string(), "2".to_string()];
        part.drag = Some("1,0.5,0,0,2,0.25".to_string());
        part
    }

    /// 解析转换后的姿态，便于按数值比较。
    pub(crate) fn rotation_of(part: &Part) -> DVec3 {
        numeric::parse_vec3(&part.rotation).expect("rotation is a vector")
    }

    #[test]
    fn common_phase_sets_materials_config_and_drag() {
        let mut part = part("4", "Block-2");
        part.position = "1,-2,0.5".to_string();
        part.attributes.set("disableAircraftCollisions", "true");
        BLOCK.convert(&mut part, 1.0).expect("convert block");

        assert_eq!(part.part_type, "Block1");
        assert_eq!(part.command_pod_id.as_deref(), Some(ROOT_PART_ID));
        assert_eq!(part.materials, ["3"; MATERIAL_SLOTS]);
        assert_eq!(part.position, "1,-2,0.5");
        assert!(part.attributes.is_empty());
        assert!(part.drag.is_none());

        let config = part.block(CONFIG).expect("config block");
        assert!(config.attributes.is_empty());
        let drag = part.block(DRAG).expect("drag block");
        assert_eq!(drag.attr("drag"), Some("1,0.5,0,0,2,0.25"));
        assert_eq!(drag.attr("area"), Some("1.5,0.75,0,0,3,0.375"));
    }

    #[test]
    fn identity_scale_keeps_source_literals() {
        let mut part = part("2", "Block-2");
        part.position = "-9.237056E-14,12.81931,8.344654E-07".to_string();
        part.rotation = "-4.829673E-06,270,180".to_string();
        part.drag = Some("0.123456789,0,0,0,0,1E-09".to_string());
        part.scale = Some("1,0.333333333333,1".to_string());
        BLOCK.convert(&mut part, 1.0).expect("convert block");

        assert_eq!(part.position, "-9.237056E-14,12.81931,8.344654E-07");
        assert_eq!(part.rotation, "-4.829673E-06,270,180");
        let drag = part.block(DRAG).expect("drag block");
        assert_eq!(drag.attr("drag"), Some("0.123456789,0,0,0,0,1E-09"));
        let config = part.block(CONFIG).expect("config block");
        assert_eq!(config.attr("partScale"), Some("1,0.333333333333,1"));
    }

    #[test]
    fn scale_is_applied_to_position_and_part_scale() {
        let mut part = part("4", "Block-2");
        part.position = "1,-2,0.5".to_string();
        part.scale = Some("1,2,0.5".to_string());
        BLOCK.convert(&mut part, 2.0).expect("convert block");

        assert_eq!(part.position, "2,-4,1");
        assert!(part.scale.is_none());
        let config = part.block(CONFIG).expect("config block");
        assert_eq!(config.attr("partScale"), Some("2,4,1"));
    }

    #[test]
    fn malformed_position_is_reported_only_when_scaled() {
        let mut part = part("6", "Block-2");
        part.position = "1,2".to_string();
        let mut unscaled = part.clone();
        BLOCK.convert(&mut unscaled, 1.0).expect("position passes through");
        assert_eq!(unscaled.position, "1,2");

        let err = BLOCK.convert(&mut part, 2.0).unwrap_err();
        match err {
            ConvertError::InvalidNumber {
                part_id, attribute, ..
            } => {
                assert_eq!(part_id, "6");
                assert_eq!(attribute, "position");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_drag_names_the_part() {
        let mut part = part("8", "Block-2");
        part.drag = Some("1,x,0,0,0,0".to_string());
        let err = BLOCK.convert(&mut part, 1.0).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::InvalidNumber { ref part_id, ref attribute, .. }
                if part_id == "8" && attribute == "drag"
        ));
    }

    #[test]
    fn missing_drag_and_materials_fall_back_to_defaults() {
        let mut part = Part::new("9", "Block-2");
        BLOCK.convert(&mut part, 1.0).expect("convert block");
        assert_eq!(part.materials, ["0"; MATERIAL_SLOTS]);
        let drag = part.block(DRAG).expect("drag block");
        assert_eq!(drag.attr("drag"), Some(DEFAULT_DRAG));
        assert_eq!(drag.attr("area"), Some(DEFAULT_DRAG));
    }
}
