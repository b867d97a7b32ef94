//! 机身类零件：普通机身、机头锥与进气道共用同一套截面换算。

use craftport_core::craft::Part;
use craftport_core::rotation::RowMatrix;

use super::{BlockEditor, ConverterKind, PartConverter};
use crate::errors::ConvertError;

const FUEL_TANK_STATE: &str = "FuelTank.State";
const FUEL_TANK: &str = "FuelTank";
const FUSELAGE_STATE: &str = "Fuselage.State";
const FUSELAGE_BLOCK: &str = "Fuselage";
const DEFAULT_TEXTURE: &str = "Default";

/// 截面缩放与偏移的换算除数。
const SECTION_DIVISOR: f64 = 4.0;
/// 角类型编码 0..=3（硬角/平滑/弯曲/圆形）对应的圆角半径，弯曲与圆形都映射为 1.0。
const CORNER_RADII: [f64; 4] = [0.0, 0.4, 1.0, 1.0];

const SOURCE_ONLY_ATTRIBUTES: &[&str] = &[
    "version",
    "rearScale",
    "frontScale",
    "buoyancy",
    "deadWeight",
    "fuelPercentage",
    "cornerTypes",
    "scale",
    "autoSizeOnConnected",
];
const INLET_ONLY_ATTRIBUTES: &[&str] = &[
    "inletSlant",
    "inletTrimSize",
    "inletThicknessFront",
    "inletThicknessRear",
];

const FUSELAGE_ATTRIBUTES: &[&str] = &[
    "id",
    "partType",
    "position",
    "rotation",
    "commandPodId",
    "materials",
    "texture",
];

const FUSELAGE_PREROTATION: RowMatrix = [[1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]];
const NOSE_CONE_PREROTATION: RowMatrix = [[-1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, -1.0, 0.0]];

pub static FUSELAGE: PartConverter = PartConverter::new(
    ConverterKind::Fuselage,
    "Fuselage1",
    Some(FUSELAGE_PREROTATION),
    FUSELAGE_ATTRIBUTES,
);

pub static NOSE_CONE: PartConverter = PartConverter::new(
    ConverterKind::NoseCone,
    "NoseCone1",
    Some(NOSE_CONE_PREROTATION),
    FUSELAGE_ATTRIBUTES,
);

pub static INLET: PartConverter = PartConverter::new(
    ConverterKind::Inlet,
    "Inlet1",
    Some(FUSELAGE_PREROTATION),
    FUSELAGE_ATTRIBUTES,
);

/// 换算后的机身截面参数。
#[derive(Debug, Clone, PartialEq)]
struct SectionShape {
    top_scale: [f64; 2],
    bottom_scale: [f64; 2],
    corner_radii: [f64; 8],
    offset: [f64; 3],
}

pub(super) fn convert_fuselage(part: &mut Part, scale: f64) -> Result<(), ConvertError> {
    convert_section(part, scale, |_| {}, &[])
}

pub(super) fn convert_nose_cone(part: &mut Part, scale: f64) -> Result<(), ConvertError> {
    convert_section(part, scale, reshape_nose_cone, &[])
}

pub(super) fn convert_inlet(part: &mut Part, scale: f64) -> Result<(), ConvertError> {
    convert_section(part, scale, |_| {}, INLET_ONLY_ATTRIBUTES)
}

fn convert_section(
    part: &mut Part,
    scale: f64,
    reshape: fn(&mut SectionShape),
    dropped: &[&str],
) -> Result<(), ConvertError> {
    part.texture = Some(DEFAULT_TEXTURE.to_string());

    if let Some(mut tank) = BlockEditor::open_optional(part, FUEL_TANK_STATE) {
        tank.rename(FUEL_TANK);
        tank.remove("fuel");
    }

    let mut body = BlockEditor::open(part, FUSELAGE_STATE)?;
    body.rename(FUSELAGE_BLOCK);

    let mut shape = read_shape(&body, scale)?;
    reshape(&mut shape);

    body.set_list("topScale", &shape.top_scale);
    body.set_list("bottomScale", &shape.bottom_scale);
    body.set_list("cornerRadiuses", &shape.corner_radii);
    body.set_list("offset", &shape.offset);

    for attribute in SOURCE_ONLY_ATTRIBUTES.iter().chain(dropped) {
        body.remove(attribute);
    }
    Ok(())
}

fn read_shape(body: &BlockEditor<'_>, scale: f64) -> Result<SectionShape, ConvertError> {
    let shrink = |value: f64| value * scale / SECTION_DIVISOR;

    let top_scale = body.fixed::<2>("frontScale")?.map(shrink);
    let bottom_scale = body.fixed::<2>("rearScale")?.map(shrink);

    let codes = body.fixed::<8>("cornerTypes")?;
    let mut corner_radii = [0.0; 8];
    for (radius, code) in corner_radii.iter_mut().zip(codes) {
        *radius = corner_radius(code).ok_or_else(|| ConvertError::InvalidCornerCode {
            part_id: body.part_id.to_string(),
            code,
        })?;
    }
    // 两种格式的角编号方向相反。
    corner_radii.swap(0, 2);
    corner_radii.swap(4, 6);

    let mut offset = body.fixed::<3>("offset")?.map(shrink);
    offset.swap(1, 2);
    offset[0] = -offset[0];

    Ok(SectionShape {
        top_scale,
        bottom_scale,
        corner_radii,
        offset,
    })
}

fn corner_radius(code: f64) -> Option<f64> {
    let index = code.trunc();
    if !(0.0..CORNER_RADII.len() as f64).contains(&index) {
        return None;
    }
    Some(CORNER_RADII[index as usize])
}

/// 机头锥只有一个开口端：前端截面移到后端，角编号再按机头锥的朝向重排。
fn reshape_nose_cone(shape: &mut SectionShape) {
    shape.bottom_scale = shape.top_scale;
    shape.top_scale = [0.0, 0.0];

    let radii = &mut shape.corner_radii;
    radii.swap(0, 1);
    radii.swap(2, 3);
    radii.rotate_left(4);

    shape.offset[2] = -shape.offset[2];
}

#[cfg(test)]
mod tests {
    use craftport_core::tree::Element;
    use glam::DVec3;

    use super::*;
    use crate::converters::tests::{part, rotation_of};

    fn section_part(part_type: &str, corner_types: &str) -> Part {
        let mut part = part("5", part_type);
        part.children.push(
            Element::new(FUEL_TANK_STATE)
                .with_attr("fuel", "0")
                .with_attr("capacity", "0"),
        );
        part.children.push(
            Element::new(FUSELAGE_STATE)
                .with_attr("version", "2")
                .with_attr("frontScale", "1,0.25")
                .with_attr("rearScale", "1,0.25")
                .with_attr("offset", "0,0,3")
                .with_attr("deadWeight", "0")
                .with_attr("buoyancy", "0")
                .with_attr("fuelPercentage", "0")
                .with_attr("cornerTypes", corner_types)
                .with_attr("inletSlant", "0.5"),
        );
        part
    }

    #[test]
    fn fuselage_quarters_sections_and_swaps_offset_axes() {
        let mut part = section_part("Fuselage-Body-1", "0,0,0,0,0,0,0,0");
        FUSELAGE.convert(&mut part, 1.0).expect("convert fuselage");

        assert_eq!(part.part_type, "Fuselage1");
        assert_eq!(part.texture.as_deref(), Some("Default"));
        assert!(part.block(FUSELAGE_STATE).is_none());

        let body = part.block(FUSELAGE_BLOCK).expect("fuselage block");
        assert_eq!(body.attr("topScale"), Some("0.25,0.0625"));
        assert_eq!(body.attr("bottomScale"), Some("0.25,0.0625"));
        assert_eq!(body.attr("cornerRadiuses"), Some("0,0,0,0,0,0,0,0"));
        assert_eq!(body.attr("offset"), Some("-0,0.75,0"));
        for attribute in SOURCE_ONLY_ATTRIBUTES {
            assert!(body.attr(attribute).is_none(), "{attribute} should be dropped");
        }
        assert_eq!(body.attr("inletSlant"), Some("0.5"));

        let tank = part.block(FUEL_TANK).expect("fuel tank block");
        assert!(tank.attr("fuel").is_none());
        assert_eq!(tank.attr("capacity"), Some("0"));
    }

    #[test]
    fn fuselage_rotation_takes_frame_correction() {
        let mut part = section_part("Fuselage-Body-1", "0,0,0,0,0,0,0,0");
        FUSELAGE.convert(&mut part, 1.0).expect("convert fuselage");
        assert!((rotation_of(&part) - DVec3::new(90.0, 0.0, 0.0)).abs().max_element() < 1e-9);
    }

    #[test]
    fn corner_codes_map_many_to_one() {
        assert_eq!(corner_radius(0.0), Some(0.0));
        assert_eq!(corner_radius(1.0), Some(0.4));
        assert_eq!(corner_radius(2.0), Some(1.0));
        assert_eq!(corner_radius(3.0), Some(1.0));
        assert_eq!(corner_radius(4.0), None);
        assert_eq!(corner_radius(-1.0), None);
        assert_eq!(corner_radius(f64::NAN), None);

        let mut part = section_part("Fuselage-Body-1", "1,2,3,0,3,2,1,0");
        FUSELAGE.convert(&mut part, 1.0).expect("convert fuselage");
        let body = part.block(FUSELAGE_BLOCK).expect("fuselage block");
        // 映射后 [0.4,1,1,0,1,1,0.4,0]，再交换 0↔2、4↔6。
        assert_eq!(body.attr("cornerRadiuses"), Some("1,1,0.4,0,0.4,1,1,0"));
    }

    #[test]
    fn invalid_corner_code_fails_with_part_context() {
        let mut part = section_part("Fuselage-Body-1", "0,0,0,7,0,0,0,0");
        let err = FUSELAGE.convert(&mut part, 1.0).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::InvalidCornerCode { ref part_id, code } if part_id == "5" && code == 7.0
        ));
    }

    #[test]
    fn missing_fuselage_block_is_structural_error() {
        let mut part = part("8", "Fuselage-Body-1");
        let err = FUSELAGE.convert(&mut part, 1.0).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::MissingBlock { ref part_id, block: FUSELAGE_STATE } if part_id == "8"
        ));
    }

    #[test]
    fn scale_multiplies_sections_before_quartering() {
        let mut part = section_part("Fuselage-Body-1", "0,0,0,0,0,0,0,0");
        FUSELAGE.convert(&mut part, 2.0).expect("convert fuselage");
        let body = part.block(FUSELAGE_BLOCK).expect("fuselage block");
        assert_eq!(body.attr("topScale"), Some("0.5,0.125"));
        assert_eq!(body.attr("offset"), Some("-0,1.5,0"));
    }

    #[test]
    fn nose_cone_moves_front_section_to_the_rear() {
        let mut part = section_part("Fuselage-Cone-1", "1,2,3,0,3,2,1,0");
        NOSE_CONE.convert(&mut part, 1.0).expect("convert nose cone");

        assert_eq!(part.part_type, "NoseCone1");
        let body = part.block(FUSELAGE_BLOCK).expect("fuselage block");
        assert_eq!(body.attr("topScale"), Some("0,0"));
        assert_eq!(body.attr("bottomScale"), Some("0.25,0.0625"));
        // [1,1,0.4,0,0.4,1,1,0] -> 交换 0↔1、2↔3 -> [1,1,0,0.4,0.4,1,1,0] -> 前后半段互换
        assert_eq!(body.attr("cornerRadiuses"), Some("0.4,1,1,0,1,1,0,0.4"));
        assert_eq!(body.attr("offset"), Some("-0,0.75,-0"));
    }

    #[test]
    fn inlet_drops_inlet_only_attributes() {
        let mut part = section_part("Fuselage-Inlet-1", "0,0,0,0,0,0,0,0");
        part.block_mut(FUSELAGE_STATE)
            .expect("fuselage state")
            .set_attr("inletThicknessRear", "0.1");
        INLET.convert(&mut part, 1.0).expect("convert inlet");

        assert_eq!(part.part_type, "Inlet1");
        let body = part.block(FUSELAGE_BLOCK).expect("fuselage block");
        for attribute in INLET_ONLY_ATTRIBUTES {
            assert!(body.attr(attribute).is_none(), "{attribute} should be dropped");
        }
        assert_eq!(body.attr("topScale"), Some("0.25,0.0625"));
    }
}
