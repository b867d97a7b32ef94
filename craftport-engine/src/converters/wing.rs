use craftport_core::craft::Part;

use super::{BASE_ATTRIBUTES, BlockEditor, ConverterKind, PartConverter};
use crate::errors::ConvertError;

const FUEL_TANK_STATE: &str = "FuelTank.State";
const WING_STATE: &str = "Wing.State";
const WING_BLOCK: &str = "Wing";
const CONTROL_SURFACE: &str = "ControlSurface";

/// 平面形状属性，随倍率整体缩放。
const PLANFORM_ATTRIBUTES: [&str; 5] = [
    "rootLeadingOffset",
    "rootTrailingOffset",
    "tipLeadingOffset",
    "tipPosition",
    "tipTrailingOffset",
];

pub static WING: PartConverter =
    PartConverter::new(ConverterKind::Wing, "Wing1", None, BASE_ATTRIBUTES);

pub(super) fn convert_wing(part: &mut Part, scale: f64) -> Result<(), ConvertError> {
    let part_id = part.id.clone();
    // 目标格式的机翼不携带燃料。
    part.take_block(FUEL_TANK_STATE);

    let mut wing = BlockEditor::open(part, WING_STATE)?;
    wing.rename(WING_BLOCK);
    let inverted = wing.flag("inverted");

    if scale != 1.0 {
        for attribute in PLANFORM_ATTRIBUTES {
            let scaled: Vec<f64> = wing.list(attribute)?.iter().map(|v| v * scale).collect();
            wing.set_list(attribute, &scaled);
        }
    }

    let mut surfaces = wing.take_children(CONTROL_SURFACE);
    for surface in &mut surfaces {
        let mut surface = BlockEditor::wrap(&part_id, surface);
        if let Some(input) = surface.remove("inputId") {
            surface.set("input", input);
        }
        if inverted {
            let flipped = !surface.flag("invert");
            surface.set("invert", flipped.to_string());
        }
        if scale != 1.0 {
            for attribute in ["start", "end"] {
                let cells: Vec<f64> = surface
                    .list(attribute)?
                    .iter()
                    .map(|v| (v * scale).trunc())
                    .collect();
                surface.set_list(attribute, &cells);
            }
        }
    }
    // 控制面在目标格式中挂在零件下，而不是机翼块下。
    part.children.extend(surfaces);
    Ok(())
}
