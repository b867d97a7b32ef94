//! 由输入控制器驱动的执行机构：活塞与两类转子。

use craftport_core::craft::Part;
use craftport_core::rotation::RowMatrix;

use super::{BlockEditor, CONFIG, ConverterKind, PartConverter};
use crate::errors::ConvertError;

const INPUT_CONTROLLER_STATE: &str = "InputController.State";
const INPUT_CONTROLLER: &str = "InputController";
const PISTON_STATE: &str = "Piston.State";
const PISTON_BLOCK: &str = "Piston";

const ACTUATOR_ATTRIBUTES: &[&str] = &[
    "id",
    "partType",
    "position",
    "rotation",
    "commandPodId",
    "materials",
    "activationGroup",
];

/// 源格式输入通道名到目标格式的映射，表外名称原样保留。
const INPUT_CHANNELS: [(&str, &str); 7] = [
    ("VTOL", "Slider1"),
    ("Trim", "Slider2"),
    ("Brake", "Brake"),
    ("Throttle", "Throttle"),
    ("Pitch", "Pitch"),
    ("Roll", "Roll"),
    ("Yaw", "Yaw"),
];

const SMALL_ROTATOR_PREROTATION: RowMatrix = [[1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, -1.0, 0.0]];
const HINGE_ROTATOR_PREROTATION: RowMatrix = [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];

pub static PISTON: PartConverter = PartConverter::new(
    ConverterKind::Piston,
    "Piston1",
    None,
    ACTUATOR_ATTRIBUTES,
);

pub static SMALL_ROTATOR: PartConverter = PartConverter::new(
    ConverterKind::SmallRotator,
    "SmallRotator1",
    Some(SMALL_ROTATOR_PREROTATION),
    ACTUATOR_ATTRIBUTES,
);

pub static HINGE_ROTATOR: PartConverter = PartConverter::new(
    ConverterKind::HingeRotator,
    "HingeRotator1",
    Some(HINGE_ROTATOR_PREROTATION),
    ACTUATOR_ATTRIBUTES,
);

pub(super) fn convert_piston(part: &mut Part) -> Result<(), ConvertError> {
    remap_input_controller(part, "Piston")?;
    if let Some(mut piston) = BlockEditor::open_optional(part, PISTON_STATE) {
        piston.rename(PISTON_BLOCK);
    }
    Ok(())
}

pub(super) fn convert_small_rotator(part: &mut Part) -> Result<(), ConvertError> {
    remap_input_controller(part, "SmallRotator")?;
    permute_part_scale(part, [0, 2, 1])
}

pub(super) fn convert_hinge_rotator(part: &mut Part) -> Result<(), ConvertError> {
    remap_input_controller(part, "HingeRotator")?;
    permute_part_scale(part, [1, 0, 2])
}

/// 映射输入通道名；表外名称原样返回。
pub fn translate_input(name: &str) -> &str {
    INPUT_CHANNELS
        .iter()
        .find(|(source, _)| *source == name)
        .map_or(name, |&(_, target)| target)
}

fn remap_input_controller(part: &mut Part, input_id: &str) -> Result<(), ConvertError> {
    let mut controller = BlockEditor::open(part, INPUT_CONTROLLER_STATE)?;
    controller.rename(INPUT_CONTROLLER);
    if let Some(input) = controller.remove("input") {
        let translated = translate_input(&input).to_string();
        controller.set("input", translated);
    }
    controller.set("inputId", input_id);
    let group = controller.remove("activationGroup");
    part.activation_group = group;
    Ok(())
}

/// 转子本地轴与目标格式不同，`partScale` 的分量需要按轴重排。
fn permute_part_scale(part: &mut Part, order: [usize; 3]) -> Result<(), ConvertError> {
    let Some(mut config) = BlockEditor::open_optional(part, CONFIG) else {
        return Ok(());
    };
    if config.get("partScale").is_none() {
        return Ok(());
    }
    let scale = config.fixed::<3>("partScale")?;
    config.set_list("partScale", &order.map(|axis| scale[axis]));
    Ok(())
}
