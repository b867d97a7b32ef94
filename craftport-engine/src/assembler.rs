//! 文档级改写：根节点属性、固定的根控制零件与主题迁移。

use std::rc::Rc;

use craftport_core::craft::{Craft, DesignerSettings, Part, SYMMETRY};
use craftport_core::numeric;
use craftport_core::tree::Element;
use tracing::debug;
use uuid::Uuid;

use crate::converters::{CONFIG, DRAG, ROOT_PART_ID};
use crate::errors::ConvertError;

pub const CRAFT_TAG: &str = "Craft";
pub const XML_VERSION: &str = "5";
pub const PLACEHOLDER_PRICE: &str = "314159";
pub const COMMAND_POD_TYPE: &str = "CommandPod1";

const DROPPED_CRAFT_ATTRIBUTES: [&str; 2] = ["url", "theme"];

const POD_ROTATION: &str = "90,0,0";
const POD_DRAG: &str = "1.206616,1.204895,1.115982,0.02278123,1.084838,1.085515";
const POD_AREA: &str = "1.619598,1.619598,2.027669,0.03990095,1.489188,1.489188";
const POD_ACTIVATION_GROUP_NAMES: &str = ",,,,,,,Landing Gear,Solar Panels,RCS";
const POD_ACTIVATION_GROUP_STATES: &str =
    "false,false,false,false,false,false,false,true,false,true";

/// 改写根节点：标签、版本与价格占位、初始包围盒，并挂上空的对称设置块。
pub fn normalize_craft(craft: &mut Craft) -> Result<(), ConvertError> {
    craft.tag = CRAFT_TAG.to_string();
    for attribute in DROPPED_CRAFT_ATTRIBUTES {
        craft.attributes.remove(attribute);
    }
    craft.attributes.set("xmlVersion", XML_VERSION);
    craft.attributes.set("parent", "");
    craft.attributes.set("price", PLACEHOLDER_PRICE);

    let raw_min = take_required(craft, "boundsMin")?;
    let raw_size = take_required(craft, "size")?;
    let bounds_min = parse_craft_list("boundsMin", &raw_min)?;
    let size = parse_craft_list("size", &raw_size)?;
    let bounds_max: Vec<f64> = bounds_min.iter().zip(&size).map(|(a, b)| a + b).collect();

    craft.attributes.set("initialBoundsMin", raw_min);
    craft
        .attributes
        .set("initialBoundsMax", numeric::format_list(&bounds_max));
    craft.symmetry = Some(Element::new(SYMMETRY));
    Ok(())
}

fn take_required(craft: &mut Craft, attribute: &'static str) -> Result<String, ConvertError> {
    craft
        .attributes
        .remove(attribute)
        .ok_or(ConvertError::MissingCraftAttribute(attribute))
}

fn parse_craft_list(attribute: &'static str, raw: &str) -> Result<Vec<f64>, ConvertError> {
    numeric::parse_list(raw).map_err(|source| ConvertError::InvalidCraftNumber { attribute, source })
}

/// 目标格式要求的唯一根控制零件。每次调用返回新的实例。
pub fn command_pod() -> Part {
    let mut pod = Part::new(ROOT_PART_ID, COMMAND_POD_TYPE);
    pod.rotation = POD_ROTATION.to_string();
    pod.command_pod_id = Some(ROOT_PART_ID.to_string());
    pod.materials = vec!["0".to_string(); crate::converters::MATERIAL_SLOTS];
    pod.attributes.set("rootPart", "true");

    let command_pod = Element::new("CommandPod")
        .with_attr("activationGroupNames", POD_ACTIVATION_GROUP_NAMES)
        .with_attr("activationGroupStates", POD_ACTIVATION_GROUP_STATES)
        .with_attr("craftConfigType", "Plane")
        .with_attr("pidPitch", "10,0,0")
        .with_attr("pidRoll", "0.6,0,0")
        .with_attr("pilotSeatRotation", "270,0,0")
        .with_child(Element::new("Controls"));

    pod.children = vec![
        Element::new(DRAG)
            .with_attr("drag", POD_DRAG)
            .with_attr("area", POD_AREA),
        Element::new(CONFIG),
        command_pod,
        Element::new("Gyroscope"),
        Element::new("FuelTank"),
        Element::new("CrewCompartment"),
    ];
    pod
}

/// 把根节点下的主题迁移到设计器设置与主题列表中，两处共享同一份数据。
///
/// 源文档没有主题时不做任何事并返回 `false`。
pub fn relocate_theme(craft: &mut Craft) -> bool {
    let Some(mut theme) = craft.theme.take() else {
        debug!("文档没有主题，跳过主题迁移");
        return false;
    };

    theme.id = Some(Uuid::new_v4().to_string());
    for color in &mut theme.colors {
        color.remove_attr("r");
    }

    let theme = Rc::new(theme);
    craft.designer_settings = Some(DesignerSettings {
        theme_name: theme.name.clone(),
        theme: Rc::clone(&theme),
    });
    craft.themes = Some(vec![theme]);
    true
}
