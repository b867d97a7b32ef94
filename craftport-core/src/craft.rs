//! 强类型的载具文档模型。
//!
//! 转换器读写的每一个属性都有显式字段；其余属性与子块原样保存在 `attributes` / `children`
//! 中，写回时保持原有内容。

use std::rc::Rc;

use thiserror::Error;

use crate::tree::{Attributes, Element};

pub const ASSEMBLY: &str = "Assembly";
pub const PARTS: &str = "Parts";
pub const PART: &str = "Part";
pub const CONNECTIONS: &str = "Connections";
pub const CONNECTION: &str = "Connection";
pub const BODIES: &str = "Bodies";
pub const BODY: &str = "Body";
pub const THEME: &str = "Theme";
pub const DESIGNER_SETTINGS: &str = "DesignerSettings";
pub const THEMES: &str = "Themes";
pub const SYMMETRY: &str = "Symmetry";

/// 缺省的位置与姿态。
pub const ZERO_VECTOR: &str = "0,0,0";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("<{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
    #[error("document has no <{0}> element")]
    MissingElement(&'static str),
}

/// 文档根节点。
#[derive(Debug, Clone)]
pub struct Craft {
    pub tag: String,
    pub attributes: Attributes,
    pub assembly: Assembly,
    /// 源格式中直接挂在根节点下的主题。
    pub theme: Option<Theme>,
    /// 目标格式的设计器设置，引用与 `themes` 相同的主题实例。
    pub designer_settings: Option<DesignerSettings>,
    pub themes: Option<Vec<Rc<Theme>>>,
    pub symmetry: Option<Element>,
    pub extras: Vec<Element>,
}

impl Craft {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Attributes::new(),
            assembly: Assembly::default(),
            theme: None,
            designer_settings: None,
            themes: None,
            symmetry: None,
            extras: Vec::new(),
        }
    }

    /// 从通用树提升为强类型文档。`Assembly` 必须存在。
    pub fn from_element(root: Element) -> Result<Self, ModelError> {
        let Element {
            name,
            attributes,
            children,
        } = root;
        let mut craft = Craft::new(name);
        craft.attributes = attributes;

        let mut assembly = None;
        for child in children {
            match child.name.as_str() {
                ASSEMBLY if assembly.is_none() => assembly = Some(Assembly::from_element(child)?),
                THEME if craft.theme.is_none() => craft.theme = Some(Theme::from_element(child)),
                SYMMETRY if craft.symmetry.is_none() => craft.symmetry = Some(child),
                _ => craft.extras.push(child),
            }
        }
        craft.assembly = assembly.ok_or(ModelError::MissingElement(ASSEMBLY))?;
        Ok(craft)
    }

    pub fn to_element(&self) -> Element {
        let mut root = Element::new(self.tag.clone());
        root.attributes = self.attributes.clone();
        root.children.push(self.assembly.to_element());
        root.children.extend(self.extras.iter().cloned());
        if let Some(symmetry) = &self.symmetry {
            root.children.push(symmetry.clone());
        }
        if let Some(theme) = &self.theme {
            root.children.push(theme.to_element());
        }
        if let Some(settings) = &self.designer_settings {
            root.children.push(settings.to_element());
        }
        if let Some(themes) = &self.themes {
            let mut list = Element::new(THEMES);
            list.children
                .extend(themes.iter().map(|theme| theme.to_element()));
            root.children.push(list);
        }
        root
    }
}

/// 零件、连接与刚体组三个有序集合。
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub attributes: Attributes,
    pub parts: Vec<Part>,
    pub connections: Vec<Connection>,
    pub bodies: Vec<Body>,
    pub extras: Vec<Element>,
}

impl Assembly {
    pub fn from_element(element: Element) -> Result<Self, ModelError> {
        let mut assembly = Assembly {
            attributes: element.attributes,
            ..Assembly::default()
        };
        for child in element.children {
            match child.name.as_str() {
                PARTS => {
                    for part in child.children {
                        assembly.parts.push(Part::from_element(part)?);
                    }
                }
                CONNECTIONS => {
                    for connection in child.children {
                        assembly
                            .connections
                            .push(Connection::from_element(connection)?);
                    }
                }
                BODIES => {
                    for body in child.children {
                        assembly.bodies.push(Body::from_element(body)?);
                    }
                }
                _ => assembly.extras.push(child),
            }
        }
        Ok(assembly)
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::new(ASSEMBLY);
        element.attributes = self.attributes.clone();

        let mut parts = Element::new(PARTS);
        parts.children.extend(self.parts.iter().map(Part::to_element));
        let mut connections = Element::new(CONNECTIONS);
        connections
            .children
            .extend(self.connections.iter().map(Connection::to_element));
        let mut bodies = Element::new(BODIES);
        bodies.children.extend(self.bodies.iter().map(Body::to_element));

        element.children.push(parts);
        element.children.push(connections);
        element.children.push(bodies);
        element.children.extend(self.extras.iter().cloned());
        element
    }
}

/// 单个零件。
///
/// 数值属性保存源文本，只有真正改写它们的转换器才解析；未被改写的数值写回时逐字不变。
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub id: String,
    pub part_type: String,
    pub position: String,
    /// 欧拉角（度）。
    pub rotation: String,
    pub materials: Vec<String>,
    pub drag: Option<String>,
    /// 源文件自带的非均匀缩放。
    pub scale: Option<String>,
    pub command_pod_id: Option<String>,
    pub texture: Option<String>,
    pub activation_group: Option<String>,
    pub attributes: Attributes,
    pub children: Vec<Element>,
}

impl Part {
    pub fn new(id: impl Into<String>, part_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            part_type: part_type.into(),
            position: ZERO_VECTOR.to_string(),
            rotation: ZERO_VECTOR.to_string(),
            materials: Vec::new(),
            drag: None,
            scale: None,
            command_pod_id: None,
            texture: None,
            activation_group: None,
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn from_element(element: Element) -> Result<Self, ModelError> {
        let Element {
            mut attributes,
            children,
            ..
        } = element;

        let id = attributes
            .remove("id")
            .ok_or_else(|| ModelError::MissingAttribute {
                element: PART.to_string(),
                attribute: "id",
            })?;
        let part_type =
            attributes
                .remove("partType")
                .ok_or_else(|| ModelError::MissingAttribute {
                    element: format!("{PART} id={id}"),
                    attribute: "partType",
                })?;

        let position = attributes
            .remove("position")
            .unwrap_or_else(|| ZERO_VECTOR.to_string());
        let rotation = attributes
            .remove("rotation")
            .unwrap_or_else(|| ZERO_VECTOR.to_string());
        let materials = attributes
            .remove("materials")
            .map(|raw| raw.split(',').map(str::to_string).collect())
            .unwrap_or_default();

        Ok(Self {
            id,
            part_type,
            position,
            rotation,
            materials,
            drag: attributes.remove("drag"),
            scale: attributes.remove("scale"),
            command_pod_id: attributes.remove("commandPodId"),
            texture: attributes.remove("texture"),
            activation_group: attributes.remove("activationGroup"),
            attributes,
            children,
        })
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::new(PART)
            .with_attr("id", self.id.clone())
            .with_attr("partType", self.part_type.clone())
            .with_attr("position", self.position.clone())
            .with_attr("rotation", self.rotation.clone());
        if let Some(pod) = &self.command_pod_id {
            element.set_attr("commandPodId", pod.clone());
        }
        if !self.materials.is_empty() {
            element.set_attr("materials", self.materials.join(","));
        }
        if let Some(texture) = &self.texture {
            element.set_attr("texture", texture.clone());
        }
        if let Some(group) = &self.activation_group {
            element.set_attr("activationGroup", group.clone());
        }
        if let Some(drag) = &self.drag {
            element.set_attr("drag", drag.clone());
        }
        if let Some(scale) = &self.scale {
            element.set_attr("scale", scale.clone());
        }
        for (key, value) in self.attributes.iter() {
            element.set_attr(key, value);
        }
        element.children = self.children.clone();
        element
    }

    #[inline]
    pub fn block(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    #[inline]
    pub fn block_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|child| child.name == name)
    }

    pub fn take_block(&mut self, name: &str) -> Option<Element> {
        let index = self.children.iter().position(|child| child.name == name)?;
        Some(self.children.remove(index))
    }

    /// 只保留白名单内的属性；可选的强类型属性同样受白名单约束。
    pub fn retain_attributes(&mut self, allowed: &[&str]) {
        let allows = |name: &str| allowed.contains(&name);
        if !allows("commandPodId") {
            self.command_pod_id = None;
        }
        if !allows("materials") {
            self.materials.clear();
        }
        if !allows("texture") {
            self.texture = None;
        }
        if !allows("activationGroup") {
            self.activation_group = None;
        }
        if !allows("drag") {
            self.drag = None;
        }
        if !allows("scale") {
            self.scale = None;
        }
        self.attributes.retain(allows);
    }
}

/// 两个零件之间的连接，只按 id 弱引用零件。
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub part_a: String,
    pub part_b: String,
    pub attributes: Attributes,
    pub children: Vec<Element>,
}

impl Connection {
    pub fn new(part_a: impl Into<String>, part_b: impl Into<String>) -> Self {
        Self {
            part_a: part_a.into(),
            part_b: part_b.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn from_element(element: Element) -> Result<Self, ModelError> {
        let mut attributes = element.attributes;
        let mut require = |attribute: &'static str| {
            attributes
                .remove(attribute)
                .ok_or_else(|| ModelError::MissingAttribute {
                    element: CONNECTION.to_string(),
                    attribute,
                })
        };
        let part_a = require("partA")?;
        let part_b = require("partB")?;
        Ok(Self {
            part_a,
            part_b,
            attributes,
            children: element.children,
        })
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::new(CONNECTION)
            .with_attr("partA", self.part_a.clone())
            .with_attr("partB", self.part_b.clone());
        for (key, value) in self.attributes.iter() {
            element.set_attr(key, value);
        }
        element.children = self.children.clone();
        element
    }

    #[inline]
    pub fn endpoints(&self) -> (&str, &str) {
        (&self.part_a, &self.part_b)
    }
}

/// 刚体组。质量与速度类属性由目标游戏重新计算，仅原样保存。
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: Option<String>,
    pub part_ids: Vec<String>,
    pub mass: Option<String>,
    pub center_of_mass: Option<String>,
    pub velocity: Option<String>,
    pub angular_velocity: Option<String>,
    pub attributes: Attributes,
    pub children: Vec<Element>,
}

impl Body {
    pub fn new<I, S>(part_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: None,
            part_ids: part_ids.into_iter().map(Into::into).collect(),
            mass: None,
            center_of_mass: None,
            velocity: None,
            angular_velocity: None,
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn from_element(element: Element) -> Result<Self, ModelError> {
        let mut attributes = element.attributes;
        let id = attributes.remove("id");
        let part_ids = attributes
            .remove("partIds")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            id,
            part_ids,
            mass: attributes.remove("mass"),
            center_of_mass: attributes.remove("centerOfMass"),
            velocity: attributes.remove("velocity"),
            angular_velocity: attributes.remove("angularVelocity"),
            attributes,
            children: element.children,
        })
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::new(BODY);
        if let Some(id) = &self.id {
            element.set_attr("id", id.clone());
        }
        element.set_attr("partIds", self.part_ids.join(","));
        if let Some(mass) = &self.mass {
            element.set_attr("mass", mass.clone());
        }
        if let Some(center) = &self.center_of_mass {
            element.set_attr("centerOfMass", center.clone());
        }
        if let Some(velocity) = &self.velocity {
            element.set_attr("velocity", velocity.clone());
        }
        if let Some(angular) = &self.angular_velocity {
            element.set_attr("angularVelocity", angular.clone());
        }
        for (key, value) in self.attributes.iter() {
            element.set_attr(key, value);
        }
        element.children = self.children.clone();
        element
    }
}

/// 配色主题：名称加一组颜色条目。
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub id: Option<String>,
    pub attributes: Attributes,
    pub colors: Vec<Element>,
}

impl Theme {
    pub fn from_element(element: Element) -> Self {
        let mut attributes = element.attributes;
        Self {
            name: attributes.remove("name").unwrap_or_default(),
            id: attributes.remove("id"),
            attributes,
            colors: element.children,
        }
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::new(THEME).with_attr("name", self.name.clone());
        if let Some(id) = &self.id {
            element.set_attr("id", id.clone());
        }
        element.attributes.extend(self.attributes.clone());
        element.children = self.colors.clone();
        element
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesignerSettings {
    pub theme_name: String,
    pub theme: Rc<Theme>,
}

impl DesignerSettings {
    pub fn to_element(&self) -> Element {
        Element::new(DESIGNER_SETTINGS)
            .with_attr("themeName", self.theme_name.clone())
            .with_child(self.theme.to_element())
    }
}
