pub mod craft;

pub mod numeric {
    use glam::DVec3;
    use thiserror::Error;

    /// 输出时保留的小数位数，与目标格式的既有存档保持一致。
    pub const OUTPUT_PRECISION: usize = 8;

    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum NumericError {
        #[error("invalid number {literal:?} in {raw:?}")]
        InvalidLiteral { raw: String, literal: String },
        #[error("expected {expected} components, found {found} in {raw:?}")]
        Arity {
            raw: String,
            expected: usize,
            found: usize,
        },
    }

    /// 解析逗号分隔的浮点列表，例如 `"1,0.25,-3E-05"`。任何无法解析的分量都会报错，不做静默修正。
    pub fn parse_list(raw: &str) -> Result<Vec<f64>, NumericError> {
        raw.split(',')
            .map(|literal| {
                literal
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| NumericError::InvalidLiteral {
                        raw: raw.to_string(),
                        literal: literal.to_string(),
                    })
            })
            .collect()
    }

    /// 解析定长列表，分量个数不符时返回 [`NumericError::Arity`]。
    pub fn parse_fixed<const N: usize>(raw: &str) -> Result<[f64; N], NumericError> {
        let values = parse_list(raw)?;
        let found = values.len();
        values.try_into().map_err(|_| NumericError::Arity {
            raw: raw.to_string(),
            expected: N,
            found,
        })
    }

    #[inline]
    pub fn parse_vec3(raw: &str) -> Result<DVec3, NumericError> {
        parse_fixed::<3>(raw).map(DVec3::from_array)
    }

    /// 以固定精度输出单个数值，并去掉多余的尾随零（`3.00000000` -> `3`）。
    pub fn format_number(value: f64) -> String {
        let mut text = format!("{value:.prec$}", prec = OUTPUT_PRECISION);
        if text.contains('.') {
            let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
            text.truncate(trimmed);
        }
        text
    }

    pub fn format_list(values: &[f64]) -> String {
        values
            .iter()
            .map(|value| format_number(*value))
            .collect::<Vec<_>>()
            .join(",")
    }

    #[inline]
    pub fn format_vec3(value: DVec3) -> String {
        format_list(&value.to_array())
    }

}

pub mod rotation {
    use glam::{DMat3, DVec3};

    /// 万向节锁判定阈值。
    const GIMBAL_EPSILON: f64 = 4.0 * f64::EPSILON;

    /// 以行优先方式书写的 3×3 常量矩阵，便于与设计稿中的矩阵逐行对照。
    pub type RowMatrix = [[f64; 3]; 3];

    #[inline]
    pub fn matrix_from_rows(rows: &RowMatrix) -> DMat3 {
        DMat3::from_cols_array_2d(rows).transpose()
    }

    /// 欧拉角（度，按 x, y, z 存放）转旋转矩阵。
    ///
    /// 约定：先绕固定 Z 轴，再绕 X 轴，最后绕 Y 轴，即 `Ry · Rx · Rz`。
    pub fn euler_to_matrix(degrees: DVec3) -> DMat3 {
        DMat3::from_rotation_y(degrees.y.to_radians())
            * DMat3::from_rotation_x(degrees.x.to_radians())
            * DMat3::from_rotation_z(degrees.z.to_radians())
    }

    /// [`euler_to_matrix`] 的逆过程；退化情况下 Y 角取 0。
    pub fn matrix_to_euler(matrix: &DMat3) -> DVec3 {
        let at = |row: usize, col: usize| matrix.col(col)[row];
        let cos_x = at(2, 2).hypot(at(0, 2));
        let (x, y, z) = if cos_x > GIMBAL_EPSILON {
            (
                (-at(1, 2)).atan2(cos_x),
                at(0, 2).atan2(at(2, 2)),
                at(1, 0).atan2(at(1, 1)),
            )
        } else {
            ((-at(1, 2)).atan2(cos_x), 0.0, (-at(0, 1)).atan2(at(0, 0)))
        };
        DVec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
    }

    /// 将欧拉角右乘预旋转矩阵后重新分解，用于修正不同零件类别的本地坐标系朝向。
    pub fn prerotate(degrees: DVec3, prerotation: &DMat3) -> DVec3 {
        matrix_to_euler(&(euler_to_matrix(degrees) * *prerotation))
    }

}

pub mod tree {
    use serde::{Deserialize, Serialize};

    /// 有序属性表。保持读取时的顺序，写回时不打乱原始布局。
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Attributes(Vec<(String, String)>);

    impl Attributes {
        #[inline]
        pub fn new() -> Self {
            Self(Vec::new())
        }

        pub fn get(&self, name: &str) -> Option<&str> {
            self.0
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        }

        #[inline]
        pub fn contains(&self, name: &str) -> bool {
            self.get(name).is_some()
        }

        /// 设置属性；已存在时原位替换。
        pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
            let name = name.into();
            let value = value.into();
            match self.0.iter_mut().find(|(key, _)| *key == name) {
                Some((_, slot)) => *slot = value,
                None => self.0.push((name, value)),
            }
        }

        pub fn remove(&mut self, name: &str) -> Option<String> {
            let index = self.0.iter().position(|(key, _)| key == name)?;
            Some(self.0.remove(index).1)
        }

        /// 原位重命名属性，返回是否存在该属性。若目标名已存在则被覆盖。
        pub fn rename(&mut self, from: &str, to: &str) -> bool {
            let Some(value) = self.remove(from) else {
                return false;
            };
            self.set(to, value);
            true
        }

        pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
            self.0.retain(|(key, _)| keep(key));
        }

        pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
            self.0
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str()))
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.0.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.0.is_empty()
        }

        pub(crate) fn extend(&mut self, other: Attributes) {
            for (key, value) in other.0 {
                self.set(key, value);
            }
        }
    }

    impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
        fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
            let mut attributes = Attributes::new();
            for (key, value) in iter {
                attributes.set(key, value);
            }
            attributes
        }
    }

    /// 通用树形文档节点。文本内容不参与转换，因此只保留标签、属性与子节点。
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Element {
        pub name: String,
        #[serde(default, skip_serializing_if = "Attributes::is_empty")]
        pub attributes: Attributes,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub children: Vec<Element>,
    }

    impl Element {
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                attributes: Attributes::new(),
                children: Vec::new(),
            }
        }

        pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
            self.attributes.set(name, value);
            self
        }

        pub fn with_child(mut self, child: Element) -> Self {
            self.children.push(child);
            self
        }

        #[inline]
        pub fn attr(&self, name: &str) -> Option<&str> {
            self.attributes.get(name)
        }

        #[inline]
        pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
            self.attributes.set(name, value);
        }

        #[inline]
        pub fn remove_attr(&mut self, name: &str) -> Option<String> {
            self.attributes.remove(name)
        }

        pub fn child(&self, name: &str) -> Option<&Element> {
            self.children.iter().find(|child| child.name == name)
        }

        pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
            self.children.iter_mut().find(|child| child.name == name)
        }

        pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
            self.children.iter().filter(move |child| child.name == name)
        }

        /// 取出第一个同名子节点。
        pub fn take_child(&mut self, name: &str) -> Option<Element> {
            let index = self.children.iter().position(|child| child.name == name)?;
            Some(self.children.remove(index))
        }

        /// 取出全部同名子节点，保持原有相对顺序。
        pub fn take_children(&mut self, name: &str) -> Vec<Element> {
            let (taken, kept) = std::mem::take(&mut self.children)
                .into_iter()
                .partition(|child| child.name == name);
            self.children = kept;
            taken
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn attributes_keep_order_and_replace_in_place() {
            let mut attributes: Attributes = [("id", "5"), ("partType", "Wing-3")].into_iter().collect();
            attributes.set("position", "0,0,0");
            attributes.set("id", "6");
            let keys: Vec<_> = attributes.iter().map(|(key, _)| key).collect();
            assert_eq!(keys, ["id", "partType", "position"]);
            assert_eq!(attributes.get("id"), Some("6"));

            assert!(attributes.rename("partType", "type"));
            assert!(!attributes.rename("missing", "other"));
            assert_eq!(attributes.get("type"), Some("Wing-3"));
            assert_eq!(attributes.remove("position").as_deref(), Some("0,0,0"));
            attributes.retain(|key| key == "id");
            assert_eq!(attributes.len(), 1);
        }

        #[test]
        fn take_children_preserves_relative_order() {
            let mut wing = Element::new("Wing.State")
                .with_child(Element::new("ControlSurface").with_attr("id", "a"))
                .with_child(Element::new("Other"))
                .with_child(Element::new("ControlSurface").with_attr("id", "b"));
            let surfaces = wing.take_children("ControlSurface");
            let ids: Vec<_> = surfaces.iter().filter_map(|s| s.attr("id")).collect();
            assert_eq!(ids, ["a", "b"]);
            assert_eq!(wing.children.len(), 1);
            assert!(wing.take_child("ControlSurface").is_none());
            assert!(wing.take_child("Other").is_some());
        }

        #[test]
        fn element_serializes_compactly() {
            let element = Element::new("Config").with_attr("partScale", "2,2,2");
            let value = serde_json::to_value(&element).expect("serialize");
            assert_eq!(
                value,
                serde_json::json!({"name": "Config", "attributes": [["partScale", "2,2,2"]]})
            );
        }
    }
}
