use std::collections::HashSet;

use crate::errors::ConvertError;

/// 转换选项。同一维度（id 或类型）上 `only_*` 与 `exclude_*` 互斥。
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    pub scale: f64,
    pub only_ids: Option<HashSet<String>>,
    pub exclude_ids: HashSet<String>,
    pub only_types: Option<HashSet<String>>,
    pub exclude_types: HashSet<String>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            only_ids: None,
            exclude_ids: HashSet::new(),
            only_types: None,
            exclude_types: HashSet::new(),
        }
    }
}

impl ConversionOptions {
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn only_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn only_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_types.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn validate(&self) -> Result<(), ConvertError> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ConvertError::InvalidScale(self.scale));
        }
        if self.only_ids.is_some() && !self.exclude_ids.is_empty() {
            return Err(ConvertError::ConflictingFilters { axis: "ids" });
        }
        if self.only_types.is_some() && !self.exclude_types.is_empty() {
            return Err(ConvertError::ConflictingFilters { axis: "types" });
        }
        Ok(())
    }

    /// 调用方的过滤策略；是否有对应转换器由注册表另行判断。
    pub fn admits(&self, part_type: &str, part_id: &str) -> bool {
        !self.exclude_types.contains(part_type)
            && self
                .only_types
                .as_ref()
                .is_none_or(|types| types.contains(part_type))
            && !self.exclude_ids.contains(part_id)
            && self
                .only_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(part_id))
    }
}
