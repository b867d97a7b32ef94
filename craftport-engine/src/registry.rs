use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::converters::{
    BLOCK, FUSELAGE, HINGE_ROTATOR, INLET, NOSE_CONE, PISTON, PartConverter, SMALL_ROTATOR, WING,
};

static STANDARD: Lazy<ConverterRegistry> = Lazy::new(ConverterRegistry::standard);

/// 源零件类型到转换器的映射。多个源类型可以共用同一个转换器。
#[derive(Debug, Default)]
pub struct ConverterRegistry {
    converters: HashMap<&'static str, &'static PartConverter>,
}

impl ConverterRegistry {
    /// 空注册表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 内置的全部转换器。
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("Fuselage-Body-1", &FUSELAGE);
        registry.register("Fuselage-Cone-1", &NOSE_CONE);
        registry.register("Fuselage-Inlet-1", &INLET);
        registry.register("Wing-3", &WING);
        registry.register("Wing-2", &WING);
        registry.register("Block-2", &BLOCK);
        registry.register("Block-1", &BLOCK);
        registry.register("Piston", &PISTON);
        registry.register("SmallRotator-1", &SMALL_ROTATOR);
        registry.register("HingeRotator-1", &HINGE_ROTATOR);
        registry
    }

    /// 进程级共享的标准注册表，首次访问时构建。
    pub fn global() -> &'static Self {
        &STANDARD
    }

    /// 注册或覆盖一个源类型。
    pub fn register(&mut self, source_type: &'static str, converter: &'static PartConverter) {
        self.converters.insert(source_type, converter);
    }

    pub fn get(&self, source_type: &str) -> Option<&'static PartConverter> {
        self.converters.get(source_type).copied()
    }

    pub fn contains(&self, source_type: &str) -> bool {
        self.converters.contains_key(source_type)
    }

    /// 已注册的源类型，按字典序排列。
    pub fn source_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.converters.keys().copied().collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}
