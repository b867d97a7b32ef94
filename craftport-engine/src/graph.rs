//! 按保留下来的零件集合修剪连接与刚体组。

use std::collections::HashSet;

use craftport_core::craft::{Assembly, Body, Connection, ZERO_VECTOR};
use tracing::debug;

/// 刚体组的占位质量，目标格式加载时会重新计算。
pub const PLACEHOLDER_MASS: &str = "3.14159265";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphReport {
    pub connections_removed: usize,
    pub bodies_removed: usize,
}

/// 同时修剪连接与刚体组。
pub fn filter_assembly(assembly: &mut Assembly, retained: &HashSet<String>) -> GraphReport {
    let report = GraphReport {
        connections_removed: filter_connections(&mut assembly.connections, retained),
        bodies_removed: filter_bodies(&mut assembly.bodies, retained),
    };
    debug!(
        connections_removed = report.connections_removed,
        bodies_removed = report.bodies_removed,
        "结构图修剪完成"
    );
    report
}

/// 只保留两端都在集合中的连接，返回移除的数量。
pub fn filter_connections(connections: &mut Vec<Connection>, retained: &HashSet<String>) -> usize {
    let before = connections.len();
    connections.retain(|connection| {
        let (a, b) = connection.endpoints();
        retained.contains(a) && retained.contains(b)
    });
    before - connections.len()
}

/// 成员与集合取交集，丢弃空组，幸存的组按出现顺序重新编号为 1..k。
pub fn filter_bodies(bodies: &mut Vec<Body>, retained: &HashSet<String>) -> usize {
    let before = bodies.len();
    bodies.retain_mut(|body| {
        body.part_ids.retain(|id| retained.contains(id));
        !body.part_ids.is_empty()
    });

    for (index, body) in bodies.iter_mut().enumerate() {
        body.id = Some((index + 1).to_string());
        body.mass = Some(PLACEHOLDER_MASS.to_string());
        body.center_of_mass = Some(ZERO_VECTOR.to_string());
        body.velocity = None;
        body.angular_velocity = None;
    }
    before - bodies.len()
}
