//! Deterministic 2-D placement hints for the rendering surface.
//!
//! Never affects graph semantics; recomputed from the finished graph on
//! every rebuild. Model nodes form version chains (one column per model
//! name, one row per version). A dependency with a single owner sits on a
//! circle around that owner; a dependency shared by several owners sits at
//! the centroid of its placed owners.

use crate::types::{BomGraph, EdgeKind, NodeKind};
use std::collections::BTreeMap;

pub const COLUMN_SPACING: f64 = 600.0;
pub const ROW_SPACING: f64 = 280.0;
pub const BASE_RADIUS: f64 = 160.0;
pub const RADIUS_STEP: f64 = 10.0;

/// Positions keyed by node id. Nodes without a placement rule (datasets
/// that are not dependencies of a placed owner) are simply absent; the
/// rendering surface falls back to physics for those.
#[must_use]
pub fn assign_positions(graph: &BomGraph) -> BTreeMap<String, (f64, f64)> {
    let mut positions: BTreeMap<String, (f64, f64)> = BTreeMap::new();

    // Version chains: columns by model name, rows by version string order.
    let mut chains: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
    for (_, node) in graph.nodes() {
        if node.kind == NodeKind::Model {
            chains
                .entry(node.name.clone())
                .or_default()
                .push((node.version.clone(), node.id.clone()));
        }
    }
    for (column, chain) in chains.values_mut().enumerate() {
        chain.sort();
        for (row, (_, id)) in chain.iter().enumerate() {
            positions.insert(
                id.clone(),
                (column as f64 * COLUMN_SPACING, row as f64 * ROW_SPACING),
            );
        }
    }

    // Dependency fan-out per owner and owner set per dependency.
    let mut deps_of: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut owners_of: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (from, to, kind) in graph.edges() {
        if kind == EdgeKind::DependsOn {
            deps_of.entry(from.id.clone()).or_default().push(to.id.clone());
            owners_of.entry(to.id.clone()).or_default().push(from.id.clone());
        }
    }
    for deps in deps_of.values_mut() {
        deps.sort();
    }

    // Single-owner dependencies: evenly spaced on a circle whose radius
    // grows with the owner's dependency count.
    for (owner_id, deps) in &deps_of {
        let Some(&(owner_x, owner_y)) = positions.get(owner_id) else {
            continue;
        };
        let radius = RADIUS_STEP.mul_add(deps.len() as f64, BASE_RADIUS);
        for (slot, dep_id) in deps.iter().enumerate() {
            if positions.contains_key(dep_id) {
                continue;
            }
            if owners_of.get(dep_id).map_or(0, Vec::len) != 1 {
                continue;
            }
            let angle = std::f64::consts::TAU * (slot as f64 / deps.len() as f64);
            positions.insert(
                dep_id.clone(),
                (
                    radius.mul_add(angle.cos(), owner_x),
                    radius.mul_add(angle.sin(), owner_y),
                ),
            );
        }
    }

    // Shared dependencies: centroid of whichever owners are placed.
    for (dep_id, owners) in &owners_of {
        if owners.len() < 2 || positions.contains_key(dep_id) {
            continue;
        }
        let placed: Vec<(f64, f64)> = owners
            .iter()
            .filter_map(|owner| positions.get(owner).copied())
            .collect();
        if placed.is_empty() {
            continue;
        }
        let n = placed.len() as f64;
        let x = placed.iter().map(|p| p.0).sum::<f64>() / n;
        let y = placed.iter().map(|p| p.1).sum::<f64>() / n;
        positions.insert(dep_id.clone(), (x, y));
    }

    positions
}
