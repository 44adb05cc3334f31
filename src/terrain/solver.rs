//! Best-pattern selection for terrain fills
//!
//! A fill runs in three steps: derive constraints from the existing map
//! content around the painted cells (majority vote per shared bit), assert
//! the user's paint action at a higher priority, then walk the modifiable
//! cells picking the candidate pattern with the lowest mismatch score.
//! Chosen patterns feed back as mid-priority constraints so a multi-cell
//! fill converges to a mutually consistent assignment.
//!
//! Runs once per paint action, never per frame, so the naive
//! cells x candidates x bits scoring is fine.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::catalog::CellCatalog;
use crate::geometry::config::GridGeometry;
use crate::geometry::neighbor::CellNeighbor;
use crate::io::configuration::{INFERRED_PRIORITY, PAINT_PRIORITY, PROPAGATED_PRIORITY};
use crate::io::error::{MapError, Result};
use crate::map::map::GridMap;
use crate::terrain::constraint::{ConstraintKey, ConstraintSet, TerrainConstraint};
use crate::terrain::pattern::TerrainPattern;

/// Per-cell pattern assignment produced by a fill
pub type FillOutput = BTreeMap<[i32; 2], TerrainPattern>;

/// Paint a terrain over cells, connecting them to matching neighbors
///
/// Neighbors of the painted cells become modifiable too, so transitions
/// re-solve around the paint.
///
/// # Errors
///
/// Returns [`MapError::MissingCatalog`], [`MapError::IndexOutOfRange`] or
/// [`MapError::InvalidTerrainSet`] for bad inputs.
pub fn fill_connect(
    map: &GridMap,
    layer: usize,
    painted: &[[i32; 2]],
    terrain_set: usize,
    terrain: i32,
    ignore_empty_terrains: bool,
) -> Result<FillOutput> {
    let (catalog, geometry) = context(map, layer, terrain_set)?;

    // Painted cells first (in reverse draw order, matching how paints are
    // committed), then every side neighbor.
    let mut can_modify_list = Vec::new();
    let mut can_modify_set = BTreeSet::new();
    let mut painted_set = BTreeSet::new();
    for &coords in painted.iter().rev() {
        if can_modify_set.insert(coords) {
            can_modify_list.push(coords);
        }
        painted_set.insert(coords);
    }
    for &coords in painted {
        for direction in CellNeighbor::ALL {
            if !geometry.is_valid_direction(direction) {
                continue;
            }
            let neighbor = geometry.neighbor(coords, direction)?;
            if can_modify_set.insert(neighbor) {
                can_modify_list.push(neighbor);
            }
        }
    }

    // Cells whose center already carries (or will carry) the painted
    // terrain; paint connects to exactly these.
    let mut center_terrain_cells = BTreeSet::new();
    for &coords in &can_modify_set {
        let connect = painted_set.contains(&coords)
            || map.terrain_pattern_at(terrain_set, layer, coords).terrain() == terrain;
        if connect {
            center_terrain_cells.insert(coords);
        }
    }

    let mut constraints = ConstraintSet::new();
    for &coords in painted {
        constraints.insert(TerrainConstraint::center(coords, terrain).with_priority(PAINT_PRIORITY));

        for bit in valid_bits(catalog.as_ref(), terrain_set) {
            let constraint = TerrainConstraint::peering(&geometry, coords, bit, terrain)?
                .with_priority(PAINT_PRIORITY);
            if bit.is_side() {
                // Side bits connect when the one neighbor matches.
                let neighbor = geometry.neighbor(coords, bit)?;
                if center_terrain_cells.contains(&neighbor) {
                    constraints.insert(constraint);
                }
            } else {
                // Corner bits only when every overlapping cell matches.
                let all_match = constraint
                    .overlapping_cells(&geometry)
                    .iter()
                    .all(|(cell, _)| center_terrain_cells.contains(cell));
                if all_match {
                    constraints.insert(constraint);
                }
            }
        }
    }

    for constraint in
        constraints_from_painted(map, layer, &painted_set, terrain_set, ignore_empty_terrains)?
            .iter()
    {
        constraints.insert(constraint);
    }

    fill_constraints(map, layer, &can_modify_list, terrain_set, constraints)
}

/// Paint a terrain along a path of adjacent cells
///
/// # Errors
///
/// As [`fill_connect`], plus [`MapError::BrokenPath`] when consecutive path
/// cells are not neighbors.
pub fn fill_path(
    map: &GridMap,
    layer: usize,
    path: &[[i32; 2]],
    terrain_set: usize,
    terrain: i32,
    ignore_empty_terrains: bool,
) -> Result<FillOutput> {
    let (catalog, geometry) = context(map, layer, terrain_set)?;

    // Validate contiguity and record the connecting bit of each step.
    let mut step_bits = Vec::new();
    for window in path.windows(2) {
        let (&from, &to) = match (window.first(), window.get(1)) {
            (Some(from), Some(to)) => (from, to),
            _ => continue,
        };
        let found = CellNeighbor::ALL.into_iter().find(|&direction| {
            geometry.is_valid_direction(direction)
                && geometry.neighbor(from, direction).is_ok_and(|n| n == to)
        });
        let bit = found.ok_or(MapError::BrokenPath { from, to })?;
        step_bits.push((from, bit));
    }

    let (can_modify_list, painted_set) =
        modifiable_cells(catalog.as_ref(), &geometry, terrain_set, path);

    let mut constraints = ConstraintSet::new();
    for &coords in path {
        constraints.insert(TerrainConstraint::center(coords, terrain).with_priority(PAINT_PRIORITY));
    }
    for (coords, bit) in step_bits {
        let constraint =
            TerrainConstraint::peering(&geometry, coords, bit, terrain)?.with_priority(PAINT_PRIORITY);
        constraints.insert(constraint);
    }

    for constraint in
        constraints_from_painted(map, layer, &painted_set, terrain_set, ignore_empty_terrains)?
            .iter()
    {
        constraints.insert(constraint);
    }

    fill_constraints(map, layer, &can_modify_list, terrain_set, constraints)
}

/// Paint one explicit terrain pattern over cells
///
/// # Errors
///
/// As [`fill_connect`].
pub fn fill_pattern(
    map: &GridMap,
    layer: usize,
    painted: &[[i32; 2]],
    terrain_set: usize,
    pattern: &TerrainPattern,
    ignore_empty_terrains: bool,
) -> Result<FillOutput> {
    let (catalog, geometry) = context(map, layer, terrain_set)?;

    let (can_modify_list, painted_set) =
        modifiable_cells(catalog.as_ref(), &geometry, terrain_set, painted);

    let mut constraints = ConstraintSet::new();
    for &coords in painted {
        for constraint in
            constraints_from_added_pattern(catalog.as_ref(), &geometry, terrain_set, coords, pattern)?
        {
            constraints.insert(constraint.with_priority(PAINT_PRIORITY));
        }
    }

    for constraint in
        constraints_from_painted(map, layer, &painted_set, terrain_set, ignore_empty_terrains)?
            .iter()
    {
        constraints.insert(constraint);
    }

    fill_constraints(map, layer, &can_modify_list, terrain_set, constraints)
}

/// Walk the modifiable cells picking the best pattern for each
///
/// Every chosen pattern feeds back into the constraint set at the
/// propagation priority, overwriting whatever was there, so later cells see
/// earlier decisions.
///
/// # Errors
///
/// As [`fill_connect`].
pub fn fill_constraints(
    map: &GridMap,
    layer: usize,
    to_replace: &[[i32; 2]],
    terrain_set: usize,
    mut constraints: ConstraintSet,
) -> Result<FillOutput> {
    let (catalog, geometry) = context(map, layer, terrain_set)?;

    let mut output = FillOutput::new();
    for &coords in to_replace {
        let current = map.terrain_pattern_at(terrain_set, layer, coords);
        let best = best_pattern_for_constraints(
            catalog.as_ref(),
            &geometry,
            terrain_set,
            coords,
            &constraints,
            &current,
        )?;

        for constraint in
            constraints_from_added_pattern(catalog.as_ref(), &geometry, terrain_set, coords, &best)?
        {
            constraints.replace(constraint.with_priority(PROPAGATED_PRIORITY));
        }

        output.insert(coords, best);
    }
    Ok(output)
}

/// Score every candidate pattern against the constraints and pick the best
///
/// A candidate that would alter an unconstrained slot relative to the cell's
/// current pattern is disqualified: nothing may change that was not asked to
/// change. Among the survivors the lowest summed mismatch priority wins, the
/// first minimum in enumeration order on ties. With no survivor the current
/// pattern is kept.
///
/// # Errors
///
/// Returns [`MapError::InvalidNeighbor`] only on a catalog reporting bits
/// the grid shape does not support.
pub fn best_pattern_for_constraints(
    catalog: &dyn CellCatalog,
    geometry: &GridGeometry,
    terrain_set: usize,
    position: [i32; 2],
    constraints: &ConstraintSet,
    current: &TerrainPattern,
) -> Result<TerrainPattern> {
    let bits = valid_bits(catalog, terrain_set);
    let mut bit_keys: Vec<(CellNeighbor, ConstraintKey)> = Vec::with_capacity(bits.len());
    for bit in bits {
        let key = TerrainConstraint::peering(geometry, position, bit, 0)?.key();
        bit_keys.push((bit, key));
    }
    let center_key = TerrainConstraint::center(position, 0).key();

    let mut best: Option<(TerrainPattern, i32)> = None;
    'candidates: for candidate in catalog.candidate_patterns(terrain_set) {
        let mut score = 0;

        match constraints.find(center_key) {
            Some((terrain, priority)) => {
                if terrain != candidate.terrain() {
                    score += priority;
                }
            }
            None => {
                if current.terrain() != candidate.terrain() {
                    continue 'candidates;
                }
            }
        }

        for &(bit, key) in &bit_keys {
            match constraints.find(key) {
                Some((terrain, priority)) => {
                    if terrain != candidate.peering_bit(bit) {
                        score += priority;
                    }
                }
                None => {
                    if current.peering_bit(bit) != candidate.peering_bit(bit) {
                        continue 'candidates;
                    }
                }
            }
        }

        if best.as_ref().is_none_or(|(_, s)| score < *s) {
            best = Some((candidate, score));
        }
    }

    Ok(best.map_or_else(|| current.clone(), |(pattern, _)| pattern))
}

/// Derive constraints from the content already on the map
///
/// For every peering bit touching a painted cell, every overlapping cell
/// votes with its current terrain at that bit; the most frequent terrain
/// wins, ties broken by the lowest terrain id. Painted cells' centers vote
/// for themselves. All results carry the inference priority.
///
/// # Errors
///
/// As [`fill_connect`].
pub fn constraints_from_painted(
    map: &GridMap,
    layer: usize,
    painted: &BTreeSet<[i32; 2]>,
    terrain_set: usize,
    ignore_empty_terrains: bool,
) -> Result<ConstraintSet> {
    let (catalog, geometry) = context(map, layer, terrain_set)?;

    // One probe per distinct canonical slot around the paint.
    let mut probes: BTreeMap<ConstraintKey, TerrainConstraint> = BTreeMap::new();
    for &coords in painted {
        for bit in valid_bits(catalog.as_ref(), terrain_set) {
            let probe = TerrainConstraint::peering(&geometry, coords, bit, -1)?;
            probes.entry(probe.key()).or_insert(probe);
        }
    }

    let mut constraints = ConstraintSet::new();
    for probe in probes.values() {
        let mut votes: BTreeMap<i32, usize> = BTreeMap::new();
        for (cell, bit) in probe.overlapping_cells(&geometry) {
            let terrain = map
                .terrain_pattern_at(terrain_set, layer, cell)
                .peering_bit(bit);
            if !ignore_empty_terrains || terrain >= 0 {
                *votes.entry(terrain).or_insert(0) += 1;
            }
        }

        // Ascending key iteration plus a strict comparison keeps the lowest
        // terrain id on a tied vote.
        let mut winner: Option<(i32, usize)> = None;
        for (&terrain, &count) in &votes {
            if winner.is_none_or(|(_, best)| count > best) {
                winner = Some((terrain, count));
            }
        }
        if let Some((terrain, count)) = winner {
            if count > 0 {
                let mut chosen = *probe;
                chosen.set_terrain(terrain);
                constraints.insert(chosen.with_priority(INFERRED_PRIORITY));
            }
        }
    }

    for &coords in painted {
        let terrain = map.terrain_pattern_at(terrain_set, layer, coords).terrain();
        if !ignore_empty_terrains || terrain >= 0 {
            constraints
                .insert(TerrainConstraint::center(coords, terrain).with_priority(INFERRED_PRIORITY));
        }
    }

    Ok(constraints)
}

/// Constraints asserting a full pattern at a position
///
/// # Errors
///
/// Returns [`MapError::InvalidNeighbor`] only on a catalog reporting bits
/// the grid shape does not support.
pub fn constraints_from_added_pattern(
    catalog: &dyn CellCatalog,
    geometry: &GridGeometry,
    terrain_set: usize,
    position: [i32; 2],
    pattern: &TerrainPattern,
) -> Result<Vec<TerrainConstraint>> {
    let mut output = vec![TerrainConstraint::center(position, pattern.terrain())];
    for bit in valid_bits(catalog, terrain_set) {
        output.push(TerrainConstraint::peering(
            geometry,
            position,
            bit,
            pattern.peering_bit(bit),
        )?);
    }
    Ok(output)
}

// Painted cells in reverse order, then their valid-peering-bit neighbors.
fn modifiable_cells(
    catalog: &dyn CellCatalog,
    geometry: &GridGeometry,
    terrain_set: usize,
    painted: &[[i32; 2]],
) -> (Vec<[i32; 2]>, BTreeSet<[i32; 2]>) {
    let mut list = Vec::new();
    let mut seen = BTreeSet::new();
    let mut painted_set = BTreeSet::new();
    for &coords in painted.iter().rev() {
        if seen.insert(coords) {
            list.push(coords);
        }
        painted_set.insert(coords);
    }
    for &coords in painted {
        for bit in valid_bits(catalog, terrain_set) {
            // Corner-only bits have no single neighbor cell; skip them.
            let Ok(neighbor) = geometry.neighbor(coords, bit) else {
                continue;
            };
            if seen.insert(neighbor) {
                list.push(neighbor);
            }
        }
    }
    (list, painted_set)
}

fn valid_bits(catalog: &dyn CellCatalog, terrain_set: usize) -> Vec<CellNeighbor> {
    CellNeighbor::ALL
        .into_iter()
        .filter(|&bit| catalog.is_valid_peering_bit(terrain_set, bit))
        .collect()
}

fn context(
    map: &GridMap,
    layer: usize,
    terrain_set: usize,
) -> Result<(Rc<dyn CellCatalog>, GridGeometry)> {
    let catalog = map
        .catalog()
        .cloned()
        .ok_or(MapError::MissingCatalog {
            operation: "solve a terrain fill",
        })?;
    if layer >= map.layer_count() {
        return Err(MapError::IndexOutOfRange {
            layer,
            layer_count: map.layer_count(),
        });
    }
    if terrain_set >= catalog.terrain_set_count() {
        return Err(MapError::InvalidTerrainSet {
            terrain_set,
            terrain_set_count: catalog.terrain_set_count(),
        });
    }
    let geometry = catalog.geometry();
    Ok((catalog, geometry))
}
