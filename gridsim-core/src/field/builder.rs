//! Graph Builder
//!
//! Compiles a [`Field`] into a [`Circuit`].
//!
//! # Algorithm
//!
//! 1. Label the grid into connected groups ([`label::label`]).
//! 2. For every cross cell, create a cross connection and union the wire
//!    groups passing straight through it on each axis.
//! 3. Scan row-major. The first cell of each positive label instantiates a
//!    component through the registry; later cells of the same label join it.
//!    Codes that cannot be instantiated become holes and are reported as
//!    [`BuildIssue`]s.
//! 4. For every boundary cell, create a typed connection and look at its
//!    neighbors up, left, down, right. The first wire neighbor attaches on the
//!    wire side, the first other component attaches on the other side; later
//!    candidates for a side are ignored.
//!
//! The label → component table is an [`IndexMap`], so component order (and
//! with it tick order and sub-circuit pin order) follows discovery order.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use super::{Build, BuildIssue, Field};
use crate::circuit::{Circuit, ComponentId, ConnectionKind};
use crate::config::BuildOptions;
use crate::error::BuildError;
use crate::grid::{label, BOUNDARY_LABEL};

pub(crate) fn build(field: &Field, options: &BuildOptions, depth: usize) -> Result<Build, BuildError> {
    let grid = field.grid();
    // snapshot, so the lock is not held while nested grids compile
    let registry = field.registry().read().clone();

    debug!(field = field.name(), width = grid.width(), height = grid.height(), depth, "building circuit");

    let mut labels = label::label(grid)?;
    let mut circuit = Circuit::new(field.name());

    for pos in label::merge_through_crosses(grid, &mut labels) {
        circuit.add_connection(ConnectionKind::Cross, pos);
    }

    let mut table: IndexMap<i32, ComponentId> = IndexMap::new();
    let mut holes = HashSet::new();
    let mut issues = Vec::new();

    for pos in grid.bounds().cells() {
        let group = labels.get(pos);
        let code = grid.get(pos);
        if group <= 0 || code.is_none() || holes.contains(&group) {
            continue;
        }
        if let Some(&id) = table.get(&group) {
            circuit.extend_component(id, pos);
            continue;
        }

        match registry.create(code, options, depth) {
            Ok((kind, nested)) => {
                issues.extend(nested);
                let id = circuit.add_component(code, kind, pos);
                table.insert(group, id);
            }
            Err(reason) => {
                warn!(field = field.name(), x = pos.x, y = pos.y, code = code.raw(), %reason, "component left out of build");
                issues.push(BuildIssue { pos, code, reason });
                holes.insert(group);
            }
        }
    }

    let boundaries: Vec<_> = labels.positions_of(BOUNDARY_LABEL).collect();
    for pos in boundaries {
        let Some(kind) = ConnectionKind::from_code(grid.get(pos)) else {
            continue;
        };
        let conn = circuit.add_connection(kind, pos);

        let mut wire_side = false;
        let mut other_side = false;
        for neighbor in pos.neighbors() {
            let Some(&id) = table.get(&labels.get(neighbor)) else {
                continue;
            };
            if grid.get(neighbor).is_wire() {
                if !wire_side {
                    circuit.add_wire(conn, id);
                    wire_side = true;
                }
            } else if !other_side {
                circuit.add_other(conn, id);
                other_side = true;
            }
        }
    }

    info!(
        field = field.name(),
        components = circuit.component_count(),
        connections = circuit.connection_count(),
        issues = issues.len(),
        "circuit built"
    );

    Ok(Build { circuit, issues })
}
