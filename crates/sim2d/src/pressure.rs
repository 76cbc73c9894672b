//! Gravity injection and pressure-driven velocity correction (phases 1–2).

use crate::numeric::Scalar;
use crate::vector_field::DELTAS;
use crate::Simulation;

/// Phase 1: every non-wall cell with a non-wall cell below it gains `g` on
/// its downward arrow. Air is pulled down like everything else; density
/// only matters once pressure pushes back.
pub(crate) fn apply_gravity<P: Scalar, V: Scalar, VF: Scalar>(sim: &mut Simulation<P, V, VF>) {
    let rows = sim.field.rows() as i32;
    let cols = sim.field.cols() as i32;
    for x in 0..rows {
        for y in 0..cols {
            if sim.field.get(x, y).is_wall() {
                continue;
            }
            if !sim.field.get(x + 1, y).is_wall() {
                sim.velocity.add(x, y, 1, 0, sim.gravity);
            }
        }
    }
}

/// Phase 2: relax pressure differences into velocity, against a snapshot of
/// the pressures at phase start.
///
/// For every neighbor at strictly lower snapshot pressure, the counter-arrow
/// pointing back at us absorbs the difference first (scaled by the
/// neighbor's density). Whatever it cannot absorb zeroes the counter-arrow,
/// becomes outgoing velocity here, and bleeds out of this cell's pressure,
/// spread over its open directions.
pub(crate) fn apply_pressure_forces<P: Scalar, V: Scalar, VF: Scalar>(
    sim: &mut Simulation<P, V, VF>,
) {
    sim.old_pressure.copy_from_slice(&sim.pressure);

    let rows = sim.field.rows() as i32;
    let cols = sim.field.cols() as i32;
    for x in 0..rows {
        for y in 0..cols {
            if sim.field.get(x, y).is_wall() {
                continue;
            }
            for (dx, dy) in DELTAS {
                let (nx, ny) = (x + dx, y + dy);
                let neighbor = sim.field.get(nx, ny);
                if neighbor.is_wall() {
                    continue;
                }
                let here = sim.old_pressure[sim.idx(x, y)];
                let there = sim.old_pressure[sim.idx(nx, ny)];
                if !(there < here) {
                    continue;
                }

                let mut force = here - there;
                let rho_n = sim.rho(neighbor);
                let contr = sim.velocity.get(nx, ny, -dx, -dy);
                if P::from_scalar(contr) * rho_n >= force {
                    *sim.velocity.get_mut(nx, ny, -dx, -dy) = contr - V::from_scalar(force / rho_n);
                    continue;
                }

                force = force - P::from_scalar(contr) * rho_n;
                *sim.velocity.get_mut(nx, ny, -dx, -dy) = V::zero();
                let rho_here = sim.rho(sim.field.get(x, y));
                sim.velocity.add(x, y, dx, dy, V::from_scalar(force / rho_here));
                let i = sim.idx(x, y);
                sim.pressure[i] = sim.pressure[i] - force / P::from_int(sim.open_dirs[i] as i64);
            }
        }
    }
}
