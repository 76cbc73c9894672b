//! Flow propagation (phase 3): augmenting-path discovery over the velocity
//! field, then reconciliation of unrealized velocity back into pressure.

use crate::numeric::Scalar;
use crate::vector_field::DELTAS;
use crate::Simulation;

/// Phase 3 driver. Clears the per-tick flow field, then runs whole-grid
/// propagation passes until one finds no new flow, and finally folds every
/// unrealized arrow back into pressure.
pub(crate) fn redistribute<P: Scalar, V: Scalar, VF: Scalar>(sim: &mut Simulation<P, V, VF>) {
    sim.flow.clear();

    let rows = sim.field.rows() as i32;
    let cols = sim.field.cols() as i32;
    loop {
        sim.generation += 2;
        let mut found = false;
        for x in 0..rows {
            for y in 0..cols {
                if sim.field.get(x, y).is_wall() {
                    continue;
                }
                if sim.last_seen[sim.idx(x, y)] == sim.generation {
                    continue;
                }
                let (flowed, _, _) = propagate_flow(sim, x, y, P::one());
                if flowed > P::zero() {
                    found = true;
                }
            }
        }
        if !found {
            break;
        }
    }

    reconcile(sim);
}

/// Depth-first search for an augmenting flow path from `(x, y)`, with
/// per-edge residual `cap - flow` and running path bound `lim`.
///
/// Returns `(flowed, on_path, end)`: the flow claimed at or below this cell,
/// whether the caller sits on the cycle and should claim it too, and the
/// cell that closed the cycle. A caller that sees itself as `end` stops the
/// claim from travelling any further up the stack.
fn propagate_flow<P: Scalar, V: Scalar, VF: Scalar>(
    sim: &mut Simulation<P, V, VF>,
    x: i32,
    y: i32,
    lim: P,
) -> (P, bool, (i32, i32)) {
    let i = sim.idx(x, y);
    sim.last_seen[i] = sim.generation - 1;

    let mut total = P::zero();
    for (dx, dy) in DELTAS {
        let (nx, ny) = (x + dx, y + dy);
        if sim.field.get(nx, ny).is_wall() {
            continue;
        }
        let ni = sim.idx(nx, ny);
        if sim.last_seen[ni] >= sim.generation {
            continue;
        }
        let cap = sim.velocity.get(x, y, dx, dy);
        let flow = sim.flow.get(x, y, dx, dy);
        if flow == VF::from_scalar(cap) {
            continue; // edge saturated
        }
        let residual = cap - V::from_scalar(flow);
        let vp = P::from_scalar(residual).min(lim);

        if sim.last_seen[ni] == sim.generation - 1 {
            // The neighbor is on the stack: the path just closed into a
            // cycle two cells long from our point of view.
            sim.flow.add(x, y, dx, dy, VF::from_scalar(vp));
            sim.last_seen[i] = sim.generation;
            return (vp, true, (nx, ny));
        }

        let (t, on_path, end) = propagate_flow(sim, nx, ny, vp);
        total = total + t;
        if on_path {
            sim.flow.add(x, y, dx, dy, VF::from_scalar(t));
            sim.last_seen[i] = sim.generation;
            // Once the cycle's start claims its flow, callers above it get
            // the amount but not the claim.
            return (t, end != (x, y), end);
        }
    }

    sim.last_seen[i] = sim.generation;
    (total, false, (0, 0))
}

/// Cut every positive arrow down to the flow that was actually realized and
/// push the difference, scaled by density, onto whatever the arrow points
/// at. A fifth of the force dissipates inside fluid; arrows into walls press
/// back on their own cell.
fn reconcile<P: Scalar, V: Scalar, VF: Scalar>(sim: &mut Simulation<P, V, VF>) {
    let rows = sim.field.rows() as i32;
    let cols = sim.field.cols() as i32;
    for x in 0..rows {
        for y in 0..cols {
            let cell = sim.field.get(x, y);
            if cell.is_wall() {
                continue;
            }
            for (dx, dy) in DELTAS {
                let old_v = sim.velocity.get(x, y, dx, dy);
                let new_v = sim.flow.get(x, y, dx, dy);
                if !(old_v > V::zero()) {
                    continue;
                }
                debug_assert!(
                    new_v <= VF::from_scalar(old_v),
                    "realized flow exceeds velocity at ({x}, {y}) toward ({dx}, {dy})"
                );
                *sim.velocity.get_mut(x, y, dx, dy) = V::from_scalar(new_v);

                let mut force =
                    P::from_scalar(old_v - V::from_scalar(new_v)) * sim.rho(cell);
                if cell.is_fluid() {
                    force = force * P::from_f64(0.8);
                }

                let (nx, ny) = (x + dx, y + dy);
                if sim.field.get(nx, ny).is_wall() {
                    let i = sim.idx(x, y);
                    sim.pressure[i] =
                        sim.pressure[i] + force / P::from_int(sim.open_dirs[i] as i64);
                } else {
                    let ni = sim.idx(nx, ny);
                    sim.pressure[ni] =
                        sim.pressure[ni] + force / P::from_int(sim.open_dirs[ni] as i64);
                }
            }
        }
    }
}
