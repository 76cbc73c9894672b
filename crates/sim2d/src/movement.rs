//! Randomized particle migration (phase 4) and its stop helpers.

use crate::numeric::Scalar;
use crate::vector_field::DELTAS;
use crate::Simulation;

/// Phase 4 driver. Every cell not yet stamped this pass either attempts a
/// randomized migration, gated on its outgoing velocity mass, or is stopped
/// in place. Returns whether any gate fired.
pub(crate) fn advance<P: Scalar, V: Scalar, VF: Scalar>(sim: &mut Simulation<P, V, VF>) -> bool {
    sim.generation += 2;

    let rows = sim.field.rows() as i32;
    let cols = sim.field.cols() as i32;
    let mut moved = false;
    for x in 0..rows {
        for y in 0..cols {
            if sim.field.get(x, y).is_wall() {
                continue;
            }
            if sim.last_seen[sim.idx(x, y)] == sim.generation {
                continue;
            }
            let gate = move_prob(sim, x, y);
            if P::rand01(&mut sim.rng) < gate {
                moved = true;
                propagate_move(sim, x, y, true);
            } else {
                propagate_stop(sim, x, y, true);
            }
        }
    }
    moved
}

/// Sum of outgoing non-negative velocities toward fresh, non-wall
/// neighbors. Deliberately not normalized: a sum above one always passes
/// the migration gate, which is how dense fluid ends up moving every tick.
fn move_prob<P: Scalar, V: Scalar, VF: Scalar>(sim: &Simulation<P, V, VF>, x: i32, y: i32) -> P {
    let mut sum = P::zero();
    for (dx, dy) in DELTAS {
        let (nx, ny) = (x + dx, y + dy);
        if sim.field.get(nx, ny).is_wall() {
            continue;
        }
        if sim.last_seen[sim.idx(nx, ny)] == sim.generation {
            continue;
        }
        let v = sim.velocity.get(x, y, dx, dy);
        if v < V::zero() {
            continue;
        }
        sum = sum + P::from_scalar(v);
    }
    sum
}

/// Mark `(x, y)` stopped and spread the stop through neighbors with no
/// outgoing positive velocity left. Without `force`, the cell first checks
/// whether it still pushes toward any neighbor this pass hasn't settled; if
/// it does, it stays unstamped and a later visit may look again.
fn propagate_stop<P: Scalar, V: Scalar, VF: Scalar>(
    sim: &mut Simulation<P, V, VF>,
    x: i32,
    y: i32,
    force: bool,
) {
    if !force {
        let mut stop = true;
        for (dx, dy) in DELTAS {
            let (nx, ny) = (x + dx, y + dy);
            if !sim.field.get(nx, ny).is_wall()
                && sim.last_seen[sim.idx(nx, ny)] < sim.generation - 1
                && sim.velocity.get(x, y, dx, dy) > V::zero()
            {
                stop = false;
                break;
            }
        }
        if !stop {
            return;
        }
    }
    let i = sim.idx(x, y);
    sim.last_seen[i] = sim.generation;
    for (dx, dy) in DELTAS {
        let (nx, ny) = (x + dx, y + dy);
        if sim.field.get(nx, ny).is_wall()
            || sim.last_seen[sim.idx(nx, ny)] == sim.generation
            || sim.velocity.get(x, y, dx, dy) > V::zero()
        {
            continue;
        }
        propagate_stop(sim, nx, ny, false);
    }
}

/// Randomized depth-first relocation from `(x, y)`.
///
/// Directions are drawn in proportion to their outgoing velocity via a
/// prefix-sum table. A draw that lands on a neighbor already on the stack
/// closes the path; otherwise the walk recurses and, on failure, redraws
/// among the directions that remain. Once a path exists, cell state moves
/// along it pairwise: character, pressure, and the velocity 4-vector swap
/// as one unit.
fn propagate_move<P: Scalar, V: Scalar, VF: Scalar>(
    sim: &mut Simulation<P, V, VF>,
    x: i32,
    y: i32,
    is_first: bool,
) -> bool {
    let i = sim.idx(x, y);
    sim.last_seen[i] = sim.generation - if is_first { 1 } else { 0 };

    let mut landed = None;
    loop {
        let mut thresholds = [P::zero(); 4];
        let mut sum = P::zero();
        for (d, (dx, dy)) in DELTAS.into_iter().enumerate() {
            let (cx, cy) = (x + dx, y + dy);
            if sim.field.get(cx, cy).is_wall()
                || sim.last_seen[sim.idx(cx, cy)] == sim.generation
            {
                thresholds[d] = sum;
                continue;
            }
            let v = sim.velocity.get(x, y, dx, dy);
            if v < V::zero() {
                thresholds[d] = sum;
                continue;
            }
            sum = sum + P::from_scalar(v);
            thresholds[d] = sum;
        }

        if sum == P::zero() {
            break;
        }

        let pick = P::rand01(&mut sim.rng) * sum;
        let d = thresholds.partition_point(|&t| t <= pick);
        let (dx, dy) = DELTAS[d];
        let (nx, ny) = (x + dx, y + dy);
        debug_assert!(
            sim.velocity.get(x, y, dx, dy) > V::zero()
                && !sim.field.get(nx, ny).is_wall()
                && sim.last_seen[sim.idx(nx, ny)] < sim.generation,
            "drew an unusable direction at ({x}, {y})"
        );

        if sim.last_seen[sim.idx(nx, ny)] == sim.generation - 1
            || propagate_move(sim, nx, ny, false)
        {
            landed = Some((nx, ny));
            break;
        }
        // The failed neighbor is stamped now; redraw among the rest.
    }

    sim.last_seen[i] = sim.generation;
    for (dx, dy) in DELTAS {
        let (cx, cy) = (x + dx, y + dy);
        if !sim.field.get(cx, cy).is_wall()
            && sim.last_seen[sim.idx(cx, cy)] < sim.generation - 1
            && sim.velocity.get(x, y, dx, dy) < V::zero()
        {
            propagate_stop(sim, cx, cy, false);
        }
    }
    if let Some(target) = landed {
        if !is_first {
            exchange(sim, (x, y), target);
        }
    }
    landed.is_some()
}

/// Exchange the full cell state — character, pressure, and the velocity
/// 4-vector — between two cells, leaving everything else in place.
fn exchange<P: Scalar, V: Scalar, VF: Scalar>(
    sim: &mut Simulation<P, V, VF>,
    a: (i32, i32),
    b: (i32, i32),
) {
    sim.field.swap(a, b);
    let (ia, ib) = (sim.idx(a.0, a.1), sim.idx(b.0, b.1));
    sim.pressure.swap(ia, ib);
    sim.velocity.swap_cells(a, b);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cell, FieldGrid, SimConfig};

    fn sim_with(lines: &[&str]) -> Simulation<f64, f64, f64> {
        let field = FieldGrid::from_lines(lines, lines[0].len()).unwrap();
        Simulation::new(field, SimConfig::default())
    }

    #[test]
    fn move_prob_sums_only_usable_directions() {
        let mut sim = sim_with(&["####", "#  #", "#  #", "####"]);
        sim.generation = 2;
        *sim.velocity.get_mut(1, 1, 1, 0) = 0.5;
        *sim.velocity.get_mut(1, 1, 0, 1) = 0.25;
        *sim.velocity.get_mut(1, 1, -1, 0) = 3.0; // toward a wall
        assert_eq!(move_prob(&sim, 1, 1), 0.75);
        // Negative arrows contribute nothing.
        *sim.velocity.get_mut(1, 1, 0, 1) = -0.25;
        assert_eq!(move_prob(&sim, 1, 1), 0.5);
        // A neighbor stamped this pass is out of the running.
        let below = sim.idx(2, 1);
        sim.last_seen[below] = 2;
        assert_eq!(move_prob(&sim, 1, 1), 0.0);
    }

    #[test]
    fn forced_stop_stamps_and_spreads_through_still_cells() {
        let mut sim = sim_with(&["####", "#  #", "#  #", "####"]);
        sim.generation = 2;
        propagate_stop(&mut sim, 1, 1, true);
        // No velocities anywhere: the stop floods the whole open region.
        for x in 1..=2 {
            for y in 1..=2 {
                assert_eq!(sim.last_seen_at(x, y), 2);
            }
        }
    }

    #[test]
    fn stop_does_not_cross_outgoing_velocity() {
        // A corridor where the middle cell still pushes rightward: the stop
        // stamps the start, then stalls — the middle stays live and shields
        // everything past it.
        let mut sim = sim_with(&["#####", "#   #", "#####"]);
        sim.generation = 2;
        *sim.velocity.get_mut(1, 2, 0, 1) = 1.0;
        propagate_stop(&mut sim, 1, 1, true);
        assert_eq!(sim.last_seen_at(1, 1), 2);
        assert_eq!(sim.last_seen_at(1, 2), 0);
        assert_eq!(sim.last_seen_at(1, 3), 0);
    }

    #[test]
    fn move_with_no_outgoing_velocity_fails_in_place() {
        let mut sim = sim_with(&["####", "#. #", "#  #", "####"]);
        sim.generation = 2;
        let moved = propagate_move(&mut sim, 1, 1, true);
        assert!(!moved);
        assert_eq!(sim.field().get(1, 1), Cell::Fluid);
        assert_eq!(sim.last_seen_at(1, 1), 2);
    }

    #[test]
    fn opposed_arrows_swap_the_pair() {
        // Fluid pushing down onto air that pushes back up: the walk steps
        // into the air cell, whose draw lands back on the stacked start —
        // the cycle closes and the pair exchanges.
        let mut sim = sim_with(&["###", "#.#", "# #", "###"]);
        sim.generation = 2;
        *sim.velocity.get_mut(1, 1, 1, 0) = 1.0;
        *sim.velocity.get_mut(2, 1, -1, 0) = 1.0;
        let i = sim.idx(1, 1);
        sim.pressure[i] = 4.0;
        let moved = propagate_move(&mut sim, 1, 1, true);
        assert!(moved);
        assert_eq!(sim.field().get(1, 1), Cell::Air);
        assert_eq!(sim.field().get(2, 1), Cell::Fluid);
        // Pressure and the velocity row travelled with the particle.
        assert_eq!(sim.pressure_at(2, 1), 4.0);
        assert_eq!(sim.velocity_at(2, 1, 1, 0), 1.0);
        assert_eq!(sim.velocity_at(1, 1, 1, 0), 0.0);
    }

    #[test]
    fn exchange_swaps_all_three_arrays() {
        let mut sim = sim_with(&["####", "#. #", "#  #", "####"]);
        let i = sim.idx(1, 1);
        sim.pressure[i] = 7.0;
        *sim.velocity.get_mut(1, 1, 0, 1) = 2.0;
        exchange(&mut sim, (1, 1), (2, 2));
        assert_eq!(sim.field().get(1, 1), Cell::Air);
        assert_eq!(sim.field().get(2, 2), Cell::Fluid);
        assert_eq!(sim.pressure_at(2, 2), 7.0);
        assert_eq!(sim.pressure_at(1, 1), 0.0);
        assert_eq!(sim.velocity_at(2, 2, 0, 1), 2.0);
        assert_eq!(sim.velocity_at(1, 1, 0, 1), 0.0);
    }
}
