//! 2D cellular fluid simulation.
//!
//! A discrete-time solver over a rectangular grid of walls (`#`), fluid
//! (`.`), and air (space). Each tick runs four phases in strict order:
//!
//! 1. Gravity injection into every open downward arrow
//! 2. Pressure-driven velocity correction against the previous tick's
//!    pressures
//! 3. Recursive flow propagation with cycle detection, then folding
//!    unrealized velocity back into pressure
//! 4. Randomized particle migration, weighted by outgoing velocity
//!
//! Pressure, velocity, and flow are three independent scalar slots; each can
//! be a native float or a Q-format fixed-point type, mixed freely.
//!
//! # Example
//!
//! ```
//! use sim2d::{FieldGrid, Fixed32, SimConfig, Simulation};
//!
//! let field = FieldGrid::from_lines(&[
//!     "####",
//!     "#. #",
//!     "#  #",
//!     "####",
//! ], 4).unwrap();
//!
//! let mut sim: Simulation<f32, Fixed32<16>, Fixed32<15>> =
//!     Simulation::new(field, SimConfig::default());
//! sim.tick();
//! ```
//!
//! This crate is presentation-agnostic — it owns the solver only. The
//! `runner` crate layers the text input format, the periodic dump file, and
//! the console report on top of the [`Observer`] seam.

pub mod config;
pub mod grid;
pub mod numeric;
pub mod vector_field;

mod flow;
mod movement;
mod pressure;

pub use config::{SimConfig, DEFAULT_SEED, MAX_TICKS, SAVE_RATE};
pub use grid::{Cell, FieldError, FieldGrid};
pub use numeric::{Fixed, Fixed16, Fixed32, Fixed64, Fixed8, Scalar, Storage};
pub use vector_field::{delta_index, DirField, DELTAS};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Read-only dump view handed to [`Observer::on_snapshot`].
pub struct Snapshot<'a, P, V> {
    pub rows: usize,
    pub cols: usize,
    pub field: &'a FieldGrid,
    pub rho_air: P,
    pub rho_fluid: P,
    pub g: V,
}

/// Sink for the run loop's two event streams: ticks that moved something,
/// and the periodic state snapshot.
pub trait Observer<P: Scalar, V: Scalar> {
    /// Called after any tick whose migration phase fired.
    fn on_move(&mut self, tick: usize, field: &FieldGrid) {
        let _ = (tick, field);
    }

    /// Called every `save_rate` ticks, starting with tick 0.
    fn on_snapshot(&mut self, tick: usize, snapshot: &Snapshot<'_, P, V>) {
        let _ = (tick, snapshot);
    }
}

/// Headless runs observe nothing.
impl<P: Scalar, V: Scalar> Observer<P, V> for () {}

/// The simulation state: field, pressure, directional velocity and flow,
/// plus the generation bookkeeping the propagation kernels key on.
///
/// `P` is the pressure scalar, `V` the velocity scalar, `VF` the per-tick
/// flow scalar.
pub struct Simulation<P: Scalar, V: Scalar, VF: Scalar> {
    pub(crate) field: FieldGrid,
    pub(crate) pressure: Vec<P>,
    pub(crate) old_pressure: Vec<P>,
    pub(crate) velocity: DirField<V>,
    pub(crate) flow: DirField<VF>,
    /// Non-wall neighbor count per cell; divisor when force spreads back
    /// into pressure.
    pub(crate) open_dirs: Vec<i32>,
    /// Generation stamp per cell. Within a pass, `generation` means done
    /// and `generation - 1` means on the recursion stack.
    pub(crate) last_seen: Vec<i64>,
    /// Advances by 2 per propagation pass so the two in-pass stamp values
    /// never collide with an older pass.
    pub(crate) generation: i64,
    pub(crate) rho_air: P,
    pub(crate) rho_fluid: P,
    pub(crate) gravity: V,
    pub(crate) rng: ChaCha8Rng,
    config: SimConfig,
}

impl<P: Scalar, V: Scalar, VF: Scalar> Simulation<P, V, VF> {
    pub fn new(field: FieldGrid, config: SimConfig) -> Self {
        let cells = field.rows() * field.cols();
        let open_dirs = field.open_neighbor_counts();
        Self {
            pressure: vec![P::zero(); cells],
            old_pressure: vec![P::zero(); cells],
            velocity: DirField::new(field.rows(), field.cols()),
            flow: DirField::new(field.rows(), field.cols()),
            open_dirs,
            last_seen: vec![0; cells],
            generation: 0,
            rho_air: P::from_f64(config.rho_air),
            rho_fluid: P::from_int(config.rho_fluid),
            gravity: V::from_f64(config.g),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            field,
            config,
        }
    }

    /// Like [`Simulation::new`], but the expected grid size is pinned at
    /// compile time and a differently-sized field is rejected.
    pub fn with_static_size<const ROWS: usize, const COLS: usize>(
        field: FieldGrid,
        config: SimConfig,
    ) -> Result<Self, FieldError> {
        if field.rows() != ROWS || field.cols() != COLS {
            return Err(FieldError::SizeMismatch {
                rows: field.rows(),
                cols: field.cols(),
                expected_rows: ROWS,
                expected_cols: COLS,
            });
        }
        Ok(Self::new(field, config))
    }

    // ========== Accessors ==========

    #[inline]
    pub fn field(&self) -> &FieldGrid {
        &self.field
    }

    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The global generation counter.
    #[inline]
    pub fn generation(&self) -> i64 {
        self.generation
    }

    #[inline]
    pub fn pressure_at(&self, x: i32, y: i32) -> P {
        self.pressure[self.idx(x, y)]
    }

    #[inline]
    pub fn velocity_at(&self, x: i32, y: i32, dx: i32, dy: i32) -> V {
        self.velocity.get(x, y, dx, dy)
    }

    /// Generation stamp of one cell.
    #[inline]
    pub fn last_seen_at(&self, x: i32, y: i32) -> i64 {
        self.last_seen[self.idx(x, y)]
    }

    /// Current dump view.
    pub fn snapshot(&self) -> Snapshot<'_, P, V> {
        Snapshot {
            rows: self.field.rows(),
            cols: self.field.cols(),
            field: &self.field,
            rho_air: self.rho_air,
            rho_fluid: self.rho_fluid,
            g: self.gravity,
        }
    }

    #[inline]
    pub(crate) fn idx(&self, x: i32, y: i32) -> usize {
        x as usize * self.field.cols() + y as usize
    }

    /// Density of a cell's material. Walls have none; kernels never ask.
    #[inline]
    pub(crate) fn rho(&self, cell: Cell) -> P {
        match cell {
            Cell::Air => self.rho_air,
            Cell::Fluid => self.rho_fluid,
            Cell::Wall => P::zero(),
        }
    }

    // ========== Stepping ==========

    /// Advance one tick. Returns whether the migration phase fired.
    pub fn tick(&mut self) -> bool {
        pressure::apply_gravity(self);
        pressure::apply_pressure_forces(self);
        flow::redistribute(self);
        movement::advance(self)
    }

    /// Run the configured number of ticks, reporting moved ticks and
    /// periodic snapshots to `observer`.
    pub fn run<O: Observer<P, V>>(&mut self, observer: &mut O) {
        log::info!(
            "running {}x{} field for {} ticks (seed {})",
            self.field.rows(),
            self.field.cols(),
            self.config.max_ticks,
            self.config.seed
        );
        let mut moved_ticks = 0usize;
        for tick in 0..self.config.max_ticks {
            if self.tick() {
                moved_ticks += 1;
                observer.on_move(tick, &self.field);
            }
            if self.config.save_rate != 0 && tick % self.config.save_rate == 0 {
                observer.on_snapshot(tick, &self.snapshot());
            }
        }
        log::info!(
            "finished: {} of {} ticks moved, generation {}",
            moved_ticks,
            self.config.max_ticks,
            self.generation
        );
    }
}
