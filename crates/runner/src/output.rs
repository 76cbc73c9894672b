//! Console report and the periodic dump file.

use std::fs;
use std::path::PathBuf;
use std::process;

use sim2d::{FieldGrid, Observer, Scalar, Snapshot};

/// Prints every moved tick to stdout and rewrites the dump file on each
/// snapshot. A dump that cannot be written is reported to stderr and ends
/// the process on the spot — a run that silently stops saving state would
/// look healthy for thousands of ticks.
pub struct ConsoleAndDump {
    dump_path: PathBuf,
}

impl ConsoleAndDump {
    pub fn new(dump_path: impl Into<PathBuf>) -> Self {
        Self {
            dump_path: dump_path.into(),
        }
    }
}

impl<P: Scalar, V: Scalar> Observer<P, V> for ConsoleAndDump {
    fn on_move(&mut self, tick: usize, field: &FieldGrid) {
        println!("Tick {tick}:");
        for line in field.lines() {
            println!("{line}");
        }
    }

    fn on_snapshot(&mut self, _tick: usize, snapshot: &Snapshot<'_, P, V>) {
        if let Err(err) = fs::write(&self.dump_path, render_dump(snapshot)) {
            eprintln!("error writing {}: {err}", self.dump_path.display());
            process::exit(1);
        }
    }
}

/// The dump format: size header, grid rows, then the three physical
/// parameters one per line.
pub fn render_dump<P: Scalar, V: Scalar>(snapshot: &Snapshot<'_, P, V>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", snapshot.rows, snapshot.cols));
    for line in snapshot.field.lines() {
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(&format!(
        "{}\n{}\n{}\n",
        snapshot.rho_air, snapshot.rho_fluid, snapshot.g
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim2d::{FieldGrid, Fixed32, SimConfig, Simulation};

    #[test]
    fn dump_matches_the_input_format() {
        let field = FieldGrid::from_lines(&["####", "#. #", "####"], 4).unwrap();
        let sim: Simulation<f32, f32, Fixed32<15>> =
            Simulation::new(field, SimConfig::default());
        let rendered = render_dump(&sim.snapshot());
        assert_eq!(rendered, "3 4\n####\n#. #\n####\n0.01\n1000\n0.1\n");
    }

    #[test]
    fn fixed_point_parameters_print_as_real_values() {
        let field = FieldGrid::from_lines(&["###", "# #", "###"], 3).unwrap();
        let sim: Simulation<Fixed32<16>, Fixed32<16>, Fixed32<16>> = Simulation::new(
            field,
            SimConfig {
                rho_air: 0.5,
                rho_fluid: 4,
                g: 0.25,
                ..SimConfig::default()
            },
        );
        let rendered = render_dump(&sim.snapshot());
        assert!(rendered.ends_with("0.5\n4\n0.25\n"), "got: {rendered}");
    }
}
