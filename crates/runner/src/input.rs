//! Scene loading.
//!
//! `input.txt` carries an `N M` header, N grid rows of M cells (a trailing
//! sentinel column is tolerated), then `rho_air`, `rho_fluid`, and `g` as
//! the remaining whitespace-separated tokens. An optional `run.json` next
//! to it overrides tick count, save cadence, and seed.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sim2d::{FieldGrid, SimConfig};

#[derive(Debug)]
pub struct Scene {
    pub field: FieldGrid,
    pub config: SimConfig,
}

pub fn load_scene(path: &Path) -> Result<Scene> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    let mut scene = parse_scene(&text)?;
    apply_overrides(&mut scene.config, path)?;
    Ok(scene)
}

fn parse_scene(text: &str) -> Result<Scene> {
    let mut lines = text.lines();
    let header = lines.next().context("missing size header")?;
    let mut head = header.split_whitespace();
    let rows: usize = head
        .next()
        .context("missing row count")?
        .parse()
        .context("bad row count")?;
    let cols: usize = head
        .next()
        .context("missing column count")?
        .parse()
        .context("bad column count")?;

    let grid: Vec<&str> = lines.by_ref().take(rows).collect();
    if grid.len() != rows {
        bail!("expected {rows} grid rows, found {}", grid.len());
    }
    let field = FieldGrid::from_lines(&grid, cols)?;

    let mut tail = lines.flat_map(str::split_whitespace);
    let rho_air: f64 = tail
        .next()
        .context("missing rho_air")?
        .parse()
        .context("bad rho_air")?;
    let rho_fluid: i64 = tail
        .next()
        .context("missing rho_fluid")?
        .parse()
        .context("bad rho_fluid")?;
    let g: f64 = tail.next().context("missing g")?.parse().context("bad g")?;

    let config = SimConfig {
        rho_air,
        rho_fluid,
        g,
        ..SimConfig::default()
    };
    Ok(Scene { field, config })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunOverrides {
    max_ticks: Option<usize>,
    save_rate: Option<usize>,
    seed: Option<u64>,
}

/// Merge `run.json` (sitting next to the input file) into the config, when
/// present. Absence is not an error; a malformed file is.
fn apply_overrides(config: &mut SimConfig, input: &Path) -> Result<()> {
    let path = input.with_file_name("run.json");
    let Ok(text) = fs::read_to_string(&path) else {
        return Ok(());
    };
    let overrides: RunOverrides =
        serde_json::from_str(&text).with_context(|| format!("malformed {}", path.display()))?;
    if let Some(max_ticks) = overrides.max_ticks {
        config.max_ticks = max_ticks;
    }
    if let Some(save_rate) = overrides.save_rate {
        config.save_rate = save_rate;
    }
    if let Some(seed) = overrides.seed {
        config.seed = seed;
    }
    log::info!("applied overrides from {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "3 4\n####\n#. #\n####\n0.01\n1000\n0.1\n";

    #[test]
    fn parses_a_complete_scene() {
        let scene = parse_scene(GOOD).unwrap();
        assert_eq!(scene.field.rows(), 3);
        assert_eq!(scene.field.cols(), 4);
        assert_eq!(scene.field.fluid_count(), 1);
        assert_eq!(scene.config.rho_air, 0.01);
        assert_eq!(scene.config.rho_fluid, 1000);
        assert_eq!(scene.config.g, 0.1);
        // Run parameters come from the defaults.
        assert_eq!(scene.config.max_ticks, 5000);
        assert_eq!(scene.config.save_rate, 100);
    }

    #[test]
    fn accepts_numbers_on_one_line() {
        let scene = parse_scene("3 3\n###\n#.#\n###\n0.5 10 2.0\n").unwrap();
        assert_eq!(scene.config.rho_air, 0.5);
        assert_eq!(scene.config.rho_fluid, 10);
        assert_eq!(scene.config.g, 2.0);
    }

    #[test]
    fn rejects_truncated_grids() {
        let err = parse_scene("3 4\n####\n#. #\n").unwrap_err();
        assert!(err.to_string().contains("expected 3 grid rows"));
    }

    #[test]
    fn rejects_missing_numbers() {
        let err = parse_scene("3 4\n####\n#. #\n####\n0.01\n").unwrap_err();
        assert!(err.to_string().contains("missing rho_fluid"));
    }

    #[test]
    fn rejects_bad_header() {
        let err = parse_scene("x y\n").unwrap_err();
        assert!(err.to_string().contains("bad row count"));
    }

    #[test]
    fn surfaces_field_validation_errors() {
        let err = parse_scene("3 4\n####\n#.x#\n####\n0.01 1000 0.1\n").unwrap_err();
        assert!(err.to_string().contains("unsupported cell"));
    }
}
