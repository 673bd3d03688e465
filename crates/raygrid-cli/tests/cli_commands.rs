use raygrid_core::domain::{PhotonRecord, RunMetadata, SimulationRun};
use raygrid_core::modules::serialization::{read_table, write_photon_run};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const CONFIG: &str = r#"
{
  "apertures": [
    { "id": 0, "channel": "1", "area_cm2": 10.0 },
    { "id": 1, "channel": "2", "area_cm2": 30.0 }
  ],
  "channels": {
    "1": { "zero_order_x": 0.0 },
    "2": { "zero_order_x": 50.0 }
  },
  "orders": [-1, 0]
}
"#;

fn raygrid(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_raygrid"))
        .args(args)
        .env("RAYGRID_LOG", "warn")
        .output()
        .expect("raygrid binary should launch")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp paths should be utf-8")
}

fn run(energy: f64, ra: f64) -> SimulationRun {
    let photons = (0..200)
        .map(|index| {
            let aperture = (index % 2) as u32;
            let detected = index % 4 < 2;
            PhotonRecord {
                energy,
                probability: 1.0,
                aperture,
                order: detected.then_some(-1),
                ccd: if detected { 0 } else { -1 },
                det_x: -80.0 + f64::from(aperture) * 50.0 + f64::from(index % 3),
                det_y: 0.0,
            }
        })
        .collect();
    SimulationRun::new(
        RunMetadata::new().with("SATELLIT", "ARCUS").with("RA_PNT", ra),
        photons,
    )
}

fn write_inputs(temp: &TempDir, runs: &[(&str, SimulationRun)]) -> (String, String) {
    let grid = temp.path().join("grid");
    for (name, run) in runs {
        write_photon_run(grid.join(name), run).expect("grid file should be written");
    }
    let config = temp.path().join("instrument.json");
    fs::write(&config, CONFIG).expect("config should be written");
    (
        path_arg(&grid).to_string(),
        path_arg(&config).to_string(),
    )
}

#[test]
fn aggregate_then_expand_writes_table_and_csv() {
    let temp = TempDir::new().expect("tempdir should be created");
    let (grid, config) = write_inputs(
        &temp,
        &[("e_0.60.json", run(0.6, 10.0)), ("e_0.80.json", run(0.8, 10.0))],
    );
    let table_path = temp.path().join("aeff_r.json");
    let csv_path = temp.path().join("aeff4.csv");

    let output = raygrid(&[
        "aggregate",
        &grid,
        "--config",
        &config,
        "--output",
        path_arg(&table_path),
        "--parallel",
    ]);
    assert!(
        output.status.success(),
        "aggregate should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        path_arg(&table_path)
    );

    let table = read_table(&table_path).expect("table should be readable");
    assert_eq!(table.rows(), 2);
    assert_eq!(table.meta.get("ORDER_0"), Some(&Value::from(-1)));
    assert_eq!(table.meta.get("APERTURE_1"), Some(&Value::from(1)));

    let output = raygrid(&[
        "expand",
        path_arg(&table_path),
        "--column",
        "Aeff4",
        "--output",
        path_arg(&csv_path),
    ]);
    assert!(
        output.status.success(),
        "expand should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let csv = fs::read_to_string(&csv_path).expect("csv should be readable");
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("wave,order_-1,order_0"));
    // 50 of 100 photons per aperture land in order -1: 0.5 * 10 + 0.5 * 30.
    let first = lines.next().expect("first data row");
    assert!(first.ends_with(",20,0"), "unexpected row: {}", first);
    assert_eq!(lines.count(), 1);
}

#[test]
fn inconsistent_grid_exits_with_consistency_code() {
    let temp = TempDir::new().expect("tempdir should be created");
    let (grid, config) = write_inputs(
        &temp,
        &[("e_0.60.json", run(0.6, 10.0)), ("e_0.80.json", run(0.8, 11.0))],
    );
    let table_path = temp.path().join("aeff_r.json");

    let output = raygrid(&[
        "aggregate",
        &grid,
        "--config",
        &config,
        "--output",
        path_arg(&table_path),
    ]);

    assert_eq!(
        output.status.code(),
        Some(2),
        "metadata mismatch should exit with status 2, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("ERROR: [CONSISTENCY.META_MISMATCH]"),
        "stderr should carry the diagnostic, stderr: {}",
        stderr
    );
    assert!(stderr.contains("RA_PNT"));
    assert!(!table_path.exists());
}

#[test]
fn inspect_reports_counts_and_rejects_mixed_energy() {
    let temp = TempDir::new().expect("tempdir should be created");
    let good = temp.path().join("good.json");
    write_photon_run(&good, &run(0.6, 10.0)).expect("run should be written");

    let output = raygrid(&["inspect", path_arg(&good)]);
    assert!(
        output.status.success(),
        "inspect should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let summary: Value =
        serde_json::from_slice(&output.stdout).expect("inspect should print json");
    assert_eq!(summary["photons"], 200);
    assert_eq!(summary["detected"], 100);
    assert_eq!(summary["apertures"]["0"], 100);
    assert_eq!(summary["orders"]["-1"], 100);
    assert_eq!(summary["orders"]["none"], 100);

    let mut mixed = run(0.6, 10.0);
    mixed.photons[7].energy = 0.9;
    let bad = temp.path().join("mixed.json");
    write_photon_run(&bad, &mixed).expect("run should be written");

    let output = raygrid(&["inspect", path_arg(&bad)]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ENERGY.NOT_UNIFORM"));
}

#[test]
fn unreadable_config_exits_with_io_code() {
    let temp = TempDir::new().expect("tempdir should be created");
    let (grid, _) = write_inputs(&temp, &[("e_0.60.json", run(0.6, 10.0))]);
    let absent = temp.path().join("absent.json");

    let output = raygrid(&[
        "aggregate",
        &grid,
        "--config",
        path_arg(&absent),
        "--output",
        path_arg(&temp.path().join("aeff_r.json")),
    ]);

    assert_eq!(output.status.code(), Some(5));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("ERROR: [IO.CONFIG_READ]"),
        "stderr should carry the config read diagnostic, stderr: {}",
        stderr
    );
}

#[test]
fn missing_subcommand_arguments_are_usage_errors() {
    let output = raygrid(&["aggregate"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("INPUT.CLI_USAGE"));
}
