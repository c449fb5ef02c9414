use std::{env, fs, path::PathBuf, process::Command};

fn run_bin(args: &[&str]) -> bool {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_mpgtrend"));

    let output = Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command");

    if !output.status.success() {
        let stderr_str = String::from_utf8_lossy(&output.stderr);
        eprintln!("binary failed with {args:?}\nstderr:\n{stderr_str}\n");
    }
    output.status.success()
}

fn setup_dir(name: &str) -> PathBuf {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let config_contents = String::new()
        + "[filter]\n"
        + "lat_min = 41.3\n"
        + "lat_max = 42.2\n"
        + "lon_min = -94.0\n"
        + "lon_max = -93.0\n"
        + "\n"
        + "[smoothing]\n"
        + "window_radius = 2\n"
        + "\n"
        + "[correlation]\n"
        + "shift_days = 91\n"
        + "shift_months = 3\n"
        + "\n"
        + "[histogram]\n"
        + "n_bins = 10\n";
    fs::write(test_dir.join("config.toml"), config_contents).expect("failed to write config file");

    test_dir
}

fn raw_rows(year: i32, lat: f64) -> String {
    (1..=12)
        .map(|month| {
            let real = 30.0 + (month as f64 - 6.5).abs();
            let car = real + 2.0 + 0.1 * month as f64;
            format!("{month:02}/15/{year},{lat},-93.6,{},{car:.1},{real:.1},\n", 280 + month)
        })
        .collect()
}

#[test]
fn basic_workflow() {
    let test_dir = setup_dir("basic_workflow");

    let header = "Date,Latitude,Longitude,Miles,Car MPG,Real MPG,notes\n";
    let first = String::from(header)
        + &raw_rows(2014, 41.6)
        + ",41.6,-93.6,300,35.0,33.0,missing date\n"
        + "03/02/2014,,-93.6,300,35.0,33.0,missing latitude\n"
        + "05/05/2014,45.0,-93.6,300,35.0,33.0,road trip\n";
    let second = String::from(header)
        + &raw_rows(2015, 41.7)
        + "07/04/2015,41.7,-93.6,300,,33.0,display reset\n";
    fs::write(test_dir.join("data_raw_2014.csv"), first).expect("failed to write raw file");
    fs::write(test_dir.join("data_raw_2015.csv"), second).expect("failed to write raw file");

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert!(run_bin(&["--data-dir", test_dir_str, "format"]));
    assert!(test_dir.join("data_formatted.msgpack").is_file());

    assert!(run_bin(&["--data-dir", test_dir_str, "analyze"]));

    let results =
        fs::read_to_string(test_dir.join("results.toml")).expect("failed to read results");
    assert!(results.contains("n_entries = 25"));
    assert!(results.contains("n_samples = 24"));
    assert!(results.contains("year = 2014"));
    assert!(results.contains("year = 2015"));
    assert!(results.contains("day_of_year (shifted)"));

    let trend = fs::read_to_string(test_dir.join("trend.csv")).expect("failed to read trend");
    let mut lines = trend.lines();
    assert_eq!(
        lines.next(),
        Some("date,real_mpg,car_mpg,real_mpg_trend,car_mpg_trend")
    );
    let rows: Vec<_> = lines.collect();
    assert_eq!(rows.len(), 24);
    assert!(rows[0].ends_with(",,"));
    assert!(rows[1].ends_with(",,"));
    assert!(!rows[2].ends_with(",,"));
    assert!(rows[23].ends_with(",,"));

    let offsets = fs::read_to_string(test_dir.join("offsets.csv")).expect("failed to read offsets");
    assert_eq!(offsets.lines().count(), 25);

    assert!(run_bin(&["--data-dir", test_dir_str, "clean"]));
    for name in ["data_formatted.msgpack", "results.toml", "trend.csv", "offsets.csv"] {
        assert!(!test_dir.join(name).exists(), "{name} was not removed");
    }
    assert!(test_dir.join("data_raw_2014.csv").exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn analyze_requires_formatted_data() {
    let test_dir = setup_dir("analyze_requires_formatted_data");
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert!(!run_bin(&["--data-dir", test_dir_str, "analyze"]));
    assert!(!run_bin(&["--data-dir", test_dir_str, "format"]));

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn malformed_date_fails_format() {
    let test_dir = setup_dir("malformed_date_fails_format");
    let raw = String::new()
        + "Date,Latitude,Longitude,Miles,Car MPG,Real MPG\n"
        + "2015-01-15,41.6,-93.6,300,35.0,33.0\n";
    fs::write(test_dir.join("data_raw.csv"), raw).expect("failed to write raw file");
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert!(!run_bin(&["--data-dir", test_dir_str, "format"]));
    assert!(!test_dir.join("data_formatted.msgpack").exists());

    fs::remove_dir_all(&test_dir).ok();
}
