use crate::config::FilterConfig;
use crate::model::{Entry, RawEntry};
use crate::stats::{Accumulator, AccumulatorReport};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rmp_serde::{decode, encode};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

const DATE_FORMAT: &str = "%m/%d/%Y";

/// Read the rows of every raw export, in file order then row order.
pub fn load_raw<P: AsRef<Path>>(files: &[P]) -> Result<Vec<RawEntry>> {
    let mut raw = Vec::new();
    for file in files {
        let file = file.as_ref();
        let reader = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let rows = read_raw(BufReader::new(reader))
            .with_context(|| format!("failed to read {file:?}"))?;
        log::info!("read {} rows from {file:?}", rows.len());
        raw.extend(rows.into_iter().map(|mut row| {
            row.origin.file = file.to_path_buf();
            row
        }));
    }
    Ok(raw)
}

/// Read the rows of one export. Rows may omit trailing empty fields.
pub fn read_raw<R: Read>(reader: R) -> Result<Vec<RawEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    reader
        .deserialize::<RawEntry>()
        .enumerate()
        .map(|(i_row, row)| {
            let mut row = row.with_context(|| format!("failed to deserialize row {i_row}"))?;
            row.origin.row = i_row;
            Ok(row)
        })
        .collect()
}

/// Drop rows without a date or location and parse the remaining dates.
///
/// # Errors
/// Returns an error if a date is not in `MM/DD/YYYY` form.
pub fn clean(raw: Vec<RawEntry>) -> Result<Vec<Entry>> {
    let n_raw = raw.len();
    let mut entries = Vec::with_capacity(n_raw);
    for row in raw {
        let (Some(date), Some(latitude), Some(longitude)) = (row.date, row.latitude, row.longitude)
        else {
            continue;
        };
        if date.is_empty() {
            continue;
        }
        let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .with_context(|| format!("invalid date {date:?} in {}", row.origin))?;

        entries.push(Entry {
            date,
            latitude,
            longitude,
            miles: row.miles,
            car_mpg: row.car_mpg,
            real_mpg: row.real_mpg,
            notes: row.notes.filter(|notes| !notes.is_empty()),
        });
    }
    log::info!("dropped {} rows without date or location", n_raw - entries.len());
    Ok(entries)
}

/// Rectangular latitude/longitude range with exclusive bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
}

impl BoundingBox {
    pub fn new(cfg: &FilterConfig) -> Self {
        Self {
            lat_min: cfg.lat_min,
            lat_max: cfg.lat_max,
            lon_min: cfg.lon_min,
            lon_max: cfg.lon_max,
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.lat_min < lat && lat < self.lat_max && self.lon_min < lon && lon < self.lon_max
    }
}

/// Keep the entries located inside `bbox`.
pub fn filter(entries: Vec<Entry>, bbox: &BoundingBox) -> Vec<Entry> {
    let n_entries = entries.len();
    let kept: Vec<_> = entries
        .into_iter()
        .filter(|entry| bbox.contains(entry.latitude, entry.longitude))
        .collect();
    log::info!("kept {} of {n_entries} entries inside {bbox:?}", kept.len());
    kept
}

pub fn save_table<P: AsRef<Path>>(entries: &[Entry], file: P) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);
    encode::write(&mut writer, entries).context("failed to serialize entries")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

pub fn load_table<P: AsRef<Path>>(file: P) -> Result<Vec<Entry>> {
    let file = file.as_ref();
    let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    let mut reader = BufReader::new(file);
    let entries = decode::from_read(&mut reader).context("failed to deserialize entries")?;
    Ok(entries)
}

/// Log and return a per-column summary of `entries`.
pub fn describe(entries: &[Entry]) -> Vec<(&'static str, AccumulatorReport)> {
    log::info!("entries: {}", entries.len());
    if let (Some(first), Some(last)) = (
        entries.iter().map(|entry| entry.date).min(),
        entries.iter().map(|entry| entry.date).max(),
    ) {
        log::info!("dates: {first} .. {last}");
    }

    let columns: [(&'static str, fn(&Entry) -> Option<f64>); 5] = [
        ("latitude", |entry| Some(entry.latitude)),
        ("longitude", |entry| Some(entry.longitude)),
        ("miles", |entry| entry.miles),
        ("car_mpg", |entry| entry.car_mpg),
        ("real_mpg", |entry| entry.real_mpg),
    ];
    columns
        .into_iter()
        .map(|(name, column)| {
            let report = entries.iter().filter_map(column).collect::<Accumulator>().report();
            log::info!("{name}: {report:?}");
            (name, report)
        })
        .collect()
}
