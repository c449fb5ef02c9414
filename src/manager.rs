use crate::analysis::{Analyzer, log_correlations};
use crate::config::Config;
use crate::loader::{self, BoundingBox};
use anyhow::{Context, Result, bail};
use glob::glob;
use std::{
    fs,
    path::{Path, PathBuf},
};

const CONFIG_FILE: &str = "config.toml";
const RAW_PATTERN: &str = "data_raw*.csv";
const TABLE_FILE: &str = "data_formatted.msgpack";
const REPORT_FILE: &str = "results.toml";
const TREND_FILE: &str = "trend.csv";
const OFFSETS_FILE: &str = "offsets.csv";

pub struct Manager {
    data_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();

        let cfg = Config::from_file(data_dir.join(CONFIG_FILE)).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { data_dir, cfg })
    }

    /// Clean and filter the raw exports into the formatted table.
    pub fn format_data(&self) -> Result<()> {
        let raw_files = self.raw_files().context("failed to collect raw files")?;
        if raw_files.is_empty() {
            bail!("no file matches {RAW_PATTERN:?} in {:?}", self.data_dir);
        }

        let raw = loader::load_raw(&raw_files).context("failed to load raw data")?;
        let entries = loader::clean(raw).context("failed to clean raw data")?;
        log::info!("summary before location filter:");
        loader::describe(&entries);

        let bbox = BoundingBox::new(&self.cfg.filter);
        let entries = loader::filter(entries, &bbox);
        log::info!("summary after location filter:");
        loader::describe(&entries);

        let table_file = self.table_file();
        loader::save_table(&entries, &table_file)
            .with_context(|| format!("failed to save {table_file:?}"))?;
        log::info!("saved {table_file:?}");

        Ok(())
    }

    /// Smooth, summarize and correlate the formatted table.
    pub fn analyze_data(&self) -> Result<()> {
        let table_file = self.table_file();
        if !table_file.is_file() {
            bail!("{table_file:?} does not exist, run format first");
        }
        let entries = loader::load_table(&table_file)
            .with_context(|| format!("failed to load {table_file:?}"))?;

        let analyzer = Analyzer::new(self.cfg.clone(), &entries);
        log::info!("analyzing {} samples", analyzer.samples().len());
        let report = analyzer.report();
        log_correlations(&report.correlations);

        analyzer
            .save_report(&report, self.data_dir.join(REPORT_FILE))
            .context("failed to save report")?;
        analyzer
            .save_trends(self.data_dir.join(TREND_FILE))
            .context("failed to save trends")?;
        analyzer
            .save_offsets(self.data_dir.join(OFFSETS_FILE))
            .context("failed to save offsets")?;

        Ok(())
    }

    /// Remove every generated file.
    pub fn clean_data(&self) -> Result<()> {
        for name in [TABLE_FILE, REPORT_FILE, TREND_FILE, OFFSETS_FILE] {
            let file = self.data_dir.join(name);
            if !file.exists() {
                continue;
            }
            fs::remove_file(&file).with_context(|| format!("failed to remove {file:?}"))?;
            log::info!("removed {file:?}");
        }
        Ok(())
    }

    fn raw_files(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.data_dir.join(RAW_PATTERN);
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let mut files: Vec<_> = glob(pattern)
            .context("failed to glob raw files")?
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .collect();
        files.sort();
        Ok(files)
    }

    fn table_file(&self) -> PathBuf {
        self.data_dir.join(TABLE_FILE)
    }
}
