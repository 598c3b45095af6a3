//! CLI runner - executes commands

use crate::bulk::{download_bulk_data, latest_archive, BulkManifest};
use crate::cli::commands::{Cli, Commands};
use crate::config::PipelineConfig;
use crate::convert::{ConvertReport, Converter};
use crate::download::Downloader;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::output::ParquetSink;
use crate::progress::BarProgress;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::Fetch {
                url,
                dest,
                expected_size,
            } => self.fetch(&config, url, dest, *expected_size).await,
            Commands::BulkUrls { manifest } => self.bulk_urls(&config, manifest).await,
            Commands::DownloadBulk { manifest, dest } => {
                self.download_bulk(&config, manifest, dest.as_deref()).await
            }
            Commands::Convert {
                archive,
                output,
                pattern,
                batch_size,
            } => {
                self.convert(
                    &config,
                    archive.clone(),
                    output.clone(),
                    pattern.as_deref(),
                    *batch_size,
                )
                .await
            }
            Commands::ConvertLatest => self.convert_latest(&config).await,
        }
    }

    /// Load the config file, if any, and apply command-line overrides
    fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.cli.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(data_dir) = &self.cli.data_dir {
            config.data_dir.clone_from(data_dir);
        }
        Ok(config)
    }

    fn downloader(config: &PipelineConfig) -> Result<Downloader> {
        let client = HttpClient::with_config(config.http_client_config())?;
        Ok(Downloader::with_config(client, config.downloader_config()))
    }

    /// Download a single file
    async fn fetch(
        &self,
        config: &PipelineConfig,
        url: &str,
        dest: &Path,
        expected_size: Option<u64>,
    ) -> Result<()> {
        let downloader = Self::downloader(config)?;
        let path = downloader
            .fetch(url, dest, expected_size, &BarProgress::bytes())
            .await?;
        println!("{}", path.display());
        Ok(())
    }

    /// Print the bulk-download listing
    async fn bulk_urls(&self, config: &PipelineConfig, manifest: &str) -> Result<()> {
        let client = HttpClient::with_config(config.http_client_config())?;
        let manifest = BulkManifest::load(manifest, &client).await?;
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        Ok(())
    }

    /// Download every file of a listing
    async fn download_bulk(
        &self,
        config: &PipelineConfig,
        manifest: &str,
        dest: Option<&Path>,
    ) -> Result<()> {
        let downloader = Self::downloader(config)?;
        let client = HttpClient::with_config(config.http_client_config())?;
        let manifest = BulkManifest::load(manifest, &client).await?;
        let dest = dest.unwrap_or(config.data_dir.as_path());

        let start = Instant::now();
        let progress = BarProgress::bytes();
        let paths = download_bulk_data(&downloader, &manifest, dest, &progress).await?;
        info!("Downloads finished in {:.1}s", start.elapsed().as_secs_f64());

        for path in paths {
            println!("{}", path.display());
        }
        Ok(())
    }

    /// Convert one archive
    async fn convert(
        &self,
        config: &PipelineConfig,
        archive: PathBuf,
        output: PathBuf,
        pattern: Option<&str>,
        batch_size: Option<usize>,
    ) -> Result<()> {
        let mut options = config.convert_options();
        if let Some(pattern) = pattern {
            options.member_glob = pattern.to_string();
        }
        if let Some(batch_size) = batch_size {
            options.batch_size = batch_size;
        }

        let sink = ParquetSink::with_config(config.writer_config());
        let converter = Converter::with_sink(sink, options);
        let report = run_conversion(converter, archive, output).await?;
        print_report(&report);
        Ok(())
    }

    /// Convert the newest archive in the data directory
    async fn convert_latest(&self, config: &PipelineConfig) -> Result<()> {
        let archive = latest_archive(&config.data_dir, &config.convert.archive_glob)?;
        info!("Latest archive: {}", archive.display());

        let converter = Converter::with_sink(
            ParquetSink::with_config(config.writer_config()),
            config.convert_options(),
        );
        let report = run_conversion(converter, archive, config.output_dir()).await?;
        print_report(&report);
        Ok(())
    }
}

/// Run a blocking conversion off the async runtime
async fn run_conversion(
    converter: Converter<ParquetSink>,
    archive: PathBuf,
    output: PathBuf,
) -> Result<ConvertReport> {
    let start = Instant::now();
    let report = tokio::task::spawn_blocking(move || {
        converter.convert(&archive, &output, &BarProgress::items())
    })
    .await
    .map_err(|e| Error::Other(format!("Conversion task failed: {e}")))??;

    info!("Conversion finished in {:.1}s", start.elapsed().as_secs_f64());
    Ok(report)
}

fn print_report(report: &ConvertReport) {
    println!(
        "{}: {} file(s), {} row(s) from {} member(s)",
        report.output_dir.display(),
        report.batches(),
        report.total_rows(),
        report.members
    );
}
