//! Download command handler

use std::path::PathBuf;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::artifacts::interactive::InteractiveFormat;
use crate::artifacts::ArtifactType;
use crate::config::Config;
use crate::error::{NlmError, Result};

#[allow(clippy::too_many_arguments)]
pub async fn run_download(
    config: &Config,
    profile: Option<&str>,
    notebook: &str,
    artifact_type: &str,
    output: Option<PathBuf>,
    artifact_id: Option<&str>,
    format: &str,
) -> Result<()> {
    let artifact_type = ArtifactType::parse(artifact_type).ok_or_else(|| {
        NlmError::Validation(format!(
            "Unknown artifact type '{}'. Valid types: {}",
            artifact_type,
            ArtifactType::ALL
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    })?;
    let output_format = InteractiveFormat::parse(format).ok_or_else(|| {
        NlmError::Validation(format!(
            "Invalid output format '{}'. Valid formats: json, markdown, html",
            format
        ))
    })?;

    let output_path = output.unwrap_or_else(|| {
        let extension = if artifact_type.is_interactive() {
            output_format.extension()
        } else {
            artifact_type.default_extension()
        };
        let mut path = config
            .download
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        path.push(format!("{}.{}", artifact_type.as_str(), extension));
        path
    });

    let client = super::build_client(config, profile)?;

    let result = if artifact_type.is_streaming() {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner} [{bar:40}] {bytes}/{total_bytes} ({bytes_per_sec})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        let mut update = |downloaded: u64, total: u64| {
            if total > 0 && bar.length() != Some(total) {
                bar.set_length(total);
            }
            bar.set_position(downloaded);
        };
        let result = client
            .download_artifact(
                notebook,
                artifact_type,
                &output_path,
                artifact_id,
                output_format,
                Some(&mut update),
            )
            .await;
        bar.finish_and_clear();
        result?
    } else {
        client
            .download_artifact(
                notebook,
                artifact_type,
                &output_path,
                artifact_id,
                output_format,
                None,
            )
            .await?
    };

    println!(
        "{} Downloaded {} to {}",
        "ok".green().bold(),
        result.artifact_type.as_str(),
        result.path.display()
    );
    Ok(())
}
