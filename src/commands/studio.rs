//! Studio command handlers

use colored::Colorize;
use prettytable::{row, Table};

use crate::cli::StudioCommand;
use crate::config::Config;
use crate::error::{NlmError, Result};
use crate::ops::studio::{
    AudioOptions, ReportFormat, StudioCreation, VideoOptions,
    INFOGRAPHIC_DETAIL_STANDARD, INFOGRAPHIC_ORIENTATION_LANDSCAPE, SLIDE_DECK_FORMAT_DETAILED,
    SLIDE_DECK_LENGTH_DEFAULT,
};

fn print_creation(kind: &str, creation: &StudioCreation) {
    println!(
        "{} Started {} generation ({}, status {})",
        "ok".green().bold(),
        kind,
        creation.artifact_id.as_deref().unwrap_or("unknown id"),
        creation.status.as_str()
    );
    println!("Poll with `nlm studio status <notebook>`; generation runs server-side.");
}

pub async fn run_studio(
    config: &Config,
    profile: Option<&str>,
    command: StudioCommand,
) -> Result<()> {
    let client = super::build_client(config, profile)?;

    match command {
        StudioCommand::Audio {
            notebook,
            focus,
            language,
        } => {
            let options = AudioOptions {
                focus_prompt: focus,
                language,
                ..Default::default()
            };
            let creation = client.create_audio_overview(&notebook, None, options).await?;
            print_creation("audio overview", &creation);
        }
        StudioCommand::Video {
            notebook,
            focus,
            language,
        } => {
            let options = VideoOptions {
                focus_prompt: focus,
                language,
                ..Default::default()
            };
            let creation = client.create_video_overview(&notebook, None, options).await?;
            print_creation("video overview", &creation);
        }
        StudioCommand::Report {
            notebook,
            format,
            prompt,
        } => {
            let report_format = ReportFormat::parse(&format).ok_or_else(|| {
                NlmError::Validation(format!(
                    "Unknown report format '{}'. Use briefing_doc, study_guide, blog_post, or custom.",
                    format
                ))
            })?;
            let creation = client
                .create_report(&notebook, None, report_format, &prompt, "en")
                .await?;
            print_creation("report", &creation);
        }
        StudioCommand::Flashcards {
            notebook,
            difficulty,
        } => {
            let creation = client.create_flashcards(&notebook, None, difficulty).await?;
            print_creation("flashcards", &creation);
        }
        StudioCommand::Quiz {
            notebook,
            questions,
            difficulty,
        } => {
            let creation = client
                .create_quiz(&notebook, None, questions, difficulty)
                .await?;
            print_creation("quiz", &creation);
        }
        StudioCommand::Infographic { notebook } => {
            let creation = client
                .create_infographic(
                    &notebook,
                    None,
                    INFOGRAPHIC_ORIENTATION_LANDSCAPE,
                    INFOGRAPHIC_DETAIL_STANDARD,
                    "en",
                    "",
                )
                .await?;
            print_creation("infographic", &creation);
        }
        StudioCommand::SlideDeck { notebook } => {
            let creation = client
                .create_slide_deck(
                    &notebook,
                    None,
                    SLIDE_DECK_FORMAT_DETAILED,
                    SLIDE_DECK_LENGTH_DEFAULT,
                    "en",
                    "",
                )
                .await?;
            print_creation("slide deck", &creation);
        }
        StudioCommand::DataTable {
            notebook,
            description,
        } => {
            let creation = client
                .create_data_table(&notebook, None, &description, "en")
                .await?;
            print_creation("data table", &creation);
        }
        StudioCommand::MindMap { notebook, title } => {
            let (document_json, _) = client.generate_mind_map(&notebook, None).await?;
            let document_json = document_json.ok_or_else(|| {
                NlmError::Service("Mind map generation returned no document".to_string())
            })?;
            let mind_map_id = client
                .save_mind_map(&notebook, &document_json, None, &title)
                .await?;
            println!(
                "{} Saved mind map '{}' ({})",
                "ok".green().bold(),
                title,
                mind_map_id.as_deref().unwrap_or("unknown id")
            );
        }
        StudioCommand::Status { notebook } => {
            let artifacts = client.poll_studio_status(&notebook).await?;
            if artifacts.is_empty() {
                println!("No studio artifacts in notebook {}.", notebook);
                return Ok(());
            }
            let mut table = Table::new();
            table.add_row(row!["ID", "TYPE", "TITLE", "STATUS"]);
            for artifact in &artifacts {
                table.add_row(row![
                    artifact.id,
                    artifact.artifact_type,
                    artifact.title,
                    artifact.status.as_str()
                ]);
            }
            table.printstd();
        }
        StudioCommand::Rm { id, notebook } => {
            let deleted = client
                .delete_studio_artifact(&id, notebook.as_deref())
                .await?;
            if deleted {
                println!("{} Deleted artifact {}", "ok".green().bold(), id);
            } else {
                println!("{} Could not delete artifact {}", "err".red().bold(), id);
            }
        }
        StudioCommand::Rename { id, title } => {
            client.rename_studio_artifact(&id, &title).await?;
            println!("{} Renamed artifact {}", "ok".green().bold(), id);
        }
    }
    Ok(())
}
