//! CLI commands: `types`, `schema`, `classify` and `scan`.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::batch::{process_batch, Batch, ItemStatus};
use crate::config::Config;
use crate::form::render_text;
use crate::gemini::{identify_document_type, GeminiClient};
use crate::image::ImageInput;
use crate::models::DocType;
use crate::progress::ProgressMode;
use crate::schema::{extraction_schema, identification_schema};

/// Prints every document type with its label.
pub fn list_types() {
    for t in DocType::ALL {
        let note = if extraction_schema(t).is_some() {
            ""
        } else {
            "  (classification only)"
        };
        println!("{:<22} {}{}", t.as_str(), t.label(), note);
    }
}

/// Prints a response schema: `identify` for the classification call, or a
/// document type for its extraction call.
pub fn print_schema(target: &str) -> Result<()> {
    let schema = if target.eq_ignore_ascii_case("identify") {
        identification_schema()
    } else {
        let doc_type: DocType = target.parse().map_err(anyhow::Error::msg)?;
        match extraction_schema(doc_type) {
            Some(schema) => schema,
            None => bail!("no extraction schema defined for type {}", doc_type),
        }
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn load_image(config: &Config, path: &Path) -> Result<ImageInput> {
    let image = ImageInput::from_path(path)?;
    image
        .validate(&config.upload)
        .with_context(|| format!("Rejected {}", path.display()))?;
    Ok(image)
}

/// Runs only the classification call for one file.
pub async fn run_classify(config: &Config, path: &Path) -> Result<()> {
    let image = load_image(config, path)?;
    let client = GeminiClient::from_config(&config.model)?;
    let doc_type = identify_document_type(&client, &image).await?;
    println!("{}\t{}\t{}", image.file_name, doc_type, doc_type.label());
    Ok(())
}

/// Runs the batch loop over `paths` and prints one result per file.
///
/// Every file is read and validated before the first model call. Returns
/// an error after printing if any item failed, so scripts see a non-zero
/// exit status.
pub async fn run_scan(
    config: &Config,
    paths: &[PathBuf],
    doc_type: Option<DocType>,
    json: bool,
    progress: ProgressMode,
) -> Result<()> {
    if paths.is_empty() {
        bail!("no files given");
    }

    let inputs = paths
        .iter()
        .map(|p| load_image(config, p))
        .collect::<Result<Vec<_>>>()?;

    let client = GeminiClient::from_config(&config.model)?;
    let mut batch = Batch::new(inputs);
    let reporter = progress.reporter();
    let summary = process_batch(&client, &mut batch, doc_type, reporter.as_ref()).await;

    if json {
        let out = serde_json::json!({
            "items": batch.items,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for item in &batch.items {
            println!("== {}", item.file_name);
            match &item.status {
                ItemStatus::Success { data } => print!("{}", render_text(data)),
                ItemStatus::Error { message } => println!("Erro: {}", message),
                ItemStatus::Pending | ItemStatus::Processing => println!("(não processado)"),
            }
            println!();
        }
        println!(
            "Scan complete: {} ok, {} failed",
            summary.success, summary.error
        );
    }

    if summary.error > 0 {
        bail!("{} of {} documents failed", summary.error, batch.len());
    }
    Ok(())
}
