//! The batch loop: classify, then extract, one queued image at a time.
//!
//! Items move through `pending → processing → (success | error)`. The
//! terminal states carry their payload inside [`ItemStatus`], so an item
//! holds either extracted data or an error message and never both.
//!
//! Processing is strictly sequential in queue order. A failed item records
//! the first error it hit and the loop continues with the next one.

use serde::Serialize;
use uuid::Uuid;

use crate::gemini::{extract_document_data, identify_document_type, ModelClient};
use crate::image::ImageInput;
use crate::models::{DocType, DocumentData};
use crate::progress::{BatchProgressEvent, BatchProgressReporter};

/// Lifecycle of one batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Processing,
    Success { data: DocumentData },
    Error { message: String },
}

impl ItemStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Success { .. } | ItemStatus::Error { .. })
    }
}

/// One uploaded file tracked through the batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    #[serde(flatten)]
    pub status: ItemStatus,
    #[serde(skip)]
    pub image: ImageInput,
}

impl BatchItem {
    pub fn new(image: ImageInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: image.file_name.clone(),
            mime_type: image.mime_type.clone(),
            status: ItemStatus::Pending,
            image,
        }
    }

    pub fn data(&self) -> Option<&DocumentData> {
        match &self.status {
            ItemStatus::Success { data } => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            ItemStatus::Error { message } => Some(message),
            _ => None,
        }
    }
}

/// Per-status counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub pending: usize,
    pub processing: usize,
    pub success: usize,
    pub error: usize,
}

/// An ordered queue of items.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Batch {
    pub items: Vec<BatchItem>,
}

impl Batch {
    pub fn new(inputs: impl IntoIterator<Item = ImageInput>) -> Self {
        Self {
            items: inputs.into_iter().map(BatchItem::new).collect(),
        }
    }

    pub fn push(&mut self, image: ImageInput) -> Uuid {
        let item = BatchItem::new(image);
        let id = item.id;
        self.items.push(item);
        id
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for item in &self.items {
            match item.status {
                ItemStatus::Pending => summary.pending += 1,
                ItemStatus::Processing => summary.processing += 1,
                ItemStatus::Success { .. } => summary.success += 1,
                ItemStatus::Error { .. } => summary.error += 1,
            }
        }
        summary
    }
}

/// Classifies and extracts one image.
///
/// With `forced_type` set the classification call is skipped and the
/// extraction is keyed by the given type.
pub async fn scan_one(
    client: &dyn ModelClient,
    image: &ImageInput,
    forced_type: Option<DocType>,
) -> anyhow::Result<DocumentData> {
    let doc_type = match forced_type {
        Some(t) => t,
        None => identify_document_type(client, image).await?,
    };
    extract_document_data(client, image, doc_type).await
}

/// Runs every non-terminal item of the batch through [`scan_one`].
///
/// Items already in `success` or `error` are left untouched, so calling this
/// again after adding files only processes the new ones.
pub async fn process_batch(
    client: &dyn ModelClient,
    batch: &mut Batch,
    forced_type: Option<DocType>,
    reporter: &dyn BatchProgressReporter,
) -> BatchSummary {
    let total = batch.items.len();

    for (index, item) in batch.items.iter_mut().enumerate() {
        if item.status.is_terminal() {
            continue;
        }
        let n = index + 1;

        item.status = ItemStatus::Processing;
        reporter.report(BatchProgressEvent::Processing {
            file: item.file_name.clone(),
            n,
            total,
        });

        match scan_one(client, &item.image, forced_type).await {
            Ok(data) => {
                tracing::info!(
                    file = %item.file_name,
                    doc_type = %data.doc_type(),
                    "document extracted"
                );
                reporter.report(BatchProgressEvent::Succeeded {
                    file: item.file_name.clone(),
                    doc_type: data.doc_type().to_string(),
                    n,
                    total,
                });
                item.status = ItemStatus::Success { data };
            }
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::warn!(file = %item.file_name, error = %message, "document failed");
                reporter.report(BatchProgressEvent::Failed {
                    file: item.file_name.clone(),
                    message: message.clone(),
                    n,
                    total,
                });
                item.status = ItemStatus::Error { message };
            }
        }
    }

    batch.summary()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::tests::ScriptedModel;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingReporter {
        events: Mutex<Vec<BatchProgressEvent>>,
    }

    impl BatchProgressReporter for RecordingReporter {
        fn report(&self, event: BatchProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn image(name: &str) -> ImageInput {
        ImageInput::new(name, "image/jpeg", vec![0xFF, 0xD8, 0xFF])
    }

    fn call(file: &str, kind: &str) -> (String, String) {
        (file.to_string(), kind.to_string())
    }

    #[test]
    fn new_batch_is_all_pending() {
        let batch = Batch::new(vec![image("a.jpg"), image("b.jpg")]);
        assert_eq!(
            batch.summary(),
            BatchSummary {
                pending: 2,
                ..BatchSummary::default()
            }
        );
        assert_ne!(batch.items[0].id, batch.items[1].id);
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_loop() {
        let model = ScriptedModel::new()
            .classify("rg.jpg", Ok(serde_json::json!({"tipoDocumento": "RG"})))
            .extract("rg.jpg", Ok(serde_json::json!({"nome": "Ana", "rg": "12.345.678-9", "cpf": "1"})))
            .classify("blurry.jpg", Err("503 Service Unavailable".to_string()))
            .classify("ata.png", Ok(serde_json::json!({"tipoDocumento": "ATA"})))
            .extract("ata.png", Ok(serde_json::json!({"nomeOrganizacao": "Associação X"})));

        let mut batch = Batch::new(vec![image("rg.jpg"), image("blurry.jpg"), image("ata.png")]);
        let reporter = RecordingReporter::default();
        let summary = process_batch(&model, &mut batch, None, &reporter).await;

        assert_eq!(summary.success, 2);
        assert_eq!(summary.error, 1);
        assert_eq!(summary.pending + summary.processing, 0);

        assert_eq!(batch.items[0].data().unwrap().get("nome"), Some("Ana"));
        assert!(batch.items[0].error().is_none());
        let message = batch.items[1].error().unwrap();
        assert!(message.contains("failed to identify the document type"));
        assert!(message.contains("503"));
        assert!(batch.items[1].data().is_none());
        assert_eq!(batch.items[2].data().unwrap().doc_type(), DocType::Ata);

        // Sequential, classify before extract, nothing extracted after a failed classify.
        assert_eq!(
            model.calls(),
            vec![
                call("rg.jpg", "classify"),
                call("rg.jpg", "extract"),
                call("blurry.jpg", "classify"),
                call("ata.png", "classify"),
                call("ata.png", "extract"),
            ]
        );

        let events = reporter.events.lock().unwrap();
        assert_eq!(events.len(), 6);
        assert!(matches!(
            &events[3],
            BatchProgressEvent::Failed { file, n: 2, total: 3, .. } if file == "blurry.jpg"
        ));
    }

    #[tokio::test]
    async fn unknown_type_becomes_item_error() {
        let model = ScriptedModel::new().classify(
            "receita.jpg",
            Ok(serde_json::json!({"tipoDocumento": "RECEITA_MEDICA"})),
        );
        let mut batch = Batch::new(vec![image("receita.jpg")]);
        process_batch(&model, &mut batch, None, &crate::progress::NoProgress).await;

        let message = batch.items[0].error().unwrap();
        assert!(message.contains("DESCONHECIDO"));
        assert_eq!(model.calls(), vec![call("receita.jpg", "classify")]);
    }

    #[tokio::test]
    async fn forced_type_skips_classification() {
        let model = ScriptedModel::new().extract(
            "cnh.jpg",
            Ok(serde_json::json!({"nome": "Bruno", "numeroRegistroCNH": "0987"})),
        );
        let mut batch = Batch::new(vec![image("cnh.jpg")]);
        process_batch(
            &model,
            &mut batch,
            Some(DocType::Cnh),
            &crate::progress::NoProgress,
        )
        .await;

        let data = batch.items[0].data().unwrap();
        assert_eq!(data.doc_type(), DocType::Cnh);
        assert_eq!(data.get("numeroRegistroCNH"), Some("0987"));
        assert_eq!(model.calls(), vec![call("cnh.jpg", "extract")]);
    }

    #[tokio::test]
    async fn rerun_only_touches_pending_items() {
        let model = ScriptedModel::new()
            .classify("a.jpg", Ok(serde_json::json!({"tipoDocumento": "PROCURACAO"})))
            .extract("a.jpg", Ok(serde_json::json!({"poderes": "amplos"})))
            .classify("b.jpg", Ok(serde_json::json!({"tipoDocumento": "ESCRITURA"})))
            .extract("b.jpg", Ok(serde_json::json!({"vendedorNome": "C"})));

        let mut batch = Batch::new(vec![image("a.jpg")]);
        process_batch(&model, &mut batch, None, &crate::progress::NoProgress).await;
        batch.push(image("b.jpg"));
        let summary = process_batch(&model, &mut batch, None, &crate::progress::NoProgress).await;

        assert_eq!(summary.success, 2);
        assert_eq!(model.calls().len(), 4);
    }

    #[test]
    fn item_serializes_status_inline() {
        let mut item = BatchItem::new(image("a.jpg"));
        item.status = ItemStatus::Error {
            message: "boom".to_string(),
        };
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["message"], "boom");
        assert_eq!(v["fileName"], "a.jpg");
        assert!(v.get("image").is_none());
        assert!(v.get("data").is_none());
    }
}
