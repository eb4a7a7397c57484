//! AWS Textract analyzer.
//!
//! FORMS and TABLES analysis. Documents at or under the sync limit go
//! through `AnalyzeDocument`; larger ones are staged to S3 and run as an
//! asynchronous job polled with `GetDocumentAnalysis`.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_textract::error::DisplayErrorContext;
use aws_sdk_textract::primitives::Blob;
use aws_sdk_textract::types::{
    Block, BlockType as SdkBlockType, Document, DocumentLocation, EntityType as SdkEntityType,
    FeatureType, JobStatus, RelationshipType as SdkRelationshipType, S3Object, SelectionStatus,
};
use aws_sdk_textract::Client;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use holerite::config::CloudConfig;
use holerite::structured::{
    AnalysisBlock, BlockType, DocumentAnalysis, EntityType, Relationship, RelationshipType,
};

use super::poll::{poll_until, JobPoll, PollPolicy};
use super::staging::{staging_key, ObjectStaging, S3Staging};
use super::{CloudError, DocumentAnalyzer};

pub struct TextractAnalyzer {
    client: Client,
    staging: Option<Arc<dyn ObjectStaging>>,
    policy: PollPolicy,
    sync_limit_bytes: u64,
    prefix: String,
}

impl TextractAnalyzer {
    /// Build clients from the default AWS credential chain. Staging is only
    /// available when a bucket is configured.
    pub async fn from_config(config: &CloudConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let staging = config.bucket.as_ref().map(|bucket| {
            Arc::new(S3Staging::new(aws_sdk_s3::Client::new(&sdk_config), bucket.clone()))
                as Arc<dyn ObjectStaging>
        });
        if staging.is_none() {
            debug!("No staging bucket configured; large documents will skip cloud analysis");
        }

        Self {
            client: Client::new(&sdk_config),
            staging,
            policy: PollPolicy::from(config),
            sync_limit_bytes: config.sync_limit_bytes,
            prefix: config.prefix.clone(),
        }
    }

    async fn analyze_inline(&self, bytes: &[u8]) -> Result<DocumentAnalysis, CloudError> {
        let output = self
            .client
            .analyze_document()
            .document(Document::builder().bytes(Blob::new(bytes.to_vec())).build())
            .feature_types(FeatureType::Forms)
            .feature_types(FeatureType::Tables)
            .send()
            .await
            .map_err(service_error)?;
        Ok(DocumentAnalysis::new(
            output.blocks().iter().map(convert_block).collect(),
        ))
    }

    async fn analyze_staged(
        &self,
        bytes: &[u8],
        filename: &str,
        cancel: watch::Receiver<bool>,
    ) -> Result<DocumentAnalysis, CloudError> {
        let staging = self.staging.as_ref().ok_or_else(|| {
            CloudError::NotConfigured("no staging bucket (set HOLERITE_S3_BUCKET)".to_string())
        })?;
        let staged = staging
            .stage(&staging_key(&self.prefix, filename), bytes)
            .await?;

        let location = DocumentLocation::builder()
            .s3_object(
                S3Object::builder()
                    .bucket(&staged.bucket)
                    .name(&staged.key)
                    .build(),
            )
            .build();
        let started = self
            .client
            .start_document_analysis()
            .document_location(location)
            .feature_types(FeatureType::Forms)
            .feature_types(FeatureType::Tables)
            .send()
            .await
            .map_err(service_error)?;
        let job_id = started
            .job_id()
            .ok_or_else(|| CloudError::Service("no job id returned".to_string()))?
            .to_string();
        info!("Started analysis job {} for {}", job_id, filename);

        let client = &self.client;
        let blocks = poll_until(self.policy, cancel, |_| {
            let job_id = job_id.clone();
            async move { fetch_job(client, &job_id).await }
        })
        .await?;
        Ok(DocumentAnalysis::new(blocks))
    }
}

#[async_trait]
impl DocumentAnalyzer for TextractAnalyzer {
    fn name(&self) -> &'static str {
        "textract"
    }

    async fn analyze(
        &self,
        bytes: &[u8],
        filename: &str,
        cancel: watch::Receiver<bool>,
    ) -> Result<DocumentAnalysis, CloudError> {
        if bytes.len() as u64 <= self.sync_limit_bytes {
            self.analyze_inline(bytes).await
        } else {
            self.analyze_staged(bytes, filename, cancel).await
        }
    }
}

async fn fetch_job(client: &Client, job_id: &str) -> Result<JobPoll<Vec<AnalysisBlock>>, CloudError> {
    let first = client
        .get_document_analysis()
        .job_id(job_id)
        .send()
        .await
        .map_err(service_error)?;

    match first.job_status() {
        None | Some(JobStatus::InProgress) => return Ok(JobPoll::Pending),
        Some(JobStatus::Failed) => {
            return Ok(JobPoll::Failed(
                first.status_message().unwrap_or("no status message").to_string(),
            ))
        }
        Some(JobStatus::PartialSuccess) => {
            warn!(
                "Analysis job {} partially succeeded: {}",
                job_id,
                first.status_message().unwrap_or("")
            );
        }
        Some(JobStatus::Succeeded) => {}
        Some(other) => {
            return Ok(JobPoll::Failed(format!("unexpected job status {}", other.as_str())))
        }
    }

    let mut blocks: Vec<AnalysisBlock> = first.blocks().iter().map(convert_block).collect();
    let mut next_token = first.next_token().map(String::from);
    while let Some(token) = next_token {
        let page = client
            .get_document_analysis()
            .job_id(job_id)
            .next_token(token)
            .send()
            .await
            .map_err(service_error)?;
        blocks.extend(page.blocks().iter().map(convert_block));
        next_token = page.next_token().map(String::from);
    }
    debug!("Analysis job {} returned {} blocks", job_id, blocks.len());
    Ok(JobPoll::Done(blocks))
}

fn service_error<E: std::error::Error + 'static>(e: E) -> CloudError {
    CloudError::Service(DisplayErrorContext(&e).to_string())
}

/// Map an SDK block onto the crate-owned block model.
fn convert_block(block: &Block) -> AnalysisBlock {
    let block_type = match block.block_type() {
        Some(SdkBlockType::Page) => BlockType::Page,
        Some(SdkBlockType::Line) => BlockType::Line,
        Some(SdkBlockType::Word) => BlockType::Word,
        Some(SdkBlockType::KeyValueSet) => BlockType::KeyValueSet,
        Some(SdkBlockType::Table) => BlockType::Table,
        Some(SdkBlockType::Cell) => BlockType::Cell,
        Some(SdkBlockType::MergedCell) => BlockType::MergedCell,
        Some(SdkBlockType::SelectionElement) => BlockType::SelectionElement,
        _ => BlockType::Other,
    };
    let entity_types = block
        .entity_types()
        .iter()
        .map(|e| match e {
            SdkEntityType::Key => EntityType::Key,
            SdkEntityType::Value => EntityType::Value,
            _ => EntityType::Other,
        })
        .collect();
    let relationships = block
        .relationships()
        .iter()
        .map(|r| Relationship {
            kind: match r.r#type() {
                Some(SdkRelationshipType::Child) => RelationshipType::Child,
                Some(SdkRelationshipType::Value) => RelationshipType::Value,
                _ => RelationshipType::Other,
            },
            ids: r.ids().to_vec(),
        })
        .collect();
    let position = |v: Option<i32>| v.and_then(|v| u32::try_from(v).ok());

    AnalysisBlock {
        id: block.id().unwrap_or_default().to_string(),
        block_type,
        text: block.text().map(String::from),
        entity_types,
        relationships,
        row_index: position(block.row_index()),
        column_index: position(block.column_index()),
        page: position(block.page()),
        selected: block
            .selection_status()
            .map(|s| *s == SelectionStatus::Selected),
    }
}
