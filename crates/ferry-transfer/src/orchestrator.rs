//! Per-run transfer state machine.

use ferry_storage::BlobStore;
use ferry_storage::types::{BlobEntry, CopyStatus};

use crate::TRACING_TARGET;
use crate::error::{Result, TransferError};
use crate::lease::with_lease;
use crate::marker::CopiedMarker;
use crate::naming::{derive_target_name, matches_name, target_key};
use crate::options::TransferOptions;
use crate::report::{FailedObject, SkipReason, TransferReport, TransferredObject};
use crate::retry::RetryPolicy;
use crate::spec::TransferSpec;
use crate::stage::TransferStage;
use crate::ticket::CopyTicket;

/// How a single successful attempt ended.
#[derive(Debug)]
enum Outcome {
    Copied { status: CopyStatus, attempts: u32 },
    AlreadyCopied,
}

/// Drives one [`TransferSpec`] against a source and a target store.
///
/// Objects are processed one after another. Only a failed listing aborts
/// the run; every other failure is recorded in the [`TransferReport`].
pub struct TransferOrchestrator<'a> {
    source: &'a dyn BlobStore,
    target: &'a dyn BlobStore,
    options: &'a TransferOptions,
    retry: RetryPolicy,
    marker: CopiedMarker,
}

impl<'a> TransferOrchestrator<'a> {
    /// Creates an orchestrator borrowing both stores.
    pub fn new(
        source: &'a dyn BlobStore,
        target: &'a dyn BlobStore,
        options: &'a TransferOptions,
    ) -> Self {
        Self {
            source,
            target,
            options,
            retry: options.retry_policy(),
            marker: options.marker(),
        }
    }

    /// Lists, filters and transfers every candidate of `spec`.
    pub async fn run(&self, spec: &TransferSpec) -> Result<TransferReport> {
        let entries = self
            .source
            .list_objects(&spec.source_prefix)
            .await
            .map_err(TransferError::Listing)?;
        let listed = entries.len();

        let candidates: Vec<BlobEntry> = entries
            .into_iter()
            .filter(|entry| matches_name(&entry.key, &spec.name_filter))
            .collect();

        tracing::info!(
            target: TRACING_TARGET,
            prefix = %spec.source_prefix,
            listed,
            matched = candidates.len(),
            "Listed source objects"
        );

        let mut report = TransferReport {
            matched: candidates.len(),
            ..TransferReport::default()
        };

        for entry in candidates {
            self.process(entry, &spec.target_prefix, &mut report).await;
        }

        tracing::info!(
            target: TRACING_TARGET,
            attempted = report.attempted(),
            succeeded = report.succeeded_count(),
            failed = report.failed_count(),
            skipped = report.skipped_count(),
            "Transfer run finished"
        );
        Ok(report)
    }

    async fn process(&self, entry: BlobEntry, target_prefix: &str, report: &mut TransferReport) {
        let key = entry.key.as_str();
        tracing::debug!(target: TRACING_TARGET, key, stage = %TransferStage::Listed, "Processing object");

        if self.marker.is_set_on(&entry.metadata) {
            tracing::debug!(target: TRACING_TARGET, key, "Already copied, skipping");
            report.record_skip(key, SkipReason::AlreadyCopied);
            return;
        }

        let name = match derive_target_name(key) {
            Ok(name) => name,
            Err(error) => {
                tracing::warn!(target: TRACING_TARGET, key, error = %error, "Skipping object");
                report.record_skip(key, SkipReason::MalformedKey);
                return;
            }
        };
        let target_key = target_key(target_prefix, &name);

        let result = self
            .retry
            .run(key, |attempt| self.attempt(key, &target_key, attempt))
            .await;

        match result {
            Ok(Outcome::Copied { status, attempts }) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    key,
                    target_key,
                    %status,
                    attempts,
                    stage = %TransferStage::Done,
                    "Object transferred"
                );
                report.record_success(TransferredObject {
                    source_key: key.to_owned(),
                    target_key,
                    status,
                    attempts,
                });
            }
            Ok(Outcome::AlreadyCopied) => {
                tracing::debug!(target: TRACING_TARGET, key, "Marked by another run, skipping");
                report.record_skip(key, SkipReason::AlreadyCopied);
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    key,
                    stage = error.stage().map(<&'static str>::from),
                    attempts = error.attempts(),
                    error = %error,
                    "Object transfer failed"
                );
                report.record_failure(FailedObject::from_error(key, &error));
            }
        }
    }

    /// One leased attempt: recheck marker, issue token, copy, mark.
    async fn attempt(&self, key: &str, target_key: &str, attempt: u32) -> Result<Outcome> {
        tracing::debug!(target: TRACING_TARGET, key, attempt, "Starting attempt");

        with_lease(self.source, key, |lease| async move {
            let current = self
                .source
                .get_metadata(key)
                .await
                .map_err(|e| TransferError::attempt(key, TransferStage::Leased, e))?;
            if self.marker.is_set_on(&current) {
                return Ok(Outcome::AlreadyCopied);
            }

            let token = self
                .source
                .issue_read_token(key, self.options.read_token_ttl())
                .await
                .map_err(|e| TransferError::attempt(key, TransferStage::TokenIssued, e))?;
            let ticket = CopyTicket::new(target_key, lease, token);

            let status = self
                .target
                .start_copy(&ticket.source_url(), ticket.target_key())
                .await
                .map_err(|e| TransferError::attempt(key, TransferStage::CopyStarted, e))?;
            if !status.is_accepted() {
                return Err(TransferError::CopyNotAccepted {
                    key: key.to_owned(),
                    status,
                });
            }

            let marked = self.marker.merge_into(current);
            self.source
                .set_metadata(key, &marked, Some(ticket.lease()))
                .await
                .map_err(|e| TransferError::attempt(key, TransferStage::Marked, e))?;

            Ok(Outcome::Copied {
                status,
                attempts: attempt,
            })
        })
        .await
    }
}
