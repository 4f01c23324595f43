//! @ai:module:intent Fold directives from every comment block into one specification
//! @ai:module:layer application
//! @ai:module:public_api aggregate, apply_block, Aggregation, AggregateOptions, ServicePolicy, Diagnostic
//! @ai:module:depends_on grammar, comments, source, specification
//! @ai:module:stateless true

use crate::comments::CommentBlock;
use crate::grammar::{eval_service, eval_slos, DirectiveError, FailureKind, Outcome};
use crate::source::SourceFile;
use crate::specification::{ServiceDeclaration, Specification};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// @ai:intent How a service directive interacts with one already recorded
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ServicePolicy {
    /// Every valid declaration replaces the previous one.
    #[default]
    LastWriteWins,
    /// The first declaration is kept; a differing later one is reported and dropped.
    RejectConflicts,
}

/// @ai:intent Options controlling the fold
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateOptions {
    pub service_policy: ServicePolicy,
}

/// @ai:intent A block whose contribution was dropped, with its location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub line: usize,
    pub kind: FailureKind,
    pub message: String,
}

/// @ai:intent Fold state: the specification built so far and what was skipped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub spec: Specification,
    pub diagnostics: Vec<Diagnostic>,
    pub blocks_seen: usize,
}

impl Aggregation {
    pub fn new() -> Self {
        Self::default()
    }

    /// @ai:intent Check whether any block was dropped
    pub fn has_failures(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn into_spec(self) -> Specification {
        self.spec
    }

    fn report(&mut self, file: &Path, line: usize, kind: FailureKind, message: String) {
        tracing::warn!(
            file = %file.display(),
            line,
            kind = %kind,
            "Skipping directive: {}",
            message
        );
        self.diagnostics.push(Diagnostic {
            file: file.to_path_buf(),
            line,
            kind,
            message,
        });
    }

    fn report_error(&mut self, file: &Path, block: &CommentBlock, error: DirectiveError) {
        let line = block.source_line(error.line());
        self.report(file, line, error.kind(), error.to_string());
    }

    fn declare_service(
        &mut self,
        service: ServiceDeclaration,
        file: &Path,
        block: &CommentBlock,
        policy: ServicePolicy,
    ) {
        if policy == ServicePolicy::RejectConflicts {
            if let Some(existing) = &self.spec.service {
                if *existing != service {
                    let message = format!(
                        "service `{}` conflicts with previously declared service `{}`",
                        service.name, existing.name
                    );
                    self.report(file, block.start_line, FailureKind::ConflictingService, message);
                    return;
                }
            }
        }

        tracing::debug!(file = %file.display(), service = %service.name, "Declared service");
        self.spec.service = Some(service);
    }
}

/// @ai:intent Apply the directives of one comment block
/// @ai:post a failing service group or SLO group drops only its own contribution
/// @ai:post slos are appended in produced order, never reordered
/// @ai:effects pure
pub fn apply_block(
    mut acc: Aggregation,
    block: &CommentBlock,
    file: &Path,
    options: &AggregateOptions,
) -> Aggregation {
    acc.blocks_seen += 1;
    let text = block.text();

    let service = eval_service(&text);
    let slo_groups = eval_slos(&text);

    if service.is_skip() && slo_groups.is_empty() {
        tracing::trace!(file = %file.display(), line = block.start_line, "Not a directive");
        return acc;
    }

    match service {
        Outcome::Success(service) => acc.declare_service(service, file, block, options.service_policy),
        Outcome::Failure(e) => acc.report_error(file, block, e),
        Outcome::Skip => {}
    }

    for group in slo_groups {
        match group {
            Ok(slos) => {
                tracing::debug!(file = %file.display(), count = slos.len(), "Collected SLOs");
                acc.spec.slos.extend(slos);
            }
            Err(e) => acc.report_error(file, block, e),
        }
    }

    acc
}

/// @ai:intent Fold one file's blocks in source order
/// @ai:effects pure
pub fn apply_file(acc: Aggregation, file: &SourceFile, options: &AggregateOptions) -> Aggregation {
    file.blocks
        .iter()
        .fold(acc, |acc, block| apply_block(acc, block, &file.path, options))
}

/// @ai:intent Fold every file, in the given order, into one aggregation
/// @ai:post never fails; malformed directives become diagnostics
/// @ai:effects pure
pub fn aggregate<'a, I>(files: I, options: &AggregateOptions) -> Aggregation
where
    I: IntoIterator<Item = &'a SourceFile>,
{
    let aggregation = files
        .into_iter()
        .fold(Aggregation::new(), |acc, file| apply_file(acc, file, options));

    tracing::info!(
        blocks = aggregation.blocks_seen,
        slos = aggregation.spec.slos.len(),
        skipped = aggregation.diagnostics.len(),
        "Aggregated specification"
    );
    aggregation
}
