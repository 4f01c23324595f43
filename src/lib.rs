//! @ai:module:intent Generate Sloth SLO specifications from @sloth comment directives
//! @ai:module:layer infrastructure
//! @ai:module:public_api grammar, aggregator, source, comments, language, specification, output, config, logging, error
//! @ai:module:stateless true
//!
//! # slocomments
//!
//! Reads `@sloth` directives out of ordinary source comments and folds them
//! into one [`Specification`]. Comments without directives are ignored and
//! malformed directives are reported as [`Diagnostic`]s without stopping the run.
//!
//! ## Example
//!
//! ```rust,no_run
//! use slocomments::{aggregate, output, AggregateOptions, CommentAdapter, SourceAdapter};
//! use std::path::PathBuf;
//!
//! let files = CommentAdapter::default().collect(&[PathBuf::from(".")]).unwrap();
//! let aggregation = aggregate(&files, &AggregateOptions::default());
//! println!("{}", output::render(&aggregation.spec, output::OutputFormat::Yaml).unwrap());
//! ```

pub mod aggregator;
pub mod comments;
pub mod config;
pub mod error;
pub mod grammar;
pub mod language;
pub mod logging;
pub mod output;
pub mod source;
pub mod specification;

pub use aggregator::{
    aggregate, apply_block, apply_file, AggregateOptions, Aggregation, Diagnostic, ServicePolicy,
};
pub use comments::{extract_comment_blocks, CommentBlock, CommentLine};
pub use config::Config;
pub use error::{Error, Result};
pub use grammar::{eval_service, eval_slos, DirectiveError, FailureKind, Outcome};
pub use language::{detect_language, Language};
pub use output::{render, write_specification, OutputFormat, ReportFormat};
pub use source::{CommentAdapter, SourceAdapter, SourceFile};
pub use specification::{
    AlertRule, Alerting, ServiceDeclaration, Sli, SloDeclaration, Specification,
};
