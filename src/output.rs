//! @ai:module:intent Render the specification and diagnostics in the supported formats
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, ReportFormat, render, parse, write_specification, format_report
//! @ai:module:depends_on specification, aggregator, error

use crate::aggregator::Aggregation;
use crate::error::Result;
use crate::specification::Specification;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Base name of files written to an output directory.
pub const OUTPUT_FILE_STEM: &str = "slos";

/// @ai:intent Output format options for the specification
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// @ai:intent Output format options for the diagnostics report
#[derive(Debug, Clone, Copy, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
        }
    }
}

/// @ai:intent Render a specification as text
/// @ai:effects pure
pub fn render(spec: &Specification, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(spec)?,
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(spec)?;
            json.push('\n');
            json
        }
    })
}

/// @ai:intent Read back a rendered specification
/// @ai:post parse(render(spec, f), f) == spec
/// @ai:effects pure
pub fn parse(text: &str, format: OutputFormat) -> Result<Specification> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::from_str(text)?,
        OutputFormat::Json => serde_json::from_str(text)?,
    })
}

/// @ai:intent Write every requested format to a writer, separated for multi-document output
/// @ai:effects io
pub fn write_to<W: Write>(spec: &Specification, formats: &[OutputFormat], out: &mut W) -> Result<()> {
    for (idx, format) in formats.iter().enumerate() {
        if idx > 0 && *format == OutputFormat::Yaml {
            writeln!(out, "---")?;
        }
        out.write_all(render(spec, *format)?.as_bytes())?;
    }
    out.flush()?;
    Ok(())
}

/// @ai:intent Write the specification to stdout and/or an output directory
/// @ai:post returns the paths of the files written
/// @ai:effects fs:write, io
pub fn write_specification(
    spec: &Specification,
    formats: &[OutputFormat],
    stdout: bool,
    output_dir: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    if stdout {
        let mut handle = std::io::stdout().lock();
        write_to(spec, formats, &mut handle)?;
    }

    let mut written = Vec::new();
    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)?;
        for format in formats {
            let path = dir.join(format!("{}.{}", OUTPUT_FILE_STEM, format.extension()));
            std::fs::write(&path, render(spec, *format)?)?;
            tracing::info!(path = %path.display(), "Wrote specification");
            written.push(path);
        }
    }

    Ok(written)
}

/// @ai:intent Format the aggregation diagnostics
/// @ai:effects pure
pub fn format_report(aggregation: &Aggregation, format: ReportFormat) -> String {
    match format {
        ReportFormat::Json => {
            serde_json::to_string_pretty(&aggregation.diagnostics).unwrap_or_default()
        }
        ReportFormat::Text => format_report_text(aggregation),
    }
}

/// @ai:intent Format diagnostics as human-readable text
/// @ai:effects pure
fn format_report_text(aggregation: &Aggregation) -> String {
    let mut output = String::new();

    for diagnostic in &aggregation.diagnostics {
        let location = format!("{}:{}", diagnostic.file.display(), diagnostic.line);
        output.push_str(&format!(
            "{} {} - {} ({})\n",
            "ERROR".red().bold(),
            location.dimmed(),
            diagnostic.message,
            diagnostic.kind.as_str().dimmed()
        ));
    }

    let spec = &aggregation.spec;
    output.push('\n');
    match &spec.service {
        Some(service) => output.push_str(&format!(
            "Service {} ({})\n",
            service.name.cyan(),
            service.version
        )),
        None => output.push_str(&format!("{}\n", "No service directive found".yellow())),
    }
    output.push_str(&format!(
        "Checked {} comment blocks, collected {} SLOs\n",
        aggregation.blocks_seen,
        spec.slos.len()
    ));

    if aggregation.has_failures() {
        output.push_str(&format!(
            "{} directives skipped\n",
            aggregation.diagnostics.len().to_string().red().bold()
        ));
    } else {
        output.push_str(&format!("{} No issues found\n", "OK".green().bold()));
    }

    output
}
