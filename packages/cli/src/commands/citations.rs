use super::render::find_markdown_files;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use folio_citations::{scan, CitationPayload, CitationResult};
use folio_common::{MentionCollector, Visitor};
use folio_renderer::import_markdown;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct CitationsArgs {
    /// Markdown file or directory to check
    pub input: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

/// One `[[…]]` token found in a file
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationReport {
    pub line: usize,
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<CitationPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: String,
    pub citations: Vec<CitationReport>,
    /// Mentions the document renders with
    pub mentions: usize,
}

impl FileReport {
    fn malformed(&self) -> usize {
        self.citations.iter().filter(|c| c.error.is_some()).count()
    }
}

pub fn citations(args: CitationsArgs, cwd: &str) -> Result<()> {
    let input = PathBuf::from(cwd).join(&args.input);

    let files = if input.is_file() {
        vec![input.clone()]
    } else if input.is_dir() {
        find_markdown_files(&input)?
    } else {
        return Err(anyhow!("Input path does not exist: {}", input.display()));
    };

    let reports = files
        .iter()
        .map(|file| check_file(file))
        .collect::<Result<Vec<_>>>()?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    let mut total = 0;
    let mut malformed = 0;
    for report in &reports {
        total += report.citations.len();
        malformed += report.malformed();
        print_report(report);
    }

    println!(
        "   {} citations, {} mentions",
        total,
        reports.iter().map(|r| r.mentions).sum::<usize>()
    );
    if malformed > 0 {
        println!("   {} {} (rendered as empty text)", "Malformed:".yellow(), malformed);
    } else {
        println!("   {} No malformed citations", "✓".green());
    }

    Ok(())
}

fn print_report(report: &FileReport) {
    println!("{}", report.path);
    for citation in &report.citations {
        match (&citation.payload, &citation.error) {
            (Some(payload), _) => {
                let kind = if payload.is_remote() {
                    "remote".blue().bold()
                } else {
                    "local".green().bold()
                };
                println!("  {}:{} [{}] {}", "line".dimmed(), citation.line, kind, payload);
            }
            (None, error) => {
                println!(
                    "  {}:{} {} [[{}]] {}",
                    "line".dimmed(),
                    citation.line,
                    "malformed".yellow().bold(),
                    citation.raw,
                    error.as_deref().unwrap_or_default().dimmed()
                );
            }
        }
    }
    println!();
}

/// Scan a source for citations and count the mentions it renders with
pub fn check_source(path: &str, source: &str) -> Result<FileReport> {
    let citations = scan(source)
        .into_iter()
        .map(|token| {
            let line = source[..token.range.start].matches('\n').count() + 1;
            let (payload, error) = split(token.payload);
            CitationReport {
                line,
                raw: token.raw.to_string(),
                payload,
                error,
            }
        })
        .collect();

    let snapshot = import_markdown(source)?;
    let mut collector = MentionCollector::default();
    collector.visit_snapshot(&snapshot);

    Ok(FileReport {
        path: path.to_string(),
        citations,
        mentions: collector.mentions.len(),
    })
}

fn split(result: CitationResult<CitationPayload>) -> (Option<CitationPayload>, Option<String>) {
    match result {
        Ok(payload) => (Some(payload), None),
        Err(err) => (None, Some(err.to_string())),
    }
}

fn check_file(file: &Path) -> Result<FileReport> {
    let source = fs::read_to_string(file)?;
    check_source(&file.display().to_string(), &source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lines_and_errors() {
        let source = "intro\nsee [[md;3f9c2b7a-1111-4444-8888-aaaaaaaaaaaa;ab3dE2F9]]\n\n[[nope]] and [[0b7e4c1d-2222-4333-9444-bbbbbbbbbbbb]]\n";
        let report = check_source("doc.md", source).unwrap();

        assert_eq!(report.citations.len(), 3);
        assert_eq!(report.citations[0].line, 2);
        assert!(report.citations[0].payload.is_some());
        assert_eq!(report.citations[1].line, 4);
        assert!(report.citations[1].error.is_some());
        assert!(report.citations[2].payload.as_ref().unwrap().is_remote());
        assert_eq!(report.malformed(), 1);
        // The remote citation needs a lookup, so only the node citation renders
        assert_eq!(report.mentions, 1);
    }
}
