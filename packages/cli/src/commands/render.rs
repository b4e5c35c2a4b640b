use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use folio_renderer::{import_markdown, single_line, Audience, RenderContext, Renderer, Theme};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::WalkDir;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Markdown file or directory to render
    pub input: PathBuf,

    /// Render only the first logical line
    #[arg(long)]
    pub single_line: bool,

    /// Theme (light, dark)
    #[arg(short, long)]
    pub theme: Option<String>,

    /// Audience (internal, external)
    #[arg(short, long)]
    pub audience: Option<String>,

    /// Output format (html, text, json)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Output directory when rendering a directory (overrides config)
    #[arg(short, long)]
    pub out_dir: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Html,
    Text,
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "html" => Ok(OutputFormat::Html),
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(anyhow!("Unknown format: {}", other)),
        }
    }
}

/// Settings for one render run, config file merged with flags
pub struct RenderOptions {
    pub theme: Theme,
    pub context: RenderContext,
    pub single_line: bool,
    pub format: OutputFormat,
}

impl RenderOptions {
    pub fn resolve(config: &Config, args: &RenderArgs) -> Result<Self> {
        let theme = match &args.theme {
            Some(name) => name.parse().map_err(|err: String| anyhow!(err))?,
            None => config.theme()?,
        };
        let audience = match &args.audience {
            Some(name) => name.parse().map_err(|err: String| anyhow!(err))?,
            None => config.audience,
        };
        let format = args.format.as_deref().unwrap_or(&config.format).parse()?;

        Ok(Self {
            theme,
            context: RenderContext {
                audience,
                ..config.render_context()
            },
            single_line: args.single_line || config.single_line,
            format,
        })
    }
}

pub fn render(args: RenderArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let options = RenderOptions::resolve(&config, &args)?;
    let input = PathBuf::from(cwd).join(&args.input);

    if input.is_file() {
        let source = fs::read_to_string(&input)?;
        println!("{}", render_source(&source, &options)?);
        return Ok(());
    }

    if !input.is_dir() {
        return Err(anyhow!("Input path does not exist: {}", input.display()));
    }

    println!("{}", "🖋  Rendering documents...".bright_blue().bold());

    let files = find_markdown_files(&input)?;
    if files.is_empty() {
        println!("{}", "⚠️  No markdown files found".yellow());
        return Ok(());
    }
    println!("Found {} files", files.len());

    let out_dir = PathBuf::from(cwd).join(args.out_dir.as_deref().unwrap_or(&config.out_dir));
    let mut success_count = 0;
    let mut error_count = 0;

    for file in &files {
        let relative_path = file.strip_prefix(&input).unwrap_or(file);
        match render_file(file, relative_path, &out_dir, &options) {
            Ok(output_path) => {
                success_count += 1;
                println!(
                    "  {} {} → {}",
                    "✓".green(),
                    relative_path.display(),
                    output_path.display()
                );
            }
            Err(e) => {
                error_count += 1;
                eprintln!(
                    "  {} {} - {}",
                    "✗".red(),
                    relative_path.display(),
                    e.to_string().red()
                );
            }
        }
    }

    println!();
    if error_count == 0 {
        println!(
            "{} Rendered {} files successfully",
            "✅".green(),
            success_count
        );
    } else {
        println!(
            "{} Rendered {} files, {} errors",
            "⚠️".yellow(),
            success_count,
            error_count
        );
    }

    Ok(())
}

/// Render one markdown source to the requested output format
pub fn render_source(source: &str, options: &RenderOptions) -> Result<String> {
    let source = if options.single_line {
        single_line(source)
    } else {
        source.to_string()
    };

    let snapshot = import_markdown(&source)?;
    let tree = Renderer::new().render(&snapshot, &options.theme, &options.context);

    Ok(match options.format {
        OutputFormat::Html => tree.to_html(),
        OutputFormat::Text => tree.to_text(),
        OutputFormat::Json => tree.to_json()?,
    })
}

fn render_file(
    file: &Path,
    relative_path: &Path,
    out_dir: &Path,
    options: &RenderOptions,
) -> Result<PathBuf> {
    let source = fs::read_to_string(file)?;
    let output = render_source(&source, options)?;

    let output_file = out_dir
        .join(relative_path)
        .with_extension(options.format.extension());
    if let Some(parent) = output_file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output_file, output)?;

    Ok(output_file)
}

pub(crate) fn find_markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let is_markdown = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext == "md" || ext == "markdown");
        if path.is_file() && is_markdown {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}
