use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_renderer::Audience;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Theme (light, dark)
    #[arg(short, long, default_value = "light")]
    pub theme: String,

    /// Docs directory
    #[arg(short, long, default_value = "docs")]
    pub docs_dir: String,

    /// Render for outside viewers
    #[arg(long)]
    pub external: bool,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

const EXAMPLE_DOCUMENT: &str = r#"# Welcome to Folio

Mention a document like [[document-mention;3f9c2b7a-1111-4444-8888-aaaaaaaaaaaa]]
or cite a single block with [[md;3f9c2b7a-1111-4444-8888-aaaaaaaaaaaa;ab3dE2F9]].

- [x] Write the first page
- [ ] Share it

```rust
fn main() {
    println!("hello");
}
```
"#;

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Folio docs...".bright_blue().bold());

    // Create docs directory if it doesn't exist
    let docs_dir = PathBuf::from(cwd).join(&args.docs_dir);
    if !docs_dir.exists() {
        fs::create_dir_all(&docs_dir)?;
        println!("  {} Created {}/", "✓".green(), args.docs_dir);
    }

    let example_file = docs_dir.join("welcome.md");
    if !example_file.exists() {
        fs::write(&example_file, EXAMPLE_DOCUMENT)?;
        println!("  {} Created welcome.md", "✓".green());
    }

    let config = Config {
        theme: args.theme.clone(),
        audience: if args.external {
            Audience::External
        } else {
            Audience::Internal
        },
        ..Config::default()
    };
    // Reject unknown theme names before writing them out
    config.theme()?;

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Docs initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {}/welcome.md", args.docs_dir);
    println!("  2. Run: folio render {}", args.docs_dir);
    println!("  3. Check output in {}/", config.out_dir);

    Ok(())
}
