use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use pagecraft_lib::script::{parse_script, ScriptRunner};
use pagecraft_lib::{Editor, EditorConfig, ExportOptions, StatusKind};
use std::fs;
use std::io::{self, BufRead, Write};

const PAGECRAFT_INTRO: &str = r#"
        ____                                  ______
       / __ \____ _____ ____  _____________ _/ __/ /_
      / /_/ / __ `/ __ `/ _ \/ ___/ ___/ __ `/ /_/ __/
     / ____/ /_/ / /_/ /  __/ /__/ /  / /_/ / __/ /_
    /_/    \__,_/\__, /\___/\___/_/   \__,_/_/  \__/
                /____/

    Welcome to Pagecraft - headless WYSIWYG editing for HTML pages!
"#;

#[derive(Parser)]
#[command(name = "Pagecraft")]
#[command(about = "Apply scripted WYSIWYG edits to an HTML page")]
struct Args {
    /// Input HTML file.
    input: String,

    /// Output file for the exported HTML.
    output: String,

    /// Edit script to run against the page.
    #[arg(short, long)]
    script: Option<String>,

    /// TOML file overriding the editor defaults.
    #[arg(short, long)]
    config: Option<String>,

    /// Confirm destructive steps without prompting.
    #[arg(short, long)]
    yes: bool,

    /// Keep the editor stylesheet (hover and breakpoint rules) in the export.
    #[arg(long)]
    keep_editor_rules: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

/// Asks on stdin; anything but y/yes declines.
fn prompt(message: &str) -> bool {
    print!("{} [y/N] ", message);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

fn main() -> Result<()> {
    // parse the args given in terminal
    let args: Args = Args::parse();

    let default_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    println!("{}", PAGECRAFT_INTRO);

    let config = match &args.config {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => EditorConfig::default(),
    };

    let html_content = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input))?;
    let mut editor = Editor::headless(config);
    editor.load(&html_content);
    info!("Successfully read the HTML file.");

    if let Some(script_path) = &args.script {
        let text = fs::read_to_string(script_path)
            .with_context(|| format!("failed to read script {}", script_path))?;
        let steps = parse_script(&text)?;
        let mut runner = ScriptRunner::default();
        let mut confirm = |message: &str| args.yes || prompt(message);
        let reports = runner.run(&mut editor, &steps, &mut confirm);
        for report in &reports {
            let marker = match report.status.kind {
                StatusKind::Success => "ok",
                StatusKind::Info => "--",
                StatusKind::Error => "!!",
            };
            println!("{:>4} {} {}", report.line, marker, report.status);
        }
    }

    let exported = editor.export(&ExportOptions {
        keep_rule_store: args.keep_editor_rules,
    })?;
    fs::write(&args.output, exported)
        .with_context(|| format!("failed to write {}", args.output))?;
    info!(
        "Exported {} ({} history entries)",
        args.output,
        editor.history_len()
    );
    Ok(())
}
