use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use dossier_rs::engine::condition::explain;
use dossier_rs::engine::field::FieldDefinition;
use dossier_rs::engine::{Context, Value};
use dossier_rs::platform::answers::{PresetAnswers, PromptAnswers};
use dossier_rs::platform::{
    server, DocumentRenderer, PlatformConfig, PluginLoader, ReportRegistry, ReportSession,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available reports
    List,
    /// Show a report's form layout and blocks
    Show {
        /// Report id
        report: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fill in a report and generate the document
    Fill {
        /// Report id
        report: String,

        /// YAML or JSON file with answers; prompts interactively when absent
        #[arg(short, long)]
        answers: Option<PathBuf>,

        /// Output directory (overrides DOSSIER_OUTPUT_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Evaluate a condition and explain the result
    Check {
        /// Condition expression
        condition: String,

        /// YAML or JSON file with the context
        #[arg(short, long)]
        context: Option<PathBuf>,

        /// Context entries as key=value
        #[arg(short, long = "set", value_parser = parse_assignment)]
        set: Vec<(String, Value)>,
    },
    /// Serve the HTTP API
    Serve {
        /// Port to listen on (overrides DOSSIER_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = PlatformConfig::from_env()?;
    let loader = PluginLoader::new(&config.reports_dir);

    match args.command {
        Commands::List => {
            let manifests = loader.list_available();
            if manifests.is_empty() {
                println!("No reports found in {}", loader.reports_dir().display());
            }
            for manifest in manifests {
                println!("{:<24} {} (v{})", manifest.id, manifest.name, manifest.version);
                if let Some(description) = &manifest.description {
                    println!("{:<24} {}", "", description);
                }
            }
        }
        Commands::Show { report, json } => {
            let plugin = loader.load_plugin(&report)?;
            let layout = plugin.layout();

            if json {
                let detail = serde_json::json!({
                    "info": plugin.info(),
                    "sections": layout.sections(),
                    "blocks": plugin.blocks,
                });
                println!("{}", serde_json::to_string_pretty(&detail)?);
                return Ok(());
            }

            let info = plugin.info();
            println!("{} (v{})", info.name, info.version);
            if let Some(description) = &info.description {
                println!("{}", description);
            }
            for section in layout.sections() {
                println!("\n[{}]", section.name);
                for field in &section.fields {
                    println!("  {}", describe_field(field));
                }
            }
            if !plugin.blocks.is_empty() {
                println!("\nBlocks:");
                for block in &plugin.blocks {
                    println!("  {} ({} rules)", block.id, block.rules.len());
                }
            }
        }
        Commands::Fill {
            report,
            answers,
            output_dir,
        } => {
            let plugin = loader.load_plugin(&report)?;
            let registry = ReportRegistry::with_builtins();
            let handler = registry.resolve(&report);
            let mut session = ReportSession::new(Arc::new(plugin), handler);

            match answers {
                Some(path) => {
                    let mut source = PresetAnswers::from_file(&path)
                        .with_context(|| format!("reading answers from {}", path.display()))?;
                    session.fill(&mut source)?;
                }
                None => {
                    session.fill(&mut PromptAnswers::new())?;
                }
            }

            let errors = session.validate();
            if !errors.is_empty() {
                for error in &errors {
                    eprintln!("  - {}", error);
                }
                bail!("{} validation error(s)", errors.len());
            }

            let output_dir = match output_dir {
                Some(dir) => dir,
                None => config.output_dir()?.to_path_buf(),
            };
            let report = session.generate(&DocumentRenderer::new(), &output_dir)?;
            println!("Document: {}", report.document_path.display());
            println!("Metadata: {}", report.metadata_path.display());
        }
        Commands::Check {
            condition,
            context,
            set,
        } => {
            let mut ctx = match context {
                Some(path) => {
                    let content = fs::read_to_string(&path)
                        .with_context(|| format!("reading context from {}", path.display()))?;
                    serde_yaml::from_str::<Context>(&content)?
                }
                None => Context::new(),
            };
            for (key, value) in set {
                ctx.insert(key, value);
            }

            let report = explain(&condition, &ctx);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Serve { port } => {
            let config = match port {
                Some(port) => config.with_port(port),
                None => config,
            };
            server::serve(config).await?;
        }
    }

    Ok(())
}

fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", raw));
    }
    Ok((key.to_string(), Value::parse_scalar(value)))
}

fn describe_field(field: &FieldDefinition) -> String {
    let mut line = format!("{} ({:?})", field.id, field.kind);
    if field.label != field.id && !field.label.is_empty() {
        line.push_str(&format!(" \"{}\"", field.label));
    }
    if field.required {
        line.push_str(" *");
    }
    if field.computed {
        line.push_str(" [computed]");
    }
    if let Some(condition) = &field.parent_condition {
        line.push_str(&format!(" if {}", condition));
    } else if let Some(dependency) = &field.dependency {
        match (&dependency.equals, &dependency.not_equals) {
            (Some(v), _) => line.push_str(&format!(" if {} == {}", dependency.variable, v)),
            (None, Some(v)) => line.push_str(&format!(" if {} != {}", dependency.variable, v)),
            (None, None) => {}
        }
    }
    if !field.options.is_empty() {
        let options: Vec<&str> = field.options.iter().map(|o| o.value()).collect();
        line.push_str(&format!(" [{}]", options.join(", ")));
    }
    line
}
