mod repl;
mod text;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use familytree_app::TreeSession;
use familytree_core::{NodeId, RecordId};
use familytree_events::{Command, Event, EventBus, EventListener};
use familytree_project::{OutlineOptions, ViewerSettings, import_outline_file};
use repl::Input;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use text::TextRenderer;

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse family trees from JSON documents", long_about = None)]
struct Args {
    /// Viewer settings file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the tree in its initial state
    Show {
        file: PathBuf,
        /// Expand every node first
        #[arg(long)]
        expand_all: bool,
    },
    /// Search names and reveal the first match
    Search { file: PathBuf, term: String },
    /// Convert a `<name> <dashed-id>` outline into a nested JSON document
    Import {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Where to write the discrepancy report
        #[arg(short, long)]
        report: Option<PathBuf>,
        #[arg(long, default_value = "Top of Family")]
        top_name: String,
        #[arg(long, default_value = "0")]
        top_id: String,
    },
    /// Interactive session reading commands from stdin
    Browse { file: PathBuf },
}

/// Prints events the user should see.
struct Notices;

impl EventListener for Notices {
    fn handle_event(&mut self, event: &Event) {
        match event {
            Event::ShowWarning { message } => eprintln!("warning: {message}"),
            Event::SearchComplete { term, matches } => {
                println!("{matches} match(es) for {term:?}")
            }
            Event::SearchCleared => println!("search cleared"),
            Event::NavigationChanged { index, total, .. } => {
                println!("result {} of {}", index + 1, total)
            }
            Event::ViewportChanged { zoom, pan_x, pan_y } => {
                println!("zoom {zoom:.2}, pan ({pan_x:.0}, {pan_y:.0})")
            }
            _ => {}
        }
    }
}

fn open(path: &Path, settings: ViewerSettings, echo: bool) -> Result<TreeSession<TextRenderer>> {
    let session = TreeSession::open(path, settings, TextRenderer::new(echo), EventBus::new())
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(session)
}

fn show(path: &Path, settings: ViewerSettings, expand_all: bool) -> Result<()> {
    let mut session = open(path, settings, false)?;
    session.start();
    if expand_all {
        session.dispatch(Command::ExpandAll)?;
    }
    session.events().dispatch_to(&mut Notices);
    print!("{}", session.sink().last());
    Ok(())
}

fn search(path: &Path, settings: ViewerSettings, term: String) -> Result<()> {
    let mut session = open(path, settings, false)?;
    session.start();
    session.dispatch(Command::Search(term))?;
    session.events().dispatch_to(&mut Notices);

    let tree = session.tree();
    for (i, id) in session.results().results().iter().enumerate() {
        let Some(node) = tree.node(*id) else {
            continue;
        };
        let record = node.record_id.as_ref().map(RecordId::as_str).unwrap_or("-");
        println!("{:>3}. {} (id {})", i + 1, node.name, record);
    }
    if !session.results().is_empty() {
        print!("{}", session.sink().last());
    }
    Ok(())
}

fn import(
    input: &Path,
    output: &Path,
    report: Option<&Path>,
    options: OutlineOptions,
) -> Result<()> {
    let outline = import_outline_file(input, &options)
        .with_context(|| format!("Failed to import {}", input.display()))?;
    outline.write_json(output)?;
    println!("Wrote {} people to {}", outline.people, output.display());

    match report {
        Some(path) => {
            outline.write_report(path)?;
            println!(
                "Found {} discrepancies, see {}",
                outline.discrepancies.len(),
                path.display()
            );
        }
        None if !outline.discrepancies.is_empty() => {
            familytree_project::write_discrepancy_report(
                &outline.discrepancies,
                &mut io::stdout().lock(),
            )?;
        }
        None => {}
    }
    Ok(())
}

/// Resolve `toggle` arguments: a record id first, then a raw node index.
fn resolve(session: &TreeSession<TextRenderer>, arg: &str) -> Option<NodeId> {
    let tree = session.tree();
    tree.find_by_record(&RecordId::new(arg)).or_else(|| {
        arg.parse()
            .ok()
            .map(NodeId)
            .filter(|id| tree.contains(*id))
    })
}

fn browse(path: &Path, settings: ViewerSettings) -> Result<()> {
    let mut session = open(path, settings, true)?;
    session.start();
    session.events().dispatch_to(&mut Notices);
    println!("type `help` for commands");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let viewport = session.viewport();
        let centre = (viewport.size.x * 0.5, viewport.size.y * 0.5);
        let command = match repl::parse_line(&line, centre) {
            Ok(None) => continue,
            Ok(Some(Input::Quit)) => break,
            Ok(Some(Input::Help)) => {
                println!("{}", repl::HELP);
                continue;
            }
            Ok(Some(Input::Toggle(arg))) => match resolve(&session, &arg) {
                Some(id) => Command::ToggleNode(id),
                None => {
                    eprintln!("no person with id {arg:?}");
                    continue;
                }
            },
            Ok(Some(Input::Command(command))) => command,
            Err(e) => {
                eprintln!("{e:#}");
                continue;
            }
        };
        if let Err(e) = session.dispatch(command) {
            eprintln!("{e}");
        }
        session.events().dispatch_to(&mut Notices);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let settings = ViewerSettings::load(args.config.as_deref());
    tracing::debug!("Viewer settings: {:?}", settings);

    match args.command {
        Cmd::Show { file, expand_all } => show(&file, settings, expand_all),
        Cmd::Search { file, term } => search(&file, settings, term),
        Cmd::Import {
            input,
            output,
            report,
            top_name,
            top_id,
        } => import(
            &input,
            &output,
            report.as_deref(),
            OutlineOptions { top_name, top_id },
        ),
        Cmd::Browse { file } => browse(&file, settings),
    }
}
