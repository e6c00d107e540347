use crate::api::{LayoutOutcome, layout_document_with};
use crate::authoring::{NewShape, add_connector, add_shape, compute_dimensions};
use crate::config::{Config, load_config};
use crate::document::Document;
use crate::extract::{extract, extract_str};
use crate::ir::ShapeKind;
use crate::layout::{LayoutKind, LayoutOptions, compute_layout};
use crate::layout_dump::{GraphDump, write_graph_dump};
use crate::text_fit::fit;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "dlay", version, about = "Automatic layout for draw.io diagrams")]
pub struct Args {
    /// Config file (JSON5) with layout and text sizing overrides
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reposition every shape in a diagram
    Layout {
        /// Input .drawio file or '-' for stdin
        #[arg(short = 'i', long = "input")]
        input: Option<PathBuf>,
        /// Output file. Defaults to stdout.
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
        /// grid, flowchart-vertical or flowchart-horizontal
        #[arg(short = 'k', long = "kind", default_value = "flowchart-vertical")]
        kind: String,
        #[arg(long)]
        spacing: Option<f32>,
        #[arg(long = "start-x")]
        start_x: Option<f32>,
        #[arg(long = "start-y")]
        start_y: Option<f32>,
        /// Print the layout summary to stderr as JSON
        #[arg(long = "summary-json")]
        summary_json: bool,
        /// Also write a JSON dump of the graph and its new positions
        #[arg(long = "dump")]
        dump: Option<PathBuf>,
    },
    /// Print the size a label needs
    Fit {
        #[arg(long)]
        text: String,
        #[arg(long, default_value = "rectangle")]
        kind: String,
        #[arg(long)]
        width: Option<f32>,
        #[arg(long)]
        height: Option<f32>,
        #[arg(long = "max-width")]
        max_width: Option<f32>,
    },
    /// Print the shapes and connectors found in a diagram
    Inspect {
        #[arg(short = 'i', long = "input")]
        input: Option<PathBuf>,
    },
    /// Append a shape sized to its label
    AddShape {
        #[arg(short = 'i', long = "input")]
        input: Option<PathBuf>,
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
        #[arg(long)]
        text: String,
        #[arg(long, default_value = "rectangle")]
        kind: String,
        #[arg(long, default_value_t = 0.0)]
        x: f32,
        #[arg(long, default_value_t = 0.0)]
        y: f32,
        #[arg(long)]
        width: Option<f32>,
        #[arg(long)]
        height: Option<f32>,
    },
    /// Append a connector between two existing shapes
    Connect {
        #[arg(short = 'i', long = "input")]
        input: Option<PathBuf>,
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
        #[arg(long)]
        label: Option<String>,
    },
}

pub fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref())
        .with_context(|| format!("reading config {:?}", args.config))?;

    match args.command {
        Command::Layout {
            input,
            output,
            kind,
            spacing,
            start_x,
            start_y,
            summary_json,
            dump,
        } => {
            let kind: LayoutKind = kind.parse()?;
            let options = layout_options(&config, spacing, start_x, start_y);
            let source = read_input(input.as_deref())?;
            let outcome = layout_document_with(&source, kind, &options)?;

            if summary_json {
                eprintln!("{}", serde_json::to_string(outcome.summary())?);
            } else {
                eprintln!("{}", outcome.summary());
            }
            if let LayoutOutcome::NothingToDo { .. } = outcome {
                eprintln!("no shapes found, document left unchanged");
            }
            if let Some(path) = dump {
                let graph = extract_str(&source);
                let positions = match &outcome {
                    LayoutOutcome::Applied { positions, .. } => positions.clone(),
                    LayoutOutcome::NothingToDo { .. } => compute_layout(&graph, kind, &options),
                };
                write_graph_dump(&path, &GraphDump::with_layout(&graph, kind, &positions))?;
            }
            write_output(outcome.document(), output.as_deref())
        }
        Command::Fit {
            text,
            kind,
            width,
            height,
            max_width,
        } => {
            let kind = ShapeKind::from_name(&kind);
            let dims = if width.is_some() || height.is_some() {
                compute_dimensions(&text, width, height, kind, &config.text)
            } else {
                fit(&text, max_width, Some(kind), &config.text)
            };
            println!("{}", serde_json::to_string(&dims)?);
            Ok(())
        }
        Command::Inspect { input } => {
            let source = read_input(input.as_deref())?;
            let graph = extract_str(&source);
            println!("{}", serde_json::to_string_pretty(&GraphDump::from_graph(&graph))?);
            Ok(())
        }
        Command::AddShape {
            input,
            output,
            text,
            kind,
            x,
            y,
            width,
            height,
        } => {
            let mut document = Document::parse(&read_input(input.as_deref())?)?;
            let shape = NewShape::new(text, ShapeKind::from_name(&kind))
                .at(x, y)
                .with_size(width, height);
            let id = add_shape(&mut document, &shape, &config.text)?;
            info!("added shape {id}");
            eprintln!("{id}");
            write_output(&document.to_xml()?, output.as_deref())
        }
        Command::Connect {
            input,
            output,
            source,
            target,
            label,
        } => {
            let mut document = Document::parse(&read_input(input.as_deref())?)?;
            let id = add_connector(&mut document, &source, &target, label.as_deref())?;
            let graph = extract(&document);
            info!(
                "added connector {id}; {} connectors in diagram",
                graph.edges.len()
            );
            eprintln!("{id}");
            write_output(&document.to_xml()?, output.as_deref())
        }
    }
}

fn layout_options(
    config: &Config,
    spacing: Option<f32>,
    start_x: Option<f32>,
    start_y: Option<f32>,
) -> LayoutOptions {
    let mut options = config.layout;
    if let Some(v) = spacing {
        options.spacing = v;
    }
    if let Some(v) = start_x {
        options.start_x = v;
    }
    if let Some(v) = start_y {
        options.start_y = v;
    }
    options
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_output(contents: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::write(path, contents)
            .with_context(|| format!("writing {}", path.display())),
        _ => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            if !contents.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_layout_subcommand() {
        let args = Args::try_parse_from([
            "dlay",
            "--log-level",
            "debug",
            "layout",
            "-i",
            "in.drawio",
            "-k",
            "grid",
            "--spacing",
            "40",
        ])
        .unwrap();
        assert_eq!(args.log_level, "debug");
        match args.command {
            Command::Layout {
                input,
                kind,
                spacing,
                start_x,
                ..
            } => {
                assert_eq!(input, Some(PathBuf::from("in.drawio")));
                assert_eq!(kind, "grid");
                assert_eq!(spacing, Some(40.0));
                assert_eq!(start_x, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn flags_override_config_values() {
        let config = Config::default();
        let options = layout_options(&config, Some(30.0), None, Some(5.0));
        assert_eq!(options.spacing, 30.0);
        assert_eq!(options.start_x, config.layout.start_x);
        assert_eq!(options.start_y, 5.0);
    }

    #[test]
    fn add_shape_defaults_to_rectangle_at_origin() {
        let args =
            Args::try_parse_from(["dlay", "add-shape", "--text", "Hello", "-o", "out.drawio"])
                .unwrap();
        let Command::AddShape { kind, x, y, .. } = args.command else {
            panic!("expected add-shape");
        };
        assert_eq!(ShapeKind::from_name(&kind), ShapeKind::Rectangle);
        assert_eq!((x, y), (0.0, 0.0));
    }
}
