//! pdtpdump - Stream a PDF's draw events as protocol chunks.
//!
//! Reads a PDF, runs the streaming extractor over the selected page range
//! and writes the binary chunk stream to a file or stdout. A failure after
//! streaming has started is reported in-band as an error chunk.

use anyhow::{Context, bail};
use clap::{ArgAction, Parser};
use pdtp_core::{ChunkWriter, PageSelection, PdfDocument, stream_events};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// A command line tool for converting a PDF into a chunked draw-event
/// stream.
#[derive(Parser, Debug)]
#[command(name = "pdtpdump")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the PDF file
    file: PathBuf,

    /// Page selection header, e.g. "start=1;end=10;base=3"
    #[arg(short = 's', long)]
    selection: Option<String>,

    /// First page of the range (1-indexed)
    #[arg(long, conflicts_with = "selection")]
    start: Option<i64>,

    /// Last page of the range (1-indexed, defaults to the page count)
    #[arg(long, conflicts_with = "selection")]
    end: Option<i64>,

    /// Page to stream first; nearer pages arrive earlier
    #[arg(long, conflicts_with = "selection")]
    base: Option<i64>,

    /// Output file ("-" for stdout)
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let selection = match &args.selection {
        Some(field) => PageSelection::parse(field)?,
        None => PageSelection {
            start: args.start,
            end: args.end,
            base: args.base,
        },
    };

    let data = std::fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let doc = PdfDocument::open(data)
        .with_context(|| format!("opening {}", args.file.display()))?;

    let sink: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)
            .with_context(|| format!("creating {}", args.outfile))?;
        Box::new(BufWriter::new(file))
    };
    let mut writer = ChunkWriter::new(sink);

    let mut events = stream_events(doc, selection);
    for event in events.by_ref() {
        writer.send(&event)?;
    }
    if let Err(e) = events.finish() {
        writer.send_error(&e.to_string())?;
        bail!("stream failed: {e}");
    }
    Ok(())
}
