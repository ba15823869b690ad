//! CLI tool to dump or re-serialize a fixed-width record file.

use clap::Parser;
use flr_file::{FlrConfig, FlrFile, OpenMode, RangeSet, Record, Result, parse_layout};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process;

/// Read a fixed-width record file using a layout definition.
///
/// Prints one line per record as `kind field=value ...`, or with --rewrite
/// writes the records back out as fixed-width lines.
#[derive(Parser)]
#[command(name = "flr-cat")]
struct Cli {
    /// Layout definition file
    layout: String,

    /// Fixed-width record file
    input: String,

    /// Logical record ranges to read, e.g. 1..10,25,40-50
    #[arg(short, long)]
    ranges: Option<String>,

    /// Use the chunked reader (single record kind, fixed width)
    #[arg(long)]
    fast: bool,

    /// Fast-mode chunk size in bytes
    #[arg(long)]
    budget: Option<u64>,

    /// Write records as fixed-width lines instead of field listings
    #[arg(long)]
    rewrite: bool,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Show paths, read mode, and record counts on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn format_record(record: &Record) -> String {
    let mut line = record.kind().to_string();
    for (name, value) in record.fields() {
        line.push_str(&format!(" {name}={}", String::from_utf8_lossy(value)));
    }
    line
}

/// Where records go: a plain listing, or a writer session for --rewrite.
enum Output {
    Listing(Box<dyn Write>),
    Rewrite(FlrFile<Box<dyn Write>>),
}

impl Output {
    fn emit(&mut self, record: &Record) -> Result<()> {
        match self {
            Output::Listing(sink) => writeln!(sink, "{}", format_record(record))?,
            Output::Rewrite(writer) => writer.write_record(record)?,
        }
        Ok(())
    }

    /// Records carry no trailing terminator; `end_line` finishes the last one
    fn finish(self, end_line: bool) -> Result<()> {
        match self {
            Output::Listing(mut sink) => sink.flush()?,
            Output::Rewrite(mut writer) => {
                if end_line {
                    writer.get_mut().write_all(b"\n")?;
                }
                writer.flush()?;
            }
        }
        Ok(())
    }
}

fn open_sink(output: Option<&str>) -> io::Result<Box<dyn Write>> {
    match output {
        Some(out_path) => {
            if let Some(parent) = Path::new(out_path).parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            Ok(Box::new(BufWriter::new(File::create(out_path)?)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

fn run(cli: &Cli, config: FlrConfig) -> Result<usize> {
    let ranges = cli.ranges.as_deref().map(RangeSet::parse).transpose()?;
    let sink = open_sink(cli.output.as_deref())?;
    let mut output = if cli.rewrite {
        Output::Rewrite(FlrFile::new(sink, config.clone())?)
    } else {
        Output::Listing(sink)
    };

    let count = FlrFile::open(&cli.input, OpenMode::Read, config, |file| {
        if cli.fast {
            file.enable_fast()?;
            if let Some(ranges) = ranges {
                file.set_ranges(ranges)?;
            }
        } else if let Some(ranges) = ranges {
            file.set_line_filter(ranges)?;
        }

        let mut count = 0;
        for record in file.records() {
            output.emit(&record?)?;
            count += 1;
        }
        Ok(count)
    })?;

    output.finish(cli.output.is_none() && count > 0)?;
    Ok(count)
}

fn main() {
    let cli = Cli::parse();

    let layout_text = match fs::read_to_string(&cli.layout) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading layout file '{}': {e}", cli.layout);
            process::exit(1);
        }
    };

    let mut config = match parse_layout(&layout_text) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error in layout file '{}': {e}", cli.layout);
            process::exit(1);
        }
    };
    if let Some(budget) = cli.budget {
        config = config.with_buffer_budget(budget);
    }

    if cli.verbose {
        eprintln!("Layout: {}", cli.layout);
        eprintln!("Input:  {}", cli.input);
        eprintln!("Output: {}", cli.output.as_deref().unwrap_or("(stdout)"));
        eprintln!("Mode:   {}", if cli.fast { "fast" } else { "sequential" });
    }

    match run(&cli, config) {
        Ok(count) => {
            if cli.verbose {
                eprintln!("Records: {count}");
            }
        }
        Err(e) => {
            eprintln!("Error reading '{}': {e}", cli.input);
            process::exit(1);
        }
    }
}
