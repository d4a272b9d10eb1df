//! Command-line front end: parse XML files, optionally normalize them, and
//! print the serialized result.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use xmldom::serial::serialize_to_writer;
use xmldom::{BuildOptions, Dom, NodeId, NodeType, SerializeOptions};

/// xmldom -- parse, normalize, and re-serialize XML documents.
#[derive(Parser, Debug)]
#[command(name = "xmldom", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// XML files to process (use `-` for stdin).
    #[arg(required = true)]
    files: Vec<String>,

    /// Log build and normalization events to stderr.
    #[arg(short, long)]
    verbose: bool,

    // -- Building ----------------------------------------------------------
    /// Remove whitespace-only text nodes inside elements.
    #[arg(long)]
    noblanks: bool,

    /// Fail on unbound namespace prefixes instead of using the prefix as
    /// its own namespace.
    #[arg(long)]
    strict_ns: bool,

    /// Element names closed as soon as they start (repeatable).
    #[arg(long, value_name = "NAME")]
    auto_close: Vec<String>,

    /// Maximum element nesting depth.
    #[arg(long, value_name = "N", default_value_t = 256)]
    max_depth: u32,

    // -- Transformations ---------------------------------------------------
    /// Add missing namespace declarations and prefixes.
    #[arg(long)]
    normalize_ns: bool,

    /// Merge adjacent text nodes and drop empty ones.
    #[arg(long)]
    normalize_text: bool,

    // -- Output ------------------------------------------------------------
    /// Do not output the result tree.
    #[arg(long)]
    noout: bool,

    /// Write childless elements as `<name/>`.
    #[arg(long)]
    self_closing: bool,

    /// Write an XML declaration.
    #[arg(long)]
    xml_decl: bool,

    /// Print the node tree instead of markup.
    #[arg(long)]
    debug: bool,

    /// Print timing information for each stage.
    #[arg(long)]
    timing: bool,
}

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.verbose {
        StderrLogger::install();
    }

    let mut worst_exit = EXIT_SUCCESS;
    for file in &cli.files {
        worst_exit = worst_exit.max(process_file(&cli, file));
    }
    ExitCode::from(worst_exit)
}

fn process_file(cli: &Cli, filename: &str) -> u8 {
    let input = match read_input(filename) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{filename}: failed to read: {e}");
            return EXIT_ERROR;
        }
    };

    let start = Instant::now();
    let options = BuildOptions::default()
        .no_blanks(cli.noblanks)
        .strict_namespaces(cli.strict_ns)
        .auto_close(cli.auto_close.iter().cloned())
        .max_depth(cli.max_depth);
    let mut dom = Dom::new();
    let doc = match dom.parse_bytes_with_options(&input, options) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{filename}: {e}");
            return EXIT_ERROR;
        }
    };
    if cli.timing {
        eprintln!("Building took {:?}", start.elapsed());
    }

    if cli.normalize_text {
        dom.normalize(doc);
    }
    if cli.normalize_ns {
        if let Err(e) = dom.normalize_namespaces(doc) {
            eprintln!("{filename}: {e}");
            return EXIT_ERROR;
        }
    }

    if cli.noout {
        return EXIT_SUCCESS;
    }
    let start = Instant::now();
    let result = if cli.debug {
        io::stdout().write_all(format_debug_tree(&dom, doc).as_bytes())
    } else {
        let options = SerializeOptions::default()
            .self_closing(cli.self_closing)
            .xml_declaration(cli.xml_decl);
        let stdout = io::stdout().lock();
        serialize_to_writer(&dom, doc, stdout, &options).and_then(|()| writeln!(io::stdout()))
    };
    if let Err(e) = result {
        eprintln!("{filename}: failed to write output: {e}");
        return EXIT_ERROR;
    }
    if cli.timing {
        eprintln!("Serializing took {:?}", start.elapsed());
    }
    EXIT_SUCCESS
}

/// Reads input from a file or stdin (when filename is `-`).
fn read_input(filename: &str) -> io::Result<Vec<u8>> {
    if filename == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(filename)
    }
}

/// One line per node, indented by depth.
fn format_debug_tree(dom: &Dom, doc: NodeId) -> String {
    let mut out = String::new();
    let mut stack = vec![(doc, 0usize)];
    while let Some((id, depth)) = stack.pop() {
        let indent = "  ".repeat(depth);
        let _ = match dom.node_type(id) {
            NodeType::Element => {
                let ns = dom.namespace_uri(id).unwrap_or("");
                writeln!(out, "{indent}ELEMENT {} {{{ns}}}", dom.node_name(id))
            }
            NodeType::Text | NodeType::CDataSection | NodeType::Comment => writeln!(
                out,
                "{indent}{} {:?}",
                dom.node_name(id),
                dom.node_value(id).unwrap_or("")
            ),
            _ => writeln!(out, "{indent}{}", dom.node_name(id)),
        };
        for &attr in dom.attributes(id) {
            let _ = writeln!(
                out,
                "{indent}  @{}={:?}",
                dom.node_name(attr),
                dom.value(attr).unwrap_or("")
            );
        }
        let children: Vec<_> = dom.children(id).collect();
        stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
    }
    out
}

/// Writes `log` records to stderr.
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl StderrLogger {
    fn install() {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
    }
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.target().starts_with("xmldom")
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}
