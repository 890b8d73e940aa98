use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    collections::HashMap,
    env,
    fs::File,
    io::{self, BufWriter, Write},
    time::Instant,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vertigo::{
    parse_vertical_file, LineError, LineProcessor, ParserConf, Structure, StructureClose, Token,
};

const DEFAULT_TOP: usize = 10;
const PROGRESS_EACH_NTH_TOKEN: usize = 10_000;

struct Args {
    conf: ParserConf,
    column: usize,
    top: usize,
    output_path: Option<String>,
    dump: bool,
}

fn get_args() -> Result<Args> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut opts = getopts::Options::new();
    opts.optopt("c", "column", "positional attribute to count (default 0)", "N");
    opts.optopt("a", "accumulator", "structural attribute accumulator", "stack|comb|nil");
    opts.optopt("e", "encoding", "input encoding (default utf-8)", "NAME");
    opts.optmulti("f", "filter", "token filter clause, alternatives separated by '|'", "KEY=VALUE");
    opts.optopt("n", "top", "number of most frequent values to print", "N");
    opts.optopt("o", "output", "write all counts as CSV", "PATH");
    opts.optopt("", "config", "parser configuration (JSON)", "PATH");
    opts.optflag("", "dump", "print parsed events as JSON lines");
    opts.optflag("h", "help", "print this help");

    let matches = match opts.parse(&args) {
        Ok(m) => m,
        Err(f) => bail!(f),
    };

    if matches.opt_present("h") {
        print!(
            "{}",
            opts.usage("Usage: vertigo [options] <vertical-file | \"|command\">")
        );
        std::process::exit(0);
    }

    let mut conf = match matches.opt_str("config") {
        Some(path) => ParserConf::load(&path)
            .with_context(|| format!("Failed to load configuration: {}", &path))?,
        None => ParserConf::new(""),
    };

    if let Some(input) = matches.free.get(0) {
        conf.input_file_path = input.clone();
    }
    if conf.input_file_path.is_empty() {
        bail!("path to a vertical file is required");
    }
    if let Some(accumulator) = matches.opt_str("a") {
        conf.struct_attr_accumulator = accumulator;
    }
    if let Some(encoding) = matches.opt_str("e") {
        conf.encoding = encoding;
    }
    for clause in matches.opt_strs("f") {
        conf.filter_args
            .push_clause(&clause)
            .with_context(|| format!("Invalid filter: {}", &clause))?;
    }

    let column = match matches.opt_str("c") {
        Some(c) => c
            .parse()
            .with_context(|| format!("column must be a non-negative integer: {:?}", c))?,
        None => 0,
    };
    let top = match matches.opt_str("n") {
        Some(n) => n
            .parse()
            .with_context(|| format!("top must be a non-negative integer: {:?}", n))?,
        None => DEFAULT_TOP,
    };

    Ok(Args {
        conf,
        column,
        top,
        output_path: matches.opt_str("o"),
        dump: matches.opt_present("dump"),
    })
}

// 列ごとの頻度
struct ColumnCounter {
    column: usize,
    counts: HashMap<String, usize>,
    tokens: usize,
    errors: usize,
    progress: ProgressBar,
}

impl ColumnCounter {
    fn new(column: usize, progress: ProgressBar) -> Self {
        ColumnCounter {
            column,
            counts: HashMap::new(),
            tokens: 0,
            errors: 0,
            progress,
        }
    }

    fn note_error(&mut self, line: usize, err: Option<LineError>) {
        if let Some(err) = err {
            self.errors += 1;
            self.progress
                .suspend(|| eprintln!("line {}: {}", line + 1, err));
        }
    }

    fn sorted(&self) -> Vec<(&str, usize)> {
        let mut all: Vec<_> = self.counts.iter().map(|(k, &v)| (k.as_str(), v)).collect();
        all.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        all
    }
}

impl LineProcessor for ColumnCounter {
    fn proc_token(&mut self, token: Token, line: usize, err: Option<LineError>) -> Result<()> {
        self.note_error(line, err);
        self.tokens += 1;
        if self.tokens % PROGRESS_EACH_NTH_TOKEN == 0 {
            self.progress.set_position(self.tokens as u64);
        }
        let value = token.pos_attr_by_index(self.column).unwrap_or_default();
        *self.counts.entry(value.to_owned()).or_insert(0) += 1;
        Ok(())
    }

    fn proc_struct(&mut self, _strc: Structure, line: usize, err: Option<LineError>) -> Result<()> {
        self.note_error(line, err);
        Ok(())
    }

    fn proc_struct_close(
        &mut self,
        _strc: StructureClose,
        line: usize,
        err: Option<LineError>,
    ) -> Result<()> {
        self.note_error(line, err);
        Ok(())
    }
}

struct EventDumper<W: Write> {
    out: W,
}

impl<W: Write> EventDumper<W> {
    fn write<T: serde::Serialize>(
        &mut self,
        event: &T,
        line: usize,
        err: Option<LineError>,
    ) -> Result<()> {
        let record = serde_json::json!({
            "line": line,
            "event": event,
            "error": err.map(|e| e.to_string()),
        });
        serde_json::to_writer(&mut self.out, &record)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> LineProcessor for EventDumper<W> {
    fn proc_token(&mut self, token: Token, line: usize, err: Option<LineError>) -> Result<()> {
        self.write(&vertigo::Event::Token(token), line, err)
    }

    fn proc_struct(&mut self, strc: Structure, line: usize, err: Option<LineError>) -> Result<()> {
        self.write(&vertigo::Event::Structure(strc), line, err)
    }

    fn proc_struct_close(
        &mut self,
        strc: StructureClose,
        line: usize,
        err: Option<LineError>,
    ) -> Result<()> {
        self.write(&vertigo::Event::StructureClose(strc), line, err)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = get_args()?;

    if args.dump {
        let stdout = io::stdout();
        let mut dumper = EventDumper {
            out: BufWriter::new(stdout.lock()),
        };
        parse_vertical_file(&args.conf, &mut dumper)
            .with_context(|| format!("Failed to parse {}", &args.conf.input_file_path))?;
        dumper.out.flush()?;
        return Ok(());
    }

    println!(
        "Parsing {} (column {})...",
        &args.conf.input_file_path, args.column
    );
    let start = Instant::now();

    let mut counter = ColumnCounter::new(args.column, create_progress_bar());
    parse_vertical_file(&args.conf, &mut counter)
        .with_context(|| format!("Failed to parse {}", &args.conf.input_file_path))?;
    counter.progress.finish_and_clear();

    println!("\nDone in {:?}", start.elapsed());
    println!("Total tokens processed: {}", counter.tokens);
    if counter.errors > 0 {
        println!("Lines with errors: {}", counter.errors);
    }

    let sorted = counter.sorted();
    println!("\nTop {} values at column {}:", args.top, args.column);
    println!("{:<8}  {}", "count", "value");
    println!("{:<8}  {}", "--------", "-----");
    for (value, count) in sorted.iter().take(args.top) {
        println!("{:<8}  {}", count, value);
    }

    if let Some(output_path) = &args.output_path {
        save_counts_csv(output_path, &sorted)
            .with_context(|| format!("Failed to write {}", output_path))?;
    }

    Ok(())
}

fn save_counts_csv(path: &str, counts: &[(&str, usize)]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(File::create(path)?);
    writer.write_record(["value", "count"])?;
    for (value, count) in counts {
        writer.write_record([*value, count.to_string().as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {pos} tokens [{elapsed_precise}] {per_sec}")
            .unwrap(),
    );
    pb
}
