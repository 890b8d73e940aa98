// Parsing runs as a two stage pipeline: a producer thread reads, decodes and
// parses lines and sends them in batches over a bounded channel, the
// caller's thread takes the batches in order and feeds the processor. Both
// stages are stopped and joined before any of the public functions return.

mod consumer;
mod producer;

use std::{
    io::BufRead,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc,
    },
    thread,
};

use tracing::info;

use crate::{
    config::{ParserConf, ResolvedConf},
    error::{Error, LineError, Result},
    model::{Event, Structure, StructureClose, Token},
    source::{ChildProcess, OpenedSource},
};

// number of batches which may wait in the channel
const CHANNEL_CAPACITY: usize = 2;

// `line` is the 0-based source line; an error stops the whole run
pub trait LineProcessor {
    fn proc_token(&mut self, token: Token, line: usize, err: Option<LineError>)
        -> anyhow::Result<()>;

    fn proc_struct(
        &mut self,
        strc: Structure,
        line: usize,
        err: Option<LineError>,
    ) -> anyhow::Result<()>;

    fn proc_struct_close(
        &mut self,
        strc: StructureClose,
        line: usize,
        err: Option<LineError>,
    ) -> anyhow::Result<()>;
}

impl<P: LineProcessor + ?Sized> LineProcessor for &mut P {
    fn proc_token(
        &mut self,
        token: Token,
        line: usize,
        err: Option<LineError>,
    ) -> anyhow::Result<()> {
        (**self).proc_token(token, line, err)
    }

    fn proc_struct(
        &mut self,
        strc: Structure,
        line: usize,
        err: Option<LineError>,
    ) -> anyhow::Result<()> {
        (**self).proc_struct(strc, line, err)
    }

    fn proc_struct_close(
        &mut self,
        strc: StructureClose,
        line: usize,
        err: Option<LineError>,
    ) -> anyhow::Result<()> {
        (**self).proc_struct_close(strc, line, err)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
struct LineItem {
    line: usize,
    event: Event,
    error: Option<LineError>,
}

type Batch = Vec<LineItem>;

pub fn parse_vertical_file<P: LineProcessor + ?Sized>(
    conf: &ParserConf,
    processor: &mut P,
) -> Result<()> {
    parse_vertical_file_with_cancel(conf, processor, &CancelFlag::new())
}

pub fn parse_vertical_file_with_cancel<P: LineProcessor + ?Sized>(
    conf: &ParserConf,
    processor: &mut P,
    cancel: &CancelFlag,
) -> Result<()> {
    let resolved = conf.resolve()?;
    let source = conf.input_source()?;
    info!(
        source = %source,
        accumulator = %resolved.accumulator,
        encoding = resolved.charset.name(),
        "parsing vertical file"
    );

    let OpenedSource { reader, mut child } = source.open_with_cancel(cancel)?;
    let result = run(reader, &resolved, processor, cancel, child.as_mut());
    match child {
        Some(child) if result.is_ok() => child.wait(),
        Some(child) => {
            child.abort();
            result
        }
        None => result,
    }
}

// `input_file_path` is ignored
pub fn parse_vertical_reader<R, P>(
    reader: R,
    conf: &ParserConf,
    processor: &mut P,
    cancel: &CancelFlag,
) -> Result<()>
where
    R: BufRead + Send,
    P: LineProcessor + ?Sized,
{
    let resolved = conf.resolve()?;
    run(reader, &resolved, processor, cancel, None)
}

fn run<R, P>(
    reader: R,
    conf: &ResolvedConf,
    processor: &mut P,
    cancel: &CancelFlag,
    child: Option<&mut ChildProcess>,
) -> Result<()>
where
    R: BufRead + Send,
    P: LineProcessor + ?Sized,
{
    let (tx, rx) = mpsc::sync_channel::<Batch>(CHANNEL_CAPACITY);
    // set when the consumer gives up; kept apart from the caller's flag
    let stop = CancelFlag::new();

    let (produced, consumed) = thread::scope(|s| {
        let producer = {
            let stop = &stop;
            s.spawn(move || producer::produce(reader, conf, tx, cancel, stop))
        };
        let consumed = consumer::consume(rx, &conf.filter, processor, cancel);
        if consumed.is_err() || cancel.is_cancelled() {
            stop.cancel();
            // the producer may be waiting for output which never comes
            if let Some(child) = child {
                child.kill();
            }
        }
        (producer.join(), consumed)
    });

    let consumed = consumed?;
    let produced = produced.map_err(|_| Error::ProducerPanicked)??;
    if cancel.is_cancelled() {
        info!(lines = produced.lines, "parsing cancelled");
        return Err(Error::Cancelled);
    }
    info!(
        lines = produced.lines,
        tokens = produced.tokens,
        delivered_tokens = consumed.tokens,
        filtered_tokens = consumed.filtered,
        "finished parsing"
    );
    Ok(())
}
