use std::{io::BufRead, mem, sync::mpsc::SyncSender};

use tracing::{debug, info};

use super::{Batch, CancelFlag, LineItem};
use crate::{accumulator::Accumulator, config::ResolvedConf, error::Result, grammar::LineParser};

// upper bound for batch preallocation, the configured size can be huge
const MAX_PREALLOC: usize = 65_536;

#[derive(Debug, Default)]
pub(super) struct ProducerStats {
    pub lines: usize,
    pub tokens: usize,
}

pub(super) fn produce<R: BufRead>(
    mut reader: R,
    conf: &ResolvedConf,
    tx: SyncSender<Batch>,
    cancel: &CancelFlag,
    stop: &CancelFlag,
) -> Result<ProducerStats> {
    let mut parser = LineParser::new(Accumulator::new(conf.accumulator));
    let new_batch = || Vec::with_capacity(conf.chunk_size.min(MAX_PREALLOC));

    let mut batch: Batch = new_batch();
    let mut buf = Vec::new();
    let mut line = 0;

    loop {
        if cancel.is_cancelled() || stop.is_cancelled() {
            debug!(line, "line producer stopped");
            return Ok(ProducerStats {
                lines: line,
                tokens: parser.num_tokens(),
            });
        }

        buf.clear();
        let read = match reader.read_until(b'\n', &mut buf) {
            Ok(read) => read,
            Err(err) => {
                flush(&tx, batch);
                return Err(err.into());
            }
        };
        if read == 0 {
            break;
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }

        let text = match conf.charset.decode(&buf, line) {
            Ok(text) => text,
            Err(err) => {
                flush(&tx, batch);
                return Err(err);
            }
        };
        let parsed = parser.parse(&text);
        batch.push(LineItem {
            line,
            event: parsed.event,
            error: parsed.error,
        });
        line += 1;

        if conf.log_progress_each_nth > 0 && line % conf.log_progress_each_nth == 0 {
            info!(lines = line, tokens = parser.num_tokens(), "processed lines");
        }

        if batch.len() >= conf.chunk_size {
            let full = mem::replace(&mut batch, new_batch());
            // blocks while the consumer is behind
            if tx.send(full).is_err() {
                debug!(line, "consumer gone, line producer stopped");
                return Ok(ProducerStats {
                    lines: line,
                    tokens: parser.num_tokens(),
                });
            }
        }
    }

    flush(&tx, batch);
    Ok(ProducerStats {
        lines: line,
        tokens: parser.num_tokens(),
    })
}

// lines read before the source ended (or failed) still go to the consumer
fn flush(tx: &SyncSender<Batch>, batch: Batch) {
    if !batch.is_empty() {
        // a failed send means the consumer has already stopped
        let _ = tx.send(batch);
    }
}
