use std::sync::mpsc::Receiver;

use tracing::debug;

use super::{Batch, CancelFlag, LineItem, LineProcessor};
use crate::{
    error::{Error, Result},
    filter::FilterCnf,
    model::Event,
};

#[derive(Debug, Default)]
pub(super) struct ConsumerStats {
    pub tokens: usize,
    pub filtered: usize,
}

// dropping the receiver on error unblocks the producer
pub(super) fn consume<P: LineProcessor + ?Sized>(
    rx: Receiver<Batch>,
    filter: &FilterCnf,
    processor: &mut P,
    cancel: &CancelFlag,
) -> Result<ConsumerStats> {
    let mut stats = ConsumerStats::default();
    for batch in rx {
        for item in batch {
            if cancel.is_cancelled() {
                debug!(line = item.line, "discarding remaining lines");
                return Ok(stats);
            }
            dispatch(item, filter, processor, &mut stats)?;
        }
    }
    Ok(stats)
}

fn dispatch<P: LineProcessor + ?Sized>(
    item: LineItem,
    filter: &FilterCnf,
    processor: &mut P,
    stats: &mut ConsumerStats,
) -> Result<()> {
    let LineItem { line, event, error } = item;
    let result = match event {
        Event::Token(token) => {
            if !token.matches_filter(filter) {
                stats.filtered += 1;
                return Ok(());
            }
            stats.tokens += 1;
            processor.proc_token(token, line, error)
        }
        Event::Structure(strc) => processor.proc_struct(strc, line, error),
        Event::StructureClose(strc) => processor.proc_struct_close(strc, line, error),
    };
    result.map_err(|source| Error::Processor { line, source })
}
