//! Reduction coordinator: folds a stream of partial top-K lists into one.
//!
//! Scanners push partial results into a single channel. The coordinator pairs
//! arrivals up as they come and hands each pair to a merge worker, whose
//! output goes back into the same channel. Merge outputs and scan outputs are
//! indistinguishable to the pairing logic, so the merges form a binary
//! reduction tree whose shape follows arrival order.
//!
//! The run ends when scanning has signalled completion, the channel is empty
//! and no merge is in flight. At that point at most one result is parked.

use crossbeam_channel::{Receiver, Sender, never, select, unbounded};
use log::{debug, trace};

use super::record::Ranked;

/// One message on the coordinator's input channel.
#[derive(Debug)]
pub enum Partial<T> {
    /// Output of a chunk scan.
    Scanned(Vec<T>),
    /// Output of a pairwise merge dispatched by the coordinator.
    Merged(Vec<T>),
}

/// Outcome of one coordinator run.
#[derive(Debug)]
pub struct Reduction<T, S> {
    /// `None` when no partial result ever arrived.
    pub result: Option<Vec<T>>,
    /// Number of pairwise merges performed.
    pub merges: u64,
    /// Payload of the scan-finished signal.
    pub finished: S,
}

/// Merge two lists sorted by descending rank into the top `k` of their union,
/// still descending. Ties take from `a` first. O(k).
pub fn merge_top<T: Ranked>(a: Vec<T>, b: Vec<T>, k: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(k.min(a.len() + b.len()));
    let mut a = a.into_iter().peekable();
    let mut b = b.into_iter().peekable();

    while out.len() < k {
        let take_a = match (a.peek(), b.peek()) {
            (Some(x), Some(y)) => x.rank() >= y.rank(),
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_a { a.next() } else { b.next() };
        out.extend(next);
    }
    out
}

pub struct Reducer<T> {
    k: usize,
    pool: rayon::ThreadPool,
    tx: Sender<Partial<T>>,
    rx: Receiver<Partial<T>>,
}

impl<T: Ranked + Send + 'static> Reducer<T> {
    /// `max_merges` bounds how many merges run at once; further merges
    /// queue on the pool until a worker frees up.
    pub fn new(k: usize, max_merges: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_merges.max(1))
            .thread_name(|i| format!("flargest-merge-{}", i))
            .build()?;
        let (tx, rx) = unbounded();
        Ok(Reducer { k, pool, tx, rx })
    }

    /// Producer handle for scan results.
    pub fn sender(&self) -> Sender<Partial<T>> {
        self.tx.clone()
    }

    /// Drive the reduction until scanning has finished and everything has
    /// been merged down. `finished` must receive exactly one message (or be
    /// disconnected) once no more scan results will be sent.
    pub fn run<S: Default>(self, finished: Receiver<S>) -> Reduction<T, S> {
        let disabled = never();
        let mut finished_with: Option<S> = None;
        let mut state = PairingState::default();

        while finished_with.is_none() || state.in_flight > 0 || !self.rx.is_empty() {
            // The finish signal fires once; afterwards only arrivals can wake us.
            let finish_source = if finished_with.is_none() {
                &finished
            } else {
                &disabled
            };
            select! {
                recv(self.rx) -> msg => {
                    // We hold a sender ourselves, so the channel never disconnects.
                    if let Ok(partial) = msg
                        && let Some((a, b)) = state.accept(partial)
                    {
                        self.dispatch(a, b);
                    }
                }
                recv(finish_source) -> msg => {
                    debug!("scanning finished; {} merge(s) in flight", state.in_flight);
                    finished_with = Some(msg.unwrap_or_default());
                }
            }
        }

        Reduction {
            result: state.parked,
            merges: state.merges,
            finished: finished_with.unwrap_or_default(),
        }
    }

    fn dispatch(&self, a: Vec<T>, b: Vec<T>) {
        let tx = self.tx.clone();
        let k = self.k;
        self.pool.spawn(move || {
            let (la, lb) = (a.len(), b.len());
            let merged = merge_top(a, b, k);
            trace!("merged {} + {} -> {}", la, lb, merged.len());
            let _ = tx.send(Partial::Merged(merged));
        });
    }
}

/// The two-slot pairing buffer plus merge bookkeeping. Only the coordinator
/// thread touches it.
struct PairingState<T> {
    parked: Option<Vec<T>>,
    in_flight: usize,
    merges: u64,
}

impl<T> Default for PairingState<T> {
    fn default() -> Self {
        PairingState {
            parked: None,
            in_flight: 0,
            merges: 0,
        }
    }
}

impl<T> PairingState<T> {
    /// Take in one arrival. Returns a pair to merge once two are buffered.
    fn accept(&mut self, partial: Partial<T>) -> Option<(Vec<T>, Vec<T>)> {
        let items = match partial {
            Partial::Scanned(items) => items,
            Partial::Merged(items) => {
                // Every dispatched merge sends exactly one Merged message.
                self.in_flight -= 1;
                items
            }
        };
        match self.parked.take() {
            None => {
                self.parked = Some(items);
                None
            }
            Some(first) => {
                self.in_flight += 1;
                self.merges += 1;
                Some((first, items))
            }
        }
    }
}
