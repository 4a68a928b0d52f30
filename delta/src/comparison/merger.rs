use futures::Stream;
use metrics::counter;
use tracing::debug;

use crate::bail;
use crate::comparison::{Comparison, ComparisonKind, ComparisonPolicy};
use crate::error::{DeltaResult, ErrorKind};
use crate::metrics::{DELTA_COMPARISONS_TOTAL, OUTCOME_LABEL};
use crate::source::{Cursor, OrderedSource};

/// Which cursors must move before the next comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Advance {
    Both,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergerState {
    Ready(Advance),
    Completed,
    Failed,
}

/// Lock-step merge of two ordered cursors into a stream of [`Comparison`] records.
///
/// Records come out in ascending key order, one per distinct key found on either side. A key
/// missing from one side only moves the other cursor; any other outcome moves both, and those
/// two fetches run concurrently. Cursors are advanced lazily, right before the comparison that
/// needs them, so nothing is fetched until the first call to [`ComparisonMerger::next`].
///
/// The merger is forward-only. After an error it refuses further use.
pub struct ComparisonMerger<LC, RC, P>
where
    LC: Cursor,
    RC: Cursor,
{
    left: LC,
    right: RC,
    policy: P,
    left_current: Option<LC::Item>,
    right_current: Option<RC::Item>,
    state: MergerState,
    emitted: usize,
}

impl<LC, RC, P> ComparisonMerger<LC, RC, P>
where
    LC: Cursor,
    RC: Cursor,
    P: ComparisonPolicy<LC::Item, RC::Item>,
{
    /// Opens a fresh cursor on each source.
    pub fn new<LS, RS>(left: &LS, right: &RS, policy: P) -> Self
    where
        LS: OrderedSource<Cursor = LC>,
        RS: OrderedSource<Cursor = RC>,
    {
        Self::from_cursors(left.open(), right.open(), policy)
    }

    pub fn from_cursors(left: LC, right: RC, policy: P) -> Self {
        Self {
            left,
            right,
            policy,
            left_current: None,
            right_current: None,
            state: MergerState::Ready(Advance::Both),
            emitted: 0,
        }
    }

    /// Returns the next record, or `None` once both sides are exhausted.
    pub async fn next(&mut self) -> DeltaResult<Option<Comparison<LC::Item, RC::Item, P::Kind>>> {
        let advance = match self.state {
            MergerState::Ready(advance) => advance,
            MergerState::Completed => return Ok(None),
            MergerState::Failed => bail!(
                ErrorKind::InvalidState,
                "The comparison merger failed and cannot be advanced"
            ),
        };

        match self.step(advance).await {
            Ok(comparison) => Ok(comparison),
            Err(err) => {
                self.state = MergerState::Failed;
                Err(err)
            }
        }
    }

    async fn step(
        &mut self,
        advance: Advance,
    ) -> DeltaResult<Option<Comparison<LC::Item, RC::Item, P::Kind>>> {
        match advance {
            Advance::Both => {
                let (left, right) = tokio::try_join!(self.left.advance(), self.right.advance())?;
                self.left_current = left;
                self.right_current = right;
            }
            Advance::Left => self.left_current = self.left.advance().await?,
            Advance::Right => self.right_current = self.right.advance().await?,
        }

        if self.left_current.is_none() && self.right_current.is_none() {
            debug!(records = self.emitted, "comparison completed");
            self.state = MergerState::Completed;
            return Ok(None);
        }

        let kind = self
            .policy
            .compare(self.left_current.as_ref(), self.right_current.as_ref())?;

        let (left, right, next) = if kind.is_missing_from_left() {
            (None, self.right_current.take(), Advance::Right)
        } else if kind.is_missing_from_right() {
            (self.left_current.take(), None, Advance::Left)
        } else {
            (
                self.left_current.take(),
                self.right_current.take(),
                Advance::Both,
            )
        };

        let outcome = outcome_label(&kind);
        let comparison = Comparison::new(kind, left, right)?;
        self.state = MergerState::Ready(next);
        self.emitted += 1;
        counter!(DELTA_COMPARISONS_TOTAL, OUTCOME_LABEL => outcome).increment(1);

        Ok(Some(comparison))
    }

    /// Drives the merger to the end and returns every record.
    pub async fn collect(mut self) -> DeltaResult<Vec<Comparison<LC::Item, RC::Item, P::Kind>>> {
        let mut comparisons = Vec::new();
        while let Some(comparison) = self.next().await? {
            comparisons.push(comparison);
        }

        Ok(comparisons)
    }

    /// Turns the merger into a stream that ends after the first error.
    pub fn into_stream(
        self,
    ) -> impl Stream<Item = DeltaResult<Comparison<LC::Item, RC::Item, P::Kind>>> + Send
    where
        Self: Send,
    {
        futures::stream::try_unfold(self, |mut merger| async move {
            let comparison = merger.next().await?;
            Ok(comparison.map(|comparison| (comparison, merger)))
        })
    }
}

fn outcome_label<K: ComparisonKind>(kind: &K) -> &'static str {
    if kind.is_same() {
        "same"
    } else if kind.is_missing_from_left() {
        "missing_from_left"
    } else if kind.is_missing_from_right() {
        "missing_from_right"
    } else {
        "different"
    }
}
