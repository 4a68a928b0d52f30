use std::future::Future;
use std::vec;

use tracing::debug;

use crate::error::DeltaResult;
use crate::source::{ContinuationToken, Cursor, KeyRange, Keyed, Positioned};

/// One page returned by a backend listing call.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment<T> {
    pub items: Vec<T>,
    /// Token for the next page, `None` when the listing is exhausted.
    pub continuation: Option<ContinuationToken>,
}

impl<T> Segment<T> {
    pub fn new(items: Vec<T>, continuation: Option<ContinuationToken>) -> Self {
        Self {
            items,
            continuation,
        }
    }
}

/// Fetches single segments of a token-paged listing.
pub trait SegmentPager: Send + Sync {
    type Item: Keyed + Send;

    fn fetch_segment(
        &self,
        continuation: Option<ContinuationToken>,
    ) -> impl Future<Output = DeltaResult<Segment<Self::Item>>> + Send;
}

enum CursorState<T> {
    Initial {
        continuation: Option<ContinuationToken>,
    },
    Positioned {
        items: vec::IntoIter<T>,
        /// Token that fetched the current segment.
        continuation: Option<ContinuationToken>,
        next_continuation: Option<ContinuationToken>,
        segment_index: usize,
        next_item_index: usize,
    },
    Complete,
}

impl<T> CursorState<T> {
    fn positioned(
        segment: Segment<T>,
        continuation: Option<ContinuationToken>,
        segment_index: usize,
    ) -> Self {
        CursorState::Positioned {
            items: segment.items.into_iter(),
            continuation,
            next_continuation: segment.continuation,
            segment_index,
            next_item_index: 0,
        }
    }
}

/// Cursor over any token-paged listing.
///
/// Segments are fetched lazily, one at a time. Empty segments that still carry a continuation
/// are skipped over. A failed fetch leaves the cursor where it was, so the error is reported
/// by the `advance` call that needed the page.
pub struct SegmentedCursor<P: SegmentPager> {
    pager: P,
    range: KeyRange<<P::Item as Keyed>::Key>,
    state: CursorState<P::Item>,
}

impl<P: SegmentPager> SegmentedCursor<P> {
    pub fn new(
        pager: P,
        range: KeyRange<<P::Item as Keyed>::Key>,
        initial_continuation: Option<ContinuationToken>,
    ) -> Self {
        Self {
            pager,
            range,
            state: CursorState::Initial {
                continuation: initial_continuation,
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, CursorState::Complete)
    }
}

impl<P: SegmentPager> Cursor for SegmentedCursor<P> {
    type Item = Positioned<P::Item>;

    async fn advance(&mut self) -> DeltaResult<Option<Self::Item>> {
        loop {
            match &mut self.state {
                CursorState::Complete => return Ok(None),
                CursorState::Initial { continuation } => {
                    let continuation = continuation.clone();
                    let segment = self.pager.fetch_segment(continuation.clone()).await?;
                    debug!(items = segment.items.len(), "fetched first segment");

                    self.state = CursorState::positioned(segment, continuation, 0);
                }
                CursorState::Positioned {
                    items,
                    continuation,
                    next_continuation,
                    segment_index,
                    next_item_index,
                } => {
                    if let Some(item) = items.next() {
                        let item_index = *next_item_index;
                        *next_item_index += 1;

                        if self.range.is_past_max(item.key()) {
                            self.state = CursorState::Complete;
                            return Ok(None);
                        }

                        if self.range.is_below_min(item.key()) {
                            continue;
                        }

                        return Ok(Some(Positioned {
                            item,
                            continuation: continuation.clone(),
                            segment_index: *segment_index,
                            item_index,
                        }));
                    }

                    let Some(next) = next_continuation.clone() else {
                        self.state = CursorState::Complete;
                        return Ok(None);
                    };

                    let segment_index = *segment_index + 1;
                    let segment = self.pager.fetch_segment(Some(next.clone())).await?;
                    debug!(
                        segment_index,
                        items = segment.items.len(),
                        "fetched next segment"
                    );

                    self.state = CursorState::positioned(segment, Some(next), segment_index);
                }
            }
        }
    }
}
