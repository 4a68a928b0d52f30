use std::sync::Arc;

use delta_config::shared::PrefixTreeConfig;
use metrics::counter;
use tracing::{Instrument, debug, info, info_span};

use crate::blob::{BlobContainerClient, BlobSegment, ListBlobsRequest};
use crate::concurrency::producer_queue::ProducerQueue;
use crate::error::{DeltaResult, ErrorKind};
use crate::metrics::{
    BACKEND_LABEL, BLOB_BACKEND, DELTA_BACKEND_REQUESTS_TOTAL, DELTA_PREFIX_NODES_ENUMERATED_TOTAL,
};
use crate::prefix_tree::node::PrefixNode;
use crate::prefix_tree::text::next_character;
use crate::source::ContinuationToken;
use crate::{bail, delta_error};

/// How many levels below the starting node to discover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Levels(usize),
    Unbounded,
}

impl Depth {
    /// Depth left for the children of a node expanded at this depth, if any.
    fn descend(self) -> Option<Depth> {
        match self {
            Depth::Levels(levels) if levels > 1 => Some(Depth::Levels(levels - 1)),
            Depth::Levels(_) => None,
            Depth::Unbounded => Some(Depth::Unbounded),
        }
    }

    fn is_zero(self) -> bool {
        self == Depth::Levels(0)
    }
}

impl Default for Depth {
    fn default() -> Self {
        Depth::Levels(1)
    }
}

/// Discovers the leading characters of blob names under a prefix, one tree level at a time.
///
/// Each node is expanded with delimited listings of two entries, using every newly found
/// character as the next delimiter, so a level costs a few calls per child instead of a
/// full listing. Nodes are expanded concurrently by a pool of workers.
#[derive(Debug, Clone)]
pub struct PrefixTreeBuilder {
    config: PrefixTreeConfig,
}

impl PrefixTreeBuilder {
    pub fn new(config: PrefixTreeConfig) -> DeltaResult<Self> {
        config.validate()?;

        Ok(Self { config })
    }

    pub fn config(&self) -> &PrefixTreeConfig {
        &self.config
    }

    /// Builds a fresh tree rooted at `prefix`.
    pub async fn enumerate_leading_characters<C>(
        &self,
        client: &C,
        prefix: impl Into<String>,
        depth: Depth,
    ) -> DeltaResult<Arc<PrefixNode>>
    where
        C: BlobContainerClient + Clone + 'static,
    {
        let root = PrefixNode::root(prefix);
        self.enumerate_node(client, root.clone(), depth).await?;

        Ok(root)
    }

    /// Expands `node` and its subtree down to `depth` levels below it.
    ///
    /// Nodes already enumerated are not listed again, so drilling down from a previous result
    /// only pays for the new levels.
    pub async fn enumerate_node<C>(
        &self,
        client: &C,
        node: Arc<PrefixNode>,
        depth: Depth,
    ) -> DeltaResult<Arc<PrefixNode>>
    where
        C: BlobContainerClient + Clone + 'static,
    {
        if depth.is_zero() {
            return Ok(node);
        }

        let expander = Arc::new(NodeExpander {
            client: client.clone(),
        });

        ProducerQueue::new([(node.clone(), depth)])
            .run(self.config.worker_count, move |(node, depth)| {
                let expander = expander.clone();
                async move {
                    if !node.is_enumerated() {
                        let span = info_span!("enumerate_node", prefix = %node.prefix());
                        expander.expand(&node).instrument(span).await?;
                        counter!(DELTA_PREFIX_NODES_ENUMERATED_TOTAL).increment(1);
                    }

                    let children = match depth.descend() {
                        Some(depth) => node
                            .children()
                            .into_iter()
                            .map(|child| (child, depth))
                            .collect(),
                        None => Vec::new(),
                    };

                    Ok(children)
                }
            })
            .await?;

        Ok(node)
    }
}

struct NodeExpander<C> {
    client: C,
}

impl<C> NodeExpander<C>
where
    C: BlobContainerClient,
{
    async fn expand(&self, node: &Arc<PrefixNode>) -> DeltaResult<()> {
        info!(prefix = %node.prefix(), "starting the enumeration of leading characters");

        let Some(first_child) = self.first_child(node).await? else {
            return Ok(());
        };

        let prefix = node.prefix();
        let mut token = first_child.token().cloned();
        let mut delimiter = first_child.partial_prefix().to_string();

        loop {
            // Every name sharing `prefix + delimiter` collapses into one directory entry, so a
            // second entry means another leading character follows.
            let request = ListBlobsRequest::delimited(prefix, &delimiter, 2)
                .with_continuation(token.clone());
            let segment = self.list(request).await?;
            let Some(next) = segment.items.get(1) else {
                break;
            };

            token = Some(self.skip_delimiter(prefix, &delimiter, token).await?);
            delimiter = next_character(next.name(), prefix.len())?.to_string();
            debug!(delimiter = %delimiter, "now using delimiter");

            node.get_or_add_child(delimiter.clone(), token.clone())?;
        }

        node.mark_enumerated();
        info!(
            prefix = %prefix,
            count = node.child_count(),
            "found leading characters"
        );

        Ok(())
    }

    /// Adds the first child of `node`, or marks it enumerated when no other child can exist.
    async fn first_child(&self, node: &Arc<PrefixNode>) -> DeltaResult<Option<Arc<PrefixNode>>> {
        let prefix = node.prefix();
        debug!(prefix = %prefix, "fetching the first blob names");

        // Two names, since the first one may equal the prefix exactly.
        let segment = self.list(ListBlobsRequest::flat(prefix, 2)).await?;
        let names = segment
            .items
            .iter()
            .map(|entry| {
                if entry.is_directory() {
                    bail!(
                        ErrorKind::InvalidData,
                        "A flat listing returned a directory",
                        entry.name()
                    );
                }
                Ok(entry.name())
            })
            .collect::<DeltaResult<Vec<&str>>>()?;

        let Some(first) = names.first() else {
            info!(prefix = %prefix, "there are no blobs with this prefix");
            node.mark_enumerated();
            return Ok(None);
        };

        let (next_name, token) = if first.len() == prefix.len() {
            debug!(prefix = %prefix, "a blob name matches the prefix exactly");
            node.mark_blob();
            node.add_exact_match_child()?;

            let Some(second) = names.get(1) else {
                info!(prefix = %prefix, "the only blob name matches the prefix exactly");
                node.mark_enumerated();
                return Ok(None);
            };

            let skipped = self.list(ListBlobsRequest::flat(prefix, 1)).await?;
            (*second, Some(Self::require_continuation(skipped, prefix)?))
        } else {
            (*first, None)
        };

        let delimiter = next_character(next_name, prefix.len())?;
        debug!(delimiter = %delimiter, "starting with delimiter");

        node.get_or_add_child(delimiter, token).map(Some)
    }

    /// Token resuming the listing right after the directory entry of `delimiter`.
    async fn skip_delimiter(
        &self,
        prefix: &str,
        delimiter: &str,
        token: Option<ContinuationToken>,
    ) -> DeltaResult<ContinuationToken> {
        debug!(prefix = %prefix, delimiter = %delimiter, "fetching a continuation token");

        let request = ListBlobsRequest::delimited(prefix, delimiter, 1).with_continuation(token);
        let segment = self.list(request).await?;

        Self::require_continuation(segment, prefix)
    }

    async fn list(&self, request: ListBlobsRequest) -> DeltaResult<BlobSegment> {
        counter!(DELTA_BACKEND_REQUESTS_TOTAL, BACKEND_LABEL => BLOB_BACKEND).increment(1);
        let segment = self.client.list_blobs_segmented(request.clone()).await?;

        let entries: Vec<&str> = segment.items.iter().map(|entry| entry.name()).collect();
        debug!(
            prefix = %request.prefix,
            delimiter = ?request.delimiter,
            count = entries.len(),
            entries = ?entries,
            "got a segment"
        );

        Ok(segment)
    }

    fn require_continuation(segment: BlobSegment, prefix: &str) -> DeltaResult<ContinuationToken> {
        segment.continuation.ok_or_else(|| {
            delta_error!(
                ErrorKind::InvalidData,
                "A listing with more entries returned no continuation token",
                format!("prefix '{prefix}'")
            )
        })
    }
}
