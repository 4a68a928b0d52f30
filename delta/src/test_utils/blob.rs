use delta_config::shared::MAX_BLOB_PAGE_SIZE;

use crate::blob::memory::MemoryBlobContainer;
use crate::blob::{BlobContainerClient, ListBlobsRequest};
use crate::error::DeltaResult;
use crate::prefix_tree::PrefixNode;

/// Creates a container holding block blobs named `names`, each with its name as content.
pub async fn container_with_blobs(names: &[&str]) -> MemoryBlobContainer {
    let container = MemoryBlobContainer::new();
    for name in names {
        container.put_block_blob(*name, name.as_bytes()).await;
    }

    container
}

/// First `count` names of a flat listing of the parent prefix, resumed at the node token.
///
/// For a correctly built tree these are the names starting at the node's own prefix.
pub async fn blob_names_at<C>(
    client: &C,
    node: &PrefixNode,
    count: usize,
) -> DeltaResult<Vec<String>>
where
    C: BlobContainerClient,
{
    let parent_prefix = node
        .parent()
        .map(|parent| parent.prefix().to_string())
        .unwrap_or_default();

    let request = ListBlobsRequest::flat(parent_prefix, MAX_BLOB_PAGE_SIZE)
        .with_continuation(node.token().cloned());
    let segment = client.list_blobs_segmented(request).await?;

    Ok(segment
        .items
        .iter()
        .take(count)
        .map(|entry| entry.name().to_string())
        .collect())
}
