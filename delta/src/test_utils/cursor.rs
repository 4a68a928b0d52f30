use crate::error::DeltaResult;
use crate::source::{Cursor, OrderedSource};

/// Reads a cursor to its end.
pub async fn drain<C>(cursor: &mut C) -> DeltaResult<Vec<C::Item>>
where
    C: Cursor,
{
    let mut items = Vec::new();
    while let Some(item) = cursor.advance().await? {
        items.push(item);
    }

    Ok(items)
}

/// Opens a fresh cursor over `source` and reads it to its end.
pub async fn read_all<S>(source: &S) -> DeltaResult<Vec<<S::Cursor as Cursor>::Item>>
where
    S: OrderedSource,
{
    drain(&mut source.open()).await
}
