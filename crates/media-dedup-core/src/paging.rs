use media_dedup_models::MovieRecord;
use media_dedup_sources::{ItemPage, SourceError};
use std::future::Future;

/// Stitch a paginated listing together.
///
/// `fetch_page(offset)` is called with offsets that advance by the number of
/// items actually received, until the cumulative count reaches the total the
/// server reports. An empty page before that point is a truncated listing.
pub(crate) async fn fetch_all_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<MovieRecord>, SourceError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<ItemPage, SourceError>>,
{
    let mut items = Vec::new();
    loop {
        let page = fetch_page(items.len()).await?;
        let total = page.total_count;
        let received = page.items.len();
        items.extend(page.items);

        if items.len() >= total {
            return Ok(items);
        }
        if received == 0 {
            return Err(SourceError::TruncatedListing {
                received: items.len(),
                total,
            });
        }
    }
}
