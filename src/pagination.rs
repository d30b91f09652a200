use tracing::debug;

use crate::error::Result;

pub const RECORDS_PER_PAGE: u32 = 100;

/// One page of a listing together with the server's page summary.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Requests pages 1, 2, ... until the reported page reaches the reported
/// total. The first failing page aborts the walk and the pages gathered so
/// far are dropped.
pub fn collect_pages<T, F>(mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Result<Page<T>>,
{
    let mut all = Vec::new();
    let mut page = 1;
    loop {
        let batch = fetch_page(page)?;
        debug!(
            page,
            total_pages = batch.total_pages,
            items = batch.items.len(),
            "fetched page"
        );
        let more = batch.has_more() && page < batch.total_pages;
        all.extend(batch.items);
        if !more {
            return Ok(all);
        }
        page += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DnsError;

    fn page(start: usize, len: usize, page: u32, total_pages: u32) -> Page<usize> {
        Page {
            items: (start..start + len).collect(),
            page,
            total_pages,
        }
    }

    #[test]
    fn accumulates_pages_in_arrival_order() {
        let sizes = [100, 100, 37];
        let mut requested = Vec::new();
        let all = collect_pages(|n| {
            requested.push(n);
            let idx = (n - 1) as usize;
            Ok(page(idx * 100, sizes[idx], n, 3))
        })
        .unwrap();

        assert_eq!(requested, [1, 2, 3]);
        assert_eq!(all.len(), 237);
        assert!(all.windows(2).all(|w| w[0] + 1 == w[1]));
    }

    #[test]
    fn failing_page_discards_everything() {
        let mut calls = 0;
        let result = collect_pages(|n| {
            calls += 1;
            if n == 2 {
                Err(DnsError::Api {
                    context: "Records".into(),
                    message: "page 2 exploded".into(),
                })
            } else {
                Ok(page(0, 100, n, 3))
            }
        });

        assert!(matches!(result, Err(DnsError::Api { .. })));
        assert_eq!(calls, 2, "walk stops at the first failure");
    }

    #[test]
    fn single_or_empty_listing_stops_after_first_page() {
        let all = collect_pages(|n| Ok(page(0, 0, n, 0))).unwrap();
        assert!(all.is_empty());

        let all = collect_pages(|n| Ok(page(0, 12, n, 1))).unwrap();
        assert_eq!(all.len(), 12);
    }

    #[test]
    fn stale_page_number_cannot_loop_forever() {
        let mut calls = 0;
        let all = collect_pages(|_| {
            calls += 1;
            Ok(page(0, 10, 1, 3))
        })
        .unwrap();

        assert_eq!(calls, 3);
        assert_eq!(all.len(), 30);
    }
}
