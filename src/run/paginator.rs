//! Incremental fetch of the trailing window from the paged inbox.
//!
//! Pages must arrive newest-first: once the last (oldest) entry of a page is
//! outside the window every later page is too, so fetching stops there.

use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::domain::entry::{InboxEntry, SortOrder};
use crate::domain::timestamp::Window;
use crate::error::ListError;
use crate::remote::InboxSource;

/// Collect every in-window entry from `source`. Rejects oldest-first listings.
pub fn collect_window(
    source: &dyn InboxSource,
    order: SortOrder,
    window: &Window,
    page_delay: Duration,
) -> Result<Vec<InboxEntry>, ListError> {
    if order != SortOrder::NewestFirst {
        return Err(ListError::UnsupportedOrder);
    }
    fetch_recent_entries(|page| source.list_page(page, order), window, page_delay)
}

/// Walk pages from 1 until a page is empty or its last entry falls outside `window`.
///
/// `list_page` must yield newest-first pages. Any error aborts the walk and
/// discards what was accumulated.
pub fn fetch_recent_entries<F>(
    list_page: F,
    window: &Window,
    page_delay: Duration,
) -> Result<Vec<InboxEntry>, ListError>
where
    F: FnMut(u32) -> Result<Vec<InboxEntry>, ListError>,
{
    info!("collecting entries from the last {} days", window.days());
    fetch_entries_while(list_page, |t| window.contains(t), page_delay)
}

/// Page walk with an arbitrary recency test, evaluated once per entry.
fn fetch_entries_while<F, R>(
    mut list_page: F,
    mut is_recent: R,
    page_delay: Duration,
) -> Result<Vec<InboxEntry>, ListError>
where
    F: FnMut(u32) -> Result<Vec<InboxEntry>, ListError>,
    R: FnMut(&str) -> bool,
{
    let mut page = 1;
    let mut out = Vec::new();

    loop {
        let items = list_page(page)?;
        if items.is_empty() {
            debug!("page {page} is empty, inbox exhausted");
            break;
        }
        debug!("page {page}: {} entries", items.len());

        // Pages are non-empty here, so this ends up describing the oldest entry.
        let mut last_recent = false;
        let mut kept = 0;
        for item in items {
            last_recent = is_recent(item.create_time());
            if last_recent {
                out.push(item);
                kept += 1;
            }
        }
        if kept > 0 {
            info!("fetched page {page}, {kept} entries in window");
        }

        if !last_recent {
            info!("reached entries outside the window, stopping");
            break;
        }

        page += 1;
        if !page_delay.is_zero() {
            thread::sleep(page_delay);
        }
    }

    info!("{} entries in window", out.len());
    Ok(out)
}
