//! Windowing over an ordered sequence. Pages are 1-based.

pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Returns the `page_index`-th window of `items`, or an empty slice when the
/// page lies outside the sequence. Callers reset to page 1 themselves.
pub fn slice<T>(items: &[T], page_index: usize, page_size: usize) -> &[T] {
    if page_index == 0 || page_size == 0 {
        return &[];
    }
    let Some(start) = (page_index - 1).checked_mul(page_size) else {
        return &[];
    };
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

#[cfg(test)]
#[path = "tests/paginator_tests.rs"]
mod tests;
