use std::ops::Range;

/// Pagination settings; pages are 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    pub size: usize,
    pub page: usize,
}

impl PageSpec {
    pub fn new(size: usize) -> Self {
        Self { size, page: 1 }
    }
}

/// Number of pages needed for `units`, at least one
pub fn page_count(units: usize, size: usize) -> usize {
    if size == 0 {
        return 1;
    }
    units.div_ceil(size).max(1)
}

/// Clamp a requested page into `1..=page_count`
pub fn clamp_page(page: usize, units: usize, size: usize) -> usize {
    page.clamp(1, page_count(units, size))
}

/// Unit index range covered by a page
pub fn page_bounds(units: usize, spec: PageSpec) -> Range<usize> {
    if spec.size == 0 {
        return 0..units;
    }
    let page = clamp_page(spec.page, units, spec.size);
    let start = ((page - 1) * spec.size).min(units);
    let end = (start + spec.size).min(units);
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(5, 0), 1);
    }

    #[test]
    fn test_page_bounds_clamps() {
        assert_eq!(page_bounds(25, PageSpec { size: 10, page: 3 }), 20..25);
        assert_eq!(page_bounds(25, PageSpec { size: 10, page: 9 }), 20..25);
        assert_eq!(page_bounds(25, PageSpec { size: 10, page: 0 }), 0..10);
        assert_eq!(page_bounds(0, PageSpec::new(10)), 0..0);
    }
}
