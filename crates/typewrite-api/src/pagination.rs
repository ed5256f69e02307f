use serde::Deserialize;
use typewrite_types::api::Pagination;

pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: default_page(), limit: default_limit() }
    }
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

impl PageQuery {
    /// Clamps page and limit to sane bounds; zero values count as one.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Safe on un-normalized queries: page zero counts as page one.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit)
    }
}

/// Pagination block for a list response. Total pages round up and floor at
/// one so an empty table still reports a single page.
pub fn paginate(count: u64, query: PageQuery) -> Pagination {
    let total_pages = (count.div_ceil(u64::from(query.limit)) as u32).max(1);
    Pagination {
        current_page: query.page,
        total_pages,
        count,
        limit: query.limit,
        next: (query.page < total_pages).then(|| query.page + 1),
        prev: (query.page > 1).then(|| query.page - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(page: u32, limit: u32) -> PageQuery {
        PageQuery { page, limit }.normalized()
    }

    #[test]
    fn offset_is_page_minus_one_times_limit() {
        assert_eq!(q(1, 10).offset(), 0);
        assert_eq!(q(3, 25).offset(), 50);
    }

    #[test]
    fn zero_values_are_clamped() {
        let query = PageQuery { page: 0, limit: 0 }.normalized();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 1);
        assert_eq!(PageQuery { page: 1, limit: 10_000 }.normalized().limit, MAX_LIMIT);
    }

    #[test]
    fn offset_tolerates_page_zero() {
        // No normalization on purpose
        assert_eq!(PageQuery { page: 0, limit: 10 }.offset(), 0);
    }

    #[test]
    fn total_pages_round_up() {
        assert_eq!(paginate(21, q(1, 10)).total_pages, 3);
        assert_eq!(paginate(20, q(1, 10)).total_pages, 2);
        // Fewer rows than the limit is still one page
        assert_eq!(paginate(3, q(1, 10)).total_pages, 1);
        assert_eq!(paginate(0, q(1, 10)).total_pages, 1);
    }

    #[test]
    fn next_and_prev_edges() {
        let first = paginate(30, q(1, 10));
        assert_eq!(first.prev, None);
        assert_eq!(first.next, Some(2));

        let middle = paginate(30, q(2, 10));
        assert_eq!(middle.prev, Some(1));
        assert_eq!(middle.next, Some(3));

        let last = paginate(30, q(3, 10));
        assert_eq!(last.prev, Some(2));
        assert_eq!(last.next, None);
    }
}
