use handle_errors::Error;
use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 50;

/// Pagination 구조체는 쿼리 매개변수에서 추출된다
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1부터 시작하는 페이지 번호
    page: u32,
    /// 한 페이지에 담길 아이템 수, 최대 50
    limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, limit: u32) -> Self {
        Pagination {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// 건너뛸 아이템 수, 범위를 넘으면 u64::MAX 에서 멈춘다
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1).saturating_mul(u64::from(self.limit))
    }
}

/// 매개변수를 목록 요청에서 추출하기
/// # 예제 쿼리
/// ?page=2&limit=20
/// # 사용 예
/// ```rust
/// use std::collections::HashMap;
/// let mut query = HashMap::new();
/// query.insert("page".to_string(), "3".to_string());
/// query.insert("limit".to_string(), "20".to_string());
/// let p = content_service::types::pagination::extract_pagination(query).unwrap();
/// assert_eq!(p.page(), 3);
/// assert_eq!(p.offset(), 40);
/// ```
pub fn extract_pagination(params: HashMap<String, String>) -> Result<Pagination, Error> {
    let page = match params.get("page") {
        Some(page) => page.parse::<u32>().map_err(Error::ParseError)?,
        None => 1,
    };
    let limit = match params.get("limit") {
        Some(limit) => limit.parse::<u32>().map_err(Error::ParseError)?,
        None => DEFAULT_PAGE_SIZE,
    };

    Ok(Pagination::new(page, limit))
}

/// One page of results and where it sits in the whole set.
#[derive(Serialize, Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub has_more: bool,
    pub items_per_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(u64::from(pagination.limit)) as u32;
        Page {
            items,
            current_page: pagination.page,
            total_pages,
            total_items,
            has_more: pagination.page < total_pages,
            items_per_page: pagination.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_given() {
        let p = extract_pagination(HashMap::new()).unwrap();
        assert_eq!(p, Pagination::default());
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn limit_is_capped() {
        let mut params = HashMap::new();
        params.insert("limit".to_string(), "500".to_string());
        assert_eq!(extract_pagination(params).unwrap().limit(), MAX_PAGE_SIZE);
    }

    #[test]
    fn page_zero_is_first_page() {
        assert_eq!(Pagination::new(0, 10).page(), 1);
        assert_eq!(Pagination::new(1, 0).limit(), 1);
    }

    #[test]
    fn huge_page_number_does_not_overflow_offset() {
        let mut params = HashMap::new();
        params.insert("page".to_string(), "100000000".to_string());
        params.insert("limit".to_string(), "50".to_string());
        let p = extract_pagination(params).unwrap();
        assert_eq!(p.offset(), 99_999_999 * 50);

        let last = Pagination::new(u32::MAX, MAX_PAGE_SIZE);
        assert_eq!(
            last.offset(),
            u64::from(u32::MAX - 1) * u64::from(MAX_PAGE_SIZE)
        );
        let page = Page::<u8>::new(vec![], last, 3);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_more);
    }

    #[test]
    fn bad_number_is_a_parse_error() {
        let mut params = HashMap::new();
        params.insert("page".to_string(), "two".to_string());
        assert!(matches!(extract_pagination(params), Err(Error::ParseError(_))));
    }

    #[test]
    fn page_totals() {
        let page = Page::new(vec![1, 2], Pagination::new(2, 10), 25);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_more);

        let last = Page::<u8>::new(vec![], Pagination::new(3, 10), 25);
        assert!(!last.has_more);
    }
}
