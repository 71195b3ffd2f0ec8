//! Paging and sorting for repository queries.
//!
//! Pages are 0-based. `Pageable::from_query` understands the request
//! parameters `page`, `size` and repeatable `sort=property[,asc|desc]`.

/// Page size used when the request does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on a requested page size.
pub const MAX_PAGE_SIZE: u32 = 2000;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One sort criterion (`property` is the JSON field name, e.g. `isBroken`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub property: String,
    pub direction: Direction,
}

impl Order {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Desc,
        }
    }

    /// Parse `property[,asc|desc]`. Unknown directions fall back to ascending.
    fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(',').map(str::trim);
        let property = parts.next().filter(|p| !p.is_empty())?;
        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            Some("desc") => Direction::Desc,
            _ => Direction::Asc,
        };
        Some(Self {
            property: property.to_string(),
            direction,
        })
    }
}

/// Page request: page number, page size, sort criteria (applied in order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pageable {
    pub page: u32,
    pub size: u32,
    pub sort: Vec<Order>,
}

impl Default for Pageable {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: Vec::new(),
        }
    }
}

impl Pageable {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: effective_size(size),
            sort: Vec::new(),
        }
    }

    pub fn with_sort(mut self, order: Order) -> Self {
        self.sort.push(order);
        self
    }

    /// Offset of the first element of this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    /// Build a page request from a raw (still percent-encoded) query string.
    ///
    /// Malformed numbers are ignored in favor of the defaults.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut pageable = Self::default();

        for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "page" => {
                    if let Ok(page) = value.parse() {
                        pageable.page = page;
                    }
                }
                "size" => {
                    if let Ok(size) = value.parse() {
                        pageable.size = effective_size(size);
                    }
                }
                "sort" => pageable.sort.extend(Order::parse(&value)),
                _ => {}
            }
        }

        pageable
    }
}

/// Zero means "unspecified"; anything above the cap is capped.
fn effective_size(size: u32) -> u32 {
    match size {
        0 => DEFAULT_PAGE_SIZE,
        n => n.min(MAX_PAGE_SIZE),
    }
}

/// A page of results plus the size of the whole collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, pageable: &Pageable, total_elements: u64) -> Self {
        Self {
            content,
            number: pageable.page,
            size: pageable.size,
            total_elements,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 1;
        }
        self.total_elements.div_ceil(u64::from(self.size))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.number) + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_query_missing() {
        let p = Pageable::from_query(None);
        assert_eq!(p, Pageable::default());
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn parses_page_size_and_repeated_sort() {
        let p = Pageable::from_query(Some("page=2&size=5&sort=id,desc&sort=name"));
        assert_eq!(p.page, 2);
        assert_eq!(p.size, 5);
        assert_eq!(p.offset(), 10);
        assert_eq!(p.sort, vec![Order::desc("id"), Order::asc("name")]);
    }

    #[test]
    fn decodes_encoded_comma_in_sort() {
        let p = Pageable::from_query(Some("sort=age%2Cdesc"));
        assert_eq!(p.sort, vec![Order::desc("age")]);

        let p = Pageable::from_query(Some("sort=is%42roken+,+desc&size=%33"));
        assert_eq!(p.sort, vec![Order::desc("isBroken")]);
        assert_eq!(p.size, 3);
    }

    #[test]
    fn ignores_malformed_numbers_and_caps_size() {
        let p = Pageable::from_query(Some("page=abc&size=999999"));
        assert_eq!(p.page, 0);
        assert_eq!(p.size, MAX_PAGE_SIZE);

        let p = Pageable::from_query(Some("size=0"));
        assert_eq!(p.size, DEFAULT_PAGE_SIZE);
        assert_eq!(Pageable::new(0, 0).size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn page_arithmetic() {
        let pageable = Pageable::new(1, 2);
        let page: Page<u8> = Page::new(vec![3, 4], &pageable, 5);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        assert!(page.has_previous());

        let empty: Page<u8> = Page::new(vec![], &Pageable::default(), 0);
        assert_eq!(empty.total_pages(), 0);
        assert!(!empty.has_next());
        assert!(!empty.has_previous());
    }
}
