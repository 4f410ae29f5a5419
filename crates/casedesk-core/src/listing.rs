//! Client-side filtering, sorting and pagination of fetched cases.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::case::Case;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Deadline,
    Category,
    Progress,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown status filter '{other}' (all, pending, completed)")),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deadline" => Ok(Self::Deadline),
            "category" => Ok(Self::Category),
            "progress" => Ok(Self::Progress),
            other => Err(format!("unknown sort key '{other}' (deadline, category, progress)")),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order '{other}' (asc, desc)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListQuery {
    pub status: StatusFilter,
    /// Case-insensitive match on category or any requirement name.
    pub search: Option<String>,
    pub sort: SortKey,
    pub order: SortOrder,
    /// 1-based.
    pub page: usize,
    pub per_page: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            status: StatusFilter::All,
            search: None,
            sort: SortKey::Deadline,
            order: SortOrder::Asc,
            page: 1,
            per_page: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub pages: usize,
}

impl ListQuery {
    fn keeps(&self, case: &Case) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Pending => !case.is_complete(),
            StatusFilter::Completed => case.is_complete(),
        };
        if !status_ok {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                case.category.to_lowercase().contains(&needle)
                    || case
                        .documents
                        .iter()
                        .any(|d| d.name.to_lowercase().contains(&needle))
            }
        }
    }

    fn compare(&self, a: &Case, b: &Case) -> Ordering {
        let ordering = match self.sort {
            // Missing deadlines sort last regardless of direction.
            SortKey::Deadline => {
                return match (a.deadline, b.deadline) {
                    (Some(x), Some(y)) => match self.order {
                        SortOrder::Asc => x.cmp(&y),
                        SortOrder::Desc => y.cmp(&x),
                    },
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
            }
            SortKey::Category => a.category.to_lowercase().cmp(&b.category.to_lowercase()),
            SortKey::Progress => a.progress().percent.cmp(&b.progress().percent),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    /// Filter, sort (stable) and slice `cases` into one page.
    pub fn apply<'a>(&self, cases: &'a [Case]) -> Page<&'a Case> {
        let per_page = self.per_page.max(1);
        let page = self.page.max(1);

        let mut matching: Vec<&Case> = cases.iter().filter(|c| self.keeps(c)).collect();
        matching.sort_by(|a, b| self.compare(a, b));

        let total = matching.len();
        let pages = total.div_ceil(per_page);
        let items = matching
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();

        Page {
            items,
            page,
            per_page,
            total,
            pages,
        }
    }
}
