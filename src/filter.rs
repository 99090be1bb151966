// src/filter.rs
//! Conjunctive job filters and page slicing over a result set

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

use crate::error::{JobBoardError, Result};
use crate::types::{CompanyId, Job};

/// Optional filters for `listJobs`. An empty or all-whitespace string is the
/// same as "not set"; any other value is used exactly as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFilter {
    pub location: Option<String>,
    pub company_id: Option<CompanyId>,
    pub search_query: Option<String>,
}

/// One conjunct of a job filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `location = value`
    LocationEq(String),
    /// `company_id = value`
    CompanyEq(CompanyId),
    /// Title contains `value`, compared after Unicode lowercasing
    TitleContains(String),
}

impl Predicate {
    pub fn column(&self) -> &'static str {
        match self {
            Predicate::LocationEq(_) => "location",
            Predicate::CompanyEq(_) => "company_id",
            Predicate::TitleContains(_) => "title",
        }
    }

    /// Evaluate the predicate against an already fetched job
    pub fn matches(&self, job: &Job) -> bool {
        match self {
            Predicate::LocationEq(location) => job.location == *location,
            Predicate::CompanyEq(company_id) => job.company_id == *company_id,
            Predicate::TitleContains(term) => job
                .title
                .to_lowercase()
                .contains(&term.to_lowercase()),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl JobFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from raw form values, where "" means unset
    pub fn from_raw(location: &str, company_id: &str, search_query: &str) -> Result<Self> {
        Ok(Self {
            location: non_blank(location),
            company_id: parse_company_id(company_id)?,
            search_query: non_blank(search_query),
        })
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = non_blank(location);
        self
    }

    pub fn with_company(mut self, company_id: Option<CompanyId>) -> Self {
        self.company_id = company_id;
        self
    }

    pub fn with_search(mut self, search_query: &str) -> Self {
        self.search_query = non_blank(search_query);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates().is_empty()
    }

    /// Present, non-empty fields in a fixed order: location, company, title
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();

        if let Some(location) = self.location.as_deref().and_then(non_blank) {
            predicates.push(Predicate::LocationEq(location));
        }
        if let Some(company_id) = self.company_id {
            predicates.push(Predicate::CompanyEq(company_id));
        }
        if let Some(term) = self.search_query.as_deref().and_then(non_blank) {
            predicates.push(Predicate::TitleContains(term));
        }

        predicates
    }

    pub fn matches(&self, job: &Job) -> bool {
        self.predicates().iter().all(|p| p.matches(job))
    }
}

fn parse_company_id(raw: &str) -> Result<Option<CompanyId>> {
    match non_blank(raw) {
        None => Ok(None),
        Some(value) => value.trim().parse::<CompanyId>().map(Some).map_err(|_| {
            JobBoardError::Validation(format!("Invalid company id: {}", value))
        }),
    }
}

// ===== Pagination =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_size: NonZeroUsize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_size: NonZeroUsize::new(Self::DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl Pagination {
    pub const DEFAULT_PAGE_SIZE: usize = 6;

    pub fn new(page_size: NonZeroUsize) -> Self {
        Self { page_size }
    }

    /// `None` when `page_size` is zero
    pub fn with_page_size(page_size: usize) -> Option<Self> {
        NonZeroUsize::new(page_size).map(Self::new)
    }

    pub fn page_size(&self) -> usize {
        self.page_size.get()
    }

    pub fn total_pages(&self, result_count: usize) -> usize {
        result_count.div_ceil(self.page_size.get())
    }

    /// `results[(page-1)*size .. page*size]`, clamped. Page 0 and pages past
    /// the end are empty.
    pub fn page<'a, T>(&self, results: &'a [T], current_page: usize) -> &'a [T] {
        let size = self.page_size.get();
        let Some(start) = current_page
            .checked_sub(1)
            .and_then(|index| index.checked_mul(size))
        else {
            return &[];
        };

        if start >= results.len() {
            return &[];
        }

        let end = start.saturating_add(size).min(results.len());
        &results[start..end]
    }
}

// ===== Client search state =====

/// Filter and page state behind a job listing view.
///
/// Changing a filter does not move `current_page`; callers that want to
/// start over call `reset_page`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSearch {
    filter: JobFilter,
    current_page: usize,
    pagination: Pagination,
}

impl Default for JobSearch {
    fn default() -> Self {
        Self::new(Pagination::default())
    }
}

impl JobSearch {
    pub fn new(pagination: Pagination) -> Self {
        Self {
            filter: JobFilter::default(),
            current_page: 1,
            pagination,
        }
    }

    pub fn filter(&self) -> &JobFilter {
        &self.filter
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn set_location(&mut self, location: &str) {
        self.filter.location = non_blank(location);
    }

    pub fn set_company(&mut self, company_id: Option<CompanyId>) {
        self.filter.company_id = company_id;
    }

    /// Accepts the raw select value; "" clears the company filter
    pub fn set_company_raw(&mut self, company_id: &str) -> Result<()> {
        self.filter.company_id = parse_company_id(company_id)?;
        Ok(())
    }

    /// A blank submission keeps the current search term
    pub fn submit_search(&mut self, query: &str) {
        if let Some(term) = non_blank(query) {
            self.filter.search_query = Some(term);
        }
    }

    pub fn clear_filters(&mut self) {
        self.filter = JobFilter::default();
    }

    pub fn set_page(&mut self, page: usize) {
        self.current_page = page;
    }

    pub fn reset_page(&mut self) {
        self.current_page = 1;
    }

    pub fn total_pages(&self, result_count: usize) -> usize {
        self.pagination.total_pages(result_count)
    }

    pub fn visible<'a, T>(&self, results: &'a [T]) -> &'a [T] {
        self.pagination.page(results, self.current_page)
    }
}
