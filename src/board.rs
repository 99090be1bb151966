// src/board.rs
//! Job board operations on behalf of a session.
//!
//! Every operation returns `Result`; a failed read is an error, never an
//! empty list. `get_job` distinguishes a missing row (`NotFound`) from an
//! empty result.
//!
//! The session's credential goes to logo storage as-is. The SQL store has no
//! row-level security of its own, so the identity scopes saved rows and
//! recruiter-owned writes instead.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::core::companies::CompanyRepository;
use crate::core::jobs::JobRepository;
use crate::core::saved_jobs::{self, SavedJobRepository};
use crate::core::{Database, LogoStorage};
use crate::error::{JobBoardError, Result};
use crate::filter::JobFilter;
use crate::operation::{AsyncOperation, OperationFuture};
use crate::types::{
    Company, Job, JobDetail, JobId, JobListing, JobWithCompany, NewCompany, NewJob, SaveState,
    SavedJob, SavedJobEntry, Session,
};
use crate::utils;

/// `{user_id, job_id}` key of the saved-job relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedJobKey {
    pub user_id: String,
    pub job_id: JobId,
}

impl SavedJobKey {
    pub fn new(user_id: impl Into<String>, job_id: JobId) -> Self {
        Self {
            user_id: user_id.into(),
            job_id,
        }
    }

    /// Key for the session's own user
    pub fn for_session(session: &Session, job_id: JobId) -> Self {
        Self::new(session.user_id(), job_id)
    }
}

fn logged<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        error!("{} failed [{}]: {}", operation, e.code(), e);
    }
    result
}

fn require_recruiter(session: &Session, action: &'static str) -> Result<()> {
    if session.is_recruiter() {
        Ok(())
    } else {
        warn!(
            "User {} with role {} may not {}",
            session.user_id(),
            session.role(),
            action
        );
        Err(JobBoardError::Forbidden {
            role: session.role(),
            action,
        })
    }
}

pub struct JobBoard<S> {
    db: Database,
    storage: S,
}

impl<S: LogoStorage> JobBoard<S> {
    pub fn new(db: Database, storage: S) -> Self {
        Self { db, storage }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ===== Companies =====

    pub async fn list_companies(&self, _session: &Session) -> Result<Vec<Company>> {
        logged(
            "listCompanies",
            CompanyRepository::new(self.db.pool()).list().await,
        )
    }

    /// Upload the logo, then insert the company row.
    ///
    /// A failed upload stops before the insert. A failed insert leaves the
    /// uploaded object in the bucket.
    pub async fn create_company(
        &self,
        session: &Session,
        company: NewCompany,
    ) -> Result<Vec<Company>> {
        require_recruiter(session, "create companies")?;
        logged("createCompany", company.validate())?;

        let name = company.name.trim();
        let file_name = utils::logo_file_name(name);

        logged(
            "createCompany",
            self.storage
                .upload(&session.credential, &file_name, &company.logo)
                .await,
        )?;

        let logo_url = self.storage.public_url(&file_name);
        let inserted = CompanyRepository::new(self.db.pool())
            .insert(name, &logo_url)
            .await;

        if inserted.is_err() {
            warn!("Company insert failed; uploaded logo {} is left in storage", file_name);
        }
        logged("createCompany", inserted)
    }

    // ===== Jobs =====

    pub async fn list_jobs(&self, session: &Session, filter: &JobFilter) -> Result<Vec<JobListing>> {
        logged(
            "listJobs",
            JobRepository::new(self.db.pool())
                .list(filter, session.user_id())
                .await,
        )
    }

    pub async fn get_job(&self, _session: &Session, job_id: JobId) -> Result<JobDetail> {
        let job = JobRepository::new(self.db.pool()).get(job_id).await;
        let job = logged("getJob", job)?;

        job.ok_or_else(|| {
            debug!("Job {} not found", job_id);
            JobBoardError::NotFound {
                entity: "job",
                id: job_id.to_string(),
            }
        })
    }

    pub async fn update_hiring_status(
        &self,
        session: &Session,
        job_id: JobId,
        is_open: bool,
    ) -> Result<Vec<Job>> {
        require_recruiter(session, "change hiring status")?;
        logged(
            "updateHiringStatus",
            JobRepository::new(self.db.pool())
                .update_hiring_status(job_id, session.user_id(), is_open)
                .await,
        )
    }

    /// Post a job as the session's recruiter
    pub async fn create_job(&self, session: &Session, job: NewJob) -> Result<Vec<Job>> {
        require_recruiter(session, "post jobs")?;
        logged("createJob", job.validate())?;
        logged(
            "createJob",
            JobRepository::new(self.db.pool())
                .insert(session.user_id(), &job)
                .await,
        )
    }

    pub async fn list_my_jobs(
        &self,
        _session: &Session,
        recruiter_id: &str,
    ) -> Result<Vec<JobWithCompany>> {
        logged(
            "listMyJobs",
            JobRepository::new(self.db.pool())
                .list_by_recruiter(recruiter_id)
                .await,
        )
    }

    pub async fn delete_job(&self, session: &Session, job_id: JobId) -> Result<Vec<Job>> {
        require_recruiter(session, "delete jobs")?;
        logged(
            "deleteJob",
            JobRepository::new(self.db.pool())
                .delete(job_id, session.user_id())
                .await,
        )
    }

    // ===== Saved jobs =====

    pub async fn save_job(&self, _session: &Session, key: &SavedJobKey) -> Result<Vec<SavedJob>> {
        logged(
            "saveJob",
            SavedJobRepository::new(self.db.pool())
                .insert(&key.user_id, key.job_id)
                .await,
        )
    }

    /// Removes all rows for the pair; removing nothing is a success
    pub async fn unsave_job(
        &self,
        _session: &Session,
        key: &SavedJobKey,
    ) -> Result<Vec<SavedJob>> {
        logged(
            "unsaveJob",
            SavedJobRepository::new(self.db.pool())
                .delete(&key.user_id, key.job_id)
                .await,
        )
    }

    /// Insert the pair if absent, otherwise delete every row for it, in one
    /// write transaction. The caller's belief about the current state is not
    /// used.
    pub async fn toggle_saved_job(&self, _session: &Session, key: &SavedJobKey) -> Result<SaveState> {
        let user_id = key.user_id.clone();
        let job_id = key.job_id;

        let state = self
            .db
            .write_transaction(move |tx| {
                Box::pin(async move { saved_jobs::toggle_on(&mut **tx, &user_id, job_id).await })
            })
            .await;

        let state = logged("toggleSavedJob", state)?;
        info!(
            "User {} {} job {}",
            key.user_id,
            if state.is_saved() { "saved" } else { "unsaved" },
            key.job_id
        );
        Ok(state)
    }

    pub async fn list_saved_jobs(&self, session: &Session) -> Result<Vec<SavedJobEntry>> {
        logged(
            "listSavedJobs",
            SavedJobRepository::new(self.db.pool())
                .list_for_user(session.user_id())
                .await,
        )
    }
}

// ===== Tracked operations =====

impl<S: LogoStorage + 'static> JobBoard<S> {
    /// `listJobs` bound to a filter; `set_options` swaps the filter
    pub fn jobs_operation(
        self: &Arc<Self>,
        session: Session,
        filter: JobFilter,
    ) -> AsyncOperation<JobFilter, (), Vec<JobListing>> {
        let board = Arc::clone(self);
        AsyncOperation::new(filter, move |filter: JobFilter, ()| {
            let board = Arc::clone(&board);
            let session = session.clone();
            let pending: OperationFuture<Vec<JobListing>> =
                Box::pin(async move { board.list_jobs(&session, &filter).await });
            pending
        })
    }

    pub fn companies_operation(
        self: &Arc<Self>,
        session: Session,
    ) -> AsyncOperation<(), (), Vec<Company>> {
        let board = Arc::clone(self);
        AsyncOperation::new((), move |(), ()| {
            let board = Arc::clone(&board);
            let session = session.clone();
            let pending: OperationFuture<Vec<Company>> =
                Box::pin(async move { board.list_companies(&session).await });
            pending
        })
    }

    pub fn saved_jobs_operation(
        self: &Arc<Self>,
        session: Session,
    ) -> AsyncOperation<(), (), Vec<SavedJobEntry>> {
        let board = Arc::clone(self);
        AsyncOperation::new((), move |(), ()| {
            let board = Arc::clone(&board);
            let session = session.clone();
            let pending: OperationFuture<Vec<SavedJobEntry>> =
                Box::pin(async move { board.list_saved_jobs(&session).await });
            pending
        })
    }

    /// Server-side toggle keyed by job id, for the session's user
    pub fn toggle_operation(
        self: &Arc<Self>,
        session: Session,
    ) -> AsyncOperation<(), JobId, SaveState> {
        let board = Arc::clone(self);
        AsyncOperation::new((), move |(), job_id: JobId| {
            let board = Arc::clone(&board);
            let session = session.clone();
            let pending: OperationFuture<SaveState> = Box::pin(async move {
                let key = SavedJobKey::for_session(&session, job_id);
                board.toggle_saved_job(&session, &key).await
            });
            pending
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemoryLogoStorage;
    use crate::filter::JobSearch;
    use crate::operation::{Loading, RunOutcome};
    use crate::types::{Credential, Role};
    use chrono::Utc;

    const STORAGE_URL: &str = "https://storage.test";

    async fn board() -> JobBoard<MemoryLogoStorage> {
        let db = Database::in_memory().await.unwrap();
        JobBoard::new(db, MemoryLogoStorage::new(STORAGE_URL, "company-logo"))
    }

    fn recruiter(user_id: &str) -> Session {
        Session::new(Credential::new("recruiter-token"), user_id, Role::Recruiter)
    }

    fn candidate(user_id: &str) -> Session {
        Session::new(Credential::new("candidate-token"), user_id, Role::Candidate)
    }

    async fn add_company(board: &JobBoard<MemoryLogoStorage>, name: &str) -> Company {
        board
            .create_company(
                &recruiter("rec-1"),
                NewCompany::new(name, "logo.png", vec![0x89, 0x50, 0x4e, 0x47]),
            )
            .await
            .unwrap()
            .remove(0)
    }

    async fn post_job(
        board: &JobBoard<MemoryLogoStorage>,
        session: &Session,
        title: &str,
        location: &str,
        company_id: i64,
    ) -> Job {
        board
            .create_job(
                session,
                NewJob::new(title, "Build things", location, company_id, "Rust"),
            )
            .await
            .unwrap()
            .remove(0)
    }

    // ===== Companies =====

    #[tokio::test]
    async fn test_create_company_uploads_then_inserts() {
        let board = board().await;
        let company = add_company(&board, "Acme Corp").await;

        let objects = board.storage().object_names();
        assert_eq!(objects.len(), 1);
        assert!(objects[0].starts_with("logo-"));
        assert!(objects[0].ends_with("-acme_corp"));
        assert_eq!(
            company.logo_url,
            format!("{}/storage/v1/object/public/company-logo/{}", STORAGE_URL, objects[0])
        );

        let companies = board.list_companies(&candidate("cand-1")).await.unwrap();
        assert_eq!(companies, vec![company]);
    }

    #[tokio::test]
    async fn test_failed_upload_inserts_nothing() {
        let board = board().await;
        board.storage().reject_uploads(true);

        let err = board
            .create_company(
                &recruiter("rec-1"),
                NewCompany::new("Acme", "logo.png", vec![1, 2, 3]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, JobBoardError::Storage { .. }));

        assert!(board.list_companies(&recruiter("rec-1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_uploaded_logo() {
        let board = board().await;
        add_company(&board, "Acme").await;

        let err = board
            .create_company(
                &recruiter("rec-1"),
                NewCompany::new("Acme", "logo.png", vec![1, 2, 3]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, JobBoardError::Insert { table: "companies", .. }));

        assert_eq!(board.storage().object_names().len(), 2);
        assert_eq!(board.list_companies(&recruiter("rec-1")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_logo_is_rejected_before_upload() {
        let board = board().await;

        let err = board
            .create_company(
                &recruiter("rec-1"),
                NewCompany::new("Acme", "logo.exe", vec![1, 2, 3]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, JobBoardError::Validation(_)));
        assert!(board.storage().object_names().is_empty());
    }

    #[tokio::test]
    async fn test_candidates_cannot_write_jobs_or_companies() {
        let board = board().await;
        let company = add_company(&board, "Acme").await;
        let job = post_job(&board, &recruiter("rec-1"), "Engineer", "Lahore", company.id).await;
        let cand = candidate("cand-1");

        let results = [
            board
                .create_company(&cand, NewCompany::new("Other", "logo.png", vec![1]))
                .await
                .map(|_| ()),
            board
                .create_job(&cand, NewJob::new("X", "Y", "Z", company.id, "R"))
                .await
                .map(|_| ()),
            board.update_hiring_status(&cand, job.id, false).await.map(|_| ()),
            board.delete_job(&cand, job.id).await.map(|_| ()),
        ];

        for result in results {
            assert!(matches!(
                result,
                Err(JobBoardError::Forbidden {
                    role: Role::Candidate,
                    ..
                })
            ));
        }
        assert_eq!(board.storage().object_names().len(), 1);
    }

    // ===== Jobs =====

    #[tokio::test]
    async fn test_filters_are_conjunctive() {
        let board = board().await;
        let rec = recruiter("rec-1");
        let a = add_company(&board, "A").await;
        let c = add_company(&board, "C").await;

        let wanted = post_job(&board, &rec, "Engineer", "Lahore", c.id).await;
        post_job(&board, &rec, "Engineer", "Lahore", a.id).await;
        post_job(&board, &rec, "Engineer", "Karachi", c.id).await;

        let filter = JobFilter::new()
            .with_location("Lahore")
            .with_company(Some(c.id));
        let jobs = board.list_jobs(&candidate("cand-1"), &filter).await.unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job, wanted);
        assert_eq!(jobs[0].company.name, "C");
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let board = board().await;
        let rec = recruiter("rec-1");
        let company = add_company(&board, "Acme").await;
        post_job(&board, &rec, "Senior Engineer", "Lahore", company.id).await;
        post_job(&board, &rec, "Designer", "Lahore", company.id).await;
        post_job(&board, &rec, "100% Remote Tester", "Lahore", company.id).await;
        let cand = candidate("cand-1");

        for term in ["eng", "ENG", "Engineer"] {
            let jobs = board
                .list_jobs(&cand, &JobFilter::new().with_search(term))
                .await
                .unwrap();
            assert_eq!(jobs.len(), 1, "term {term}");
            assert_eq!(jobs[0].job.title, "Senior Engineer");
        }

        let jobs = board
            .list_jobs(&cand, &JobFilter::new().with_search("%"))
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job.title, "100% Remote Tester");
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let board = board().await;
        let rec = recruiter("rec-1");
        let company = add_company(&board, "Acme").await;
        post_job(&board, &rec, "ÉCOLE Teacher", "Lahore", company.id).await;
        post_job(&board, &rec, "Engineer", "Lahore", company.id).await;

        let filter = JobFilter::new()
            .with_location("Lahore")
            .with_search("école");
        let jobs = board.list_jobs(&candidate("cand-1"), &filter).await.unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job.title, "ÉCOLE Teacher");
        assert!(filter.matches(&jobs[0].job));
    }

    #[tokio::test]
    async fn test_location_is_not_trimmed() {
        let board = board().await;
        let company = add_company(&board, "Acme").await;
        post_job(&board, &recruiter("rec-1"), "Engineer", "Lahore", company.id).await;

        let jobs = board
            .list_jobs(&candidate("cand-1"), &JobFilter::new().with_location(" Lahore "))
            .await
            .unwrap();
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn test_unfiltered_list_is_ordered_and_empty_table_is_ok() {
        let board = board().await;
        let cand = candidate("cand-1");
        assert!(board.list_jobs(&cand, &JobFilter::new()).await.unwrap().is_empty());

        let rec = recruiter("rec-1");
        let company = add_company(&board, "Acme").await;
        let first = post_job(&board, &rec, "First", "Lahore", company.id).await;
        let second = post_job(&board, &rec, "Second", "Karachi", company.id).await;

        let jobs = board.list_jobs(&cand, &JobFilter::new()).await.unwrap();
        let ids: Vec<JobId> = jobs.iter().map(|l| l.job.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_thirteen_jobs_make_three_pages() {
        let board = board().await;
        let rec = recruiter("rec-1");
        let company = add_company(&board, "Acme").await;
        for i in 0..13 {
            post_job(&board, &rec, &format!("Job {}", i), "Lahore", company.id).await;
        }

        let mut view = JobSearch::default();
        let jobs = board
            .list_jobs(&candidate("cand-1"), view.filter())
            .await
            .unwrap();
        assert_eq!(view.total_pages(jobs.len()), 3);
        assert_eq!(view.visible(&jobs).len(), 6);

        view.set_page(3);
        let last = view.visible(&jobs);
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].job.title, "Job 12");
    }

    #[tokio::test]
    async fn test_create_job_then_get_job() {
        let board = board().await;
        let company = add_company(&board, "Acme").await;
        let created = post_job(&board, &recruiter("rec-1"), "Engineer", "Lahore", company.id).await;

        assert_eq!(created.recruiter_id, "rec-1");
        assert!(created.is_open);

        sqlx::query(
            "INSERT INTO applications (job_id, candidate_id, name, status, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(created.id)
        .bind("cand-1")
        .bind("Ayesha")
        .bind("applied")
        .bind(Utc::now())
        .execute(board.database().pool())
        .await
        .unwrap();

        let detail = board.get_job(&candidate("cand-1"), created.id).await.unwrap();
        assert_eq!(detail.job, created);
        assert_eq!(detail.company.name, "Acme");
        assert_eq!(detail.company.logo_url, company.logo_url);
        assert_eq!(detail.applications.len(), 1);
        assert_eq!(detail.applications[0].candidate_id, "cand-1");
        assert_eq!(detail.applications[0].resume, None);
    }

    #[tokio::test]
    async fn test_get_missing_job_is_not_found() {
        let board = board().await;
        let err = board.get_job(&candidate("cand-1"), 42).await.unwrap_err();
        assert!(matches!(err, JobBoardError::NotFound { entity: "job", .. }));
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_create_job_with_unknown_company_fails() {
        let board = board().await;
        let err = board
            .create_job(
                &recruiter("rec-1"),
                NewJob::new("Engineer", "Build", "Lahore", 99, "Rust"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, JobBoardError::Insert { table: "jobs", .. }));
    }

    #[tokio::test]
    async fn test_hiring_status_is_scoped_to_owner() {
        let board = board().await;
        let owner = recruiter("rec-1");
        let company = add_company(&board, "Acme").await;
        let job = post_job(&board, &owner, "Engineer", "Lahore", company.id).await;

        let untouched = board
            .update_hiring_status(&recruiter("rec-2"), job.id, false)
            .await
            .unwrap();
        assert!(untouched.is_empty());

        let updated = board.update_hiring_status(&owner, job.id, false).await.unwrap();
        assert_eq!(updated.len(), 1);
        assert!(!updated[0].is_open);

        let detail = board.get_job(&owner, job.id).await.unwrap();
        assert!(!detail.job.is_open);
    }

    #[tokio::test]
    async fn test_list_my_jobs() {
        let board = board().await;
        let company = add_company(&board, "Acme").await;
        let mine = post_job(&board, &recruiter("rec-1"), "Mine", "Lahore", company.id).await;
        post_job(&board, &recruiter("rec-2"), "Theirs", "Lahore", company.id).await;

        let session = recruiter("rec-1");
        let jobs = board.list_my_jobs(&session, session.user_id()).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job, mine);
        assert_eq!(jobs[0].company.name, "Acme");
    }

    #[tokio::test]
    async fn test_delete_job_cascades_saved_rows() {
        let board = board().await;
        let owner = recruiter("rec-1");
        let cand = candidate("cand-1");
        let company = add_company(&board, "Acme").await;
        let job = post_job(&board, &owner, "Engineer", "Lahore", company.id).await;
        board
            .save_job(&cand, &SavedJobKey::for_session(&cand, job.id))
            .await
            .unwrap();

        assert!(board.delete_job(&recruiter("rec-2"), job.id).await.unwrap().is_empty());

        let deleted = board.delete_job(&owner, job.id).await.unwrap();
        assert_eq!(deleted, vec![job.clone()]);
        assert!(board.list_saved_jobs(&cand).await.unwrap().is_empty());
        assert!(matches!(
            board.get_job(&cand, job.id).await,
            Err(JobBoardError::NotFound { .. })
        ));
    }

    // ===== Saved jobs =====

    #[tokio::test]
    async fn test_saved_annotation_is_per_viewer() {
        let board = board().await;
        let company = add_company(&board, "Acme").await;
        let job = post_job(&board, &recruiter("rec-1"), "Engineer", "Lahore", company.id).await;
        let cand = candidate("cand-1");

        let saved = board
            .save_job(&cand, &SavedJobKey::for_session(&cand, job.id))
            .await
            .unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].user_id, "cand-1");

        let mine = board.list_jobs(&cand, &JobFilter::new()).await.unwrap();
        assert!(mine[0].is_saved());
        assert_eq!(mine[0].saved[0].id, saved[0].id);

        let theirs = board
            .list_jobs(&candidate("cand-2"), &JobFilter::new())
            .await
            .unwrap();
        assert!(!theirs[0].is_saved());
    }

    #[tokio::test]
    async fn test_unsave_removes_duplicates_and_tolerates_absent_rows() {
        let board = board().await;
        let company = add_company(&board, "Acme").await;
        let job = post_job(&board, &recruiter("rec-1"), "Engineer", "Lahore", company.id).await;
        let cand = candidate("cand-1");
        let key = SavedJobKey::for_session(&cand, job.id);

        assert!(board.unsave_job(&cand, &key).await.unwrap().is_empty());

        board.save_job(&cand, &key).await.unwrap();
        board.save_job(&cand, &key).await.unwrap();
        let listed = board.list_jobs(&cand, &JobFilter::new()).await.unwrap();
        assert_eq!(listed[0].saved.len(), 2);

        let removed = board.unsave_job(&cand, &key).await.unwrap();
        assert_eq!(removed.len(), 2);
        let listed = board.list_jobs(&cand, &JobFilter::new()).await.unwrap();
        assert!(!listed[0].is_saved());
    }

    #[tokio::test]
    async fn test_save_unknown_job_is_an_insert_error() {
        let board = board().await;
        let cand = candidate("cand-1");
        let err = board
            .save_job(&cand, &SavedJobKey::for_session(&cand, 7))
            .await
            .unwrap_err();
        assert!(matches!(err, JobBoardError::Insert { table: "saved_jobs", .. }));
    }

    #[tokio::test]
    async fn test_toggle_flips_state() {
        let board = board().await;
        let company = add_company(&board, "Acme").await;
        let job = post_job(&board, &recruiter("rec-1"), "Engineer", "Lahore", company.id).await;
        let cand = candidate("cand-1");
        let key = SavedJobKey::for_session(&cand, job.id);

        let first = board.toggle_saved_job(&cand, &key).await.unwrap();
        assert!(first.is_saved());

        board.save_job(&cand, &key).await.unwrap();
        let second = board.toggle_saved_job(&cand, &key).await.unwrap();
        assert_eq!(second, SaveState::Unsaved { removed: 2 });

        let third = board.toggle_saved_job(&cand, &key).await.unwrap();
        assert!(third.is_saved());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_on_file_database() {
        let dir = std::env::temp_dir().join(format!("jobboard_toggle_{}", uuid::Uuid::new_v4()));
        let db = Database::new(&dir.join("jobs.db")).await.unwrap();
        let board = Arc::new(JobBoard::new(
            db,
            MemoryLogoStorage::new(STORAGE_URL, "company-logo"),
        ));
        let company = add_company(&board, "Acme").await;
        let job_id = post_job(&board, &recruiter("rec-1"), "Engineer", "Lahore", company.id)
            .await
            .id;
        let cand = candidate("cand-1");

        for _ in 0..20 {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let board = Arc::clone(&board);
                    let cand = cand.clone();
                    tokio::spawn(async move {
                        let key = SavedJobKey::for_session(&cand, job_id);
                        board.toggle_saved_job(&cand, &key).await
                    })
                })
                .collect();

            let mut saved = 0;
            for handle in handles {
                if handle.await.unwrap().unwrap().is_saved() {
                    saved += 1;
                }
            }
            assert_eq!(saved, 1);
        }

        assert!(board.list_saved_jobs(&cand).await.unwrap().is_empty());

        board.database().pool().close().await;
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_list_saved_jobs_joins_job_and_company() {
        let board = board().await;
        let company = add_company(&board, "Acme").await;
        let job = post_job(&board, &recruiter("rec-1"), "Engineer", "Lahore", company.id).await;
        let other = post_job(&board, &recruiter("rec-1"), "Designer", "Lahore", company.id).await;
        let cand = candidate("cand-1");

        board
            .save_job(&cand, &SavedJobKey::for_session(&cand, job.id))
            .await
            .unwrap();
        let someone_else = candidate("cand-2");
        board
            .save_job(&someone_else, &SavedJobKey::for_session(&someone_else, other.id))
            .await
            .unwrap();

        let saved = board.list_saved_jobs(&cand).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].saved.job_id, job.id);
        assert_eq!(saved[0].job.job, job);
        assert_eq!(saved[0].job.company.name, "Acme");
    }

    // ===== Tracked operations =====

    #[tokio::test]
    async fn test_jobs_operation_refetches_after_toggle() {
        let board = Arc::new(board().await);
        let company = add_company(&board, "Acme").await;
        let job = post_job(&board, &recruiter("rec-1"), "Engineer", "Lahore", company.id).await;
        let cand = candidate("cand-1");

        let jobs = board.jobs_operation(cand.clone(), JobFilter::new());
        assert_eq!(jobs.loading(), Loading::NotStarted);

        assert_eq!(jobs.run(()).await, RunOutcome::Applied);
        assert_eq!(jobs.loading(), Loading::Settled);
        assert!(!jobs.data().unwrap()[0].is_saved());

        let toggle = board.toggle_operation(cand.clone());
        toggle.run(job.id).await;
        assert!(toggle.data().unwrap().is_saved());

        jobs.run(()).await;
        assert!(jobs.data().unwrap()[0].is_saved());

        jobs.set_options(JobFilter::new().with_location("Karachi"));
        jobs.run(()).await;
        assert!(jobs.data().unwrap().is_empty());
        assert!(jobs.error().is_none());
    }

    #[tokio::test]
    async fn test_operation_error_clears_data() {
        let board = Arc::new(board().await);
        let cand = candidate("cand-1");

        let toggle = board.toggle_operation(cand);
        toggle.run(404).await;

        let state = toggle.snapshot();
        assert_eq!(state.loading, Loading::Settled);
        assert!(state.data.is_none());
        assert_eq!(state.error.unwrap().code(), "INSERT_ERROR");
    }
}
