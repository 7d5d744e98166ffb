//! Follower acquisition.
//!
//! [`acquire`] walks the authenticating account's follower stream page by
//! page, classifies every user it sees and hands each eligible one to a
//! caller-supplied callback until the requested number has been collected or
//! the stream runs out. Every failure carries the partial progress and the
//! point at which a later run can pick up again.

pub mod gate;

use std::{fmt::Display, future::Future, pin::pin};

use futures_util::{StreamExt, stream};
use log::{debug, info, warn};

use crate::{
    api::{
        FollowerApi,
        types::{Counters, Cursor, ResumePoint, User},
    },
    error::{AcquireError, AcquireFailure, ValidationError},
};

use self::gate::RateLimitGate;

/// Largest `count` accepted by `followers/list`.
pub const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionRequest {
    pub target_count: i64,
    /// Otherwise-eligible users to discard before collecting.
    pub skip_count: i64,
    pub page_size: i64,
    pub include_protected: bool,
    pub only_non_followed: bool,
    pub resume_cursor: Option<Cursor>,
    /// Eligible-user callbacks allowed in flight at once.
    pub concurrency: usize,
}

impl Default for AcquisitionRequest {
    fn default() -> Self {
        Self {
            target_count: 0,
            skip_count: 0,
            page_size: MAX_PAGE_SIZE,
            include_protected: false,
            only_non_followed: true,
            resume_cursor: None,
            concurrency: 1,
        }
    }
}

impl AcquisitionRequest {
    pub fn new(target_count: i64) -> Self {
        Self {
            target_count,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.target_count < 0 {
            return Err(ValidationError::NegativeTarget(self.target_count));
        }
        if self.skip_count < 0 {
            return Err(ValidationError::NegativeSkip(self.skip_count));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(ValidationError::PageSize {
                got: self.page_size,
                max: MAX_PAGE_SIZE,
            });
        }
        if self.concurrency == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }
        if let Some(cursor) = self.resume_cursor {
            if cursor.is_exhausted() {
                return Err(ValidationError::ExhaustedCursor(cursor));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    TargetMet,
    /// The stream ran out of pages before the target was reached.
    EndOfStream,
}

#[derive(Debug, Clone)]
pub struct Acquisition {
    pub collected: Vec<User>,
    pub counters: Counters,
    pub outcome: Outcome,
    /// Continuation cursor of the last page fetched, if the stream goes on.
    pub final_cursor: Option<Cursor>,
    /// Where a follow-up run continues without revisiting anyone, if there
    /// is anything left to visit.
    pub resume: Option<ResumePoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    QuotaReached,
    Protected,
    AlreadyFollowed,
    ResumeSkip,
    Eligible,
}

impl Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Classification::QuotaReached => "target already met",
            Classification::Protected => "protected",
            Classification::AlreadyFollowed => "already followed",
            Classification::ResumeSkip => "skipped for resume",
            Classification::Eligible => "eligible",
        };
        write!(f, "{text}")
    }
}

/// Mutable state of one run.
///
/// Owned by a single [`acquire`] call for its whole duration and dropped (or
/// turned into the result) when it returns.
#[derive(Debug)]
struct AcquisitionState {
    remaining_to_collect: i64,
    remaining_to_skip: i64,
    /// Cursor of the page being classified, or of the next page to fetch.
    cursor: Cursor,
    /// Resume-skipped plus collected users of the current page.
    consumed_on_page: i64,
    quota_skipped_on_page: u64,
    /// Eligible users whose callbacks have not completed yet.
    reserved: i64,
    collected: Vec<User>,
    counters: Counters,
}

impl AcquisitionState {
    fn new(request: &AcquisitionRequest) -> Self {
        Self {
            remaining_to_collect: request.target_count,
            remaining_to_skip: request.skip_count,
            cursor: request.resume_cursor.unwrap_or(Cursor::START),
            consumed_on_page: 0,
            quota_skipped_on_page: 0,
            reserved: 0,
            collected: Vec::new(),
            counters: Counters::default(),
        }
    }

    fn enter_page(&mut self, cursor: Cursor) {
        self.cursor = cursor;
        self.consumed_on_page = 0;
        self.quota_skipped_on_page = 0;
    }

    /// First match wins: quota, protected, already followed, resume skip.
    fn classify(&mut self, user: &User, request: &AcquisitionRequest) -> Classification {
        let class = if self.remaining_to_collect - self.reserved <= 0 {
            self.counters.skipped_quota_reached += 1;
            self.quota_skipped_on_page += 1;
            Classification::QuotaReached
        } else if user.protected && !request.include_protected {
            self.counters.skipped_protected += 1;
            Classification::Protected
        } else if request.only_non_followed && user.following {
            self.counters.skipped_already_followed += 1;
            Classification::AlreadyFollowed
        } else if self.remaining_to_skip > 0 {
            self.remaining_to_skip -= 1;
            self.consumed_on_page += 1;
            self.counters.skipped_for_resume += 1;
            Classification::ResumeSkip
        } else {
            self.reserved += 1;
            return Classification::Eligible;
        };

        self.counters.fetched += 1;
        class
    }

    fn accept(&mut self, user: User) {
        self.reserved -= 1;
        self.remaining_to_collect -= 1;
        self.consumed_on_page += 1;
        self.counters.collected += 1;
        self.counters.fetched += 1;
        self.collected.push(user);
    }

    async fn process_page<F, Fut, E>(
        &mut self,
        users: Vec<User>,
        request: &AcquisitionRequest,
        on_eligible: &F,
    ) -> Result<(), E>
    where
        F: Fn(User) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let mut batch = Vec::with_capacity(request.concurrency);
        for user in users {
            match self.classify(&user, request) {
                Classification::Eligible => {
                    batch.push(user);
                    if batch.len() >= request.concurrency {
                        let ready = std::mem::take(&mut batch);
                        self.run_callbacks(ready, request.concurrency, on_eligible)
                            .await?;
                    }
                }
                class => debug!("Skipping @{} ({class})", user.screen_name),
            }
        }
        self.run_callbacks(batch, request.concurrency, on_eligible)
            .await
    }

    /// Runs up to `concurrency` callbacks at once and records the users in
    /// classification order. Stops at the first failure.
    async fn run_callbacks<F, Fut, E>(
        &mut self,
        batch: Vec<User>,
        concurrency: usize,
        on_eligible: &F,
    ) -> Result<(), E>
    where
        F: Fn(User) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        if batch.is_empty() {
            return Ok(());
        }

        let results = stream::iter(batch)
            .map(|user| {
                let call = on_eligible(user.clone());
                async move { call.await.map(|()| user) }
            })
            .buffered(concurrency);
        let mut results = pin!(results);

        while let Some(result) = results.next().await {
            let user = result?;
            debug!("Collected @{}", user.screen_name);
            self.accept(user);
        }
        Ok(())
    }

    fn resume_here(&self) -> ResumePoint {
        ResumePoint {
            cursor: self.cursor,
            skip: self.consumed_on_page + self.remaining_to_skip,
            remaining: self.remaining_to_collect,
        }
    }

    fn fail<E>(self, error: AcquireError<E>) -> AcquireFailure<E> {
        let resume = Some(self.resume_here());
        AcquireFailure {
            error,
            collected: self.collected,
            counters: self.counters,
            resume,
        }
    }

    fn finish(
        self,
        outcome: Outcome,
        final_cursor: Option<Cursor>,
        resume: Option<ResumePoint>,
    ) -> Acquisition {
        Acquisition {
            collected: self.collected,
            counters: self.counters,
            outcome,
            final_cursor,
            resume,
        }
    }
}

/// Collects up to `request.target_count` eligible followers.
///
/// `on_eligible` is awaited for every eligible user before that user counts
/// as collected. A failing callback aborts the run.
///
/// The run is strictly sequential unless `request.concurrency` is raised, in
/// which case callbacks for consecutive eligible users of one page overlap
/// but are still recorded in API order.
pub async fn acquire<A, F, Fut, E>(
    api: &A,
    request: &AcquisitionRequest,
    on_eligible: F,
) -> Result<Acquisition, AcquireFailure<E>>
where
    A: FollowerApi,
    F: Fn(User) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    if let Err(err) = request.validate() {
        return Err(AcquireFailure {
            error: err.into(),
            collected: Vec::new(),
            counters: Counters::default(),
            resume: None,
        });
    }

    let mut state = AcquisitionState::new(request);
    if request.target_count == 0 {
        debug!("Target count is zero, nothing to fetch");
        let resume = state.resume_here();
        return Ok(state.finish(Outcome::TargetMet, request.resume_cursor, Some(resume)));
    }

    let gate = RateLimitGate::new(api);
    // Validated to 1..=MAX_PAGE_SIZE above.
    let page_size = request.page_size as u32;

    loop {
        if let Err(err) = gate.check_quota().await {
            return Err(state.fail(err.into()));
        }

        let page = match api.followers_page(state.cursor, page_size).await {
            Ok(page) => page,
            Err(err) => return Err(state.fail(err.into())),
        };
        info!(
            "Fetched {} followers at cursor {} ({} still to collect)",
            page.users.len(),
            state.cursor,
            state.remaining_to_collect
        );

        if let Err(err) = state
            .process_page(page.users, request, &on_eligible)
            .await
        {
            return Err(state.fail(AcquireError::Callback(err)));
        }

        if state.remaining_to_collect > 0 {
            match page.next_cursor {
                Some(next) => state.enter_page(next),
                None => {
                    warn!(
                        "Follower stream ended with {} of {} collected",
                        state.counters.collected, request.target_count
                    );
                    return Ok(state.finish(Outcome::EndOfStream, None, None));
                }
            }
        } else {
            let resume = if state.quota_skipped_on_page > 0 {
                Some(state.resume_here())
            } else {
                page.next_cursor.map(|cursor| ResumePoint {
                    cursor,
                    skip: 0,
                    remaining: 0,
                })
            };
            info!("Collected {} followers", state.counters.collected);
            return Ok(state.finish(Outcome::TargetMet, page.next_cursor, resume));
        }
    }
}
