//! Per-request orchestration context.
//!
//! [`RequestContext`] is extracted before any handler code runs. It parses
//! the call metadata (request id, span context, bearer token) and fixes
//! the deadline and cancellation token the whole operation runs under.
//! Extraction failures reject the request with 401 before a transaction
//! could be opened.
//!
//! Every operation then follows the same shape:
//!
//! ```ignore
//! ctx.authorize(Capability::LeaderOrAdmin)?;
//! let mut tx = ctx.begin(&state.accessors).await?;
//! let result: OpResult<_> = async {
//!     let club = ctx.step("get club", tx.get_club_with_uuid(&uuid)).await?;
//!     // ...
//! }
//! .await;
//! ctx.finish(tx, result).await
//! ```

use std::future::Future;
use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use club_core::codes::DomainCode;
use club_core::roles::{self, Capability, Role};
use club_core::trace::{TraceContext, REQUEST_ID_HEADER, SPAN_CONTEXT_HEADER};
use club_db::{AccessorManager, ClubAccessor};
use club_remote::CallMetadata;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::auth::jwt::validate_token;
use crate::error::{Failure, OpResult, StepError};
use crate::state::AppState;

/// Optional header narrowing the request deadline, in milliseconds.
pub const REQUEST_TIMEOUT_HEADER: &str = "x-request-timeout-ms";

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub trace: TraceContext,
    /// Caller identity from the token subject.
    pub caller: String,
    pub role: Role,
    deadline: Instant,
    cancel: CancellationToken,
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Failure;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;

        let trace = TraceContext::from_metadata(
            header_str(headers, REQUEST_ID_HEADER),
            header_str(headers, SPAN_CONTEXT_HEADER),
        )?;

        let token = header_str(headers, "authorization")
            .ok_or_else(|| Failure::unauthenticated("Missing Authorization header"))?
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                Failure::unauthenticated("Invalid Authorization format. Expected: Bearer <token>")
            })?;

        let claims = validate_token(token, &state.config.jwt)
            .map_err(|_| Failure::unauthenticated("Invalid or expired token"))?;
        let role = Role::from_identity(&claims.sub)?;

        let budget = request_budget(
            header_str(headers, REQUEST_TIMEOUT_HEADER),
            state.config.request_budget(),
        )?;

        Ok(Self {
            trace,
            caller: claims.sub,
            role,
            deadline: Instant::now() + budget,
            cancel: state.shutdown.child_token(),
        })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// The caller may shorten the server's request budget, never extend it.
fn request_budget(header: Option<&str>, max: Duration) -> Result<Duration, Failure> {
    let Some(raw) = header else {
        return Ok(max);
    };
    let millis: u64 = raw.trim().parse().map_err(|_| {
        Failure::bad_request(format!("{REQUEST_TIMEOUT_HEADER} '{raw}' is not a number"))
    })?;
    Ok(Duration::from_millis(millis).min(max))
}

impl RequestContext {
    /// Build a context directly, bypassing extraction.
    pub fn new(
        trace: TraceContext,
        caller: impl Into<String>,
        budget: Duration,
        cancel: CancellationToken,
    ) -> Result<Self, Failure> {
        let caller = caller.into();
        let role = Role::from_identity(&caller)?;
        Ok(Self {
            trace,
            caller,
            role,
            deadline: Instant::now() + budget,
            cancel,
        })
    }

    /// Identity-only authority check.
    pub fn authorize(&self, capability: Capability) -> OpResult<()> {
        roles::authorize(&self.caller, capability)?;
        Ok(())
    }

    /// Leader half of [`Capability::LeaderOrAdmin`], once the club's leader
    /// is known.
    pub fn ensure_leader(&self, leader_uuid: &str) -> OpResult<()> {
        roles::is_leader_or_admin(&self.caller, leader_uuid)
            .map_err(|e| Failure::forbidden(Some(DomainCode::NotClubLeader), e.to_string()))
    }

    /// Metadata forwarded to remote services.
    pub fn call_metadata(&self) -> CallMetadata {
        CallMetadata {
            trace: self.trace,
            caller_uuid: self.caller.clone(),
        }
    }

    pub fn trace_id(&self) -> String {
        format!("{:032x}", self.trace.span.trace_id)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run one step: refuse to start once cancelled, bound it by the
    /// deadline, and classify its error.
    pub async fn step<T, E, F>(&self, name: &'static str, fut: F) -> Result<T, StepError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<StepError>,
    {
        if self.cancel.is_cancelled() {
            tracing::warn!(step = name, "Request cancelled before step");
            return Err(StepError::Cancelled);
        }

        let child = self.trace.child();
        let span = tracing::debug_span!(
            "step",
            step = name,
            span_id = %format!("{:016x}", child.span.span_id),
        );

        let outcome = async {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => Err(StepError::Cancelled),
                bounded = tokio::time::timeout_at(self.deadline, fut) => match bounded {
                    Ok(result) => result.map_err(Into::into),
                    Err(_) => Err(StepError::DeadlineExceeded),
                },
            }
        }
        .instrument(span.clone())
        .await;

        span.in_scope(|| match &outcome {
            Ok(_) => tracing::debug!("Step succeeded"),
            Err(e) => tracing::warn!(error = %e, "Step failed"),
        });
        outcome
    }

    /// Open the operation's transaction as its first step.
    pub async fn begin(&self, accessors: &AccessorManager) -> OpResult<Box<dyn ClubAccessor>> {
        Ok(self.step("begin transaction", accessors.begin_tx()).await?)
    }

    /// Close the transaction: commit when every step succeeded, otherwise
    /// roll back exactly once and return the failure unchanged.
    pub async fn finish<T>(&self, tx: Box<dyn ClubAccessor>, result: OpResult<T>) -> OpResult<T> {
        let value = match result {
            Ok(value) if !self.is_cancelled() => value,
            Ok(_) => {
                rollback(tx).await;
                return Err(StepError::Cancelled.into());
            }
            Err(failure) => {
                rollback(tx).await;
                tracing::debug!(status = failure.status.as_u16(), "Operation rolled back");
                return Err(failure);
            }
        };

        match tokio::time::timeout_at(self.deadline, tx.commit()).await {
            Ok(Ok(())) => {
                tracing::debug!("Operation committed");
                Ok(value)
            }
            Ok(Err(e)) => Err(StepError::Storage(e).into()),
            Err(_) => Err(StepError::DeadlineExceeded.into()),
        }
    }
}

async fn rollback(tx: Box<dyn ClubAccessor>) {
    if let Err(e) = tx.rollback().await {
        tracing::error!(error = %e, "Rollback failed");
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use club_core::trace::SpanContext;

    use super::*;

    fn context(budget: Duration, cancel: CancellationToken) -> RequestContext {
        let trace = TraceContext {
            request_id: uuid::Uuid::new_v4(),
            span: SpanContext::new_root(),
        };
        RequestContext::new(trace, "admin-000000000001", budget, cancel).unwrap()
    }

    #[test]
    fn caller_may_only_shorten_the_budget() {
        let max = Duration::from_secs(30);
        assert_eq!(request_budget(None, max).unwrap(), max);
        assert_eq!(
            request_budget(Some("250"), max).unwrap(),
            Duration::from_millis(250)
        );
        assert_eq!(request_budget(Some("900000"), max).unwrap(), max);
        assert!(request_budget(Some("soon"), max).is_err());
    }

    #[test]
    fn unknown_identity_is_unauthenticated() {
        let trace = TraceContext {
            request_id: uuid::Uuid::new_v4(),
            span: SpanContext::new_root(),
        };
        let err = RequestContext::new(
            trace,
            "parent-000000000001",
            Duration::from_secs(1),
            CancellationToken::new(),
        )
        .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn step_after_cancellation_does_not_run() {
        let cancel = CancellationToken::new();
        let ctx = context(Duration::from_secs(5), cancel.clone());
        cancel.cancel();

        let ran = std::sync::atomic::AtomicBool::new(false);
        let result = ctx
            .step("never", async {
                ran.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok::<_, StepError>(())
            })
            .await;

        assert_matches!(result, Err(StepError::Cancelled));
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn step_past_deadline_times_out() {
        let ctx = context(Duration::from_millis(20), CancellationToken::new());
        let result = ctx
            .step("slow", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, StepError>(())
            })
            .await;
        assert_matches!(result, Err(StepError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn leader_check_names_the_code() {
        let trace = TraceContext {
            request_id: uuid::Uuid::new_v4(),
            span: SpanContext::new_root(),
        };
        let ctx = RequestContext::new(
            trace,
            "student-000000000002",
            Duration::from_secs(1),
            CancellationToken::new(),
        )
        .unwrap();

        assert!(ctx.ensure_leader("student-000000000002").is_ok());
        let err = ctx.ensure_leader("student-000000000001").unwrap_err();
        assert_eq!(err.code, Some(DomainCode::NotClubLeader));
    }
}
