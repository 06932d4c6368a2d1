//! Synthetic request execution.

use std::time::Duration;

use opentelemetry::trace::{Status, Tracer};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::trace::SdkTracer;
use opentelemetry_semantic_conventions::attribute::{EXCEPTION_MESSAGE, EXCEPTION_TYPE};

use crate::monolith::timeline::{
    StageScript, BACKEND, DATABASE, DB_ERROR_STATUS, DEFAULT_SESSION_ID, FRONTEND, QUERY_ID,
    REPOSITORY,
};
use crate::observability::ScopedSpan;

/// Name of the tracer the generator's spans belong to.
pub const TRACER_NAME: &str = "monolithic-tracer";

/// Event name for recorded exceptions.
const EXCEPTION_EVENT: &str = "exception";

/// Failure reported by the simulated database.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("no records found in DB")]
    NoRecords,
}

/// One scripted request through frontend, backend, repository and database.
#[derive(Clone)]
pub struct SyntheticRequest {
    tracer: SdkTracer,
    session_id: String,
    fail_database: bool,
}

impl SyntheticRequest {
    pub fn new(tracer: SdkTracer) -> Self {
        Self {
            tracer,
            session_id: DEFAULT_SESSION_ID.to_string(),
            fail_database: false,
        }
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Make the database stage report [`QueryError::NoRecords`].
    pub fn fail_database(mut self, fail: bool) -> Self {
        self.fail_database = fail;
        self
    }

    /// Run the whole call tree under `parent`.
    pub async fn run(&self, parent: &Context) {
        tracing::debug!(
            session_id = %self.session_id,
            fail_database = self.fail_database,
            "Starting synthetic request"
        );
        self.frontend(parent).await;
    }

    async fn frontend(&self, parent: &Context) {
        let scope = self.open(&FRONTEND, parent, Vec::new());
        hold(FRONTEND.before_child).await;
        self.backend(scope.context()).await;
        hold(FRONTEND.after_child).await;
    }

    async fn backend(&self, parent: &Context) {
        let scope = self.open(&BACKEND, parent, Vec::new());
        hold(BACKEND.before_child).await;
        self.repository(scope.context()).await;
        hold(BACKEND.after_child).await;
    }

    async fn repository(&self, parent: &Context) {
        let scope = self.open(&REPOSITORY, parent, vec![KeyValue::new("query-id", QUERY_ID)]);
        hold(REPOSITORY.before_child).await;

        if let Err(err) = self.database(scope.context()).await {
            let span = scope.span();
            span.set_status(Status::error(DB_ERROR_STATUS));
            span.add_event(
                EXCEPTION_EVENT,
                vec![
                    KeyValue::new(EXCEPTION_TYPE, std::any::type_name_of_val(&err)),
                    KeyValue::new(EXCEPTION_MESSAGE, err.to_string()),
                ],
            );
            tracing::warn!(error = %err, "Query failed; recorded on repository span");
        }

        hold(REPOSITORY.after_child).await;
    }

    async fn database(&self, parent: &Context) -> Result<(), QueryError> {
        let _scope = self.open(&DATABASE, parent, Vec::new());
        hold(DATABASE.before_child).await;
        if self.fail_database {
            Err(QueryError::NoRecords)
        } else {
            Ok(())
        }
    }

    fn open(&self, stage: &StageScript, parent: &Context, extra: Vec<KeyValue>) -> ScopedSpan {
        let mut attributes = vec![KeyValue::new("session-id", self.session_id.clone())];
        attributes.extend(extra);
        attributes.push(KeyValue::new("service.name", stage.service));

        let builder = self.tracer.span_builder(stage.span_name).with_attributes(attributes);
        ScopedSpan::start(&self.tracer, parent, builder)
    }
}

async fn hold(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// Run one synthetic request, optionally with a failing database stage.
///
/// The failure is recorded on the repository span only; nothing is returned.
pub async fn run_synthetic_request(tracer: &SdkTracer, parent: &Context, fail_database: bool) {
    SyntheticRequest::new(tracer.clone())
        .fail_database(fail_database)
        .run(parent)
        .await;
}
