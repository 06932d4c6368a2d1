//! The scripted call tree.
//!
//! One row per stage: span name, the `service.name` it pretends to be, and
//! how long it holds its span open before and after calling the next stage.

use std::time::Duration;

/// Fixed script for one stage of the synthetic request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageScript {
    pub span_name: &'static str,
    pub service: &'static str,
    pub before_child: Duration,
    pub after_child: Duration,
}

impl StageScript {
    /// Time the stage spends sleeping itself, excluding its child.
    pub const fn own_hold(&self) -> Duration {
        self.before_child.saturating_add(self.after_child)
    }
}

pub const FRONTEND: StageScript = StageScript {
    span_name: "HTTP POST /api-endpoint",
    service: "demo-frontend",
    before_child: Duration::from_millis(30),
    after_child: Duration::from_millis(10),
};

pub const BACKEND: StageScript = StageScript {
    span_name: "/api-endpoint",
    service: "backend-api",
    before_child: Duration::from_millis(80),
    after_child: Duration::from_millis(10),
};

pub const REPOSITORY: StageScript = StageScript {
    span_name: "CallQuery",
    service: "backend-query-repository",
    before_child: Duration::from_millis(50),
    after_child: Duration::from_millis(30),
};

pub const DATABASE: StageScript = StageScript {
    span_name: "SELECT x,y,z FROM abc WHERE user_id = ?",
    service: "db",
    before_child: Duration::from_millis(350),
    after_child: Duration::ZERO,
};

/// Stages from outermost to innermost.
pub const CALL_TREE: [StageScript; 4] = [FRONTEND, BACKEND, REPOSITORY, DATABASE];

/// Query identifier recorded on the repository span.
pub const QUERY_ID: &str = "get-user-details";

/// Session identifier used when none is configured.
pub const DEFAULT_SESSION_ID: &str = "abcde1234";

/// Span status description set on the repository when the query fails.
pub const DB_ERROR_STATUS: &str = "DB Error";

/// Wall-clock lower bound for one full synthetic request.
pub fn scripted_total() -> Duration {
    CALL_TREE.iter().map(StageScript::own_hold).sum()
}
