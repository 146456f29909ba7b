//! Process exit codes.
//!
//! | code | meaning |
//! |------|---------|
//! | 1 | any other error |
//! | 2 | a search or revalidation run was aborted (retry budget or API keys exhausted) |
//! | 3 | invalid or incomplete configuration |

use std::fmt;

use sesg_sweep::SweepError;
use sesg_sweep::coordinator::FatalReason;

pub const GENERAL: i32 = 1;
pub const RUN_ABORTED: i32 = 2;
pub const CONFIG: i32 = 3;

/// A search run ended with a fatal termination. Its summary has already
/// been printed.
#[derive(Debug)]
pub struct RunAborted(pub FatalReason);

impl fmt::Display for RunAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "search run aborted: {}", self.0)
    }
}

impl std::error::Error for RunAborted {}

/// Exit code for an error, from the first recognized cause in its chain.
pub fn code_for(error: &anyhow::Error) -> i32 {
    for cause in error.chain() {
        if cause.is::<RunAborted>() {
            return RUN_ABORTED;
        }
        if matches!(cause.downcast_ref::<SweepError>(), Some(SweepError::Aborted(_))) {
            return RUN_ABORTED;
        }
        if cause.is::<sesg_config::ConfigError>() {
            return CONFIG;
        }
    }
    GENERAL
}

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn aborted_runs_exit_with_two() {
        let error = anyhow::Error::new(RunAborted(FatalReason::OutOfApiKeys));
        assert_eq!(code_for(&error), RUN_ABORTED);
    }

    #[test]
    fn aborted_revalidation_exits_with_two() {
        let failed: Result<(), _> = Err(SweepError::Aborted(FatalReason::RetriesExhausted {
            client: 0,
            budget: 10,
        }));
        let error = failed.context("fix-invalid failed").unwrap_err();
        assert_eq!(code_for(&error), RUN_ABORTED);
    }

    #[test]
    fn config_errors_are_found_through_context_and_wrappers() {
        let inner = sesg_config::ConfigError::NotConfigured {
            section: "scopus".into(),
        };
        let wrapped: Result<(), _> = Err(sesg_sweep::SweepError::from(inner));
        let error = wrapped.context("search failed").unwrap_err();
        assert_eq!(code_for(&error), CONFIG);
    }

    #[test]
    fn anything_else_exits_with_one() {
        assert_eq!(code_for(&anyhow::anyhow!("boom")), GENERAL);
    }
}
