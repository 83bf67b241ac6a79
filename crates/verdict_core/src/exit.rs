//! Exit code resolution from the final aggregated summary.

use crate::summary::CheckSummary;

/// No alarms, no errors.
pub const EXIT_OK: u8 = 0;
/// One or more control alarms, no errors.
pub const EXIT_ALARMS: u8 = 1;
/// One or more control errors; dominates alarms.
pub const EXIT_ERRORS: u8 = 2;

/// Map the root summary to the process exit status.
///
/// Codes 3 and above are reserved for runtime/setup failures and are
/// assigned by the caller, not from a summary.
pub fn exit_code(summary: &CheckSummary) -> u8 {
    if summary.error > 0 {
        EXIT_ERRORS
    } else if summary.alarm > 0 {
        EXIT_ALARMS
    } else {
        EXIT_OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(alarm: u32, error: u32) -> CheckSummary {
        CheckSummary {
            alarm,
            ok: 5,
            info: 1,
            skip: 2,
            error,
        }
    }

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(exit_code(&summary(0, 0)), EXIT_OK);
        assert_eq!(exit_code(&summary(3, 0)), EXIT_ALARMS);
        assert_eq!(exit_code(&summary(0, 2)), EXIT_ERRORS);
        // errors dominate alarms
        assert_eq!(exit_code(&summary(3, 2)), EXIT_ERRORS);
    }
}
