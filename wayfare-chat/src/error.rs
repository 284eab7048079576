/// What the outermost handler reports for a failed turn: a machine
/// error type plus the user-facing message template.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub error_type: &'static str,
    pub message: &'static str,
}

/// Heuristic categorization of an unclassified failure by keyword, so
/// the chat UI can show a relevant message instead of a raw error.
/// Checked in order; the first hit wins.
pub fn categorize_failure(detail: &str) -> ErrorReport {
    let lowered = detail.to_lowercase();

    if lowered.contains("openai") || lowered.contains("llm") {
        return ErrorReport {
            error_type: "llm_error",
            message: "I'm having trouble thinking right now. Please try again in a moment.",
        };
    }
    if lowered.contains("rapidapi")
        || lowered.contains("flight")
        || lowered.contains("hotel")
        || lowered.contains("amadeus")
        || lowered.contains("kiwi")
        || lowered.contains("provider")
    {
        return ErrorReport {
            error_type: "provider_error",
            message: "I couldn't reach the travel data service. Please try your search again shortly.",
        };
    }
    if lowered.contains("database") || lowered.contains("conversation") {
        return ErrorReport {
            error_type: "storage_error",
            message: "I had trouble saving our conversation. Your request was not lost; please resend it.",
        };
    }
    if lowered.contains("timeout") {
        return ErrorReport {
            error_type: "timeout_error",
            message: "That took longer than expected and timed out. Please try again.",
        };
    }
    if lowered.contains("network") {
        return ErrorReport {
            error_type: "network_error",
            message: "I'm having network trouble. Please try again in a moment.",
        };
    }
    if lowered.contains("rate") || lowered.contains("limit") {
        return ErrorReport {
            error_type: "rate_limit_error",
            message: "I'm being rate limited right now. Please wait a moment and try again.",
        };
    }

    ErrorReport {
        error_type: "unknown_error",
        message: "Something unexpected went wrong. Please try again.",
    }
}

/// Configuration failures are detected structurally, never by keyword.
pub const CONFIGURATION_REPORT: ErrorReport = ErrorReport {
    error_type: "configuration_error",
    message: "The assistant is not configured correctly. Please contact support.",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_keywords() {
        assert_eq!(categorize_failure("openai returned 500").error_type, "llm_error");
    }

    #[test]
    fn test_provider_keywords() {
        assert_eq!(
            categorize_failure("rapidapi: connection reset").error_type,
            "provider_error"
        );
        assert_eq!(
            categorize_failure("no flight data available").error_type,
            "provider_error"
        );
    }

    #[test]
    fn test_storage_keywords() {
        assert_eq!(
            categorize_failure("conversation insert failed").error_type,
            "storage_error"
        );
        assert_eq!(categorize_failure("database is down").error_type, "storage_error");
    }

    #[test]
    fn test_timeout_beats_network() {
        assert_eq!(
            categorize_failure("network timeout after 30s").error_type,
            "timeout_error"
        );
    }

    #[test]
    fn test_rate_limit() {
        assert_eq!(categorize_failure("rate exceeded").error_type, "rate_limit_error");
    }

    #[test]
    fn test_unknown_fallback() {
        assert_eq!(categorize_failure("segfault").error_type, "unknown_error");
    }
}
