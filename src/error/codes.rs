/// Error code registry for tagsync
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration and credentials errors
/// - 2000-2999: Container reconciliation errors
/// - 3000-3999: Extraction and placement errors
/// - 4000-4999: Index verification errors
/// - 5000-5999: Run initialization errors
/// - 6000-6999: Instruction rendering errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_MALFORMED: u16 = 1001;
    pub const CONFIG_DUPLICATE_SHEET_TAG: u16 = 1002;
    pub const CONFIG_IO: u16 = 1003;
    pub const CONFIG_SETTINGS: u16 = 1004;
    pub const CREDENTIALS_MALFORMED: u16 = 1101;
    pub const CREDENTIALS_MISSING_BLOCK: u16 = 1102;

    // Reconciliation errors (2000-2999)
    pub const RECONCILE_UNAUTHORIZED: u16 = 2001;
    pub const RECONCILE_UNAVAILABLE: u16 = 2002;
    pub const RECONCILE_TRANSPORT: u16 = 2003;

    // Extraction errors (3000-3999)
    pub const EXTRACT_NO_RESULT: u16 = 3001;
    pub const EXTRACT_SOURCE: u16 = 3002;
    pub const EXTRACT_SERIALIZATION: u16 = 3003;
    pub const PLACEMENT_FAILED: u16 = 3101;

    // Verification errors (4000-4999)
    pub const VERIFY_EXHAUSTED: u16 = 4001;
    pub const VERIFY_CANCELLED: u16 = 4002;

    // Initialization errors (5000-5999)
    pub const INIT_SOURCE: u16 = 5001;
    pub const INIT_NAMESPACE: u16 = 5002;
    pub const INIT_INDEX: u16 = 5003;

    // Instruction errors (6000-6999)
    pub const INSTRUCTIONS_UNKNOWN_DASHBOARD: u16 = 6001;
    pub const INSTRUCTIONS_NO_PROFILE: u16 = 6002;
    pub const INSTRUCTIONS_TEMPLATE: u16 = 6003;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        1001 => "Project document does not have the expected shape",
        1002 => "Two sheets under the same dashboard share a tag",
        1003 => "Configuration file could not be read",
        1004 => "Run settings are invalid",
        1101 => "Credentials document does not have the expected shape",
        1102 => "Credentials document is missing a capability block",

        2001 => "Namespace rejected the request as unauthorized",
        2002 => "Namespace is temporarily unavailable",
        2003 => "Network-level failure talking to the namespace",

        3001 => "No successful result set found for the sheet tag",
        3002 => "Source system failed while resolving the result set",
        3003 => "Extracted table could not be serialized",
        3101 => "Artifact could not be written into its container",

        4001 => "Index did not confirm the artifact within the attempt budget",
        4002 => "Verification was cancelled",

        5001 => "Source collaborator failed to initialize",
        5002 => "Namespace collaborator failed to initialize",
        5003 => "Index collaborator failed to initialize",

        6001 => "No dashboard with that name in the project",
        6002 => "Dashboard has no index profile",
        6003 => "Instruction template failed to render",

        _ => "Unknown error code",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_described() {
        for code in [
            ErrorCode::CONFIG_MALFORMED,
            ErrorCode::CONFIG_DUPLICATE_SHEET_TAG,
            ErrorCode::RECONCILE_TRANSPORT,
            ErrorCode::EXTRACT_NO_RESULT,
            ErrorCode::VERIFY_CANCELLED,
            ErrorCode::INIT_INDEX,
        ] {
            assert_ne!(describe_error_code(code), "Unknown error code");
        }
        assert_eq!(describe_error_code(9999), "Unknown error code");
    }
}
