//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/users/{user_id}/sms/parse', use [format_endpoint].

/// The route for checking that the server is up.
pub const HEALTH: &str = "/api/health";
/// The route for parsing an SMS forwarded by a user's phone.
pub const PARSE_SMS: &str = "/api/users/{user_id}/sms/parse";
/// The route for listing a user's SMS transactions that have not been reconciled.
pub const UNPROCESSED_SMS: &str = "/api/users/{user_id}/sms/unprocessed";
/// The route for marking an SMS transaction as reconciled.
pub const PROCESS_SMS: &str = "/api/sms/{sms_id}/process";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace and ends with a
/// right brace. For example, in the endpoint path '/users/{user_id}',
/// '{user_id}' is the parameter.
///
/// Only the first parameter is replaced. If no parameter is found in
/// `endpoint_path`, the function returns the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
