//! Small helpers shared across the engine's modules.

use hfmirror_core::Settings;
use std::time::SystemTime;

/// Current wall-clock time as Unix epoch milliseconds.
///
/// Progress events never read the clock internally (see
/// [`hfmirror_core::ProgressEvent::new`]); this is the one place engine code
/// does.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

/// Build the auth headers for every request the engine issues.
pub(crate) fn auth_headers(settings: &Settings) -> Vec<(String, String)> {
    hfmirror_hub::add_auth(settings.token.as_deref())
}
