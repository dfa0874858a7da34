//! Logging support

use log::{debug, error, info, warn};
use x509_cert::name::Name;

use crate::util::name_utilities::name_to_openssl;

/// Enum that describes level associated with a log message
#[derive(Debug, Eq, PartialEq)]
pub enum PeLogLevels {
    /// Common error logging level
    PeError,
    /// Common info logging level
    PeInfo,
    /// Common warn logging level
    PeWarn,
    /// Common debug logging level
    PeDebug,
}

/// `log_message` routes a message to the `log` facade at the given level. No logger is installed by
/// this crate.
pub fn log_message(level: &PeLogLevels, message: &str) {
    if &PeLogLevels::PeError == level {
        error!("{}", message);
    } else if &PeLogLevels::PeWarn == level {
        warn!("{}", message);
    } else if &PeLogLevels::PeInfo == level {
        info!("{}", message);
    } else {
        debug!("{}", message);
    }
}

/// log a message with the given name appended
pub fn log_error_for_name(name: &Name, msg: &str) {
    error!("{} for {}", msg, name_to_openssl(name));
}

/// log a message at the given level with the given name appended
pub fn log_for_name(level: &PeLogLevels, name: &Name, msg: &str) {
    log_message(level, &format!("{} for {}", msg, name_to_openssl(name)));
}
