//! Access rule classification.
//!
//! Maps a property's (get, set, inf) rules to the kind of interface content
//! it becomes. Only the combinations listed in [`classify`] are supported.

use crate::datatype::DataType;
use crate::error::Violation;
use crate::types::{AccessRule, AccessTriple, InterfaceKind};

/// Result of classifying a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: InterfaceKind,
    pub writable: bool,
}

impl Classification {
    fn command() -> Self {
        Self {
            kind: InterfaceKind::Command,
            writable: false,
        }
    }

    fn telemetry() -> Self {
        Self {
            kind: InterfaceKind::Telemetry,
            writable: false,
        }
    }

    fn property(writable: bool) -> Self {
        Self {
            kind: InterfaceKind::Property,
            writable,
        }
    }
}

/// Classify a property by its access rules.
///
/// | get | set | inf | result |
/// |-----|-----|-----|--------|
/// | NA | optional | NA | Command |
/// | NA | required | optional | Command |
/// | optional, required, required_c | NA | required | Telemetry |
/// | optional, required, required_c | NA | optional | Telemetry for state data, else read-only Property |
/// | required | required | NA | writable Property |
/// | optional, required | optional | required | writable Property |
/// | required, required_c | same as get | required, optional | writable Property |
/// | optional, required, required_c | optional | optional | writable Property |
///
/// # Errors
///
/// Returns `Violation::UnsupportedAccess` for any other combination.
pub fn classify(access: AccessTriple, shape: &DataType) -> Result<Classification, Violation> {
    use AccessRule::{NotApplicable as Na, Optional, Required, RequiredByCase as ByCase};

    let classification = match (access.get, access.set, access.notify) {
        // No get
        (Na, Optional, Na) | (Na, Required, Optional) => Classification::command(),

        // No set
        (Optional | Required | ByCase, Na, Required) => Classification::telemetry(),
        (Optional | Required | ByCase, Na, Optional) => {
            if shape.is_state() {
                Classification::telemetry()
            } else {
                Classification::property(false)
            }
        }

        // Get and set
        (Required, Required, Na)
        | (Optional, Optional, Required)
        | (Required, Optional, Required)
        | (Required, Required, Required)
        | (ByCase, ByCase, Required)
        | (Optional, Optional, Optional)
        | (Required, Optional, Optional)
        | (ByCase, Optional, Optional)
        | (Required, Required, Optional)
        | (ByCase, ByCase, Optional) => Classification::property(true),

        _ => return Err(Violation::UnsupportedAccess { access }),
    };
    Ok(classification)
}
