//! Derived statuses of builds, versions and patches.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! derived_status {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            /// Nothing has started, or everything is blocked.
            #[default]
            Created,
            /// Work is running or still runnable.
            Started,
            /// Everything finished and something failed or was aborted.
            Failed,
            /// Everything finished without failure.
            Succeeded,
        }

        impl $name {
            /// Returns the canonical storage representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    Self::Created => "created",
                    Self::Started => "started",
                    Self::Failed => "failed",
                    Self::Succeeded => "succeeded",
                }
            }

            /// Returns `true` for terminal statuses.
            #[must_use]
            pub const fn is_finished(self) -> bool {
                matches!(self, Self::Failed | Self::Succeeded)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

derived_status!(
    /// Status of a build, derived from its tasks.
    BuildStatus
);

derived_status!(
    /// Status of a version, derived from its builds.
    VersionStatus
);

derived_status!(
    /// Status of a patch, looked up from its version's status.
    PatchStatus
);

impl From<VersionStatus> for PatchStatus {
    fn from(status: VersionStatus) -> Self {
        match status {
            VersionStatus::Created => Self::Created,
            VersionStatus::Started => Self::Started,
            VersionStatus::Failed => Self::Failed,
            VersionStatus::Succeeded => Self::Succeeded,
        }
    }
}
