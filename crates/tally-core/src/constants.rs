//! Package-level constants.

/// Current version of Tally (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name.
pub const NAME: &str = "tally";

/// Participants tasks can be assigned to when no settings file overrides them.
pub const DEFAULT_PARTICIPANTS: [&str; 3] = ["Anna", "Bella", "Chloe"];

/// Bound for the per-generator counter in composite task IDs.
pub const ID_COUNTER_WRAP: u32 = 10_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_semver() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert_eq!(parts.len(), 3, "VERSION must be semver (MAJOR.MINOR.PATCH)");
        for part in parts {
            let _: u32 = part.parse().expect("each semver segment must be a number");
        }
    }

    #[test]
    fn name_is_lowercase() {
        assert_eq!(NAME, NAME.to_lowercase());
    }

    #[test]
    fn default_participants_are_distinct() {
        let mut names = DEFAULT_PARTICIPANTS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), DEFAULT_PARTICIPANTS.len());
    }
}
