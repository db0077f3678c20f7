pub const SUGGESTION_DEBOUNCE_MS: u64 = 300;
pub const SUGGESTION_LIMIT: i64 = 20;
pub const SUGGESTION_LIMIT_MAX: i64 = 100;

pub const DEFAULT_STEP_MINUTES: u32 = 2;

/// Preference flags and the flavor tag each one stands for.
pub const FLAVOR_FLAGS: &[(&str, &str)] = &[
    ("prefers_sweet", "Sweet"),
    ("prefers_bitter", "Bitter"),
    ("prefers_citrus", "Citrus"),
    ("prefers_strong", "Dry"),
    ("prefers_low_abv", "Fresh"),
];
