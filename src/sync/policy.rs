use serde::Deserialize;

/// How a delta record combines with the record already held for its key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// The delta record replaces the previous one entirely.
    #[default]
    Replace,
    /// Top-level fields of the delta overwrite those of the previous record;
    /// fields the delta does not carry are kept. Falls back to `Replace` when
    /// either side is not a JSON object.
    ShallowMerge,
}

/// What a delta payload means for keys it does not mention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaPolicy {
    /// Unlisted keys are left untouched.
    #[default]
    Upsert,
    /// Every delta is the complete current list; unlisted keys are dropped.
    Authoritative,
}
