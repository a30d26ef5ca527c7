pub mod dispense;
pub mod lookup;
pub mod playlist;

/// Interpret a query-string flag (`1`, `true`, `yes`, `on`).
pub(crate) fn is_truthy(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}
