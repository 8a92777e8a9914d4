use anyhow::Result;
use serde::Serialize;

use crate::view::Notification;

/// Pretty-print any serializable value as JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Print a value together with the notification the action produced.
pub fn print_json_with_notice<T: Serialize>(value: &T, notice: Option<&Notification>) -> Result<()> {
    print_json(&serde_json::json!({
        "data": value,
        "notification": notice,
    }))
}
