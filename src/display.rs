use anyhow::Result;
use console::style;
use serde::Serialize;

use crate::chat::ChatDelivery;

pub fn display_json<T: Serialize>(o: T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&o)?);
    Ok(())
}

/// One line per delivery. Bodies that are not chat events are printed as they are.
pub fn format_delivery(delivery: &ChatDelivery) -> String {
    match delivery.event {
        Some(ref event) => event.to_string(),
        None => delivery.body.trim_end().to_string(),
    }
}

pub fn display_delivery(delivery: &ChatDelivery) {
    let prefix = style(&delivery.destination).dim();
    println!("{prefix} {}", format_delivery(delivery));
}
