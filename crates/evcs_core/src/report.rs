//! Plain-text activity report of a station.

use std::fmt::Write;
use std::path::Path;

use crate::models::transfer_time;
use crate::{Condition, EventSnapshot, Kind, Station};

const RULE: &str = "********************";

fn completed(events: &[EventSnapshot], kind: Kind) -> usize {
    events
        .iter()
        .filter(|event| event.kind == kind && event.condition == Condition::Finished)
        .count()
}

fn estimate_ms(event: &EventSnapshot) -> u64 {
    event.estimated_wait_ms.unwrap_or(0)
}

impl Station {
    /// Current situation of the station followed by every event it has
    /// seen and every energy addition, oldest first.
    pub fn render_report(&self) -> String {
        let events: Vec<EventSnapshot> =
            self.events().iter().map(|event| event.snapshot()).collect();
        let mut out = String::new();

        // Writing into a String cannot fail
        let _ = self.write_summary(&mut out, &events);
        let _ = write_events(&mut out, self.name(), &events, self.rates().inductive);

        let _ = writeln!(out);
        let _ = writeln!(out, "***Energy additions***");
        for addition in self.energy_additions() {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "{}, {}, {}",
                capitalized(addition.source.ledger_name()),
                addition.amount,
                addition.at.format("%Y/%m/%d %H:%M:%S")
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", RULE);
        out
    }

    fn write_summary(&self, out: &mut String, events: &[EventSnapshot]) -> std::fmt::Result {
        writeln!(out, "{}", RULE)?;
        writeln!(out)?;
        writeln!(out, "Id: {}", self.id())?;
        writeln!(out, "Name: {}", self.name())?;
        writeln!(out, "Remaining energy: {}", self.total_stock())?;
        writeln!(out, "Fast chargers: {}", self.unit_count(Kind::Fast))?;
        writeln!(out, "Slow chargers: {}", self.unit_count(Kind::Slow))?;
        writeln!(out, "Dischargers: {}", self.unit_count(Kind::Discharge))?;
        writeln!(out, "Exchange handlers: {}", self.unit_count(Kind::Exchange))?;
        writeln!(out, "Parking slots: {}", self.unit_count(Kind::Parking))?;
        writeln!(out, "Completed fast chargings: {}", completed(events, Kind::Fast))?;
        writeln!(out, "Completed slow chargings: {}", completed(events, Kind::Slow))?;
        writeln!(out, "Completed dischargings: {}", completed(events, Kind::Discharge))?;
        writeln!(out, "Completed battery swappings: {}", completed(events, Kind::Exchange))?;
        writeln!(out, "Completed parkings: {}", completed(events, Kind::Parking))?;
        writeln!(out, "Vehicles waiting for fast charging: {}", self.queue_len(Kind::Fast))?;
        writeln!(out, "Vehicles waiting for slow charging: {}", self.queue_len(Kind::Slow))?;
        writeln!(out, "Vehicles waiting for discharging: {}", self.queue_len(Kind::Discharge))?;
        writeln!(out, "Vehicles waiting for battery swapping: {}", self.queue_len(Kind::Exchange))?;
        writeln!(out, "Vehicles waiting for parking: {}", self.queue_len(Kind::Parking))?;
        writeln!(out, "Energy amounts: ")?;
        for stock in self.stock() {
            writeln!(out, "  {}: {}", stock.source, stock.amount)?;
        }
        Ok(())
    }

    /// Write the report to `path`. Failures are logged and otherwise ignored;
    /// returns whether the report was written.
    pub fn write_report(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match std::fs::write(path, self.render_report()) {
            Ok(()) => {
                tracing::info!("Report of station {} written to {}", self.name(), path.display());
                true
            }
            Err(err) => {
                tracing::error!("Could not write report to {}: {}", path.display(), err);
                false
            }
        }
    }
}

fn write_events(
    out: &mut String,
    station: &str,
    events: &[EventSnapshot],
    inductive_rate: f64,
) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "***Charging events***")?;
    for event in events.iter().filter(|event| matches!(event.kind, Kind::Fast | Kind::Slow)) {
        writeln!(out)?;
        writeln!(out, "Id: {}", event.id)?;
        writeln!(out, "Station name: {}", station)?;
        writeln!(out, "Kind of charging: {}", event.kind)?;
        writeln!(out, "Asking energy: {}", event.requested)?;
        writeln!(out, "Received energy: {}", event.energy_to_be_received)?;
        writeln!(out, "Condition: {}", event.condition)?;
        writeln!(out, "Charging time: {}", event.duration_ms)?;
        writeln!(out, "Waiting time: {}", event.max_wait_ms)?;
        writeln!(out, "Maximum waiting time: {}", estimate_ms(event))?;
        writeln!(out, "Cost: {}", event.cost)?;
    }

    writeln!(out)?;
    writeln!(out, "***Discharging events***")?;
    for event in events.iter().filter(|event| event.kind == Kind::Discharge) {
        writeln!(out)?;
        writeln!(out, "Id: {}", event.id)?;
        writeln!(out, "Station name: {}", station)?;
        writeln!(out, "Asking energy: {}", event.requested)?;
        writeln!(out, "Condition: {}", event.condition)?;
        writeln!(out, "Discharging time: {}", event.duration_ms)?;
        writeln!(out, "Waiting time: {}", event.max_wait_ms)?;
        writeln!(out, "Maximum waiting time: {}", estimate_ms(event))?;
        writeln!(out, "Profit: {}", event.cost)?;
    }

    writeln!(out)?;
    writeln!(out, "***Exchange events***")?;
    for event in events.iter().filter(|event| event.kind == Kind::Exchange) {
        writeln!(out)?;
        writeln!(out, "Id: {}", event.id)?;
        writeln!(out, "Station name: {}", station)?;
        writeln!(out, "Condition: {}", event.condition)?;
        writeln!(out, "Waiting time: {}", event.max_wait_ms)?;
        writeln!(out, "Maximum waiting time: {}", estimate_ms(event))?;
        writeln!(out, "Cost: {}", event.cost)?;
    }

    writeln!(out)?;
    writeln!(out, "***Parking events***")?;
    for event in events.iter().filter(|event| event.kind == Kind::Parking) {
        let charging = transfer_time(event.energy_to_be_received, inductive_rate);
        writeln!(out)?;
        writeln!(out, "Id: {}", event.id)?;
        writeln!(out, "Station name: {}", station)?;
        writeln!(out, "Amount of energy: {}", event.requested)?;
        writeln!(out, "Received energy: {}", event.energy_to_be_received)?;
        writeln!(out, "Condition: {}", event.condition)?;
        writeln!(out, "Parking time: {}", event.parking_ms)?;
        writeln!(out, "Charging time: {}", charging.as_millis())?;
        writeln!(out, "Cost: {}", event.cost)?;
    }
    Ok(())
}

fn capitalized(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
