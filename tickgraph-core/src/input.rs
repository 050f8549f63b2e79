//! Input Data
//!
//! Observed series for the inventory model, loaded from JSON:
//!
//! ```json
//! {
//!   "opening_inventory": 100,
//!   "shipments": [20, 20, 20],
//!   "arrivals": [10, 20, 30]
//! }
//! ```

use std::io;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::sheet::Sheet;
use crate::ticks::Tick;

/// Row names of the sheet built by [`InventoryInput::build_sheet`].
pub const INVENTORY_ROWS: [&str; 4] = ["opening", "arrivals", "shipments", "closing"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryInput {
    /// Stock on hand at the start of the first tick.
    pub opening_inventory: f64,

    /// Units shipped out, one entry per tick.
    pub shipments: Vec<f64>,

    /// Units received, one entry per tick.
    pub arrivals: Vec<f64>,
}

impl InventoryInput {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Check that both series cover `learn_start..=sim_end`, one entry per tick.
    pub fn validate<T: Tick>(&self, learn_start: T, sim_end: T) -> Result<()> {
        let expected = sim_end.since(learn_start) + 1;
        for (name, series) in [("shipments", &self.shipments), ("arrivals", &self.arrivals)] {
            if series.len() as i64 != expected {
                return Err(Error::InvalidData(format!(
                    "length of '{name}' is invalid. expected: {expected}, actual: {}",
                    series.len()
                )));
            }
        }
        Ok(())
    }

    /// Build the inventory flow over `start..=end`:
    ///
    /// - `opening` is the opening inventory on the first tick, and the
    ///   previous tick's `closing` afterwards,
    /// - `closing = opening + arrivals - shipments`.
    ///
    /// The sheet is returned uncalculated.
    pub fn build_sheet<T: Tick>(&self, start: T, end: T) -> Result<Sheet<T>> {
        self.validate(start, end)?;
        let [opening, arrivals, shipments, closing] = INVENTORY_ROWS;
        let mut sheet = Sheet::new(start, end, INVENTORY_ROWS)?;

        sheet.set(opening, start, self.opening_inventory)?;
        for (i, day) in sheet.columns().into_iter().enumerate() {
            sheet.set(arrivals, day, self.arrivals[i])?;
            sheet.set(shipments, day, self.shipments[i])?;

            if day > start {
                let previous = sheet.get(closing, day.offset(-1))?;
                sheet.set(opening, day, previous)?;
            }

            let stock = sheet.get(opening, day)?;
            let received = sheet.get(arrivals, day)?;
            let shipped = sheet.get(shipments, day)?;
            let graph = sheet.graph_mut();
            let gross = graph.add(stock, received);
            let net = graph.sub(gross, shipped);
            sheet.set(closing, day, net)?;
        }

        debug!(ticks = self.shipments.len(), "inventory sheet built");
        Ok(sheet)
    }
}
