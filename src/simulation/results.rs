//! Time-indexed tables of named signals returned by a simulation run.

use std::collections::BTreeMap;
use std::io::Write;

use serde::{Deserialize, Serialize};

pub const PENDULUM_THETA: &str = "Pendulum.Theta";
pub const PENDULUM_OMEGA: &str = "Pendulum.Omega";
pub const SETPOINT: &str = "Setpoint.out_0";
pub const PID_COMMAND: &str = "Discrete_PID.Command";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SimulationResults {
    time: Vec<f64>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl SimulationResults {
    pub fn new(column_names: &[&str]) -> SimulationResults {
        SimulationResults {
            time: Vec::new(),
            columns: column_names
                .iter()
                .map(|name| (name.to_string(), Vec::new()))
                .collect(),
        }
    }

    /// Appends one row of `(column name, value)` pairs. Every column must be given a value.
    pub fn push_row(&mut self, time: f64, values: &[(&str, f64)]) {
        assert_eq!(values.len(), self.columns.len(), "incomplete result row");
        self.time.push(time);
        for (name, value) in values {
            self.columns
                .get_mut(*name)
                .unwrap_or_else(|| panic!("unknown result column: {}", name))
                .push(*value);
        }
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|values| values.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|name| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Writes the table as CSV with a leading `time` column.
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let mut header = vec!["time"];
        header.extend(self.column_names());
        csv_writer.write_record(&header)?;

        for (row, t) in self.time.iter().enumerate() {
            let mut record = vec![t.to_string()];
            record.extend(
                self.columns
                    .values()
                    .map(|values| values.get(row).map_or(String::new(), |v| v.to_string())),
            );
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
