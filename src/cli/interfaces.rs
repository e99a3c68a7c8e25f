//! Interfaces subcommand implementation.

use super::Context;
use crate::error::CliResult;
use crate::history::{HistoryEntry, Operation};
use crate::probe::{list_interfaces, InterfaceInfo};
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use std::time::Instant;

/// List local network interfaces.
#[derive(Parser, Debug)]
pub struct InterfacesCommand {
    /// Only show interfaces that are up
    #[arg(long)]
    pub up: bool,

    /// Leave out loopback interfaces
    #[arg(long)]
    pub no_loopback: bool,
}

#[derive(Debug, Serialize)]
struct InterfaceListing {
    count: usize,
    interfaces: Vec<InterfaceInfo>,
}

impl InterfacesCommand {
    fn keep(&self, interface: &InterfaceInfo) -> bool {
        (!self.up || interface.is_up) && !(self.no_loopback && interface.is_loopback)
    }

    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        let started = Instant::now();
        let interfaces: Vec<InterfaceInfo> = list_interfaces()
            .into_iter()
            .filter(|i| self.keep(i))
            .collect();
        let listing = InterfaceListing {
            count: interfaces.len(),
            interfaces,
        };

        let entry = HistoryEntry::new(
            Operation::Interfaces,
            "localhost",
            &json!({ "up": self.up, "no_loopback": self.no_loopback }),
            &listing,
            started.elapsed(),
            true,
        )?;
        ctx.emit(&entry)
    }
}
