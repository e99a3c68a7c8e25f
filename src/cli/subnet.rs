//! Subnet subcommand implementation.

use super::Context;
use crate::error::CliResult;
use crate::history::{HistoryEntry, Operation};
use crate::subnet;
use clap::Parser;
use serde_json::json;
use std::time::Instant;

/// Calculate subnet information.
#[derive(Parser, Debug)]
pub struct SubnetCommand {
    /// `10.0.0.0/24`, `10.0.0.1 255.255.255.0`, or a bare address
    #[arg(value_name = "NETWORK", num_args = 1..=2, required = true)]
    pub network: Vec<String>,
}

impl SubnetCommand {
    pub fn input(&self) -> String {
        self.network.join(" ")
    }

    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        let input = self.input();
        let started = Instant::now();
        let info = subnet::parse(&input)?;

        let entry = HistoryEntry::new(
            Operation::Subnet,
            &info.cidr_notation,
            &json!({ "input": input }),
            &info,
            started.elapsed(),
            true,
        )?;
        ctx.emit(&entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_form_takes_two_arguments() {
        let cmd = SubnetCommand::try_parse_from(["subnet", "10.0.0.1", "255.255.255.0"]).unwrap();
        assert_eq!(cmd.input(), "10.0.0.1 255.255.255.0");
        assert!(subnet::parse(&cmd.input()).is_ok());

        let cmd = SubnetCommand::try_parse_from(["subnet", "10.0.0.0/8"]).unwrap();
        assert_eq!(cmd.input(), "10.0.0.0/8");
    }
}
