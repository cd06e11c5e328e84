//! CLI parse tests.

use super::{Cli, ToolArg};
use clap::Parser;

pub(super) fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

pub(super) fn parse_err(args: &[&str]) -> clap::error::ErrorKind {
    Cli::try_parse_from(args).unwrap_err().kind()
}


#[test]
fn tool_arg_maps_to_identifier() {
    use rebarup_core::ToolIdentifier;
    assert_eq!(ToolIdentifier::from(ToolArg::Rebar), ToolIdentifier::Rebar);
    assert_eq!(ToolIdentifier::from(ToolArg::Rebar3), ToolIdentifier::Rebar3);
}
