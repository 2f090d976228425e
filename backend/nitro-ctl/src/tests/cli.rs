use crate::cli::{Cli, Commands};

use clap::Parser;
use googletest::assert_that;
use googletest::prelude::eq;

#[test]
fn given_init_with_hold_when_parse_then_model_and_flag_set() {
    // When
    let cli = Cli::try_parse_from(["nitro-ctl", "init", "llama-7b.gguf", "--hold", "--pretty"])
        .unwrap();

    // Then
    assert!(cli.pretty);
    match cli.command {
        Commands::Init { model, hold } => {
            assert_that!(model.as_str(), eq("llama-7b.gguf"));
            assert!(hold);
        }
        _ => panic!("expected init"),
    }
}

#[test]
fn given_init_without_model_when_parse_then_error() {
    assert!(Cli::try_parse_from(["nitro-ctl", "init"]).is_err());
}

#[test]
fn given_simple_subcommands_when_parse_then_matched() {
    let parse = |name: &str| Cli::try_parse_from(["nitro-ctl", name]).unwrap().command;

    assert!(matches!(parse("kill"), Commands::Kill));
    assert!(matches!(parse("status"), Commands::Status));
    assert!(matches!(parse("platform"), Commands::Platform));
    assert!(matches!(parse("config"), Commands::Config));
}
