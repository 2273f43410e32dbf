// Grammar selection from --enable-symbols / --disable-symbols.

use anyhow::{Context, bail};
use expression_trees::NodeKind;

use crate::cli::args::Cli;
use crate::grammar::{Grammar, SymbolSet};

/// Default arithmetic grammar, widened then narrowed by the CLI lists.
pub fn build_grammar(cli: &Cli) -> anyhow::Result<Grammar> {
    let mut grammar = Grammar::default();
    if let Some(list) = &cli.enable_symbols {
        grammar.enable(SymbolSet::parse(list).context("failed to parse --enable-symbols")?);
    }
    if let Some(list) = &cli.disable_symbols {
        grammar.disable(SymbolSet::parse(list).context("failed to parse --disable-symbols")?);
    }
    if !grammar.has_terminals() {
        bail!("grammar has no terminal symbols (constant or variable must stay enabled)");
    }
    Ok(grammar)
}

pub fn print_grammar(grammar: &Grammar) {
    println!("{:<10} {:<6} {:<6} weight", "symbol", "infix", "arity");
    for (kind, weight) in grammar.allowed_symbols() {
        println!(
            "{:<10} {:<6} {:<6} {}",
            kind.name(),
            kind.infix().unwrap_or("-"),
            kind.arity(),
            weight
        );
    }
    let disabled: Vec<&str> = NodeKind::ALL
        .into_iter()
        .filter(|k| !grammar.is_enabled(*k))
        .map(NodeKind::name)
        .collect();
    if !disabled.is_empty() {
        println!();
        println!("available: {}", disabled.join(","));
    }
}
