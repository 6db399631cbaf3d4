use std::io;

use anyhow::{bail, Context, Result};

use avl_menu::avl_tree::{AvlTree, AvlTreeDebug};
use avl_menu::menu::{Menu, DEFAULT_SEED};

#[derive(Debug, PartialEq, Eq)]
struct Args {
    debug: bool,
    seed: u64,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut parsed = Args {
        debug: false,
        seed: DEFAULT_SEED,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--debug" => parsed.debug = true,
            "--seed" => {
                let value = args.next().context("--seed needs a value")?;
                parsed.seed = value
                    .parse()
                    .with_context(|| format!("invalid seed: {}", value))?;
            }
            other => bail!("unknown argument: {}", other),
        }
    }
    Ok(parsed)
}

pub fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    let mut menu = Menu::new(io::stdin().lock(), io::stdout().lock(), args.seed);
    if args.debug {
        menu.run(&mut AvlTreeDebug::new())?;
    } else {
        menu.run(&mut AvlTree::new())?;
    }
    Ok(())
}
