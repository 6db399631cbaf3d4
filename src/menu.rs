use std::io::{self, BufRead, Write};

use itertools::Itertools;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::avl_tree::{ConfigT, Key, Tree};
use crate::error::InputError;

pub const DEFAULT_SEED: u64 = 5;
pub const MAX_FILL: usize = 100_000;

pub const MENU: &str = "\
Menu:
1. Create new AVL tree
2. Insert key
3. Delete key
4. Search key
5. Print AVL tree (in-order)
6. Exit
7. Fill with random keys
8. Print tree shape
Choice: ";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    NewTree,
    Insert,
    Delete,
    Search,
    PrintInOrder,
    Exit,
    FillRandom,
    PrintShape,
}

impl Command {
    pub fn parse(choice: &str) -> Result<Self, InputError> {
        match choice.trim() {
            "1" => Ok(Command::NewTree),
            "2" => Ok(Command::Insert),
            "3" => Ok(Command::Delete),
            "4" => Ok(Command::Search),
            "5" => Ok(Command::PrintInOrder),
            "6" => Ok(Command::Exit),
            "7" => Ok(Command::FillRandom),
            "8" => Ok(Command::PrintShape),
            other => Err(InputError::InvalidChoice(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Menu<R: BufRead, W: Write> {
    input: R,
    output: W,
    rng: Pcg64,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, output: W, seed: u64) -> Self {
        Menu {
            input,
            output,
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_line(&mut self) -> Result<String, InputError> {
        // bytes, not read_line: a badly encoded line is bad input, not an I/O failure
        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line)? == 0 {
            return Err(InputError::Eof);
        }
        Ok(String::from_utf8_lossy(&line).trim().to_string())
    }

    fn prompt(&mut self, prompt: &str) -> Result<String, InputError> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        self.read_line()
    }

    fn read_key(&mut self, prompt: &str) -> Result<Key, InputError> {
        let line = self.prompt(prompt)?;
        line.parse().map_err(|_| InputError::InvalidKey(line))
    }

    fn read_count(&mut self) -> Result<usize, InputError> {
        let line = self.prompt("How many keys: ")?;
        match line.parse() {
            Ok(n) if n <= MAX_FILL => Ok(n),
            _ => Err(InputError::InvalidCount(line)),
        }
    }

    fn print_height<Config: ConfigT>(&mut self, tree: &Tree<Config>) -> io::Result<()> {
        writeln!(self.output, "Current tree height: {}", tree.height())
    }

    /// Runs one command against `tree`, prompting for its argument if it takes one.
    pub fn execute<Config: ConfigT>(
        &mut self,
        tree: &mut Tree<Config>,
        command: Command,
    ) -> Result<Flow, InputError> {
        match command {
            Command::NewTree => {
                tree.clear();
                writeln!(self.output, "New AVL tree created.")?;
            }
            Command::Insert => {
                let key = self.read_key("Key to insert: ")?;
                if !tree.insert(key) {
                    writeln!(self.output, "Key {} already present.", key)?;
                }
                self.print_height(tree)?;
            }
            Command::Delete => {
                let key = self.read_key("Key to delete: ")?;
                if !tree.remove(key) {
                    writeln!(self.output, "Key {} not found.", key)?;
                }
                self.print_height(tree)?;
            }
            Command::Search => {
                let key = self.read_key("Key to search: ")?;
                if tree.contains(key) {
                    writeln!(self.output, "Key {} found in AVL tree.", key)?;
                } else {
                    writeln!(self.output, "Key {} not found in AVL tree.", key)?;
                }
            }
            Command::PrintInOrder => {
                writeln!(self.output, "In-order traversal:")?;
                writeln!(self.output, "{}", tree.iter().join(" "))?;
            }
            Command::Exit => return Ok(Flow::Exit),
            Command::FillRandom => {
                let count = self.read_count()?;
                let inserted = tree.insert_random(count, &mut self.rng);
                writeln!(self.output, "Inserted {} new keys.", inserted)?;
                self.print_height(tree)?;
            }
            Command::PrintShape => {
                if tree.is_empty() {
                    writeln!(self.output, "(empty)")?;
                } else {
                    write!(self.output, "{}", tree.render_shape())?;
                }
            }
        }
        Ok(Flow::Continue)
    }

    /// Shows the menu and executes commands until Exit or end of input.
    pub fn run<Config: ConfigT>(&mut self, tree: &mut Tree<Config>) -> io::Result<()> {
        loop {
            writeln!(self.output)?;
            let result = self
                .prompt(MENU)
                .and_then(|line| Command::parse(&line))
                .and_then(|command| self.execute(tree, command));
            match result {
                Ok(Flow::Continue) => (),
                Ok(Flow::Exit) | Err(InputError::Eof) => return Ok(()),
                Err(InputError::Io(e)) => return Err(e),
                Err(e) => writeln!(self.output, "{}", e)?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("1").unwrap(), Command::NewTree);
        assert_eq!(Command::parse(" 6 \n").unwrap(), Command::Exit);
        assert_eq!(Command::parse("8").unwrap(), Command::PrintShape);
        assert!(matches!(
            Command::parse("9"),
            Err(InputError::InvalidChoice(s)) if s == "9"
        ));
        assert!(matches!(
            Command::parse(""),
            Err(InputError::InvalidChoice(_))
        ));
    }
}
