//! Hand-rolled `--flag value` parsing; the command surface is small.

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};

pub const USAGE: &str = "\
usage: boardfeed <command> [--flag value]...

commands:
  list      --board <slug> [--keyword K] [--option title|content|writer|category|tag|image]
            [--page N] [--bunch N] [--since-uid N] [--direction next|prev] [--viewer N]
  view      --board <slug> --post N [--viewer N] [--hit] [--latest N]
  comments  --board <slug> --post N [--since-uid N] [--direction next|prev] [--bunch N]
            [--viewer N]
  home      [--board <slug>] [--bunch N] [--since-uid N] [--direction next|prev] [--viewer N]
  schema    create the PostgreSQL tables

global flags:
  --memory  use the seeded in-memory demo store instead of PostgreSQL";

/// Flags that take no value.
const SWITCHES: &[&str] = &["memory", "hit"];

#[derive(Debug, Default)]
pub struct Args {
    pub command: String,
    flags: HashMap<String, String>,
}

impl Args {
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let mut args = args.into_iter();
        let command = args.next().ok_or_else(|| anyhow!("missing command"))?;
        let mut flags = HashMap::new();
        while let Some(arg) = args.next() {
            let Some(name) = arg.strip_prefix("--") else {
                bail!("unexpected argument '{arg}'");
            };
            let value = if SWITCHES.contains(&name) {
                String::from("true")
            } else {
                args.next().with_context(|| format!("--{name} needs a value"))?
            };
            flags.insert(name.to_string(), value);
        }
        Ok(Self { command, flags })
    }

    pub fn switch(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.flags.get(name).map(String::as_str)
    }

    /// Parses the flag, or returns the type's default when it is absent.
    pub fn value<T>(&self, name: &str) -> anyhow::Result<T>
    where
        T: FromStr + Default,
        T::Err: std::fmt::Display,
    {
        match self.flags.get(name) {
            None => Ok(T::default()),
            Some(raw) => raw
                .parse()
                .map_err(|err| anyhow!("invalid --{name} '{raw}': {err}")),
        }
    }
}
