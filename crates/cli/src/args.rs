use std::collections::HashMap;

use anyhow::{bail, Result};

/// Positional arguments plus `--name value` options.
#[derive(Debug, Default)]
pub struct Args {
    positional: Vec<String>,
    options: HashMap<String, String>,
}

impl Args {
    /// Split raw arguments. Every `--name` must be followed by a value.
    pub fn parse(raw: &[String]) -> Result<Self> {
        let mut parsed = Args::default();
        let mut iter = raw.iter();
        while let Some(arg) = iter.next() {
            match arg.strip_prefix("--") {
                Some(name) if !name.is_empty() => {
                    let Some(value) = iter.next() else {
                        bail!("option --{name} needs a value");
                    };
                    parsed.options.insert(name.to_string(), value.clone());
                }
                _ => parsed.positional.push(arg.clone()),
            }
        }
        Ok(parsed)
    }

    /// Positional argument at `index`, or an empty string.
    pub fn at(&self, index: usize) -> &str {
        self.positional.get(index).map(String::as_str).unwrap_or("")
    }

    /// Required positional argument.
    pub fn require(&self, index: usize, name: &str) -> Result<&str> {
        match self.positional.get(index) {
            Some(value) => Ok(value),
            None => bail!("missing <{name}>"),
        }
    }

    /// Option value, or an empty string.
    pub fn option(&self, name: &str) -> &str {
        self.options.get(name).map(String::as_str).unwrap_or("")
    }
}
