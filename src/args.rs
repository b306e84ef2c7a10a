use std::collections::HashMap;

/// One subcommand's words split into flags, `-x value` options and positions.
#[derive(Debug, Default)]
pub(crate) struct Args {
    flags: Vec<String>,
    options: HashMap<String, String>,
    positions: Vec<String>,
}

impl Args {
    /// Words in `options` take the next word as their value. Any other word
    /// starting with `-` is a flag.
    pub(crate) fn parse(args: &[String], options: &[&str]) -> Self {
        let mut parsed = Self::default();
        let mut words = args.iter();

        while let Some(word) = words.next() {
            if options.contains(&word.as_str()) {
                if let Some(value) = words.next() {
                    parsed.options.insert(word.clone(), value.clone());
                }
            } else if word.len() > 1 && word.starts_with('-') {
                parsed.flags.push(word.clone());
            } else {
                parsed.positions.push(word.clone());
            }
        }

        parsed
    }

    pub(crate) fn flag(&self, name: &str) -> bool {
        self.flags.iter().any(|flag| flag == name)
    }

    pub(crate) fn option(&self, name: &str) -> Option<String> {
        self.options.get(name).cloned()
    }

    pub(crate) fn position(&self, index: usize) -> Option<String> {
        self.positions.get(index).cloned()
    }
}
