//! User input utilities for interactive command-line prompts.

use std::io::{self, BufRead, Write};

/// Interpret a yes/no answer. Empty input means no; anything unrecognised
/// is `None` so the caller can ask again.
pub fn parse_confirmation(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" | "" => Some(false),
        _ => None,
    }
}

/// Ask a yes/no question on the terminal, defaulting to no.
pub fn prompt_confirmation(prompt: &str) -> io::Result<bool> {
    let stdin = io::stdin();
    loop {
        print!("{prompt} (y/N): ");
        io::stdout().flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF
            return Ok(false);
        }
        match parse_confirmation(&input) {
            Some(answer) => return Ok(answer),
            None => eprintln!("Please enter 'y' for yes or 'n' for no."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_confirmation() {
        assert_eq!(parse_confirmation("y\n"), Some(true));
        assert_eq!(parse_confirmation(" YES "), Some(true));
        assert_eq!(parse_confirmation("no"), Some(false));
        assert_eq!(parse_confirmation("\n"), Some(false));
        assert_eq!(parse_confirmation("maybe"), None);
    }
}
