use std::io::{self, BufRead, Write};

use colored::Colorize;

use crate::models::DeletionReport;

/// Print one name per line on stdout and the total on stderr
pub fn print_listing(items: &[String], noun: &str) {
    for item in items {
        println!("{}", item);
    }
    eprintln!("Total of {} {}.", items.len(), noun);
}

/// Print the selected tags as a JSON array without deleting anything
pub fn print_dry_run(image: &str, tags: &[String]) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string(tags)?);
    eprintln!(
        "{} would delete image \"{}\" with {} tags.",
        "Dry run,".yellow().bold(),
        image.bold(),
        tags.len()
    );
    Ok(())
}

/// Ask a yes/no question; only `y` or `yes` counts as consent
pub fn confirm<R, W>(question: &str, input: &mut R, out: &mut W) -> io::Result<bool>
where
    R: BufRead,
    W: Write,
{
    write!(out, "{} [y/n]: ", question)?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Print per-tag failures followed by the totals
pub fn print_report(report: &DeletionReport) {
    for outcome in report.failures() {
        eprintln!(
            "{} {}:{}: {}",
            "[ERROR]".red().bold(),
            report.image,
            outcome.tag,
            outcome.error.as_deref().unwrap_or_default()
        );
    }

    let deleted = report.attempted() - report.failed();
    let failed = report.failed();
    eprintln!(
        "Total of {} tags deleted, {} failed.",
        deleted.to_string().green().bold(),
        if failed > 0 {
            failed.to_string().red().bold().to_string()
        } else {
            failed.to_string()
        }
    );

    if deleted > 0 {
        eprintln!(
            "\n{} Run registry garbage collection to reclaim disk space:",
            "REMINDER:".yellow().bold()
        );
        eprintln!("  docker exec <registry-container> bin/registry garbage-collect /etc/docker/registry/config.yml");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(answer: &str) -> (bool, String) {
        let mut input = io::Cursor::new(answer.as_bytes().to_vec());
        let mut out = Vec::new();
        let result = confirm("Delete?", &mut input, &mut out).unwrap();
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_confirm_accepts_yes() {
        assert!(ask("y\n").0);
        assert!(ask("yes\n").0);
        assert!(ask("  YES \n").0);
    }

    #[test]
    fn test_confirm_rejects_everything_else() {
        assert!(!ask("n\n").0);
        assert!(!ask("yep\n").0);
        assert!(!ask("\n").0);
        assert!(!ask("").0);
    }

    #[test]
    fn test_confirm_prints_prompt() {
        assert_eq!(ask("y\n").1, "Delete? [y/n]: ");
    }
}
