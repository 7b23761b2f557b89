//! Example that diffs two text files line by line and prints the changeset.
//!
//! Usage:
//!   cargo run --example diff_lines -- old.txt new.txt
//!   cargo run --example diff_lines -- --paragraphs old.txt new.txt
//!   cat new.txt | cargo run --example diff_lines -- old.txt -

use std::fs;
use std::io::{self, Read};
use std::process;

use clap::Parser;
use flexdiff::{
    ByValue, Changeset, SectionedChangeset, Strategy,
    tracing_support::{TimingScope, dump_method_timings, reset_method_timings, set_timing_scope},
};

/// Diff two text files by line and print the changes between them.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Previous version of the file
    previous: String,

    /// Current version of the file (use '-' to read from stdin)
    current: String,

    /// Treat blank-line separated paragraphs as sections, identified by
    /// their first line
    #[arg(long)]
    paragraphs: bool,

    /// Print the time spent in each pass of the diff
    #[arg(long)]
    timings: bool,
}

fn main() {
    let args = Args::parse();

    let previous = read_or_exit(&args.previous);
    let current = read_or_exit(&args.current);

    if args.timings {
        reset_method_timings();
    }
    let _scope = set_timing_scope(TimingScope::Compute);

    if args.paragraphs {
        let previous = paragraphs(&previous);
        let current = paragraphs(&current);
        let changeset = SectionedChangeset::new(
            Some(&previous[..]),
            &current,
            &Strategy::new(
                |paragraph: &Vec<String>| paragraph.first().cloned(),
                |_: &Vec<String>, _: &Vec<String>| true,
            ),
            |paragraph: &Vec<String>| paragraph.as_slice(),
            &ByValue,
        );
        print_summary(changeset.has_no_changes(), &changeset);
    } else {
        let previous: Vec<&str> = previous.lines().collect();
        let current: Vec<&str> = current.lines().collect();
        let changeset = Changeset::by_value(Some(&previous[..]), &current);
        print_summary(changeset.has_no_changes(), &changeset);
    }

    if args.timings {
        dump_method_timings();
    }
}

fn read_or_exit(path: &str) -> String {
    if path == "-" {
        let mut buffer = String::new();
        if let Err(err) = io::stdin().read_to_string(&mut buffer) {
            eprintln!("Failed to read stdin: {err}");
            process::exit(1);
        }
        return buffer;
    }
    match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            eprintln!("Failed to read '{path}': {err}");
            process::exit(1);
        }
    }
}

fn paragraphs(text: &str) -> Vec<Vec<String>> {
    let mut paragraphs = Vec::new();
    let mut paragraph = Vec::new();
    for line in text.lines() {
        if !line.trim().is_empty() {
            paragraph.push(line.to_string());
        } else if !paragraph.is_empty() {
            paragraphs.push(std::mem::take(&mut paragraph));
        }
    }
    if !paragraph.is_empty() {
        paragraphs.push(paragraph);
    }
    paragraphs
}

fn print_summary(unchanged: bool, changeset: &impl std::fmt::Display) {
    if unchanged {
        println!("No changes.");
    } else {
        println!("{changeset}");
    }
}
