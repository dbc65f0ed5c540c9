//! Terminal output for the CLI: result values in color when stdout is a
//! terminal, plain text otherwise.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::runtime::value::Value;

fn color_choice() -> ColorChoice {
    if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

/// Print the final value of a run, highlighted.
pub fn print_result(value: &Value) {
    let mut stdout = StandardStream::stdout(color_choice());
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(Color::Green));
    let _ = stdout.set_color(&spec);
    let _ = writeln!(&mut stdout, "{}", value);
    let _ = stdout.reset();
}

/// Print a line of program text (expanded forms, AST dumps).
pub fn print_plain(text: &str) {
    println!("{}", text);
}
