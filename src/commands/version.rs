//! Command: print version information.

/// Print the azstack version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("azstack {}", crate::version());
}
