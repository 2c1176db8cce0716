//! todo CLI binary.
//!
//! Minimal entrypoint: all logic lives in the library, `main` only maps
//! the result to a process exit code.

fn main() {
    let code = todo_engine::cli::run();
    std::process::exit(code);
}
