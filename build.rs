/// Expose the compilation target triple as an environment variable at build time.
///
/// `constants::TARGET` reads it with `env!("TARGET")` for the `version` command.
fn main() {
    println!(
        "cargo:rustc-env=TARGET={}",
        std::env::var("TARGET").unwrap_or_else(|_| "unknown".to_string())
    );
}
