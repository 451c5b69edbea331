#[cfg(feature = "cli")]
mod cli;

#[cfg(feature = "cli")]
fn main() {
    cli::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("instantcloud-rs was built without the cli feature");
    std::process::exit(1);
}
