fn main() {
    if let Err(err) = item_lookup::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
