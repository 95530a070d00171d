fn main() {
    if let Err(err) = sales_fact_etl::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
