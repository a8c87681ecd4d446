use kapasda_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("kapasda: {err}");
        std::process::exit(1);
    }
}
