#[actix_web::main]
async fn main() -> std::io::Result<()> {
    riskwise_lib::run().await
}
