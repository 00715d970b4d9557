use tracing::Level;

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    let report = classroom_backend::seed_demo(Some(Level::INFO)).await?;

    println!(
        "Seeded {} accounts, {} classes, {} assignments and {} resources.",
        report.users, report.classes, report.assignments, report.resources
    );
    println!(
        "Every account signs in with password '{}' or PIN {}.",
        classroom_backend::service::seed::DEMO_PASSWORD,
        classroom_backend::service::seed::DEMO_PIN
    );

    Ok(())
}
