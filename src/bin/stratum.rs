use color_eyre::eyre::Result;
use stratum::{FLAVOR_ENV_VAR, Flavor, RegisteredHomeViewModel, init_tracing, initiate};

/// Runs the home screen flow headless: login, then refresh, then print the greeting.
///
/// The flavor comes from the first argument or `STRATUM_FLAVOR`, `release` by default.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing()?;

    let flavor = match std::env::args()
        .nth(1)
        .or_else(|| std::env::var(FLAVOR_ENV_VAR).ok())
    {
        Some(value) => value.parse::<Flavor>()?,
        None => Flavor::default(),
    };

    let registry = initiate(flavor);
    let view_model = RegisteredHomeViewModel::from_registry(&registry)?;
    let mut changes = view_model.changes();

    view_model.start().await?;

    if !changes.has_changed()? {
        tracing::warn!("No user was published");
    }
    println!("{}", view_model.greeting());

    Ok(())
}
