//! Subcommand handlers. Each returns the JSON value printed on success.

use nitro_config::Config;
use nitro_supervisor::{InitResponse, Platform, ReadinessGate, Supervisor, SupervisorSettings};

use serde_json::{Value, json};
use tracing::info;

pub(crate) enum Outcome {
    Success(Value),
    Failure(Value),
    /// Output was already written while the command ran
    Done,
}

pub(crate) async fn init(
    config: &Config,
    model: &str,
    hold: bool,
    pretty: bool,
) -> Result<Outcome, String> {
    let supervisor = Supervisor::from_config(config).map_err(|e| e.to_string())?;
    let response = supervisor.init(model).await;

    if !response.is_ok() {
        supervisor.dispose().await;
        return Ok(Outcome::Failure(response_json(&response)?));
    }

    if !hold {
        supervisor.dispose().await;
        return Ok(Outcome::Success(response_json(&response)?));
    }

    print_value(&response_json(&response)?, pretty);
    info!("Server is running, press Ctrl-C to stop");

    let signal = tokio::signal::ctrl_c().await;
    supervisor.dispose().await;
    signal.map_err(|e| format!("failed to listen for Ctrl-C: {e}"))?;

    Ok(Outcome::Done)
}

pub(crate) async fn kill(config: &Config) -> Result<Outcome, String> {
    let supervisor = Supervisor::from_config(config).map_err(|e| e.to_string())?;
    supervisor.kill_subprocess().await;

    let settings = supervisor.settings();
    Ok(Outcome::Success(json!({
        "port": settings.port,
        "free": nitro_supervisor::PortReconciler::is_free(&settings.host, settings.port),
    })))
}

pub(crate) async fn status(config: &Config) -> Result<Outcome, String> {
    let settings = SupervisorSettings::from_config(config).map_err(|e| e.to_string())?;
    let accepting =
        ReadinessGate::is_up(&settings.host, settings.port, settings.readiness_poll_interval)
            .await;

    Ok(Outcome::Success(json!({
        "host": settings.host,
        "port": settings.port,
        "accepting": accepting,
    })))
}

pub(crate) fn platform(config: &Config) -> Outcome {
    Outcome::Success(platform_json(&Platform::current(), config))
}

pub(crate) fn show_config(config: &Config) -> Result<Outcome, String> {
    let settings = SupervisorSettings::from_config(config).map_err(|e| e.to_string())?;
    Ok(Outcome::Success(settings_json(&settings)))
}

pub(crate) fn platform_json(platform: &Platform, config: &Config) -> Value {
    json!({
        "platform": platform.to_string(),
        "binary": platform.binary_name(),
        "binary_override": config.server.binary_name,
    })
}

pub(crate) fn settings_json(settings: &SupervisorSettings) -> Value {
    json!({
        "host": settings.host,
        "port": settings.port,
        "binary_dir": settings.binary_dir.display().to_string(),
        "config_path": settings.config_path.display().to_string(),
        "user_data_dir": settings.user_data_dir.display().to_string(),
        "binary_name": settings.binary_name,
        "port_poll_interval_ms": settings.port_poll_interval.as_millis() as u64,
        "port_grace_timeout_ms": settings.port_grace_timeout.as_millis() as u64,
        "readiness_poll_interval_ms": settings.readiness_poll_interval.as_millis() as u64,
        "readiness_timeout_ms": settings.readiness_timeout.as_millis() as u64,
        "kill_on_readiness_timeout": settings.kill_on_readiness_timeout,
    })
}

fn response_json(response: &InitResponse) -> Result<Value, String> {
    serde_json::to_value(response).map_err(|e| format!("Error serializing response: {e}"))
}

pub(crate) fn print_value(value: &Value, pretty: bool) {
    let output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };

    match output {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error serializing response: {e}"),
    }
}
