//! # Messaging Link
//!
//! Optional MQTT collaborator for remote control and telemetry. The
//! greenhouse publishes per-tick status and sensor readings under the
//! configured topic prefix and accepts setpoint overrides on the command
//! topics. Malformed commands are logged and ignored; the simulation never
//! stalls on a broken broker connection.
//!
//! ## Topics
//!
//! - `<prefix>/status` - per-tick plant and environment snapshot
//! - `<prefix>/sensor_data` - per-tick raw readings
//! - `<prefix>/command/override` - set an actuation override
//! - `<prefix>/command/clear_override` - clear one or all overrides
//! - `<prefix>/command/get_status` - request a status republish

pub mod messages;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, Publish, QoS};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::MqttConfig;
use crate::controller::OverrideSet;
use crate::domain::TickRecord;

pub use messages::{ClearOverrideCommand, OverrideCommand, SensorMessage, StatusMessage};

/// Handle for publishing telemetry; the receive side runs in its own task.
pub struct MqttLink {
    client: AsyncClient,
    topic_prefix: String,
    last_status: Arc<RwLock<Option<StatusMessage>>>,
}

impl MqttLink {
    /// Connect to the broker and spawn the event task. Subscriptions are
    /// queued immediately and take effect once the connection is up.
    pub fn connect(
        cfg: &MqttConfig,
        broker: &str,
        overrides: Arc<RwLock<OverrideSet>>,
    ) -> Result<Self> {
        let mut options = MqttOptions::new(cfg.client_id.clone(), broker, cfg.port);
        options.set_keep_alive(Duration::from_secs(cfg.keep_alive_seconds.max(5)));

        let (client, eventloop) = AsyncClient::new(options, 16);
        let last_status = Arc::new(RwLock::new(None));

        info!(broker, port = cfg.port, "connecting messaging link");
        tokio::spawn(event_task(
            client.clone(),
            eventloop,
            cfg.topic_prefix.clone(),
            overrides,
            last_status.clone(),
        ));

        Ok(Self {
            client,
            topic_prefix: cfg.topic_prefix.clone(),
            last_status,
        })
    }

    /// Publish status and sensor telemetry for a tick. Failures are logged,
    /// never propagated - telemetry must not stop the simulation.
    pub async fn publish_tick(&self, record: &TickRecord) {
        let status = StatusMessage::from(record);
        *self.last_status.write().await = Some(status.clone());
        self.publish_json("status", &status).await;
        self.publish_json("sensor_data", &SensorMessage::from(record))
            .await;
    }

    async fn publish_json<T: serde::Serialize>(&self, subtopic: &str, payload: &T) {
        let topic = format!("{}/{}", self.topic_prefix, subtopic);
        match serde_json::to_vec(payload) {
            Ok(bytes) => {
                if let Err(e) = self
                    .client
                    .publish(topic, QoS::AtLeastOnce, false, bytes)
                    .await
                {
                    warn!(error = %e, "mqtt publish failed");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode mqtt payload"),
        }
    }
}

async fn event_task(
    client: AsyncClient,
    mut eventloop: EventLoop,
    prefix: String,
    overrides: Arc<RwLock<OverrideSet>>,
    last_status: Arc<RwLock<Option<StatusMessage>>>,
) {
    if let Err(e) = client
        .subscribe(format!("{prefix}/command/#"), QoS::AtLeastOnce)
        .await
    {
        warn!(error = %e, "failed to queue command subscription");
    }

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => info!("connected to mqtt broker"),
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                handle_command(&client, &prefix, &publish, &overrides, &last_status).await;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "mqtt connection error, retrying");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

async fn handle_command(
    client: &AsyncClient,
    prefix: &str,
    publish: &Publish,
    overrides: &Arc<RwLock<OverrideSet>>,
    last_status: &Arc<RwLock<Option<StatusMessage>>>,
) {
    let Some(command) = publish
        .topic
        .strip_prefix(prefix)
        .and_then(|t| t.strip_prefix('/'))
    else {
        debug!(topic = %publish.topic, "ignoring message outside topic prefix");
        return;
    };

    match command {
        "command/override" => match serde_json::from_slice::<OverrideCommand>(&publish.payload) {
            Ok(cmd) => {
                overrides.write().await.set(cmd.parameter, cmd.value);
                info!(parameter = %cmd.parameter, value = cmd.value, "remote override applied");
            }
            Err(e) => warn!(error = %e, "ignoring malformed override command"),
        },
        "command/clear_override" => {
            let cmd = if publish.payload.is_empty() {
                ClearOverrideCommand::default()
            } else {
                match serde_json::from_slice::<ClearOverrideCommand>(&publish.payload) {
                    Ok(cmd) => cmd,
                    Err(e) => {
                        warn!(error = %e, "ignoring malformed clear_override command");
                        return;
                    }
                }
            };
            let mut ov = overrides.write().await;
            match cmd.parameter {
                Some(parameter) => {
                    ov.clear(parameter);
                    info!(parameter = %parameter, "remote override cleared");
                }
                None => {
                    ov.clear_all();
                    info!("all remote overrides cleared");
                }
            }
        }
        "command/get_status" => {
            let status = last_status.read().await.clone();
            match status {
                Some(status) => match serde_json::to_vec(&status) {
                    Ok(bytes) => {
                        let topic = format!("{prefix}/status");
                        if let Err(e) =
                            client.publish(topic, QoS::AtLeastOnce, false, bytes).await
                        {
                            warn!(error = %e, "mqtt publish failed");
                        }
                    }
                    Err(e) => warn!(error = %e, "failed to encode status"),
                },
                None => debug!("status requested before first tick"),
            }
        }
        other => debug!(command = other, "ignoring unknown command topic"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EnvParameter;

    fn test_client() -> AsyncClient {
        let (client, _eventloop) = AsyncClient::new(MqttOptions::new("test", "localhost", 1883), 16);
        client
    }

    fn publish(topic: &str, payload: &str) -> Publish {
        Publish::new(topic, QoS::AtLeastOnce, payload.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_override_command_updates_set() {
        let overrides = Arc::new(RwLock::new(OverrideSet::default()));
        let last_status = Arc::new(RwLock::new(None));
        let msg = publish(
            "greenhouse/command/override",
            r#"{"parameter": "temperature", "value": 25.5}"#,
        );

        handle_command(&test_client(), "greenhouse", &msg, &overrides, &last_status).await;
        assert_eq!(
            overrides.read().await.get(EnvParameter::Temperature),
            Some(25.5)
        );
    }

    #[tokio::test]
    async fn test_malformed_override_is_ignored() {
        let overrides = Arc::new(RwLock::new(OverrideSet::default()));
        let last_status = Arc::new(RwLock::new(None));
        let msg = publish("greenhouse/command/override", "{{{ not json");

        handle_command(&test_client(), "greenhouse", &msg, &overrides, &last_status).await;
        assert!(overrides.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_override_without_payload_clears_all() {
        let overrides = Arc::new(RwLock::new(OverrideSet::default()));
        overrides.write().await.set(EnvParameter::Irrigation, 10.0);
        overrides.write().await.set(EnvParameter::LightHours, 6.0);
        let last_status = Arc::new(RwLock::new(None));
        let msg = publish("greenhouse/command/clear_override", "");

        handle_command(&test_client(), "greenhouse", &msg, &overrides, &last_status).await;
        assert!(overrides.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_topic_is_ignored() {
        let overrides = Arc::new(RwLock::new(OverrideSet::default()));
        let last_status = Arc::new(RwLock::new(None));
        let msg = publish("greenhouse/command/reboot", "{}");

        handle_command(&test_client(), "greenhouse", &msg, &overrides, &last_status).await;
        assert!(overrides.read().await.is_empty());
    }
}
