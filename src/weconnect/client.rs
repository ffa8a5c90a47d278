//! HTTP client for the Cupra We Connect cloud API
//!
//! The client keeps one authenticated session and an in-memory mapping of
//! VIN to the latest [`VehicleSnapshot`]. Nothing here retries: an expired
//! session is renewed before the next batch of calls, and any mid-flight
//! auth failure surfaces as an error so the next scheduled refresh starts
//! from a clean login.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::config::AccountConfig;
use crate::error::{FormentorError, Result};
use crate::logging::{StructuredLogger, get_logger};
use crate::weconnect::VehicleGateway;
use crate::weconnect::decode;
use crate::weconnect::types::{ControlOperation, MaxChargeCurrent, VehicleSnapshot};

const APP_USER_AGENT: &str = concat!("formentor/", env!("CARGO_PKG_VERSION"));

/// Refresh the session this long before the token actually expires
const SESSION_EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Clone)]
struct Session {
    access_token: String,
    user_id: String,
    expires_at: DateTime<Utc>,
}

/// We Connect API client holding the session and vehicle mapping
pub struct WeConnectClient {
    http: reqwest::Client,
    api_base: String,
    username: String,
    password: String,
    service: String,
    logger: StructuredLogger,
    session: RwLock<Option<Session>>,
    vehicles: RwLock<HashMap<String, VehicleSnapshot>>,
}

impl WeConnectClient {
    /// Create a new client; `request_timeout` bounds every individual call
    pub fn new(account: &AccountConfig, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            api_base: account.api_base.trim_end_matches('/').to_string(),
            username: account.username.clone(),
            password: account.password.clone(),
            service: account.service.clone(),
            logger: get_logger("weconnect"),
            session: RwLock::new(None),
            vehicles: RwLock::new(HashMap::new()),
        })
    }

    /// Session that is still comfortably within its validity window
    fn current_session(&self) -> Option<(String, String)> {
        let guard = self.session.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|s| {
                s.expires_at > Utc::now() + chrono::Duration::seconds(SESSION_EXPIRY_SKEW_SECONDS)
            })
            .map(|s| (s.access_token.clone(), s.user_id.clone()))
    }

    fn store_session(&self, session: Option<Session>) {
        let mut guard = self.session.write().unwrap_or_else(PoisonError::into_inner);
        *guard = session;
    }

    async fn ensure_session(&self) -> Result<(String, String)> {
        if let Some(session) = self.current_session() {
            return Ok(session);
        }
        self.do_login().await?;
        self.current_session()
            .ok_or_else(|| FormentorError::auth("Login did not produce a usable session"))
    }

    async fn do_login(&self) -> Result<()> {
        let resp = self
            .http
            .post(format!("{}/login/v1/session", self.api_base))
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, APP_USER_AGENT)
            .json(&json!({
                "username": self.username,
                "password": self.password,
                "service": self.service,
            }))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FormentorError::auth(format!(
                "We Connect rejected the credentials: {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(FormentorError::api(format!(
                "We Connect login failed: {}",
                status
            )));
        }

        let body: Value = resp.json().await?;
        let access_token = body
            .get("accessToken")
            .and_then(Value::as_str)
            .ok_or_else(|| FormentorError::api("Login response carried no access token"))?
            .to_string();
        let user_id = body
            .get("userId")
            .and_then(Value::as_str)
            .ok_or_else(|| FormentorError::api("Login response carried no user id"))?
            .to_string();
        let expires_in = body.get("expiresIn").and_then(Value::as_i64).unwrap_or(3600);

        self.store_session(Some(Session {
            access_token,
            user_id,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in),
        }));
        self.logger
            .info(&format!("Logged in to We Connect as {}", self.username));
        Ok(())
    }

    async fn get_json(&self, url: &str, token: &str) -> Result<Value> {
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, APP_USER_AGENT)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            // Token went stale mid-flight; the next refresh logs in again
            self.store_session(None);
            return Err(FormentorError::auth("We Connect session expired"));
        }
        if !status.is_success() {
            return Err(FormentorError::api(format!(
                "We Connect API error: {} for {}",
                status, url
            )));
        }
        Ok(resp.json().await?)
    }

    async fn send_command(&self, request: reqwest::RequestBuilder, what: &str) -> Result<()> {
        let (token, _) = self.ensure_session().await?;
        let resp = request
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, APP_USER_AGENT)
            .header("X-Request-Id", Uuid::new_v4().to_string())
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            self.store_session(None);
            return Err(FormentorError::auth("We Connect session expired"));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(FormentorError::api(format!(
                "{} failed: {} {}",
                what, status, snippet
            )));
        }
        Ok(())
    }

    /// Apply an in-place edit to one mapped vehicle, if present
    fn update_vehicle<F: FnOnce(&mut VehicleSnapshot)>(&self, vin: &str, f: F) {
        let mut guard = self.vehicles.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(vehicle) = guard.get_mut(vin) {
            f(vehicle);
        }
    }
}

#[async_trait::async_trait]
impl VehicleGateway for WeConnectClient {
    async fn login(&self) -> Result<()> {
        self.do_login().await
    }

    async fn update(&self) -> Result<()> {
        let (token, user_id) = self.ensure_session().await?;

        let garage_doc = self
            .get_json(
                &format!("{}/v2/users/{}/garage/vehicles", self.api_base, user_id),
                &token,
            )
            .await?;
        let garage = decode::garage_vehicles(&garage_doc);

        let fetched_at = Utc::now();
        let mut mapping = HashMap::with_capacity(garage.len());
        for entry in &garage {
            let status_doc = self
                .get_json(
                    &format!("{}/v1/vehicles/{}/status", self.api_base, entry.vin),
                    &token,
                )
                .await?;
            mapping.insert(
                entry.vin.clone(),
                decode::vehicle_snapshot(entry, &status_doc, fetched_at),
            );
        }

        self.logger
            .debug(&format!("Refreshed {} vehicle(s)", mapping.len()));
        let mut guard = self.vehicles.write().unwrap_or_else(PoisonError::into_inner);
        *guard = mapping;
        Ok(())
    }

    fn vehicles(&self) -> Vec<VehicleSnapshot> {
        let guard = self.vehicles.read().unwrap_or_else(PoisonError::into_inner);
        let mut list: Vec<VehicleSnapshot> = guard.values().cloned().collect();
        // Stable output order regardless of map internals
        list.sort_by(|a, b| a.vin.cmp(&b.vin));
        list
    }

    fn vehicle(&self, vin: &str) -> Option<VehicleSnapshot> {
        let guard = self.vehicles.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(vin).cloned()
    }

    async fn send_charging_operation(&self, vin: &str, operation: ControlOperation) -> Result<()> {
        let request = self.http.post(format!(
            "{}/v1/vehicles/{}/charging/requests/{}",
            self.api_base,
            vin,
            operation.as_str()
        ));
        self.send_command(request, "Charging request").await
    }

    async fn send_climatisation_operation(
        &self,
        vin: &str,
        operation: ControlOperation,
    ) -> Result<()> {
        let request = self.http.post(format!(
            "{}/v1/vehicles/{}/climatisation/requests/{}",
            self.api_base,
            vin,
            operation.as_str()
        ));
        self.send_command(request, "Climatisation request").await
    }

    async fn set_target_soc(&self, vin: &str, target_soc_pct: i64) -> Result<()> {
        let request = self
            .http
            .put(format!(
                "{}/v1/vehicles/{}/charging/settings",
                self.api_base, vin
            ))
            .json(&json!({ "targetSOC_pct": target_soc_pct }));
        self.send_command(request, "Target SoC update").await?;
        self.update_vehicle(vin, |vehicle| {
            if let Some(charging) = vehicle.charging.as_mut()
                && let Some(settings) = charging.settings.as_mut()
            {
                settings.target_soc_pct = Some(target_soc_pct);
            }
        });
        Ok(())
    }

    async fn set_max_charge_current(&self, vin: &str, level: MaxChargeCurrent) -> Result<()> {
        let request = self
            .http
            .put(format!(
                "{}/v1/vehicles/{}/charging/settings",
                self.api_base, vin
            ))
            .json(&json!({ "maxChargeCurrentAC": level.as_str() }));
        self.send_command(request, "AC charge speed update").await?;
        self.update_vehicle(vin, |vehicle| {
            if let Some(charging) = vehicle.charging.as_mut()
                && let Some(settings) = charging.settings.as_mut()
            {
                settings.max_charge_current_ac = Some(level);
            }
        });
        Ok(())
    }

    async fn set_target_temperature(&self, vin: &str, temperature_c: f64) -> Result<()> {
        let request = self
            .http
            .put(format!(
                "{}/v1/vehicles/{}/climatisation/settings",
                self.api_base, vin
            ))
            .json(&json!({ "targetTemperature_C": temperature_c }));
        self.send_command(request, "Target temperature update")
            .await?;
        self.update_vehicle(vin, |vehicle| {
            if let Some(climatisation) = vehicle.climatisation.as_mut()
                && let Some(settings) = climatisation.settings.as_mut()
            {
                settings.target_temperature_c = Some(temperature_c);
            }
        });
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        let Some((token, _)) = self.current_session() else {
            return Ok(());
        };
        let result = self
            .http
            .delete(format!("{}/login/v1/session", self.api_base))
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(USER_AGENT, APP_USER_AGENT)
            .send()
            .await;
        if let Err(e) = result {
            self.logger.debug(&format!("Logout call failed: {}", e));
        }
        self.store_session(None);
        Ok(())
    }
}
