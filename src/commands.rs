//! Remote command dispatchers
//!
//! Each dispatcher resolves one service request against the cached vehicle
//! mapping and the gateway. The boolean return only reports "did not fail":
//! requests for unknown VINs, disabled controls or unchanged values resolve
//! to `true` without any call leaving the process. Only a gateway error
//! yields `false`, and the cause goes to the log rather than the caller.

use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::weconnect::{ControlOperation, MaxChargeCurrent, VehicleGateway};

/// Target values at or below this are treated as "not set" and ignored
const SETTINGS_FLOOR_PCT: i64 = 10;
const SETTINGS_FLOOR_C: f64 = 10.0;

/// How a dispatcher resolved a request that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The request went out to the car
    Applied,
    /// Nothing was sent; the reason ends up in the debug log
    Skipped(&'static str),
}

fn command_logger(vin: &str) -> StructuredLogger {
    get_logger_with_context(LogContext::new("commands").with_vin(vin))
}

/// Start or stop charging
pub async fn start_stop_charging(
    vin: &str,
    gateway: &dyn VehicleGateway,
    operation: ControlOperation,
) -> bool {
    let logger = command_logger(vin);
    let Some(vehicle) = gateway.vehicle(vin) else {
        logger.debug("Vehicle not in account, ignoring charging request");
        return true;
    };

    if !vehicle.charging_control_enabled() {
        logger.debug("Charging control not enabled for this vehicle");
        return true;
    }

    if let Err(e) = gateway.send_charging_operation(vin, operation).await {
        logger.error(&format!("Failed to send request to car - {}", e));
        return false;
    }
    match operation {
        ControlOperation::Start => logger.info("Sent start charging call to the car"),
        ControlOperation::Stop => logger.info("Sent stop charging call to the car"),
    }
    true
}

/// Switch the AC charging speed between maximum and reduced
pub async fn set_ac_charging_speed(
    vin: &str,
    gateway: &dyn VehicleGateway,
    charging_speed: MaxChargeCurrent,
) -> bool {
    let logger = command_logger(vin);
    let Some(vehicle) = gateway.vehicle(vin) else {
        logger.debug("Vehicle not in account, ignoring AC charge speed request");
        return true;
    };

    let outcome = match vehicle.charging_settings() {
        Some(settings) => match settings.max_charge_current_ac {
            Some(current) if current == charging_speed => {
                CommandOutcome::Skipped("speed already set")
            }
            Some(_) => {
                if let Err(e) = gateway.set_max_charge_current(vin, charging_speed).await {
                    logger.error(&format!("Failed to send request to car - {}", e));
                    return false;
                }
                CommandOutcome::Applied
            }
            None => CommandOutcome::Skipped("current speed unknown"),
        },
        None => {
            logger.warn("Charging settings not available for this vehicle");
            return true;
        }
    };

    match outcome {
        CommandOutcome::Applied => logger.info("Sent charging speed call to the car"),
        CommandOutcome::Skipped(reason) => {
            logger.debug(&format!("AC charge speed request skipped: {}", reason));
        }
    }
    true
}

/// Set the charging target state of charge, in percent
pub async fn set_target_soc(vin: &str, gateway: &dyn VehicleGateway, target_soc: i64) -> bool {
    let logger = command_logger(vin);
    let Some(vehicle) = gateway.vehicle(vin) else {
        logger.debug("Vehicle not in account, ignoring target SoC request");
        return true;
    };

    let outcome = match vehicle.charging_settings() {
        Some(settings) => match settings.target_soc_pct {
            _ if target_soc <= SETTINGS_FLOOR_PCT => {
                CommandOutcome::Skipped("value at or below floor")
            }
            Some(current) if current == target_soc => {
                CommandOutcome::Skipped("target already set")
            }
            Some(_) => {
                if let Err(e) = gateway.set_target_soc(vin, target_soc).await {
                    logger.error(&format!("Failed to send request to car - {}", e));
                    return false;
                }
                CommandOutcome::Applied
            }
            None => CommandOutcome::Skipped("current target unknown"),
        },
        None => {
            logger.warn("Target SOC setting not available for this vehicle");
            return true;
        }
    };

    match outcome {
        CommandOutcome::Applied => logger.info("Sent target SoC call to the car"),
        CommandOutcome::Skipped(reason) => {
            logger.debug(&format!("Target SoC request skipped: {}", reason));
        }
    }
    true
}

/// Set the cabin target temperature, then optionally start or stop
/// climatisation. The temperature leg runs first so a combined request heats
/// towards the new target rather than the old one.
pub async fn set_climatisation(
    vin: &str,
    gateway: &dyn VehicleGateway,
    operation: Option<ControlOperation>,
    target_temperature: f64,
) -> bool {
    let logger = command_logger(vin);
    let Some(vehicle) = gateway.vehicle(vin) else {
        logger.debug("Vehicle not in account, ignoring climatisation request");
        return true;
    };

    if target_temperature > SETTINGS_FLOOR_C
        && let Some(settings) = vehicle.climatisation_settings()
    {
        match settings.target_temperature_c {
            #[allow(clippy::float_cmp)]
            Some(current) if current != target_temperature => {
                if let Err(e) = gateway.set_target_temperature(vin, target_temperature).await {
                    logger.error(&format!("Failed to send temperature request to car - {}", e));
                    return false;
                }
                logger.info("Sent target temperature call to the car");
            }
            Some(_) => logger.debug("Temperature request skipped: target already set"),
            None => logger.debug("Temperature request skipped: current target unknown"),
        }
    }

    if let Some(op) = operation {
        if !vehicle.climatisation_control_enabled() {
            logger.debug("Climatisation control not enabled for this vehicle");
            return true;
        }
        if let Err(e) = gateway.send_climatisation_operation(vin, op).await {
            match op {
                ControlOperation::Start => logger.error(&format!(
                    "Failed to send climate start request to car - {}",
                    e
                )),
                ControlOperation::Stop => logger.error(&format!(
                    "Failed to send climate stop request to car - {}",
                    e
                )),
            }
            return false;
        }
        match op {
            ControlOperation::Start => logger.info("Sent start climate call to the car"),
            ControlOperation::Stop => logger.info("Sent stop climate call to the car"),
        }
    }
    true
}
