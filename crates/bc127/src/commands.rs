//! BC127 command builders.
//!
//! This module maps each module feature to the [`Exchange`] that performs it.
//! All functions are pure -- they describe what to write and how to read the
//! reply without performing any I/O. [`Bc127`](crate::Bc127) and
//! [`Bc127Io`](crate::Bc127Io) run the exchanges.
//!
//! # Command reference
//!
//! Based on the Melody 5.0 command set. Role changes are stored in RAM; they
//! take effect after `WRITE` followed by `RESET`.

use bc127_core::types::{AudioCommand, BleRole, ClassicRole};
use bc127_protocol::Exchange;

pub use bc127_protocol::engine::BAUD_PARAM;

/// Bluetooth Low Energy role selection.
pub const BLE_ROLE_PARAM: &str = "BLE_ROLE";

/// Bluetooth Classic audio role selection.
pub const CLASSIC_ROLE_PARAM: &str = "CLASSIC_ROLE";

/// The module's own Bluetooth address.
pub const LOCAL_ADDR_PARAM: &str = "LOCAL_ADDR";

// ---------------------------------------------------------------
// Value mapping
// ---------------------------------------------------------------

/// `BLE_ROLE` value for a role.
pub fn ble_role_value(role: BleRole) -> &'static str {
    match role {
        BleRole::Disabled => "0",
        BleRole::Peripheral => "1",
        BleRole::Central => "2",
    }
}

/// `CLASSIC_ROLE` value for a role.
pub fn classic_role_value(role: ClassicRole) -> &'static str {
    match role {
        ClassicRole::Sink => "0",
        ClassicRole::Source => "1",
    }
}

/// Command word for an audio transport control.
pub fn audio_command_token(command: AudioCommand) -> &'static str {
    match command {
        AudioCommand::Play => "PLAY",
        AudioCommand::Pause => "PAUSE",
        AudioCommand::Forward => "FORWARD",
        AudioCommand::Back => "BACKWARD",
        AudioCommand::VolumeUp => "VOLUME UP",
        AudioCommand::VolumeDown => "VOLUME DOWN",
        AudioCommand::Stop => "STOP",
    }
}

// ---------------------------------------------------------------
// Exchange builders
// ---------------------------------------------------------------

/// Reboot the module (`RESET`), succeeding on its `Ready` banner.
pub fn cmd_reset() -> Exchange {
    Exchange::reset()
}

/// Return all settings to factory defaults (`RESTORE`).
pub fn cmd_restore() -> Exchange {
    Exchange::command("RESTORE")
}

/// Persist current settings so they survive a reset (`WRITE`).
pub fn cmd_write_config() -> Exchange {
    Exchange::command("WRITE")
}

/// Select the BLE role (`SET BLE_ROLE=<0|1|2>`).
pub fn cmd_set_ble_role(role: BleRole) -> Exchange {
    Exchange::set(BLE_ROLE_PARAM, ble_role_value(role))
}

/// Select the classic audio role (`SET CLASSIC_ROLE=<0|1>`).
pub fn cmd_set_classic_role(role: ClassicRole) -> Exchange {
    Exchange::set(CLASSIC_ROLE_PARAM, classic_role_value(role))
}

/// Start or stop BLE advertising (`ADVERTISING ON|OFF`).
pub fn cmd_advertise(on: bool) -> Exchange {
    if on {
        Exchange::command("ADVERTISING ON")
    } else {
        Exchange::command("ADVERTISING OFF")
    }
}

/// Send an audio transport control to the connected peer.
pub fn cmd_music(command: AudioCommand) -> Exchange {
    Exchange::command(audio_command_token(command))
}

/// Read the module's Bluetooth address (`GET LOCAL_ADDR`).
pub fn cmd_query_address() -> Exchange {
    Exchange::get(LOCAL_ADDR_PARAM)
}

/// Read the module's configured line rate (`GET BAUD`).
pub fn cmd_query_baud_rate() -> Exchange {
    Exchange::get(BAUD_PARAM)
}
